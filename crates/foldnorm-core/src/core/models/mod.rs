//! # Core Models Module
//!
//! This module contains the fundamental data structures used to represent
//! predicted structure models, providing the foundation for all output
//! normalization operations.
//!
//! ## Overview
//!
//! The models module defines the core abstractions for representing predicted
//! structures, including atoms, residues, chains, and their organization into
//! complete models. These models are designed to:
//!
//! - **Represent predicted structures** - Complete description of atomic coordinates and identity
//! - **Preserve source order** - Chains keep the order they appeared in on disk
//! - **Support efficient operations** - Slot-map storage with stable IDs
//! - **Maintain type safety** - Strong typing for structural data integrity
//!
//! ## Key Components
//!
//! - [`atom`] - Individual atom representation with coordinates and confidence
//! - [`residue`] - Residue structure with atom membership
//! - [`chain`] - Chain organization and classification
//! - [`structure`] - Complete predicted model with all components and length queries
//! - [`ids`] - Unique identifier types for atoms, residues, and chains

pub mod atom;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod structure;
