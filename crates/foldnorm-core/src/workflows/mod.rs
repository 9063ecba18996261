//! # Workflows Module
//!
//! This module provides high-level workflow implementations that orchestrate
//! the complete normalization of structure prediction output.
//!
//! ## Overview
//!
//! Workflows are the top-level entry points for users of this crate. They
//! encapsulate the entire normalization pipeline, from model discovery
//! through artifact serialization. Each workflow handles input loading,
//! per-model fault isolation, progress reporting, and result organization,
//! providing a simple API over the engine's tasks.
//!
//! ## Architecture
//!
//! The module is organized around specific workflows:
//!
//! - **Normalization Workflow** ([`normalize`]) - Complete per-model
//!   normalization including chain relabeling, classification, confidence
//!   embedding, clash detection, PAE canonicalization, and superposition.
//!
//! ## Key Capabilities
//!
//! - **End-to-end normalization** from raw tool output to canonical artifacts
//! - **Fault isolation** so one corrupt model never stops its siblings
//! - **Progress monitoring** with detailed phase and task reporting
//! - **Dual output modes** persisting artifacts or returning them in memory

pub mod normalize;
