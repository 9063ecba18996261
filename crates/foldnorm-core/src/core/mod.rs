//! # Core Module
//!
//! This module provides the fundamental building blocks for normalizing
//! structure prediction outputs, serving as the data foundation of the
//! library.
//!
//! ## Overview
//!
//! The core module implements the essential data structures and file formats
//! required to turn raw prediction artifacts into canonical outputs. It
//! provides a complete framework for representing predicted models, reading
//! and writing their on-disk formats, and answering the structural queries
//! the post-processing engine is built on.
//!
//! ## Architecture
//!
//! The module is organized into specialized submodules that handle different
//! aspects of the data layer:
//!
//! - **Model Representation** ([`models`]) - Data structures for atoms, residues, chains, and structures
//! - **Run Description** ([`input`]) - The canonical description of the predicted complex
//! - **File I/O** ([`io`]) - Reading/writing coordinate and score file formats
//! - **Chemical Knowledge** ([`utils`]) - Element radii, residue alphabets, and geometry helpers
//!
//! ## Key Capabilities
//!
//! - **Complete model representation** with source-order preservation
//! - **mmCIF parsing and regeneration** with deterministic output
//! - **Score file handling** for every supported prediction tool
//! - **Length and token queries** shared by all downstream consistency checks

pub mod input;
pub mod io;
pub mod models;
pub mod utils;
