//! # FoldNorm Core Library
//!
//! A library for normalizing structure prediction output from AlphaFold3,
//! Boltz, and Chai-1 into one canonical form, so downstream analysis never
//! has to care which tool produced a model.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models
//!   (`Structure`), the complex description parser, and I/O for mmCIF
//!   structures and score files.
//!
//! - **[`engine`]: The Logic Core.** This layer implements the normalization
//!   tasks (chain relabeling, classification, confidence aggregation, clash
//!   detection, PAE canonicalization, superposition) and the per-tool
//!   adapters that map each tool's on-disk layout onto them.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level,
//!   user-facing layer. It ties the `engine` and `core` together to run the
//!   complete normalization of a tool's output directory, with per-model
//!   fault isolation and progress reporting.

pub mod core;
pub mod engine;
pub mod workflows;
