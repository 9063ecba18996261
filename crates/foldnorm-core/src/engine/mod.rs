//! The engine layer: tool adapters, normalization tasks, and their shared
//! plumbing.
//!
//! ## Overview
//!
//! Everything below this module turns raw prediction tool output into the
//! canonical form the rest of the system consumes. The engine owns no I/O
//! policy of its own beyond what tasks need; orchestration across models
//! lives in the `workflows` layer on top.
//!
//! ## Architecture
//!
//! - [`adapters`] - Per-tool knowledge: output layouts, naming, raw score
//!   schemas, and which normalization steps a tool's output needs.
//! - [`tasks`] - The individual units of work: chain relabeling, confidence
//!   embedding and aggregation, clash detection, PAE normalization, and
//!   superposition.
//! - [`classify`] - Chain classification against the complex description.
//! - [`config`] - Run configuration and its builder.
//! - [`progress`] - Progress event reporting for long operations.
//! - [`error`] - The engine-wide error type.

pub mod adapters;
pub mod classify;
pub mod config;
pub mod error;
pub mod progress;
pub mod tasks;
