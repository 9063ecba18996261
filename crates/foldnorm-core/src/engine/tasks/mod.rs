//! Defines the distinct computational tasks of the normalization engine.
//!
//! Each task is a self-contained unit of work over one model: relabeling
//! chains, embedding confidence, aggregating scores, detecting clashes,
//! normalizing PAE output, and superposing siblings. Workflows compose them
//! into the full per-tool pipeline.

pub mod clash_detection;
pub mod confidence;
pub mod embed_confidence;
pub mod pae_normalization;
pub mod relabel;
pub mod superpose;
