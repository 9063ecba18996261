//! Provides input/output functionality for prediction output files.
//!
//! This module contains the mmCIF coordinate codec, readers for the raw
//! score files each prediction tool writes, and the writer for the
//! normalized score schema. A unified trait-based interface covers
//! coordinate file I/O so the pipeline stays format-agnostic.

pub mod mmcif;
pub mod scores;
pub mod traits;
