//! Utility tables and math helpers for the core layer.
//!
//! This module provides the static chemical knowledge the normalization
//! pipeline relies on (element radii, standard residue alphabets) together
//! with the geometric routines used for model superposition.

pub mod elements;
pub mod geometry;
pub mod residues;
