//! The canonical description of the predicted complex.
//!
//! Prediction tools are launched from one AlphaFold 3 style run description
//! JSON; this module parses that description into the form the normalization
//! pipeline uses to classify, order, and relabel chains.

pub mod descriptor;
