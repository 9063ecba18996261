//! Configuration structures for the normalization engine.
//!
//! A [`NormalizationConfig`] is assembled through its builder, which rejects
//! incomplete setups before any model is touched.

use thiserror::Error;

/// Represents errors for configuration validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required parameter was not provided before building.
    #[error("Missing required configuration parameter: {0}")]
    MissingParameter(&'static str),
}

/// Controls what happens to normalized artifacts once a model is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Write normalized structures, scores, and reports under the output
    /// directory.
    Persist,
    /// Keep every artifact in memory and leave the filesystem untouched.
    InMemoryOnly,
}

/// Parameters for steric clash detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClashParams {
    /// Neighbor search radius in Angstroms. Atom pairs farther apart than
    /// this are never considered.
    pub distance_threshold: f64,
    /// Fraction of the summed van der Waals radii below which a contact
    /// counts as a clash.
    pub overlap_fraction: f64,
}

impl Default for ClashParams {
    fn default() -> Self {
        Self {
            distance_threshold: 3.4,
            overlap_fraction: 0.63,
        }
    }
}

/// Top-level configuration for a normalization run.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationConfig {
    /// Whether artifacts are written to disk or only returned in memory.
    pub output_mode: OutputMode,
    /// Steric clash detection parameters.
    pub clash: ClashParams,
    /// Whether sibling models are superposed onto the first processed model.
    pub superpose: bool,
}

impl NormalizationConfig {
    /// Creates a new builder for constructing a configuration.
    pub fn builder() -> NormalizationConfigBuilder {
        NormalizationConfigBuilder::default()
    }
}

/// A builder for creating [`NormalizationConfig`] instances.
#[derive(Debug, Default, Clone)]
pub struct NormalizationConfigBuilder {
    output_mode: Option<OutputMode>,
    clash: Option<ClashParams>,
    superpose: Option<bool>,
}

impl NormalizationConfigBuilder {
    /// Sets the output mode for the run.
    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = Some(mode);
        self
    }

    /// Sets the clash detection parameters.
    pub fn clash_params(mut self, params: ClashParams) -> Self {
        self.clash = Some(params);
        self
    }

    /// Sets whether sibling models are superposed onto the first one.
    pub fn superpose(mut self, enabled: bool) -> Self {
        self.superpose = Some(enabled);
        self
    }

    /// Builds the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingParameter` if the output mode was never
    /// chosen. Clash parameters and superposition fall back to defaults.
    pub fn build(self) -> Result<NormalizationConfig, ConfigError> {
        Ok(NormalizationConfig {
            output_mode: self
                .output_mode
                .ok_or(ConfigError::MissingParameter("output_mode"))?,
            clash: self.clash.unwrap_or_default(),
            superpose: self.superpose.unwrap_or(true),
        })
    }
}
