use crate::cli::NormalizeArgs;
use crate::error::{CliError, Result};
use foldnorm::engine::config as core_config;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialClashConfig {
    #[serde(rename = "distance-threshold")]
    distance_threshold: Option<f64>,
    #[serde(rename = "overlap-fraction")]
    overlap_fraction: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialNormalizationConfig {
    superpose: Option<bool>,
    clash: Option<PartialClashConfig>,
}

impl PartialNormalizationConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(mut self, args: &NormalizeArgs) -> Result<core_config::NormalizationConfig> {
        self.apply_set_values(&args.set_values)?;

        let clash_file = self.clash.take().unwrap_or_default();
        let clash_defaults = core_config::ClashParams::default();
        let clash = core_config::ClashParams {
            distance_threshold: args
                .clash_distance
                .or(clash_file.distance_threshold)
                .unwrap_or(clash_defaults.distance_threshold),
            overlap_fraction: args
                .clash_overlap
                .or(clash_file.overlap_fraction)
                .unwrap_or(clash_defaults.overlap_fraction),
        };

        let superpose = if args.no_superpose {
            false
        } else {
            self.superpose.unwrap_or(true)
        };

        let output_mode = if args.in_memory {
            core_config::OutputMode::InMemoryOnly
        } else {
            core_config::OutputMode::Persist
        };

        core_config::NormalizationConfig::builder()
            .output_mode(output_mode)
            .clash_params(clash)
            .superpose(superpose)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        if set_values.is_empty() {
            return Ok(());
        }
        for kv_pair in set_values {
            let parts: Vec<_> = kv_pair.splitn(2, '=').collect();
            if parts.len() != 2 {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            }
            let key = parts[0];
            let value_str = parts[1];

            match key {
                "superpose" => {
                    self.superpose = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!("Invalid bool value for {}: {}", key, value_str))
                    })?);
                }
                "clash.distance-threshold" => {
                    self.clash
                        .get_or_insert_with(Default::default)
                        .distance_threshold = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                    })?);
                }
                "clash.overlap-fraction" => {
                    self.clash
                        .get_or_insert_with(Default::default)
                        .overlap_fraction = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                    })?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_config_file(dir: &Path, content: &str) -> PathBuf {
        let file_path = dir.join("config.toml");
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn parse_normalize_args(extra: &[&str]) -> NormalizeArgs {
        let mut args = vec![
            "foldnorm",
            "normalize",
            "-t",
            "af3",
            "-i",
            "input_dir",
            "-o",
            "output_dir",
        ];
        args.extend_from_slice(extra);
        let cli = Cli::parse_from(args);
        let Commands::Normalize(normalize_args) = cli.command;
        normalize_args
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempdir().unwrap();
        let config_path = write_config_file(
            dir.path(),
            r#"
            [clash]
            distance-threshold = 4.0
            "#,
        );

        let args = parse_normalize_args(&[]);
        let config = PartialNormalizationConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();

        assert_eq!(config.clash.distance_threshold, 4.0);
        assert_eq!(config.clash.overlap_fraction, 0.63);
        assert!(config.superpose);
        assert_eq!(config.output_mode, core_config::OutputMode::Persist);
    }

    #[test]
    fn cli_args_override_file_values() {
        let dir = tempdir().unwrap();
        let config_path = write_config_file(
            dir.path(),
            r#"
            superpose = true

            [clash]
            overlap-fraction = 0.5
            "#,
        );

        let args = parse_normalize_args(&["--clash-overlap", "0.7", "--in-memory", "--no-superpose"]);
        let config = PartialNormalizationConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();

        assert_eq!(config.clash.overlap_fraction, 0.7);
        assert!(!config.superpose);
        assert_eq!(config.output_mode, core_config::OutputMode::InMemoryOnly);
    }

    #[test]
    fn set_values_override_file_values() {
        let dir = tempdir().unwrap();
        let config_path = write_config_file(
            dir.path(),
            r#"
            [clash]
            overlap-fraction = 0.5
            "#,
        );

        let args = parse_normalize_args(&[
            "-S",
            "clash.overlap-fraction=0.8",
            "-S",
            "superpose=false",
        ]);
        let config = PartialNormalizationConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();

        assert_eq!(config.clash.overlap_fraction, 0.8);
        assert!(!config.superpose);
    }

    #[test]
    fn unknown_set_key_is_an_error() {
        let args = parse_normalize_args(&["-S", "clash.radius=1.0"]);
        let result = PartialNormalizationConfig::default().merge_with_cli(&args);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_file_field_is_an_error() {
        let dir = tempdir().unwrap();
        let config_path = write_config_file(dir.path(), "radius = 1.0\n");
        let result = PartialNormalizationConfig::from_file(&config_path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
