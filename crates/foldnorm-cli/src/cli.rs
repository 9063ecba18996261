use clap::{Args, Parser, Subcommand};
use foldnorm::engine::adapters::Tool;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "FoldNorm CLI - A command-line interface for normalizing structure prediction output from AlphaFold3, Boltz, and Chai-1 into a common, canonical form.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize one prediction tool's output directory into canonical artifacts.
    Normalize(NormalizeArgs),
}

/// Arguments for the `normalize` subcommand.
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    // --- Core Arguments ---
    /// The tool that produced the output (alphafold3, boltz, or chai-1).
    #[arg(short, long, required = true, value_name = "TOOL")]
    pub tool: Tool,

    /// Path to the tool's output directory.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub input: PathBuf,

    /// Directory for the normalized artifacts.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Path to the complex description JSON the prediction job was submitted
    /// with. Without it chains keep their tool-assigned labels and types.
    #[arg(long, value_name = "PATH")]
    pub input_json: Option<PathBuf>,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Run Overrides ---
    /// Keep results in memory instead of writing artifacts to the output directory.
    #[arg(long)]
    pub in_memory: bool,

    /// Disable superposing sibling models onto the first model.
    #[arg(long)]
    pub no_superpose: bool,

    /// The seed the prediction was run with, used in Boltz model names.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    // --- Clash Detection Overrides ---
    /// Override the clash search distance threshold in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub clash_distance: Option<f64>,

    /// Override the van der Waals overlap fraction that counts as a clash.
    #[arg(long, value_name = "FLOAT")]
    pub clash_overlap: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S clash.overlap-fraction=0.7
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
