use crate::cli::NormalizeArgs;
use crate::config::PartialNormalizationConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use foldnorm::{
    core::input::descriptor::ComplexDescriptor,
    engine::adapters::{Alphafold3Adapter, BoltzAdapter, Chai1Adapter, Tool, ToolAdapter},
    engine::config::NormalizationConfig,
    engine::progress::ProgressReporter,
    engine::tasks::confidence,
    workflows::normalize::{self, NormalizationReport},
};
use tracing::{info, warn};

pub fn run(args: NormalizeArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialNormalizationConfig::from_file(path)?,
        None => PartialNormalizationConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_with_cli(&args)?;

    let descriptor = match &args.input_json {
        Some(path) => {
            info!("Loading complex description from {:?}", path);
            Some(
                ComplexDescriptor::from_path(path).map_err(|e| CliError::FileParsing {
                    path: path.clone(),
                    source: e.into(),
                })?,
            )
        }
        None => {
            warn!("No complex description given; chains keep their tool-assigned labels.");
            None
        }
    };

    println!(
        "Normalizing {} output from {}...",
        args.tool,
        args.input.display()
    );
    info!("Invoking the core normalization workflow...");

    let report = match args.tool {
        Tool::Alphafold3 => dispatch(&Alphafold3Adapter, &args, descriptor.as_ref(), &final_config)?,
        Tool::Boltz => dispatch(
            &BoltzAdapter::new(args.seed),
            &args,
            descriptor.as_ref(),
            &final_config,
        )?,
        Tool::Chai1 => dispatch(&Chai1Adapter, &args, descriptor.as_ref(), &final_config)?,
    };

    info!(
        "Workflow finished, normalized {} model(s), {} failed.",
        report.models.len(),
        report.failed.len()
    );
    print_summary(&report);

    Ok(())
}

fn dispatch<A: ToolAdapter + Sync>(
    adapter: &A,
    args: &NormalizeArgs,
    descriptor: Option<&ComplexDescriptor>,
    config: &NormalizationConfig,
) -> Result<NormalizationReport> {
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    normalize::run(
        adapter,
        &args.input,
        &args.output,
        descriptor,
        config,
        &reporter,
    )
    .map_err(CliError::Core)
}

fn print_summary(report: &NormalizationReport) {
    if report.models.is_empty() {
        println!("Warning: no models were successfully normalized.");
    } else {
        println!("✓ Normalized {} model(s).", report.models.len());
        for model in &report.models {
            let mean_plddt = confidence::average(&model.structure);
            let clashes = match model.clashes.residue_clash_count() {
                0 => String::from("no clashes"),
                n => format!("{} clashing residue pair(s)", n),
            };
            match &model.output {
                Some(paths) => println!(
                    "  {} (mean pLDDT {:.1}, {}) written to: {}",
                    model.model.name,
                    mean_plddt,
                    clashes,
                    paths.structure.display()
                ),
                None => println!(
                    "  {} (mean pLDDT {:.1}, {})",
                    model.model.name, mean_plddt, clashes
                ),
            }
        }
    }

    if !report.failed.is_empty() {
        println!("✗ {} model(s) failed:", report.failed.len());
        for (name, error) in &report.failed {
            println!("  {}: {}", name, error);
        }
    }
}
