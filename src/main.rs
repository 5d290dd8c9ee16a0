// main.rs - CLI entry point

use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use aligntree::cli::Config;
use aligntree::get_info;
use aligntree::prelude::*;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_from_env("ALIGNTREE_LOG"))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Rows to cluster: an alignment, a precomputed matrix, or both
struct Inputs {
    alignment: Option<Alignment>,
    precomputed: Option<LabeledMatrix>,
}

impl Inputs {
    fn labels(&self) -> Vec<String> {
        match (&self.alignment, &self.precomputed) {
            (Some(alignment), _) => alignment.names().to_vec(),
            (None, Some(loaded)) => loaded.labels.clone(),
            (None, None) => Vec::new(),
        }
    }
}

fn load_inputs(args: &Args, validation: &ValidationResult) -> Result<Inputs> {
    let alignment = match &args.alignment {
        Some(path) => {
            let mut alignment = Alignment::from_fasta(Path::new(path))?;
            if validation.has_row_filters() {
                alignment.filter_rows(
                    validation.row_include_regex.as_ref(),
                    validation.row_exclude_regex.as_ref(),
                    validation.rows_include_set.as_ref(),
                    validation.rows_exclude_set.as_ref(),
                );
            }
            Some(alignment)
        }
        None => None,
    };

    let precomputed = match &args.matrix {
        Some(path) => Some(load_matrix(Path::new(path), args.matrix_input_format.as_deref())?),
        None => None,
    };

    if let (Some(alignment), Some(loaded)) = (&alignment, &precomputed) {
        if alignment.names() != loaded.labels.as_slice() {
            return Err(TreeError::Configuration(
                "precomputed matrix labels do not match the alignment rows in order".to_string(),
            ));
        }
    }

    Ok(Inputs {
        alignment,
        precomputed,
    })
}

fn distance_matrix(args: &Args, validation: &ValidationResult, inputs: Inputs) -> Result<DistanceMatrix> {
    match (inputs.alignment, inputs.precomputed) {
        (Some(alignment), Some(loaded)) => {
            let calculator = PrecomputedDistance::new(loaded.matrix);
            info!("Distance source: {}", calculator.name());
            calculator.compute_matrix(&alignment)
        }
        (Some(alignment), None) => {
            let calculator = PairwiseDistance::new(validation.model)
                .with_saturation(args.saturation)
                .with_progress(args.progress);
            info!("Distance source: {} ({})", calculator.name(), validation.model.description());
            calculator.compute_matrix(&alignment)
        }
        (None, Some(loaded)) => Ok(loaded.matrix),
        (None, None) => Err(TreeError::Configuration(
            "either --alignment or --matrix is required".to_string(),
        )),
    }
}

fn run_main() -> Result<()> {
    let mut args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        println!("{}", Config::generate_sample());
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    init_logging(args.verbose);
    info!("🚀 {}", get_info());
    if let Some(config_path) = &args.config {
        info!("📄 Configuration merged from: {}", config_path);
    }

    let validation = validate_args(&args)?;
    if args.output.is_none() && !args.dry_run {
        return Err(TreeError::Configuration("--output is required".to_string()));
    }
    if args.model != "clustal" && args.alignment.is_none() {
        warn!("--model has no effect on a precomputed matrix");
    }

    let total_start = Instant::now();
    let inputs = load_inputs(&args, &validation)?;
    let labels = inputs.labels();
    info!("🌳 Method: {} | Rows: {}", validation.method, labels.len());

    if args.dry_run {
        info!("✅ Dry run completed successfully");
        return Ok(());
    }

    let matrix = distance_matrix(&args, &validation, inputs)?;

    if let Some(matrix_output) = &args.matrix_output {
        write_matrix(
            Path::new(matrix_output),
            validation.matrix_format,
            &labels,
            &matrix,
            &command_line,
        )?;
    }

    let (mut tree, report) = cluster_matrix(matrix, validation.method)?;
    tree.set_leaf_labels(&labels)?;

    if let Some(output) = &args.output {
        write_tree(
            Path::new(output),
            validation.tree_format,
            &tree,
            &report,
            &validation.method.to_string(),
        )?;
    }
    if let Some(merge_log) = &args.merge_log {
        write_merge_log(Path::new(merge_log), &report)?;
    }

    info!(
        "✅ Completed {} merges in {:.2}s",
        report.steps.len(),
        total_start.elapsed().as_secs_f64()
    );
    Ok(())
}
