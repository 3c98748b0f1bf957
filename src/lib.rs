//! Boxseed: bootstrap an object-detection dataset from raw images.
//!
//! Given a directory of unlabeled images, boxseed proposes candidate object
//! regions with a classic edge/contour pass (no trained model), writes them
//! as normalized YOLO-style label files split into train and val, exports a
//! crop of every region for human review, and emits a `dataset.yaml`
//! manifest for the trainer.
//!
//! Every region receives its own placeholder label ID. The resulting label
//! space is one class per instance, to be collapsed into real categories by
//! whoever reviews the crops.
//!
//! # Modules
//!
//! - [`ir`]: records, regions, label IDs and the label map
//! - [`corpus`]: image enumeration and shuffling
//! - [`propose`]: edge/contour region proposals
//! - [`crops`]: crop export for review
//! - [`encode`]: normalized annotations and label allocation
//! - [`split`]: train/val routing and the on-disk layout
//! - [`manifest`]: the dataset descriptor
//! - [`pipeline`]: the end-to-end build
//! - [`check`]: consistency checks over a built dataset
//! - [`config`]: pipeline settings
//! - [`error`]: error types

pub mod check;
pub mod config;
pub mod corpus;
pub mod crops;
pub mod encode;
pub mod error;
pub mod ir;
pub mod manifest;
pub mod pipeline;
pub mod propose;
pub mod split;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub use error::BoxseedError;

use config::{load_config, validate_proposer_config, PipelineConfig};
use propose::{decode_image, EdgeContourProposer, RegionProposer};

/// The boxseed CLI application.
#[derive(Parser)]
#[command(name = "boxseed")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Only log warnings and errors (RUST_LOG still takes precedence).
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build a dataset from a directory of raw images.
    Build(BuildArgs),
    /// Print the regions proposed for a single image.
    Propose(ProposeArgs),
    /// Check a built dataset for consistency.
    Check(CheckArgs),
}

/// Arguments for the build subcommand.
#[derive(clap::Args)]
struct BuildArgs {
    /// Directory containing the raw images.
    source: PathBuf,

    /// Dataset root to write into.
    #[arg(short, long)]
    output: PathBuf,

    /// YAML file with pipeline settings; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the shuffle (unseeded runs split differently every time).
    #[arg(long)]
    seed: Option<u64>,

    /// Fraction of images assigned to training.
    #[arg(long)]
    split_ratio: Option<f64>,

    /// Regions must be larger than this many pixels on both sides.
    #[arg(long)]
    min_size: Option<u32>,

    /// Edge detector low threshold.
    #[arg(long)]
    low_threshold: Option<f32>,

    /// Edge detector high threshold.
    #[arg(long)]
    high_threshold: Option<f32>,

    /// Name of the crop-review directory under the dataset root.
    #[arg(long)]
    crops_dir: Option<String>,

    /// File name of the manifest under the dataset root.
    #[arg(long)]
    manifest_name: Option<String>,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    report: String,
}

/// Arguments for the propose subcommand.
#[derive(clap::Args)]
struct ProposeArgs {
    /// Image to run the proposer on.
    image: PathBuf,

    /// Regions must be larger than this many pixels on both sides.
    #[arg(long, default_value_t = config::DEFAULT_MIN_SIZE)]
    min_size: u32,

    /// Edge detector low threshold.
    #[arg(long, default_value_t = config::DEFAULT_LOW_THRESHOLD)]
    low_threshold: f32,

    /// Edge detector high threshold.
    #[arg(long, default_value_t = config::DEFAULT_HIGH_THRESHOLD)]
    high_threshold: f32,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the check subcommand.
#[derive(clap::Args)]
struct CheckArgs {
    /// Dataset root produced by `build`.
    root: PathBuf,

    /// Name of the crop-review directory under the dataset root.
    #[arg(long, default_value = config::DEFAULT_CROPS_DIR)]
    crops_dir: String,

    /// File name of the manifest under the dataset root.
    #[arg(long, default_value = config::DEFAULT_MANIFEST_NAME)]
    manifest_name: String,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the boxseed CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), BoxseedError> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match cli.command {
        Some(Commands::Build(args)) => run_build(args),
        Some(Commands::Propose(args)) => run_propose(args),
        Some(Commands::Check(args)) => run_check(args),
        None => {
            println!("boxseed {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Bootstrap an object-detection dataset from raw images.");
            println!();
            println!("Run 'boxseed --help' for usage information.");
            Ok(())
        }
    }
}

// Logs go to stderr; stdout carries reports only.
fn init_tracing(quiet: bool) {
    let default_level = if quiet { "boxseed=warn" } else { "boxseed=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(env_filter)
        .try_init();
}

fn ensure_output_format(format: &str) -> Result<(), BoxseedError> {
    match format {
        "text" | "json" => Ok(()),
        other => Err(BoxseedError::UnsupportedFormat(format!(
            "'{}' (supported: text, json)",
            other
        ))),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, BoxseedError> {
    serde_json::to_string_pretty(value).map_err(BoxseedError::ReportSerialize)
}

/// Execute the build subcommand.
fn run_build(args: BuildArgs) -> Result<(), BoxseedError> {
    ensure_output_format(&args.report)?;

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(ratio) = args.split_ratio {
        config.split_ratio = ratio;
    }
    if let Some(min_size) = args.min_size {
        config.proposer.min_size = min_size;
    }
    if let Some(low) = args.low_threshold {
        config.proposer.low_threshold = low;
    }
    if let Some(high) = args.high_threshold {
        config.proposer.high_threshold = high;
    }
    if let Some(crops_dir) = args.crops_dir {
        config.crops_dir = crops_dir;
    }
    if let Some(manifest_name) = args.manifest_name {
        config.manifest_name = manifest_name;
    }

    let proposer = EdgeContourProposer::new(config.proposer.clone());
    let report = pipeline::run_pipeline(&args.source, &args.output, &config, &proposer)?;

    match args.report.as_str() {
        "json" => println!("{}", to_json(&report)?),
        _ => print!("{}", report),
    }

    Ok(())
}

/// Execute the propose subcommand.
fn run_propose(args: ProposeArgs) -> Result<(), BoxseedError> {
    ensure_output_format(&args.output)?;

    let proposer_config = config::ProposerConfig {
        low_threshold: args.low_threshold,
        high_threshold: args.high_threshold,
        min_size: args.min_size,
    };
    validate_proposer_config(&proposer_config)?;

    let image = decode_image(&args.image)?;
    let regions = EdgeContourProposer::new(proposer_config).propose(&image);

    match args.output.as_str() {
        "json" => println!("{}", to_json(&regions)?),
        _ => {
            println!("{} region(s) in {}", regions.len(), args.image.display());
            for (idx, region) in regions.iter().enumerate() {
                println!("  {}: {}", idx + 1, region);
            }
        }
    }

    Ok(())
}

/// Execute the check subcommand.
fn run_check(args: CheckArgs) -> Result<(), BoxseedError> {
    ensure_output_format(&args.output)?;

    let opts = check::CheckOptions {
        crops_dir: args.crops_dir,
        manifest_name: args.manifest_name,
        strict: args.strict,
    };
    let report = check::check_dataset(&args.root, &opts)?;

    match args.output.as_str() {
        "json" => println!("{}", to_json(&report)?),
        _ => print!("{}", report),
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (opts.strict && has_warnings) {
        Err(BoxseedError::CheckFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}
