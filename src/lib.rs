//! voc2tfrecord: Pascal VOC annotations to TFRecord.
//!
//! Reads a directory of VOC XML files and a TensorFlow Object Detection API
//! label map, and writes one `tf.train.Example` per image into a TFRecord
//! file for training pipelines.
//!
//! # Modules
//!
//! - [`label_map`]: `.pbtxt` label map parsing
//! - [`ir`]: annotation model and the VOC XML reader
//! - [`tfrecord`]: record encoding and container framing
//! - [`conversion`]: the pipeline driver and its report
//! - [`config`]: run configuration
//! - [`error`]: error types

pub mod config;
pub mod conversion;
pub mod error;
pub mod ir;
pub mod label_map;
pub mod tfrecord;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

pub use config::ConvertConfig;
pub use error::ConvertError;

use ir::io_voc_xml::GroupingPolicy;

/// The voc2tfrecord CLI application.
#[derive(Parser)]
#[command(name = "voc2tfrecord")]
#[command(version, about)]
struct Cli {
    /// Directory containing the VOC XML annotation files.
    #[arg(short = 'x', long = "xml-dir", env = "VOC2TFRECORD_XML_DIR")]
    xml_dir: PathBuf,

    /// Label map file (.pbtxt).
    #[arg(short = 'l', long = "labels", env = "VOC2TFRECORD_LABELS")]
    labels: PathBuf,

    /// Output TFRecord file.
    #[arg(short = 'o', long = "output", env = "VOC2TFRECORD_OUTPUT")]
    output: PathBuf,

    /// Directory to read images from (defaults to the XML directory).
    #[arg(long)]
    image_dir: Option<PathBuf>,

    /// How to combine annotation files that name the same image.
    #[arg(long, value_enum, default_value_t = PolicyArg::Union)]
    policy: PolicyArg,

    /// Abort on malformed annotation files instead of skipping them.
    #[arg(long)]
    strict: bool,

    /// Output format for the summary report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,

    /// Log debug details.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    /// Merge objects from every file naming the image.
    Union,
    /// Keep only the first file naming the image.
    FirstFile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

impl PolicyArg {
    fn policy(self) -> GroupingPolicy {
        match self {
            PolicyArg::Union => GroupingPolicy::Union,
            PolicyArg::FirstFile => GroupingPolicy::FirstFile,
        }
    }
}

impl Cli {
    fn config(&self) -> ConvertConfig {
        let mut config = ConvertConfig::new(&self.xml_dir, &self.labels, &self.output);
        config.image_dir = self.image_dir.clone();
        config.policy = self.policy.policy();
        config.strict = self.strict;
        config
    }
}

/// Run the voc2tfrecord CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), ConvertError> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = cli.config();
    let report = conversion::convert(&config)?;

    match cli.report {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => print!("{}", report),
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        LevelFilter::DEBUG
    } else if cli.quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    // Already installed when the library is driven more than once in-process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
