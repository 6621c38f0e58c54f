//! Command line arguments backing the `sockpair` binary.
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use sockpair_rs::palette::ColorPolicy;

#[derive(Parser, Debug)]
#[command(
  name = "sockpair",
  about = "Suggest sock pairs from a photo and draw them over the image",
  version
)]
pub struct Args {
  /// Log debug output
  #[arg(long, short = 'v', global = true)]
  pub verbose: bool,

  /// Path to the JSON config file
  #[arg(long, short = 'c', global = true, default_value = sockpair_rs::config::DEFAULT_CONFIG_FILE)]
  pub config: PathBuf,

  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorArg {
  Service,
  Deterministic,
}

impl From<ColorArg> for ColorPolicy {
  fn from(arg: ColorArg) -> Self {
    match arg {
      ColorArg::Service => ColorPolicy::Service,
      ColorArg::Deterministic => ColorPolicy::Deterministic,
    }
  }
}

/// Where rendered artifacts go.
#[derive(clap::Args, Debug, Clone)]
pub struct OutputArgs {
  /// Width the photo is displayed at (defaults to its natural width)
  #[arg(long, short = 'w')]
  pub width: Option<u32>,

  /// Write the annotated photo as SVG
  #[arg(long)]
  pub svg: Option<PathBuf>,

  /// Write a markdown report of the suggested pairs
  #[arg(long)]
  pub report: Option<PathBuf>,

  /// Override where pair colours come from
  #[arg(long, value_enum)]
  pub colors: Option<ColorArg>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Print version information
  Version,
  /// Send a photo to the analysis service and visualise the suggested pairs
  Analyze {
    /// Photo of the socks (JPEG, PNG or WebP)
    image: PathBuf,

    /// Analysis endpoint URL
    #[arg(long, short = 'e')]
    endpoint: Option<String>,

    /// Save the raw analysis result as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,
  },
  /// Draw a previously saved analysis result over its photo
  Render {
    /// Analysis result JSON
    result: PathBuf,

    /// The photo the result belongs to
    #[arg(long, short = 'i')]
    image: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
  },
  /// Take a snapshot through the capture pipeline, using an image file as the camera
  Capture {
    /// Image served as the camera's live frame
    frame: PathBuf,

    /// Where to write the JPEG snapshot
    #[arg(long, short = 'o')]
    out: PathBuf,
  },
}
