mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Args, Commands, OutputArgs};
use log::info;
use std::path::Path;
use std::sync::Arc;

use sockpair_rs::capture::{CaptureDeviceManager, CaptureState, FrameSourceCamera, HeadlessPreview};
use sockpair_rs::config::Config;
use sockpair_rs::coordinates::Dimensions;
use sockpair_rs::dimension_tracker::{DimensionTracker, ResizeEvents, ResponsiveImage};
use sockpair_rs::overlay::{compose_annotated_svg, OverlayRenderer};
use sockpair_rs::palette::apply_color_policy;
use sockpair_rs::report::{render_report, ReportOptions};
use sockpair_rs::session::AnalysisSession;
use sockpair_vision::{AnalysisResult, HttpAnalysisEngine, ImageData};

#[tokio::main]
async fn main() {
  let args = Args::parse();
  sockpair_rs::logging::init(args.verbose);

  if let Err(e) = run(args).await {
    eprintln!("Error: {:#}", e);
    std::process::exit(1);
  }
}

async fn run(args: Args) -> Result<()> {
  let config = Config::load(&args.config)?;

  match args.command {
    Commands::Version => {
      println!("sockpair {}", env!("CARGO_PKG_VERSION"));
      Ok(())
    }
    Commands::Analyze {
      image,
      endpoint,
      json,
      output,
    } => analyze(&config, &image, endpoint, json.as_deref(), &output).await,
    Commands::Render {
      result,
      image,
      output,
    } => {
      let contents = std::fs::read_to_string(&result)
        .with_context(|| format!("Failed to read {}", result.display()))?;
      let parsed: AnalysisResult = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse analysis result {}", result.display()))?;
      let photo = ImageData::from_path(&image)?;
      let dims = display_dimensions(&image, output.width.or(config.display_width))?;
      write_outputs(&config, &photo, dims, &parsed, &output)
    }
    Commands::Capture { frame, out } => capture(&frame, &out).await,
  }
}

async fn analyze(
  config: &Config,
  image: &Path,
  endpoint: Option<String>,
  json: Option<&Path>,
  output: &OutputArgs,
) -> Result<()> {
  let photo = ImageData::from_path(image)?;
  photo.validate()?;
  let dims = display_dimensions(image, output.width.or(config.display_width))?;

  let endpoint = endpoint.unwrap_or_else(|| config.endpoint.clone());
  let engine = HttpAnalysisEngine::new(endpoint, config.timeout())?;
  let session = AnalysisSession::new(Arc::new(engine));
  session.set_image(photo.clone());
  session.analyze().await;

  let state = session.state();
  if let Some(error) = state.error {
    bail!(error);
  }
  let Some(result) = state.result else {
    bail!("analysis produced no result");
  };

  if let Some(path) = json {
    let serialized = serde_json::to_string_pretty(&result)?;
    std::fs::write(path, serialized)
      .with_context(|| format!("Failed to write {}", path.display()))?;
  }
  write_outputs(config, &photo, dims, &result, output)
}

/// Lays the photo out the way the viewer would and reads back its size.
fn display_dimensions(image: &Path, width: Option<u32>) -> Result<Dimensions> {
  let (natural_width, natural_height) = image::image_dimensions(image)
    .with_context(|| format!("Failed to read image size of {}", image.display()))?;
  let surface = Arc::new(ResponsiveImage::new(
    natural_width,
    natural_height,
    width.unwrap_or(natural_width) as f64,
  ));
  let events = ResizeEvents::new();
  let mut tracker = DimensionTracker::attach(surface.clone(), &events);
  surface.mark_loaded();
  tracker.on_load();
  let dims = tracker.dimensions();
  tracker.detach();
  Ok(dims)
}

fn write_outputs(
  config: &Config,
  photo: &ImageData,
  dims: Dimensions,
  result: &AnalysisResult,
  output: &OutputArgs,
) -> Result<()> {
  let policy = output.colors.map(Into::into).unwrap_or(config.color_policy);
  let result = apply_color_policy(result, policy);
  let malformed = result.malformed_pair_count();
  if malformed > 0 {
    log::warn!("{} pair(s) have out-of-range or inverted boxes", malformed);
  }

  for (index, pair) in result.pairs.iter().enumerate() {
    println!(
      "{}. {} [{}] {}",
      index + 1,
      pair.title,
      pair.confidence.label(),
      pair.highlight_color
    );
  }
  println!("Found {} pair(s)", result.pairs.len());

  if let Some(path) = &output.svg {
    let scene = OverlayRenderer::render(&result.pairs, dims);
    std::fs::write(path, compose_annotated_svg(photo, dims, &scene))
      .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("wrote overlay to {}", path.display());
  }
  if let Some(path) = &output.report {
    std::fs::write(path, render_report(&result, &ReportOptions::default()))
      .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("wrote report to {}", path.display());
  }
  Ok(())
}

async fn capture(frame: &Path, out: &Path) -> Result<()> {
  let camera = FrameSourceCamera::from_image_file(frame)
    .with_context(|| format!("Failed to load camera frame {}", frame.display()))?;
  let manager = CaptureDeviceManager::new(Arc::new(camera), Box::new(HeadlessPreview::new()));

  if let CaptureState::Denied(e) = manager.open().await {
    bail!(e.user_message());
  }
  let snapshot = manager.capture_photo()?;
  manager.stop_camera();

  let Some(snapshot) = snapshot else {
    bail!("the camera has not produced a frame yet");
  };
  std::fs::write(out, snapshot.decode()?)
    .with_context(|| format!("Failed to write {}", out.display()))?;
  println!("Captured snapshot to {}", out.display());
  Ok(())
}
