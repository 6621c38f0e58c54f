//! # sockpair-rs
//!
//! Turns sock-pairing suggestions from an analysis service into an overlay
//! drawn over the photo they came from.
//!
//! ## Features
//!
//! - **Coordinate Scaling**: Map boxes on the 0-1000 grid onto the photo's displayed size
//! - **Dimension Tracking**: Follow the rendered size of the photo across loads and resizes
//! - **Overlay Rendering**: Connector lines, translucent boxes and numbered markers per pair, as SVG
//! - **Camera Capture**: Acquire a rear-facing stream, snapshot it as JPEG and always release it
//! - **Analysis Sessions**: One photo, one request in flight, stale answers dropped
//! - **Reports**: A markdown summary numbered like the overlay
//!
//! ## Quick Start
//!
//! ```ignore
//! use sockpair_rs::prelude::*;
//!
//! let session = AnalysisSession::new(Arc::new(HttpAnalysisEngine::new(DEFAULT_ENDPOINT, timeout)?));
//! session.set_image(ImageData::from_path("socks.jpg")?);
//! session.analyze().await;
//!
//! let scene = session.overlay(Dimensions::new(800.0, 600.0));
//! println!("{}", scene.to_svg());
//! ```

pub mod capture;
pub mod config;
pub mod coordinates;
pub mod dimension_tracker;
pub mod logging;
pub mod overlay;
pub mod palette;
pub mod report;
pub mod session;

// Re-export commonly used types at the root level
pub use capture::{
    CameraBackend, CameraConstraints, CaptureDeviceManager, CaptureError, CaptureState, DeviceError,
    FrameSourceCamera, HeadlessPreview, MediaStream, MediaTrack, PreviewSurface,
};
pub use config::Config;
pub use coordinates::{center, scale_box, Dimensions, Point, ScaledBox};
pub use dimension_tracker::{DimensionTracker, DisplaySurface, ResizeEvents, ResizeSubscription, ResponsiveImage};
pub use overlay::{compose_annotated_svg, OverlayRenderer, OverlayScene, PairLayer};
pub use palette::{apply_color_policy, ColorPolicy};
pub use report::{render_report, ReportOptions};
pub use session::{AnalysisSession, AnalyzeOutcome, SessionState};

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```ignore
/// use sockpair_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        apply_color_policy, center, compose_annotated_svg, render_report, scale_box, AnalysisSession,
        AnalyzeOutcome, CaptureDeviceManager, CaptureState, ColorPolicy, Config, DeviceError, DimensionTracker,
        Dimensions, FrameSourceCamera, HeadlessPreview, OverlayRenderer, OverlayScene, Point, ReportOptions,
        ResizeEvents, ResponsiveImage, ScaledBox, SessionState,
    };
    pub use sockpair_vision::{
        AnalysisEngine, AnalysisError, AnalysisResult, Confidence, HttpAnalysisEngine, ImageData, NormalizedBox,
        SockPair, DEFAULT_ENDPOINT,
    };
}
