//! Parameter definitions with units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Units (pixels, seconds, radians, percent)
//! - Documented ranges and meanings

mod audio;
mod render;
mod visual;

// Re-export all types
pub use audio::{AnalysisConfig, CAPTURE_WINDOW_SIZE, MEDIA_WINDOW_SIZE};
pub use render::{RecordingConfig, RenderConfig};
pub use visual::{BarsParams, CircularParams, IdleParams, WaveformParams};
