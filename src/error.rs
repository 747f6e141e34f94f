//! Error types shared across the crate.

use thiserror::Error;

/// Failures reported by a signal source.
///
/// None of these ever stop the frame loop; the driver falls back to the idle
/// pattern and reports the error to whoever asked for the source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Capture request was rejected. The source stays inactive until the
    /// user explicitly asks again.
    #[error("microphone access denied")]
    PermissionDenied,

    /// Nothing to connect (no media loaded, no device present)
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The analysis tap could not be set up
    #[error("analysis setup failed: {0}")]
    AnalysisSetup(String),

    /// The audio stream could not be built or started
    #[error("audio stream error: {0}")]
    Stream(String),

    /// The media file could not be read
    #[error("failed to decode media: {0}")]
    Decode(String),
}

impl From<hound::Error> for SourceError {
    fn from(err: hound::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<ConfigError> for SourceError {
    fn from(err: ConfigError) -> Self {
        Self::AnalysisSetup(err.to_string())
    }
}

/// Invalid analysis configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("window size must be a power of 2, got {0}")]
    WindowNotPowerOfTwo(usize),

    #[error("window size must be within 32..=32768, got {0}")]
    WindowOutOfRange(usize),

    #[error("smoothing time constant must be within [0, 1], got {0}")]
    SmoothingOutOfRange(f32),

    #[error("min_decibels ({min}) must be below max_decibels ({max})")]
    DecibelRange { min: f32, max: f32 },
}

/// GPU presentation failures
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found")]
    Adapter,

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("failed to save frame: {0}")]
    Capture(#[from] image::ImageError),
}
