//! The currently active audio producer.

use super::tap::AnalysisHandle;
use crate::error::SourceError;
use crate::params::AnalysisConfig;

/// Which kind of producer sits behind a `SignalSource`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Decoded media file played to the output device
    Media,
    /// Live input device, never routed to the speakers
    Capture,
}

/// Uniform sampling interface over decoded media and live capture.
///
/// At most one source is connected to analysis at any instant; the driver
/// disconnects the previous one before connecting the next.
pub trait SignalSource {
    fn kind(&self) -> SourceKind;

    /// Human-readable name for status lines
    fn label(&self) -> &str;

    /// True once a stream exists and is connected to analysis
    fn is_active(&self) -> bool;

    /// True between a successful start and an explicit stop/pause
    fn is_running(&self) -> bool;

    /// Analysis settings this source is meant to be sampled with
    fn analysis_config(&self) -> AnalysisConfig;

    /// Tap this source's signal. Connecting again replaces the old handle.
    fn connect_analysis(&mut self, config: AnalysisConfig)
        -> Result<AnalysisHandle, SourceError>;

    /// Tear down the analysis connection and release the stream
    fn disconnect(&mut self);

    /// Start playback/capture
    fn start(&mut self) -> Result<(), SourceError>;

    /// Pause playback or stop capture
    fn stop(&mut self);

    /// Move the playhead by `delta_secs` (media only)
    fn seek_by(&mut self, _delta_secs: f32) {}

    /// `(position, duration)` in seconds for sources with a timeline
    fn timeline(&self) -> Option<(f32, f32)> {
        None
    }
}

/// Format seconds as `M:SS`
pub fn format_time(seconds: f32) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
