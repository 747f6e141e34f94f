//! Audio sources and per-frame spectral sampling.
//!
//! Sources push their signal into an analysis tap from the audio thread;
//! the frame loop samples the tap once per frame through a
//! `SpectralSampler`.

mod capture;
mod fft;
mod media;
mod sampler;
mod source;
mod tap;

// Re-export public types
pub use capture::CaptureSource;
pub use fft::{blackman_window, time_domain_bytes, Analyser};
pub use media::{DecodedMedia, MediaSource};
pub use sampler::{SampleBuffer, SampleDomain, SpectralSampler};
pub use source::{format_time, SignalSource, SourceKind};
pub use tap::{AnalysisHandle, AnalysisTap};
