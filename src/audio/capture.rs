//! Live input capture feeding analysis only.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::FromSample;
use log::{debug, error, info, warn};

use super::source::{SignalSource, SourceKind};
use super::tap::{AnalysisHandle, AnalysisTap};
use crate::error::SourceError;
use crate::params::AnalysisConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Closed,
    Open,
    /// Access was refused once; this instance never asks again
    Denied,
}

/// Default input device, tapped for analysis and never played back
pub struct CaptureSource {
    state: CaptureState,
    label: String,
    handle: Option<AnalysisHandle>,
    stream: Option<cpal::Stream>,
    running: bool,
}

impl Default for CaptureSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Closed,
            label: "Microphone".to_string(),
            handle: None,
            stream: None,
            running: false,
        }
    }

    pub fn is_denied(&self) -> bool {
        self.state == CaptureState::Denied
    }

    fn open(&mut self, handle: &AnalysisHandle) -> Result<cpal::Stream, SourceError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(SourceError::PermissionDenied)?;

        let config = device.default_input_config().map_err(classify_open_error)?;
        let channels = config.channels() as usize;
        let sample_format = config.sample_format();

        if let Ok(name) = device.name() {
            self.label = name;
        }
        info!(
            "Audio in: {} @ {}Hz ({:?})",
            self.label,
            config.sample_rate().0,
            sample_format
        );

        let stream_config: cpal::StreamConfig = config.into();
        let tap = handle.tap();
        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_input::<f32>(&device, &stream_config, tap, channels)?
            }
            cpal::SampleFormat::I16 => {
                build_input::<i16>(&device, &stream_config, tap, channels)?
            }
            cpal::SampleFormat::U16 => {
                build_input::<u16>(&device, &stream_config, tap, channels)?
            }
            other => {
                return Err(SourceError::Stream(format!(
                    "unsupported input sample format {:?}",
                    other
                )))
            }
        };

        stream.play().map_err(classify_open_error)?;
        Ok(stream)
    }
}

/// Input stream for sample type `T`, normalised to f32 before it reaches the tap
fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tap: Arc<AnalysisTap>,
    channels: usize,
) -> Result<cpal::Stream, SourceError>
where
    T: cpal::SizedSample,
    f32: FromSample<T>,
{
    let mut block = Vec::new();
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                normalize_block(data, &mut block);
                tap.push_interleaved(&block, channels);
            },
            |err| error!("Capture stream error: {}", err),
            None,
        )
        .map_err(classify_open_error)
}

/// Convert device samples to f32 in -1.0..=1.0, reusing `out`
fn normalize_block<T>(data: &[T], out: &mut Vec<f32>)
where
    T: Copy,
    f32: FromSample<T>,
{
    out.clear();
    out.extend(data.iter().map(|&s| f32::from_sample_(s)));
}

/// Map a device error to a denial when the backend says so
fn classify_open_error(err: impl std::fmt::Display) -> SourceError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    let denied = ["permission", "denied", "not permitted", "unauthorized"]
        .iter()
        .any(|needle| lower.contains(needle));

    if denied {
        SourceError::PermissionDenied
    } else {
        SourceError::Stream(message)
    }
}

impl SignalSource for CaptureSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Capture
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_active(&self) -> bool {
        self.state == CaptureState::Open
            && self.stream.is_some()
            && self.handle.as_ref().is_some_and(|h| h.is_connected())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig::capture()
    }

    fn connect_analysis(
        &mut self,
        config: AnalysisConfig,
    ) -> Result<AnalysisHandle, SourceError> {
        if self.is_denied() {
            return Err(SourceError::PermissionDenied);
        }
        self.disconnect();
        config.validate()?;

        let handle = AnalysisHandle::new(config);
        match self.open(&handle) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.handle = Some(handle.clone());
                self.state = CaptureState::Open;
                self.running = true;
                debug!("Capture stream open on {}", self.label);
                Ok(handle)
            }
            Err(err) => {
                handle.disconnect();
                if matches!(err, SourceError::PermissionDenied) {
                    warn!("Microphone access denied");
                    self.state = CaptureState::Denied;
                }
                Err(err)
            }
        }
    }

    fn disconnect(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.disconnect();
        }
        self.stream = None;
        self.running = false;
        if self.state == CaptureState::Open {
            self.state = CaptureState::Closed;
        }
    }

    fn start(&mut self) -> Result<(), SourceError> {
        if self.is_denied() {
            return Err(SourceError::PermissionDenied);
        }
        if !self.is_active() {
            return Err(SourceError::Unavailable("microphone is not connected".into()));
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        if self.stream.is_some() {
            debug!("Closing capture stream on {}", self.label);
        }
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_denial() {
        assert!(matches!(
            classify_open_error("Permission denied (os error 13)"),
            SourceError::PermissionDenied
        ));
        assert!(matches!(
            classify_open_error("operation not permitted"),
            SourceError::PermissionDenied
        ));
        assert!(matches!(
            classify_open_error("The requested device is no longer available"),
            SourceError::Stream(_)
        ));
    }

    #[test]
    fn test_integer_samples_normalize() {
        let mut block = Vec::new();

        normalize_block(&[i16::MIN, 0, i16::MAX], &mut block);
        assert_eq!(block.len(), 3);
        assert!((block[0] + 1.0).abs() < 1e-4);
        assert_eq!(block[1], 0.0);
        assert!((block[2] - 1.0).abs() < 1e-4);

        normalize_block(&[0u16, 32768, u16::MAX], &mut block);
        assert_eq!(block.len(), 3);
        assert!((block[0] + 1.0).abs() < 1e-4);
        assert!(block[1].abs() < 1e-4);
        assert!((block[2] - 1.0).abs() < 1e-4);

        normalize_block(&[0.25f32, -0.5], &mut block);
        assert_eq!(block, vec![0.25, -0.5]);
    }

    #[test]
    fn test_normalized_block_reaches_tap() {
        let handle = AnalysisHandle::new(AnalysisConfig::capture());
        let mut block = Vec::new();
        normalize_block(&[i16::MAX, i16::MAX, 0, 0], &mut block);
        handle.tap().push_interleaved(&block, 2);

        let mut latest = [0.0; 2];
        handle.tap().copy_latest(&mut latest);
        assert!((latest[0] - 1.0).abs() < 1e-4);
        assert_eq!(latest[1], 0.0);
    }

    #[test]
    fn test_denied_capture_never_retries() {
        let mut source = CaptureSource::new();
        source.state = CaptureState::Denied;

        assert!(matches!(
            source.connect_analysis(AnalysisConfig::capture()),
            Err(SourceError::PermissionDenied)
        ));
        assert!(matches!(source.start(), Err(SourceError::PermissionDenied)));
        assert!(!source.is_active());
        assert!(source.is_denied());
    }

    #[test]
    fn test_fresh_capture_is_inactive() {
        let source = CaptureSource::new();
        assert_eq!(source.kind(), SourceKind::Capture);
        assert!(!source.is_active());
        assert!(!source.is_running());
        assert_eq!(source.analysis_config().window_size, 256);
    }
}
