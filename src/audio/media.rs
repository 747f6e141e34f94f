//! Decoded media playback with a non-destructive analysis tap.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{debug, error, info};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::source::{SignalSource, SourceKind};
use super::tap::{AnalysisHandle, AnalysisTap};
use crate::error::SourceError;
use crate::params::AnalysisConfig;

/// Interleaved PCM held fully in memory
#[derive(Debug, Clone)]
pub struct DecodedMedia {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl DecodedMedia {
    /// Decode a WAV file into normalised f32 samples
    pub fn from_wav<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        Self::from_samples(samples, spec.channels as usize, spec.sample_rate)
    }

    pub fn from_samples(
        samples: Vec<f32>,
        channels: usize,
        sample_rate: u32,
    ) -> Result<Self, SourceError> {
        if channels == 0 || sample_rate == 0 {
            return Err(SourceError::Decode(format!(
                "invalid format: {} channels @ {}Hz",
                channels, sample_rate
            )));
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn duration_secs(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }

    fn frame(&self, index: usize) -> &[f32] {
        let start = index * self.channels;
        &self.samples[start..start + self.channels]
    }
}

/// Playhead shared with the output callback
#[derive(Debug, Default)]
struct Playback {
    /// Position in source frames (fractional when resampling)
    position: f64,
    playing: bool,
}

impl Playback {
    /// Fill one output block and feed the same audio to the tap.
    ///
    /// Paused playback writes silence and leaves the tap untouched; running
    /// past the end writes (and taps) silence.
    fn render_block(
        &mut self,
        media: &DecodedMedia,
        data: &mut [f32],
        out_channels: usize,
        output_rate: u32,
        tap: &AnalysisTap,
        mono: &mut Vec<f32>,
    ) {
        if !self.playing {
            data.fill(0.0);
            return;
        }

        let step = media.sample_rate as f64 / output_rate as f64;
        let frames = media.frames();
        mono.clear();

        for out in data.chunks_exact_mut(out_channels) {
            let index = self.position as usize;
            if index >= frames {
                out.fill(0.0);
                mono.push(0.0);
                continue;
            }

            let frame = media.frame(index);
            for (ch, slot) in out.iter_mut().enumerate() {
                *slot = frame[ch.min(media.channels - 1)];
            }
            mono.push(frame.iter().sum::<f32>() / media.channels as f32);
            self.position += step;
        }

        tap.push(mono);
    }

    fn seek_to(&mut self, frame: f64, frames: usize) {
        self.position = frame.clamp(0.0, frames as f64);
    }
}

/// Decoded media played to the default output device
pub struct MediaSource {
    label: String,
    media: Arc<DecodedMedia>,
    playback: Arc<Mutex<Playback>>,
    handle: Option<AnalysisHandle>,
    stream: Option<cpal::Stream>,
}

impl MediaSource {
    /// Load a WAV file; playback starts paused
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let media = DecodedMedia::from_wav(path)?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        debug!(
            "Decoded {} ({} ch @ {}Hz, {:.1}s)",
            label,
            media.channels(),
            media.sample_rate(),
            media.duration_secs()
        );
        Ok(Self::new(label, media))
    }

    pub fn new(label: impl Into<String>, media: DecodedMedia) -> Self {
        Self {
            label: label.into(),
            media: Arc::new(media),
            playback: Arc::new(Mutex::new(Playback::default())),
            handle: None,
            stream: None,
        }
    }

    fn playback(&self) -> MutexGuard<'_, Playback> {
        lock_playback(&self.playback)
    }

    fn build_stream(&self, tap: Arc<AnalysisTap>) -> Result<cpal::Stream, SourceError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| SourceError::Unavailable("no audio output device found".into()))?;

        let config = device
            .default_output_config()
            .map_err(|e| SourceError::Stream(format!("failed to get output config: {}", e)))?;

        let out_channels = config.channels() as usize;
        let output_rate = config.sample_rate().0;
        info!(
            "Audio out: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            output_rate
        );

        let media = Arc::clone(&self.media);
        let playback = Arc::clone(&self.playback);
        let mut mono = Vec::new();

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    lock_playback(&playback).render_block(
                        &media,
                        data,
                        out_channels,
                        output_rate,
                        &tap,
                        &mut mono,
                    );
                },
                |err| error!("Audio output stream error: {}", err),
                None,
            )
            .map_err(|e| SourceError::Stream(format!("failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| SourceError::Stream(format!("failed to start output stream: {}", e)))?;

        Ok(stream)
    }
}

fn lock_playback(playback: &Mutex<Playback>) -> MutexGuard<'_, Playback> {
    playback.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SignalSource for MediaSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Media
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_active(&self) -> bool {
        self.stream.is_some() && self.handle.as_ref().is_some_and(|h| h.is_connected())
    }

    fn is_running(&self) -> bool {
        self.playback().playing
    }

    fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig::media()
    }

    fn connect_analysis(
        &mut self,
        config: AnalysisConfig,
    ) -> Result<AnalysisHandle, SourceError> {
        self.disconnect();
        config.validate()?;

        let handle = AnalysisHandle::new(config);
        let stream = self.build_stream(handle.tap())?;

        self.stream = Some(stream);
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    fn disconnect(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.disconnect();
        }
        self.stream = None;
        self.playback().playing = false;
    }

    fn start(&mut self) -> Result<(), SourceError> {
        if self.stream.is_none() {
            return Err(SourceError::Unavailable(format!(
                "{} is not connected",
                self.label
            )));
        }
        let frames = self.media.frames();
        let mut playback = self.playback();
        if playback.position as usize >= frames {
            playback.position = 0.0;
        }
        playback.playing = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.playback().playing = false;
    }

    fn seek_by(&mut self, delta_secs: f32) {
        let delta = delta_secs as f64 * self.media.sample_rate() as f64;
        let frames = self.media.frames();
        let mut playback = self.playback();
        let target = playback.position + delta;
        playback.seek_to(target, frames);
    }

    fn timeline(&self) -> Option<(f32, f32)> {
        let position = self.playback().position as f32 / self.media.sample_rate() as f32;
        Some((position, self.media.duration_secs()))
    }
}
