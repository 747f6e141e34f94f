//! Command-line argument parsing.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use crate::params::{RecordingConfig, RenderConfig};
use crate::render::VisualStyle;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "vibescope")]
#[command(about = "Real-time audio visualizer for WAV files and the microphone", long_about = None)]
pub struct Args {
    /// WAV file to visualize
    #[arg(long, value_name = "WAV")]
    pub file: Option<PathBuf>,

    /// Start with the microphone instead of a file
    #[arg(long, conflicts_with = "file")]
    pub mic: bool,

    /// Start file playback immediately instead of paused
    #[arg(long, requires = "file")]
    pub play: bool,

    /// Visual style
    #[arg(long, value_enum, default_value_t = VisualStyle::Bars)]
    pub style: VisualStyle,

    /// Window width (pixels)
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Window height (pixels)
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Record frames to disk (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width.max(1),
            window_height: self.height.max(1),
            ..RenderConfig::default()
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> anyhow::Result<Option<RecordingConfig>> {
        let Some(duration) = self.record else {
            return Ok(None);
        };
        anyhow::ensure!(
            duration > 0.0,
            "recording duration must be positive, got {}",
            duration
        );

        let config = RecordingConfig::new(duration);
        std::fs::create_dir_all(config.frames_dir())
            .with_context(|| format!("failed to create {}", config.frames_dir()))?;
        info!(
            "Recording {} frames to {}",
            config.total_frames(),
            config.frames_dir()
        );

        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["vibescope"]).unwrap();
        assert_eq!(args.style, VisualStyle::Bars);
        assert!(args.file.is_none());
        assert!(!args.mic);
        assert_eq!(args.render_config().window_width, 1280);
        assert!(args.create_recording_config().unwrap().is_none());
    }

    #[test]
    fn test_style_and_source_flags() {
        let args =
            Args::try_parse_from(["vibescope", "--file", "song.wav", "--style", "circle"]).unwrap();
        assert_eq!(args.style, VisualStyle::CircularSpectrum);
        assert_eq!(args.file, Some(PathBuf::from("song.wav")));

        assert!(Args::try_parse_from(["vibescope", "--file", "a.wav", "--mic"]).is_err());
        assert!(Args::try_parse_from(["vibescope", "--play"]).is_err());
        assert!(Args::try_parse_from(["vibescope", "--style", "spiral"]).is_err());
    }

    #[test]
    fn test_rejects_non_positive_recording() {
        let args = Args::try_parse_from(["vibescope", "--record", "0"]).unwrap();
        assert!(args.create_recording_config().is_err());
    }
}
