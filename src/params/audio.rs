//! Analysis configuration for the spectral sampler.

use crate::error::ConfigError;

/// Window size used when analysing decoded media playback
pub const MEDIA_WINDOW_SIZE: usize = 512;

/// Window size used when analysing a live capture stream
pub const CAPTURE_WINDOW_SIZE: usize = 256;

/// Per-source analysis configuration.
///
/// Fixed for the lifetime of a connected source. Switching sources builds a
/// fresh config, which in turn resizes the sample buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Number of raw samples consumed per transform (power of two)
    pub window_size: usize,

    /// Weight of the previous frame's magnitude (0.0 = none, 1.0 = frozen)
    pub smoothing_time_constant: f32,

    /// Magnitude (dB) mapped to byte value 0
    pub min_decibels: f32,

    /// Magnitude (dB) mapped to byte value 255
    pub max_decibels: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::media()
    }
}

impl AnalysisConfig {
    /// Config for decoded file playback (512-sample window)
    pub fn media() -> Self {
        Self::with_window(MEDIA_WINDOW_SIZE)
    }

    /// Config for microphone capture (256-sample window)
    pub fn capture() -> Self {
        Self::with_window(CAPTURE_WINDOW_SIZE)
    }

    fn with_window(window_size: usize) -> Self {
        Self {
            window_size,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }

    /// Number of entries in each sample buffer (half the window)
    pub fn buffer_len(&self) -> usize {
        self.window_size / 2
    }

    /// Validate configuration (window must be a power of 2, etc.)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.window_size.is_power_of_two() {
            return Err(ConfigError::WindowNotPowerOfTwo(self.window_size));
        }
        if !(32..=32768).contains(&self.window_size) {
            return Err(ConfigError::WindowOutOfRange(self.window_size));
        }
        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(ConfigError::SmoothingOutOfRange(
                self.smoothing_time_constant,
            ));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(ConfigError::DecibelRange {
                min: self.min_decibels,
                max: self.max_decibels,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_windows() {
        assert_eq!(AnalysisConfig::media().buffer_len(), 256);
        assert_eq!(AnalysisConfig::capture().buffer_len(), 128);
        assert!(AnalysisConfig::media().validate().is_ok());
        assert!(AnalysisConfig::capture().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_window() {
        let mut config = AnalysisConfig::media();
        config.window_size = 500;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WindowNotPowerOfTwo(500))
        ));

        config.window_size = 16;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WindowOutOfRange(16))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_smoothing_and_decibels() {
        let mut config = AnalysisConfig::capture();
        config.smoothing_time_constant = 1.5;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::capture();
        config.min_decibels = -20.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DecibelRange { .. })
        ));
    }
}
