//! Visual constants for each drawing style.
//!
//! Lengths are in surface units (pixels), angles in radians, hues in degrees
//! and saturation/lightness in percent.

/// Frequency bar chart
#[derive(Debug, Clone)]
pub struct BarsParams {
    /// Horizontal gap between bars
    pub gap: f32,

    /// Bars never shrink below this height, so silent bins stay visible
    pub min_height: f32,

    /// Fraction of the surface height a full-scale (255) bin reaches
    pub height_fraction: f32,

    /// Bar width multiplier applied to `surface_width / N`
    pub width_scale: f32,

    /// HSL saturation (%)
    pub saturation: f32,

    /// Lightness of a silent bin (%); loud bins add up to `lightness_range`
    pub base_lightness: f32,

    /// Extra lightness at full scale (%)
    pub lightness_range: f32,
}

impl Default for BarsParams {
    fn default() -> Self {
        Self {
            gap: 2.0,
            min_height: 5.0,
            height_fraction: 0.8,
            width_scale: 2.0,
            saturation: 100.0,
            base_lightness: 50.0,
            lightness_range: 50.0,
        }
    }
}

/// Rotating circular spectrum
#[derive(Debug, Clone)]
pub struct CircularParams {
    /// Distance of each spoke's inner end from the surface centre
    pub radius: f32,

    /// Ring rotation speed (rad/s of wall-clock time)
    pub rotation_speed: f32,

    /// Spoke length of a silent bin
    pub segment_base: f32,

    /// Additional spoke length at full scale
    pub segment_scale: f32,

    /// Stroke width
    pub line_width: f32,

    pub saturation: f32,
    pub lightness: f32,
}

impl Default for CircularParams {
    fn default() -> Self {
        Self {
            radius: 100.0,
            rotation_speed: 0.7,
            segment_base: 15.0,
            segment_scale: 200.0,
            line_width: 3.0,
            saturation: 70.0,
            lightness: 50.0,
        }
    }
}

/// Oscilloscope-style waveform
#[derive(Debug, Clone)]
pub struct WaveformParams {
    /// Stroke colour as RGB bytes (#00ff88)
    pub stroke_rgb: [u8; 3],

    /// Stroke width
    pub line_width: f32,
}

impl Default for WaveformParams {
    fn default() -> Self {
        Self {
            stroke_rgb: [0x00, 0xff, 0x88],
            line_width: 2.0,
        }
    }
}

/// Idle pattern shown while no source is active
#[derive(Debug, Clone)]
pub struct IdleParams {
    /// Side length of the rotating square
    pub size: f32,

    /// Revolutions per second
    pub revolutions_per_s: f32,

    /// Hue drift (degrees per second)
    pub hue_speed: f32,

    pub saturation: f32,
    pub lightness: f32,
}

impl Default for IdleParams {
    fn default() -> Self {
        Self {
            size: 50.0,
            revolutions_per_s: 1.0,
            hue_speed: 50.0,
            saturation: 70.0,
            lightness: 50.0,
        }
    }
}
