//! Per-style frame renderers.
//!
//! Every renderer measures the canvas on each call; nothing about the
//! layout survives between frames.

use glam::Vec2;
use std::f32::consts::TAU;

use super::canvas::{Canvas, Color, Rect, SurfaceSize};
use super::style::VisualStyle;
use crate::audio::SampleBuffer;
use crate::params::{BarsParams, CircularParams, IdleParams, RenderConfig, WaveformParams};

/// A drawing style fed with one sample buffer per frame
pub trait Renderable {
    /// Draw `buffer` onto `canvas`. `elapsed_s` is wall-clock time since the
    /// driver started, for time-based motion.
    fn render(&self, buffer: &SampleBuffer, canvas: &mut dyn Canvas, elapsed_s: f32);
}

/// Geometry and colour of a single frequency bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub rect: Rect,
    pub hue: f32,
    pub lightness: f32,
    pub color: Color,
}

pub struct BarsRenderer {
    params: BarsParams,
}

impl BarsRenderer {
    pub fn new(params: BarsParams) -> Self {
        Self { params }
    }

    /// Bar width for `n` bins on the current surface
    pub fn bar_width(&self, n: usize, size: SurfaceSize) -> f32 {
        size.width / n as f32 * self.params.width_scale
    }

    /// Bar height for one byte value, never below the minimum
    pub fn bar_height(&self, value: u8, size: SurfaceSize) -> f32 {
        let level = value as f32 / 255.0;
        (level * size.height * self.params.height_fraction).max(self.params.min_height)
    }

    /// Layout of bar `index` out of `n`, or `None` when it starts past the
    /// right edge
    pub fn bar(&self, index: usize, value: u8, n: usize, size: SurfaceSize) -> Option<Bar> {
        let width = self.bar_width(n, size);
        let x = index as f32 * (width + self.params.gap);
        if x >= size.width {
            return None;
        }

        let height = self.bar_height(value, size);
        let hue = 360.0 * index as f32 / n as f32;
        let lightness =
            self.params.base_lightness + self.params.lightness_range * (value as f32 / 255.0);

        Some(Bar {
            rect: Rect::new(x, size.height - height, width, height),
            hue,
            lightness,
            color: Color::from_hsl(hue, self.params.saturation, lightness),
        })
    }
}

impl Renderable for BarsRenderer {
    fn render(&self, buffer: &SampleBuffer, canvas: &mut dyn Canvas, _elapsed_s: f32) {
        let size = canvas.size();
        let n = buffer.len();

        for (i, &value) in buffer.values().iter().enumerate() {
            if let Some(bar) = self.bar(i, value, n, size) {
                canvas.fill_rect(bar.rect, bar.color);
            }
        }
    }
}

/// One spoke of the circular spectrum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spoke {
    pub inner: Vec2,
    pub outer: Vec2,
    pub angle: f32,
    pub length: f32,
    pub color: Color,
}

pub struct CircularRenderer {
    params: CircularParams,
}

impl CircularRenderer {
    pub fn new(params: CircularParams) -> Self {
        Self { params }
    }

    /// Ring rotation after `elapsed_s` seconds
    pub fn rotation(&self, elapsed_s: f32) -> f32 {
        elapsed_s * self.params.rotation_speed
    }

    pub fn segment_length(&self, value: u8) -> f32 {
        self.params.segment_base + (value as f32 / 255.0) * self.params.segment_scale
    }

    pub fn spoke(
        &self,
        index: usize,
        value: u8,
        n: usize,
        rotation: f32,
        size: SurfaceSize,
    ) -> Spoke {
        let center = size.center();
        let angle = index as f32 * (TAU / n as f32) + rotation;
        let direction = Vec2::from_angle(angle);
        let length = self.segment_length(value);

        Spoke {
            inner: center + direction * self.params.radius,
            outer: center + direction * (self.params.radius + length),
            angle,
            length,
            color: Color::from_hsl(
                360.0 * index as f32 / n as f32,
                self.params.saturation,
                self.params.lightness,
            ),
        }
    }
}

impl Renderable for CircularRenderer {
    fn render(&self, buffer: &SampleBuffer, canvas: &mut dyn Canvas, elapsed_s: f32) {
        let size = canvas.size();
        let n = buffer.len();
        let rotation = self.rotation(elapsed_s);

        for (i, &value) in buffer.values().iter().enumerate() {
            let spoke = self.spoke(i, value, n, rotation, size);
            canvas.stroke_line(spoke.inner, spoke.outer, self.params.line_width, spoke.color);
        }
    }
}

pub struct WaveformRenderer {
    params: WaveformParams,
}

impl WaveformRenderer {
    pub fn new(params: WaveformParams) -> Self {
        Self { params }
    }

    /// Offset from the vertical midline; 128 is silence
    pub fn vertical_offset(value: u8, size: SurfaceSize) -> f32 {
        (value as f32 / 128.0 - 1.0) * size.height / 2.0
    }

    /// Polyline vertices spanning the full width
    pub fn points(&self, values: &[u8], size: SurfaceSize) -> Vec<Vec2> {
        let step = size.width / values.len() as f32;
        let midline = size.height / 2.0;

        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Vec2::new(i as f32 * step, midline + Self::vertical_offset(v, size)))
            .collect()
    }
}

impl Renderable for WaveformRenderer {
    fn render(&self, buffer: &SampleBuffer, canvas: &mut dyn Canvas, _elapsed_s: f32) {
        if buffer.is_empty() {
            return;
        }
        let points = self.points(buffer.values(), canvas.size());
        canvas.stroke_polyline(
            points,
            self.params.line_width,
            Color::from_rgb8(self.params.stroke_rgb),
        );
    }
}

/// Rotating, hue-cycling square shown while nothing is live
pub struct IdleRenderer {
    params: IdleParams,
}

impl IdleRenderer {
    pub fn new(params: IdleParams) -> Self {
        Self { params }
    }

    pub fn angle(&self, elapsed_s: f32) -> f32 {
        elapsed_s * TAU * self.params.revolutions_per_s
    }

    pub fn hue(&self, elapsed_s: f32) -> f32 {
        (elapsed_s * self.params.hue_speed).rem_euclid(360.0)
    }

    pub fn render(&self, canvas: &mut dyn Canvas, elapsed_s: f32) {
        let size = canvas.size();
        canvas.fill_rotated_rect(
            size.center(),
            Vec2::splat(self.params.size),
            self.angle(elapsed_s),
            Color::from_hsl(
                self.hue(elapsed_s),
                self.params.saturation,
                self.params.lightness,
            ),
        );
    }
}

/// Composes one frame: background pass, then the style's drawing
pub struct FrameRenderer {
    background: Color,
    trail_alpha: f32,
    bars: BarsRenderer,
    circular: CircularRenderer,
    waveform: WaveformRenderer,
    idle: IdleRenderer,
}

impl FrameRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            background: Color::from_rgb8(config.background_rgb),
            trail_alpha: config.trail_alpha,
            bars: BarsRenderer::new(BarsParams::default()),
            circular: CircularRenderer::new(CircularParams::default()),
            waveform: WaveformRenderer::new(WaveformParams::default()),
            idle: IdleRenderer::new(IdleParams::default()),
        }
    }

    fn renderer_for(&self, style: VisualStyle) -> &dyn Renderable {
        match style {
            VisualStyle::Bars => &self.bars,
            VisualStyle::CircularSpectrum => &self.circular,
            VisualStyle::Waveform => &self.waveform,
        }
    }

    /// Draw one frame. `None` means no live source: the surface is cleared
    /// opaquely and the idle pattern drawn; the style is ignored.
    pub fn render_frame(
        &self,
        buffer: Option<&SampleBuffer>,
        style: VisualStyle,
        canvas: &mut dyn Canvas,
        elapsed_s: f32,
    ) {
        let bounds = canvas.size().bounds();

        match buffer {
            None => {
                canvas.fill_rect(bounds, self.background);
                self.idle.render(canvas, elapsed_s);
            }
            Some(buffer) => {
                canvas.fill_rect(bounds, self.background.with_alpha(self.trail_alpha));
                self.renderer_for(style).render(buffer, canvas, elapsed_s);
            }
        }
    }
}
