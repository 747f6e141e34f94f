//! Frame composition: canvas abstraction, per-style renderers and
//! tessellation for the GPU backend.

mod canvas;
mod renderers;
mod style;
mod tessellate;

// Re-export public types
pub use canvas::{Canvas, Color, DrawCommand, DrawList, Rect, SurfaceSize};
pub use renderers::{
    Bar, BarsRenderer, CircularRenderer, FrameRenderer, IdleRenderer, Renderable, Spoke,
    WaveformRenderer,
};
pub use style::VisualStyle;
pub use tessellate::{tessellate, to_ndc, Vertex};
