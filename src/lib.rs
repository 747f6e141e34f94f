//! Vibescope library - real-time audio visualization
//!
//! A signal source feeds an analysis tap, a spectral sampler turns the tap
//! into one byte buffer per frame, and the frame renderer draws it in one of
//! three styles (or an idle pattern when nothing is playing).

pub mod audio;
pub mod cli;
pub mod clock;
pub mod driver;
pub mod error;
pub mod gpu;
pub mod params;
pub mod render;
