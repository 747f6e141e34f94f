//! Per-frame orchestration: source → sampler → renderer.
//!
//! The driver owns every piece of mutable frame state (selected style,
//! current source, the sampler's reusable buffer, surface size and the
//! recorded frame) so a tick is a function of that state and the elapsed
//! time alone.

use std::time::Duration;

use log::{debug, error, info, warn};

use crate::audio::{SignalSource, SpectralSampler};
use crate::clock::FrameClock;
use crate::error::SourceError;
use crate::params::RenderConfig;
use crate::render::{DrawList, FrameRenderer, SurfaceSize, VisualStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No live source; the idle pattern is drawn
    Idle,
    /// A connected source is running and sampled each frame
    Active,
}

/// Outcome of replacing the current source
pub struct SourceSwitch {
    /// The source that was detached, already disconnected
    pub previous: Option<Box<dyn SignalSource>>,
    /// Whether the new source connected to analysis
    pub result: Result<(), SourceError>,
}

pub struct AnimationDriver {
    renderer: FrameRenderer,
    style: VisualStyle,
    size: SurfaceSize,
    source: Option<Box<dyn SignalSource>>,
    sampler: Option<SpectralSampler>,
    state: DriverState,
    frame: DrawList,
    frames: u64,
}

impl AnimationDriver {
    pub fn new(config: &RenderConfig, style: VisualStyle) -> Self {
        let size = SurfaceSize::new(config.window_width as f32, config.window_height as f32);
        Self {
            renderer: FrameRenderer::new(config),
            style,
            size,
            source: None,
            sampler: None,
            state: DriverState::Idle,
            frame: DrawList::new(size),
            frames: 0,
        }
    }

    /// Select the style used from the next tick on
    pub fn set_style(&mut self, style: VisualStyle) {
        if style != self.style {
            debug!("Style: {} -> {}", self.style, style);
        }
        self.style = style;
    }

    pub fn style(&self) -> VisualStyle {
        self.style
    }

    /// Adopt new surface dimensions; the next tick lays out against them
    pub fn on_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = SurfaceSize::new(width as f32, height as f32);
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Commands recorded by the most recent tick
    pub fn frame(&self) -> &DrawList {
        &self.frame
    }

    /// Ticks run so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn source(&self) -> Option<&(dyn SignalSource + 'static)> {
        self.source.as_deref()
    }

    pub fn source_mut(&mut self) -> Option<&mut (dyn SignalSource + 'static)> {
        self.source.as_deref_mut()
    }

    /// Make `source` the current one. The previous source is disconnected
    /// before the new one is connected; a failed connection leaves the new
    /// source installed but inactive, and ticks fall back to idle.
    pub fn switch_source(&mut self, source: Box<dyn SignalSource>) -> SourceSwitch {
        let previous = self.detach_source();
        self.source = Some(source);
        let result = self.reconnect();

        SourceSwitch { previous, result }
    }

    /// Disconnect and hand back the current source, if any
    pub fn detach_source(&mut self) -> Option<Box<dyn SignalSource>> {
        self.sampler = None;
        let mut source = self.source.take()?;
        source.disconnect();
        info!("Disconnected {:?} source '{}'", source.kind(), source.label());
        Some(source)
    }

    /// (Re)connect the current source to a fresh analysis configuration
    pub fn reconnect(&mut self) -> Result<(), SourceError> {
        self.sampler = None;
        let Some(source) = self.source.as_mut() else {
            return Err(SourceError::Unavailable("no source selected".into()));
        };

        let config = source.analysis_config();
        let handle = match source.connect_analysis(config) {
            Ok(handle) => handle,
            Err(err) => {
                warn!("Could not connect '{}': {}", source.label(), err);
                return Err(err);
            }
        };

        match SpectralSampler::new(handle) {
            Ok(sampler) => {
                info!(
                    "Connected {:?} source '{}' ({} bins)",
                    source.kind(),
                    source.label(),
                    sampler.buffer_len()
                );
                self.sampler = Some(sampler);
                Ok(())
            }
            Err(err) => {
                error!("Analysis setup failed for '{}': {}", source.label(), err);
                source.disconnect();
                Err(err)
            }
        }
    }

    /// True when this tick should sample instead of idling
    pub fn is_live(&self) -> bool {
        let source_live = self
            .source
            .as_ref()
            .is_some_and(|s| s.is_active() && s.is_running());
        let sampler_live = self
            .sampler
            .as_ref()
            .is_some_and(|s| s.handle().is_connected());
        source_live && sampler_live
    }

    /// Render one frame into the recorded draw list
    pub fn tick(&mut self, elapsed: Duration) -> DriverState {
        // Read once so a mid-frame change waits for the next tick
        let style = self.style;
        let elapsed_s = elapsed.as_secs_f32();
        let live = self.is_live();

        self.frame.begin(self.size);

        let state = match self.sampler.as_mut() {
            Some(sampler) if live => {
                let buffer = sampler.pull(style.sample_domain());
                self.renderer
                    .render_frame(Some(buffer), style, &mut self.frame, elapsed_s);
                DriverState::Active
            }
            _ => {
                self.renderer
                    .render_frame(None, style, &mut self.frame, elapsed_s);
                DriverState::Idle
            }
        };

        if state != self.state {
            debug!("Driver {:?} -> {:?}", self.state, state);
        }
        self.state = state;
        self.frames += 1;
        state
    }

    /// Tick once per clock frame until the clock stops, handing each
    /// recorded frame to `present`. Returns the number of frames run.
    pub fn run<C, P>(&mut self, clock: &mut C, mut present: P) -> u64
    where
        C: FrameClock + ?Sized,
        P: FnMut(&DrawList, DriverState),
    {
        let mut count = 0;
        while let Some(elapsed) = clock.next_frame() {
            let state = self.tick(elapsed);
            present(&self.frame, state);
            count += 1;
        }
        count
    }
}
