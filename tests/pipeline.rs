//! End-to-end frame pipeline tests driven by scripted sources.

use std::cell::RefCell;
use std::f32::consts::TAU;
use std::rc::Rc;
use std::time::Duration;

use glam::Vec2;
use vibescope::audio::{AnalysisHandle, SampleBuffer, SampleDomain, SignalSource, SourceKind};
use vibescope::driver::{AnimationDriver, DriverState};
use vibescope::error::SourceError;
use vibescope::params::{AnalysisConfig, RenderConfig};
use vibescope::render::{
    Color, DrawCommand, DrawList, FrameRenderer, Rect, SurfaceSize, VisualStyle,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Connect(&'static str),
    Disconnect(&'static str),
}

/// Shared record of what the sources were asked to do
#[derive(Default)]
struct Recorder {
    events: Vec<Event>,
    handles: Vec<AnalysisHandle>,
}

type SharedRecorder = Rc<RefCell<Recorder>>;

/// Source that writes a fixed block into its tap when connected
struct ScriptedSource {
    name: &'static str,
    kind: SourceKind,
    config: AnalysisConfig,
    samples: Vec<f32>,
    running: bool,
    deny: bool,
    handle: Option<AnalysisHandle>,
    recorder: SharedRecorder,
}

impl ScriptedSource {
    fn media(name: &'static str, samples: Vec<f32>, recorder: &SharedRecorder) -> Self {
        Self {
            name,
            kind: SourceKind::Media,
            config: AnalysisConfig::media(),
            samples,
            running: true,
            deny: false,
            handle: None,
            recorder: Rc::clone(recorder),
        }
    }

    fn capture(name: &'static str, samples: Vec<f32>, recorder: &SharedRecorder) -> Self {
        Self {
            kind: SourceKind::Capture,
            config: AnalysisConfig::capture(),
            ..Self::media(name, samples, recorder)
        }
    }

    fn denied(name: &'static str, recorder: &SharedRecorder) -> Self {
        Self {
            deny: true,
            ..Self::capture(name, Vec::new(), recorder)
        }
    }

    fn with_config(self, config: AnalysisConfig) -> Self {
        Self { config, ..self }
    }

    fn paused(self) -> Self {
        Self {
            running: false,
            ..self
        }
    }
}

impl SignalSource for ScriptedSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn label(&self) -> &str {
        self.name
    }

    fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| h.is_connected())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn analysis_config(&self) -> AnalysisConfig {
        self.config.clone()
    }

    fn connect_analysis(
        &mut self,
        config: AnalysisConfig,
    ) -> Result<AnalysisHandle, SourceError> {
        if self.deny {
            return Err(SourceError::PermissionDenied);
        }
        let handle = AnalysisHandle::new(config);
        handle.tap().push(&self.samples);

        let mut recorder = self.recorder.borrow_mut();
        recorder.events.push(Event::Connect(self.name));
        recorder.handles.push(handle.clone());

        self.handle = Some(handle.clone());
        Ok(handle)
    }

    fn disconnect(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.disconnect();
            self.recorder.borrow_mut().events.push(Event::Disconnect(self.name));
        }
        self.running = false;
    }

    fn start(&mut self) -> Result<(), SourceError> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

fn tone(len: usize, amplitude: f32) -> Vec<f32> {
    (0..len)
        .map(|i| amplitude * (TAU * 32.0 * i as f32 / 512.0).sin())
        .collect()
}

fn driver(style: VisualStyle) -> AnimationDriver {
    AnimationDriver::new(&RenderConfig::default(), style)
}

fn bar_rects(list: &DrawList) -> Vec<Rect> {
    list.commands()
        .iter()
        .skip(1)
        .filter_map(|c| match c {
            DrawCommand::FillRect { rect, .. } => Some(*rect),
            _ => None,
        })
        .collect()
}

fn background_alpha(list: &DrawList) -> f32 {
    match &list.commands()[0] {
        DrawCommand::FillRect { color, .. } => color.a,
        other => panic!("frame must start with a background fill, got {:?}", other),
    }
}

#[test]
fn test_inactive_source_draws_idle_square() {
    let recorder = SharedRecorder::default();
    let mut driver = driver(VisualStyle::Bars);

    // No source at all
    assert_eq!(driver.tick(Duration::from_millis(500)), DriverState::Idle);
    let frame = driver.frame();
    assert_eq!(frame.len(), 2);
    assert_eq!(background_alpha(frame), 1.0);
    assert!(matches!(
        frame.commands()[1],
        DrawCommand::FillRotatedRect { center, .. } if center == Vec2::new(640.0, 360.0)
    ));

    // Connected but paused is still idle
    driver.switch_source(Box::new(
        ScriptedSource::media("song", tone(512, 0.1), &recorder).paused(),
    ));
    assert_eq!(driver.tick(Duration::from_millis(516)), DriverState::Idle);
    assert_eq!(driver.frame().len(), 2);
    assert_eq!(background_alpha(driver.frame()), 1.0);
}

#[test]
fn test_idle_frames_vary_only_with_time() {
    let mut driver = driver(VisualStyle::CircularSpectrum);

    let square = |driver: &AnimationDriver| match driver.frame().commands()[1] {
        DrawCommand::FillRotatedRect {
            center,
            size,
            angle,
            color,
        } => (center, size, angle, color),
        ref other => panic!("expected idle square, got {:?}", other),
    };

    driver.tick(Duration::from_millis(100));
    let a = square(&driver);
    driver.tick(Duration::from_millis(350));
    let b = square(&driver);

    assert_eq!(a.0, b.0);
    assert_eq!(a.1, b.1);
    assert!((b.2 - a.2 - 0.25 * TAU).abs() < 1e-4);
    assert_ne!(a.3, b.3);
}

#[test]
fn test_bars_heights_from_known_buffer() {
    let renderer = FrameRenderer::new(&RenderConfig::default());
    let size = SurfaceSize::new(1280.0, 720.0);
    let mut list = DrawList::new(size);

    let mut values = vec![0u8; 128];
    values[1] = 255;
    values[2] = 128;
    let buffer = SampleBuffer::from_values(SampleDomain::Frequency, values);

    renderer.render_frame(Some(&buffer), VisualStyle::Bars, &mut list, 0.0);
    assert!((background_alpha(&list) - 0.2).abs() < 1e-6);

    let bars = bar_rects(&list);
    assert_eq!(bars[0].height, 5.0);
    assert!((bars[1].height - 0.8 * 720.0).abs() < 1e-3);
    assert!((bars[2].height - 0.4 * 720.0).abs() < 2.0);
    for bar in &bars {
        assert!(bar.height >= 5.0 && bar.height <= 576.0 + 1e-3);
    }
}

#[test]
fn test_live_source_drives_bars() {
    let recorder = SharedRecorder::default();
    let mut driver = driver(VisualStyle::Bars);
    let song = ScriptedSource::media("song", tone(512, 0.1), &recorder);
    let switch = driver.switch_source(Box::new(song));
    assert!(switch.result.is_ok());

    assert_eq!(driver.tick(Duration::ZERO), DriverState::Active);
    let bars = bar_rects(driver.frame());

    // 256 bins at width 10 + gap 2 fit 107 bars on 1280 pixels
    assert_eq!(bars.len(), 107);
    let tallest = bars
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.height.total_cmp(&b.1.height))
        .map(|(i, _)| i);
    assert_eq!(tallest, Some(32));
}

#[test]
fn test_style_switch_applies_next_frame() {
    let recorder = SharedRecorder::default();
    let mut driver = driver(VisualStyle::Bars);
    driver.switch_source(Box::new(ScriptedSource::media("song", tone(512, 0.1), &recorder)));

    driver.tick(Duration::ZERO);
    driver.set_style(VisualStyle::CircularSpectrum);

    // Frame k is untouched by the change
    assert!(driver.frame().commands()[1..]
        .iter()
        .all(|c| matches!(c, DrawCommand::FillRect { .. })));

    driver.tick(Duration::from_millis(16));
    let commands = &driver.frame().commands()[1..];
    assert_eq!(commands.len(), 256);
    assert!(commands.iter().all(|c| matches!(c, DrawCommand::Line { .. })));

    driver.set_style(VisualStyle::Waveform);
    driver.tick(Duration::from_millis(32));
    assert!(matches!(
        &driver.frame().commands()[1],
        DrawCommand::Polyline { points, width, color }
            if points.len() == 256 && *width == 2.0 && *color == Color::from_rgb8([0, 255, 0x88])
    ));
}

#[test]
fn test_switch_disconnects_before_new_source_is_sampled() {
    let recorder = SharedRecorder::default();
    let mut driver = driver(VisualStyle::Bars);

    driver.switch_source(Box::new(ScriptedSource::media("song", tone(512, 0.1), &recorder)));
    driver.tick(Duration::ZERO);

    let mic = ScriptedSource::capture("mic", vec![0.0; 256], &recorder);
    let switch = driver.switch_source(Box::new(mic));
    assert!(switch.result.is_ok());
    let previous = switch.previous.expect("media source handed back");
    assert!(!previous.is_active());

    assert_eq!(
        recorder.borrow().events,
        vec![
            Event::Connect("song"),
            Event::Disconnect("song"),
            Event::Connect("mic"),
        ]
    );

    // A late callback on the old connection must not reach the new one
    let (old, new) = {
        let recorder = recorder.borrow();
        (recorder.handles[0].clone(), recorder.handles[1].clone())
    };
    assert!(!old.is_connected());
    assert!(new.is_connected());
    old.tap().push(&tone(512, 0.9));

    assert_eq!(driver.tick(Duration::from_millis(16)), DriverState::Active);
    let bars = bar_rects(driver.frame());
    assert_eq!(bars.len(), 59);
    assert!(bars.iter().all(|b| b.height == 5.0));
}

#[test]
fn test_denied_capture_falls_back_to_idle() {
    let recorder = SharedRecorder::default();
    let mut driver = driver(VisualStyle::Bars);
    driver.switch_source(Box::new(ScriptedSource::media("song", tone(512, 0.1), &recorder)));

    let switch = driver.switch_source(Box::new(ScriptedSource::denied("mic", &recorder)));
    assert!(matches!(switch.result, Err(SourceError::PermissionDenied)));

    // The loop keeps running on the idle pattern
    for i in 0..3 {
        assert_eq!(driver.tick(Duration::from_millis(16 * i)), DriverState::Idle);
        assert_eq!(driver.frame().len(), 2);
    }
    assert_eq!(recorder.borrow().events.len(), 2);
}

#[test]
fn test_analysis_setup_failure_keeps_loop_idle() {
    let recorder = SharedRecorder::default();
    let mut driver = driver(VisualStyle::Bars);

    let odd_window = AnalysisConfig {
        window_size: 300,
        ..AnalysisConfig::media()
    };
    let broken = ScriptedSource::media("odd", tone(300, 0.1), &recorder).with_config(odd_window);
    let switch = driver.switch_source(Box::new(broken));
    assert!(matches!(switch.result, Err(SourceError::AnalysisSetup(_))));

    let source = driver.source().expect("failed source stays installed");
    assert!(!source.is_active());
    assert_eq!(
        recorder.borrow().events,
        vec![Event::Connect("odd"), Event::Disconnect("odd")]
    );

    for i in 0..3 {
        assert_eq!(driver.tick(Duration::from_millis(16 * i)), DriverState::Idle);
        assert_eq!(driver.frame().len(), 2);
        assert_eq!(background_alpha(driver.frame()), 1.0);
    }
}

#[test]
fn test_resize_applies_to_next_frame() {
    let recorder = SharedRecorder::default();
    let mut driver = driver(VisualStyle::Bars);
    driver.switch_source(Box::new(ScriptedSource::media("song", tone(512, 0.1), &recorder)));

    driver.tick(Duration::ZERO);
    assert_eq!(bar_rects(driver.frame())[0].width, 10.0);

    driver.on_resize(640, 360);
    driver.tick(Duration::from_millis(16));
    let bars = bar_rects(driver.frame());
    assert_eq!(bars[0].width, 5.0);
    assert!(bars.iter().all(|b| (b.y + b.height - 360.0).abs() < 1e-3));
    assert_eq!(
        driver.frame().commands()[0],
        DrawCommand::FillRect {
            rect: Rect::new(0.0, 0.0, 640.0, 360.0),
            color: Color::BLACK.with_alpha(0.2),
        }
    );

    driver.set_style(VisualStyle::CircularSpectrum);
    driver.on_resize(800, 600);
    driver.tick(Duration::from_millis(32));
    let center = Vec2::new(400.0, 300.0);
    for command in &driver.frame().commands()[1..] {
        let DrawCommand::Line { from, .. } = command else {
            panic!("ring draws lines");
        };
        assert!((from.distance(center) - 100.0).abs() < 1e-3);
    }
}
