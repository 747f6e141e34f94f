//! Vibescope - real-time audio visualizer
//!
//! Plays a WAV file (or listens to the microphone) and draws its spectrum
//! as bars, a rotating ring, or an oscilloscope line.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use vibescope::audio::{format_time, CaptureSource, MediaSource, SignalSource, SourceKind};
use vibescope::cli::Args;
use vibescope::clock::{FixedStepClock, FrameClock, WallClock};
use vibescope::driver::AnimationDriver;
use vibescope::error::{RenderError, SourceError};
use vibescope::params::{RecordingConfig, RenderConfig};
use vibescope::render::VisualStyle;
use vibescope::gpu::RenderSystem;

const SEEK_STEP_SECS: f32 = 5.0;

/// Source requested on the command line
enum StartupSource {
    None,
    File { path: PathBuf, play: bool },
    Microphone,
}

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    title: String,

    // Visualization pipeline
    driver: AnimationDriver,
    clock: Box<dyn FrameClock>,
    startup: Option<StartupSource>,

    /// File source kept aside while the microphone is current
    parked_media: Option<Box<dyn SignalSource>>,
    status: String,

    // Configuration
    render_config: RenderConfig,
    recording_config: Option<RecordingConfig>,
}

impl App {
    fn new(args: &Args) -> anyhow::Result<Self> {
        let render_config = args.render_config();
        let recording_config = args.create_recording_config()?;

        let clock: Box<dyn FrameClock> = match &recording_config {
            Some(config) => Box::new(FixedStepClock::new(config.fps, config.total_frames())),
            None => Box::new(WallClock::new()),
        };

        let startup = match (&args.file, args.mic) {
            (Some(path), _) => StartupSource::File {
                path: path.clone(),
                play: args.play,
            },
            (None, true) => StartupSource::Microphone,
            (None, false) => StartupSource::None,
        };

        Ok(Self {
            window: None,
            render_system: None,
            title: String::new(),
            driver: AnimationDriver::new(&render_config, args.style),
            clock,
            startup: Some(startup),
            parked_media: None,
            status: "Load a file or press M for the microphone".to_string(),
            render_config,
            recording_config,
        })
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        info!("{}", self.status);
    }

    fn connect_startup_source(&mut self, startup: StartupSource) {
        match startup {
            StartupSource::None => {}
            StartupSource::File { path, play } => match MediaSource::load(&path) {
                Ok(media) => {
                    let label = media.label().to_string();
                    let switch = self.driver.switch_source(Box::new(media));
                    match switch.result {
                        Ok(()) => {
                            self.set_status(format!("Loaded: {}", label));
                            if play {
                                self.toggle_playback();
                            }
                        }
                        Err(e) => self.set_status(format!("Audio error: {}", e)),
                    }
                }
                Err(e) => self.set_status(format!("Could not load {}: {}", path.display(), e)),
            },
            StartupSource::Microphone => self.start_microphone(),
        }
    }

    fn current_kind(&self) -> Option<SourceKind> {
        self.driver.source().map(|s| s.kind())
    }

    /// Make the file source current again, reconnecting it to analysis
    fn restore_media(&mut self) -> bool {
        if self.current_kind() == Some(SourceKind::Media) {
            if let Err(e) = self.driver.reconnect() {
                self.set_status(format!("Audio error: {}", e));
                return false;
            }
            return true;
        }

        let Some(media) = self.parked_media.take() else {
            self.set_status("No file loaded");
            return false;
        };
        let label = media.label().to_string();
        let switch = self.driver.switch_source(media);
        self.park(switch.previous);
        match switch.result {
            Ok(()) => {
                self.set_status(format!("Loaded: {}", label));
                true
            }
            Err(e) => {
                self.set_status(format!("Audio error: {}", e));
                false
            }
        }
    }

    fn park(&mut self, previous: Option<Box<dyn SignalSource>>) {
        if let Some(source) = previous {
            if source.kind() == SourceKind::Media {
                self.parked_media = Some(source);
            }
        }
    }

    fn toggle_playback(&mut self) {
        if self.current_kind() != Some(SourceKind::Media) && !self.restore_media() {
            return;
        }
        let Some(source) = self.driver.source_mut() else {
            return;
        };

        if source.is_running() {
            source.stop();
            self.set_status("Paused");
        } else {
            match source.start() {
                Ok(()) => self.set_status("Playing..."),
                Err(e) => self.set_status(format!("Playback error: {}", e)),
            }
        }
    }

    fn toggle_microphone(&mut self) {
        let mic_running = self.current_kind() == Some(SourceKind::Capture)
            && self.driver.source().is_some_and(|s| s.is_running());

        if mic_running {
            if let Some(source) = self.driver.source_mut() {
                source.stop();
            }
            self.set_status("Microphone stopped");
        } else {
            self.start_microphone();
        }
    }

    /// An explicit request always gets a fresh capture source, so a
    /// previous denial is asked about again
    fn start_microphone(&mut self) {
        let switch = self.driver.switch_source(Box::new(CaptureSource::new()));
        self.park(switch.previous);

        match switch.result {
            Ok(()) => self.set_status("Microphone active"),
            Err(SourceError::PermissionDenied) => self.set_status("Microphone access denied"),
            Err(e) => self.set_status(format!("Microphone error: {}", e)),
        }
    }

    fn seek(&mut self, delta_secs: f32) {
        if let Some(source) = self.driver.source_mut() {
            source.seek_by(delta_secs);
        }
    }

    fn handle_key(&mut self, key: KeyCode, event_loop: &ActiveEventLoop) {
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Digit1 => self.driver.set_style(VisualStyle::Bars),
            KeyCode::Digit2 => self.driver.set_style(VisualStyle::CircularSpectrum),
            KeyCode::Digit3 => self.driver.set_style(VisualStyle::Waveform),
            KeyCode::Space => self.toggle_playback(),
            KeyCode::KeyM => self.toggle_microphone(),
            KeyCode::KeyF => {
                self.restore_media();
            }
            KeyCode::ArrowLeft => self.seek(-SEEK_STEP_SECS),
            KeyCode::ArrowRight => self.seek(SEEK_STEP_SECS),
            _ => {}
        }
    }

    fn update_title(&mut self) {
        let Some(window) = &self.window else {
            return;
        };

        let mut title = format!("vibescope - {} - {}", self.status, self.driver.style());
        if let Some((position, duration)) = self.driver.source().and_then(|s| s.timeline()) {
            title.push_str(&format!(
                " - {} / {}",
                format_time(position),
                format_time(duration)
            ));
        }

        if title != self.title {
            window.set_title(&title);
            self.title = title;
        }
    }

    /// Render a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };

        // Fixed-step clock runs out once recording is complete
        let Some(elapsed) = self.clock.next_frame() else {
            info!("Recording complete ({} frames)", self.driver.frames());
            event_loop.exit();
            return;
        };

        let frame_num = self.driver.frames() as usize;
        self.driver.tick(elapsed);

        match render_system.render(self.driver.frame(), frame_num) {
            Ok(()) => {}
            Err(RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                render_system.reconfigure();
            }
            Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => warn!("Render error: {}", e),
        }

        self.update_title();
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title("vibescope")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ))
            .with_resizable(self.recording_config.is_none());

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let render_system = match pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            self.recording_config.clone(),
        )) {
            Ok(render_system) => render_system,
            Err(e) => {
                error!("Failed to initialize rendering: {}", e);
                event_loop.exit();
                return;
            }
        };

        let (width, height) = render_system.size();
        self.driver.on_resize(width, height);

        self.window = Some(window);
        self.render_system = Some(render_system);

        if let Some(startup) = self.startup.take() {
            self.connect_startup_source(startup);
        }

        info!("Keys: 1/2/3 style, Space play/pause, M mic, F file, Left/Right seek, Esc quit");
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(size.width, size.height);
                }
                self.driver.on_resize(size.width, size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(key),
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(key, event_loop),
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut app = App::new(&args)?;
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
