//! Analysis tap shared between an audio callback and the frame loop.
//!
//! The audio thread pushes mono samples; the frame loop copies out the most
//! recent window. A tap belongs to exactly one connection: once it is
//! disconnected it ignores further pushes and reads back silence, so a
//! stale callback can never leak samples into a newer source.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::params::AnalysisConfig;

static NEXT_TAP_ID: AtomicU64 = AtomicU64::new(1);

/// Fixed-size ring of the latest `window_size` samples
#[derive(Debug)]
struct SampleRing {
    samples: Vec<f32>,
    write: usize,
}

impl SampleRing {
    fn push(&mut self, sample: f32) {
        self.samples[self.write] = sample;
        self.write = (self.write + 1) % self.samples.len();
    }
}

/// Receiving end of an analysis connection
#[derive(Debug)]
pub struct AnalysisTap {
    id: u64,
    window_size: usize,
    connected: AtomicBool,
    ring: Mutex<SampleRing>,
}

impl AnalysisTap {
    fn new(window_size: usize) -> Self {
        Self {
            id: NEXT_TAP_ID.fetch_add(1, Ordering::Relaxed),
            window_size,
            connected: AtomicBool::new(true),
            ring: Mutex::new(SampleRing {
                samples: vec![0.0; window_size],
                write: 0,
            }),
        }
    }

    fn ring(&self) -> MutexGuard<'_, SampleRing> {
        // A panicking audio callback must not take the frame loop down with it
        self.ring.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Push mono samples (no-op once disconnected)
    pub fn push(&self, samples: &[f32]) {
        if !self.is_connected() {
            return;
        }
        let mut ring = self.ring();
        for &sample in samples {
            ring.push(sample);
        }
    }

    /// Push interleaved frames, mixing all channels down to mono
    pub fn push_interleaved(&self, data: &[f32], channels: usize) {
        if !self.is_connected() || channels == 0 {
            return;
        }
        let mut ring = self.ring();
        let scale = 1.0 / channels as f32;
        for frame in data.chunks_exact(channels) {
            ring.push(frame.iter().sum::<f32>() * scale);
        }
    }

    /// Copy the most recent `out.len()` samples, oldest first.
    ///
    /// Reads silence when disconnected. `out` longer than the window is
    /// zero-padded at the front.
    pub fn copy_latest(&self, out: &mut [f32]) {
        out.fill(0.0);
        if !self.is_connected() {
            return;
        }
        let ring = self.ring();
        let len = ring.samples.len();
        let count = out.len().min(len);
        let offset = out.len() - count;
        let start = (ring.write + len - count) % len;
        for (i, slot) in out[offset..].iter_mut().enumerate() {
            *slot = ring.samples[(start + i) % len];
        }
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }
}

/// Handle returned by `SignalSource::connect_analysis`
#[derive(Debug, Clone)]
pub struct AnalysisHandle {
    tap: Arc<AnalysisTap>,
    config: AnalysisConfig,
}

impl AnalysisHandle {
    /// Open a fresh connection sized for `config`
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            tap: Arc::new(AnalysisTap::new(config.window_size)),
            config,
        }
    }

    pub fn id(&self) -> u64 {
        self.tap.id()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Shared tap for the producing audio callback
    pub fn tap(&self) -> Arc<AnalysisTap> {
        Arc::clone(&self.tap)
    }

    pub fn is_connected(&self) -> bool {
        self.tap.is_connected()
    }

    /// Sever the connection. Every clone of this handle observes it.
    pub fn disconnect(&self) {
        self.tap.disconnect();
    }
}
