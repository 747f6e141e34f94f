//! Per-frame sampling of the active analysis connection.

use log::trace;

use super::fft::{time_domain_bytes, Analyser};
use super::tap::AnalysisHandle;
use crate::error::SourceError;

/// Which view of the signal a buffer holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDomain {
    /// One magnitude per frequency bin, low to high
    Frequency,
    /// Amplitude samples over one window, 128 = silence
    Time,
}

/// Fixed-length byte buffer produced fresh every frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    values: Vec<u8>,
    domain: SampleDomain,
}

impl SampleBuffer {
    /// Zeroed buffer of `len` entries
    pub fn new(len: usize, domain: SampleDomain) -> Self {
        let fill = match domain {
            SampleDomain::Frequency => 0,
            SampleDomain::Time => 128,
        };
        Self {
            values: vec![fill; len],
            domain,
        }
    }

    pub fn from_values(domain: SampleDomain, values: Vec<u8>) -> Self {
        Self { values, domain }
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn domain(&self) -> SampleDomain {
        self.domain
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all entries (diagnostics only)
    pub fn magnitude_sum(&self) -> u32 {
        self.values.iter().map(|&v| v as u32).sum()
    }
}

/// Pulls one sample buffer per frame from an analysis connection.
///
/// Owns a single buffer sized to the connection's `window_size / 2`; every
/// `pull` overwrites it in place and hands back a borrow, so the renderer
/// cannot hold on to it past the frame.
pub struct SpectralSampler {
    handle: AnalysisHandle,
    analyser: Analyser,
    window: Vec<f32>,
    buffer: SampleBuffer,
}

impl SpectralSampler {
    pub fn new(handle: AnalysisHandle) -> Result<Self, SourceError> {
        let config = handle.config().clone();
        let analyser = Analyser::new(config.clone())?;

        Ok(Self {
            window: vec![0.0; config.window_size],
            buffer: SampleBuffer::new(config.buffer_len(), SampleDomain::Frequency),
            analyser,
            handle,
        })
    }

    pub fn handle(&self) -> &AnalysisHandle {
        &self.handle
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Read the current analysis state into the shared buffer
    pub fn pull(&mut self, domain: SampleDomain) -> &SampleBuffer {
        self.handle.tap().copy_latest(&mut self.window);

        match domain {
            SampleDomain::Frequency => {
                self.analyser
                    .frequency_bytes(&self.window, &mut self.buffer.values)
            }
            SampleDomain::Time => time_domain_bytes(&self.window, &mut self.buffer.values),
        }
        self.buffer.domain = domain;

        let sum = self.buffer.magnitude_sum();
        if sum > 0 {
            trace!("tap {}: {:?} magnitude sum {}", self.handle.id(), domain, sum);
        }

        &self.buffer
    }
}
