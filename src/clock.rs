//! Frame timing sources for the animation loop.

use std::time::{Duration, Instant};

/// Supplies the elapsed time of each successive frame
pub trait FrameClock {
    /// Elapsed time for the next frame, or `None` when the loop should stop
    fn next_frame(&mut self) -> Option<Duration>;
}

/// Real time since construction; never stops
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for WallClock {
    fn next_frame(&mut self) -> Option<Duration> {
        Some(self.elapsed())
    }
}

/// Deterministic clock advancing by a fixed step, for recording and tests
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    step: Duration,
    frame: u32,
    remaining: usize,
}

impl FixedStepClock {
    /// Step of `1/fps`, running for `frames` frames
    pub fn new(fps: u32, frames: usize) -> Self {
        Self {
            step: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            frame: 0,
            remaining: frames,
        }
    }

    /// Frames handed out so far
    pub fn frame(&self) -> u32 {
        self.frame
    }
}

impl FrameClock for FixedStepClock {
    fn next_frame(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let elapsed = self.step * self.frame;
        self.frame += 1;
        Some(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_sequence() {
        let mut clock = FixedStepClock::new(4, 3);
        assert_eq!(clock.next_frame(), Some(Duration::ZERO));
        assert_eq!(clock.next_frame(), Some(Duration::from_millis(250)));
        assert_eq!(clock.next_frame(), Some(Duration::from_millis(500)));
        assert_eq!(clock.next_frame(), None);
        assert_eq!(clock.frame(), 3);
    }

    #[test]
    fn test_wall_clock_is_monotonic() {
        let mut clock = WallClock::new();
        let a = clock.next_frame().unwrap();
        let b = clock.next_frame().unwrap();
        assert!(b >= a);
    }
}
