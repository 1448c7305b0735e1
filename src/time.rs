//! Frame timing.
//!
//! [`Time`] is the single clock of the frame loop: it yields the elapsed
//! time since start and the delta since the previous tick. The very first
//! tick reports a delta of zero.
//!
//! # Example
//!
//! ```ignore
//! use gpgpu_flow::time::Time;
//!
//! let mut time = Time::new();
//!
//! // In your frame loop:
//! let (elapsed, delta) = time.update();
//! log::trace!("t={:.2}s dt={:.4}s frame={}", elapsed, delta, time.frame());
//! ```

use std::time::{Duration, Instant};

/// Time tracking for the frame loop.
#[derive(Debug)]
pub struct Time {
    /// When the timer was created.
    start: Instant,
    /// When the last tick occurred; `None` before the first tick.
    last_frame: Option<Instant>,
    /// Total elapsed time in seconds, excluding paused spans.
    elapsed_secs: f32,
    /// Time since last tick in seconds.
    delta_secs: f32,
    /// Total ticks since start.
    frame_count: u64,
    paused: bool,
    /// Accumulated time spent paused.
    pause_elapsed: Duration,
    /// Fixed delta time for deterministic stepping (optional).
    fixed_delta: Option<f32>,
}

impl Time {
    /// Create a new time tracker starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: None,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            paused: false,
            pause_elapsed: Duration::ZERO,
            fixed_delta: None,
        }
    }

    /// Advance the clock. Call once per frame.
    ///
    /// Returns `(elapsed_time, delta_time)`.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();

        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, self.delta_secs);
        }

        self.delta_secs = match self.last_frame {
            None => 0.0,
            Some(last) => self
                .fixed_delta
                .unwrap_or_else(|| now.duration_since(last).as_secs_f32()),
        };
        self.last_frame = Some(now);

        self.elapsed_secs = match self.fixed_delta {
            Some(_) => self.elapsed_secs + self.delta_secs,
            None => (now.duration_since(self.start) - self.pause_elapsed).as_secs_f32(),
        };

        self.frame_count += 1;

        (self.elapsed_secs, self.delta_secs)
    }

    /// Total elapsed time in seconds since start.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Time since last tick in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total ticks since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause time progression.
    ///
    /// While paused, `delta()` is 0 and `elapsed()` stops increasing, so
    /// the flow field freezes.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume time progression after pausing.
    pub fn resume(&mut self) {
        if self.paused {
            let now = Instant::now();
            if let Some(last) = self.last_frame {
                self.pause_elapsed += now.duration_since(last);
                self.last_frame = Some(now);
            }
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Use a fixed delta for every tick after the first.
    ///
    /// Pass `None` to go back to wall-clock timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_time_new() {
        let time = Time::new();
        assert_eq!(time.frame(), 0);
        assert!(!time.is_paused());
    }

    #[test]
    fn test_first_tick_has_zero_delta() {
        let mut time = Time::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = time.update();

        assert!(elapsed > 0.0);
        assert_eq!(delta, 0.0);
        assert_eq!(time.frame(), 1);
    }

    #[test]
    fn test_second_tick_has_delta() {
        let mut time = Time::new();
        time.update();
        thread::sleep(Duration::from_millis(10));
        let (_, delta) = time.update();
        assert!(delta > 0.0);
    }

    #[test]
    fn test_time_pause() {
        let mut time = Time::new();
        time.update();

        time.pause();
        assert!(time.is_paused());

        let elapsed_before = time.elapsed();
        thread::sleep(Duration::from_millis(10));
        time.update();

        assert_eq!(time.elapsed(), elapsed_before);
        assert_eq!(time.delta(), 0.0);
    }

    #[test]
    fn test_fixed_delta() {
        let mut time = Time::new();
        time.set_fixed_delta(Some(1.0 / 60.0));

        time.update();
        thread::sleep(Duration::from_millis(50));
        time.update();

        let expected = 1.0 / 60.0;
        assert!((time.delta() - expected).abs() < 0.0001);
        assert!((time.elapsed() - expected).abs() < 0.0001);
    }
}
