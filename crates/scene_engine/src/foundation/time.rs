//! Time management utilities

use std::time::Instant;

/// Frame timer driven by a millisecond tick counter
///
/// Delta time is the difference between two whole-millisecond ticks, so a
/// frame shorter than one millisecond reports a delta of zero.
pub struct Timer {
    start: Instant,
    last_ticks: u64,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last_ticks: 0,
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Milliseconds elapsed since the timer was created
    pub fn ticks(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Update the timer (should be called once per frame)
    ///
    /// Returns the new delta time in seconds.
    pub fn update(&mut self) -> f32 {
        let ticks = self.ticks();
        self.advance_to(ticks)
    }

    fn advance_to(&mut self, ticks: u64) -> f32 {
        let elapsed_ms = ticks.saturating_sub(self.last_ticks);
        self.delta_time = elapsed_ms as f32 * 0.001;
        self.total_time += self.delta_time;
        self.last_ticks = ticks;
        self.frame_count += 1;
        self.delta_time
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time accumulated by `update`
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}
