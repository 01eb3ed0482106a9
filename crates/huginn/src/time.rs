//! Frame timing helpers for the external driver loop.
//!
//! The core itself only consumes a delta-time scalar; these types are how a
//! driver produces one. [`Time`] measures real frame deltas from a monotonic
//! clock, and [`FixedStep`] converts those variable deltas into a stream of
//! fixed-size simulation steps.

use std::time::{Duration, Instant};

/// Wall-clock frame timing. Call [`update`](Time::update) once at the top of
/// each frame and feed the returned delta to the simulation.
pub struct Time {
    last: Instant,
    delta: Duration,
    elapsed: Duration,
    frames: u64,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frames: 0,
        }
    }

    /// Advance to the current instant and return the frame delta in seconds.
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        self.delta = now - self.last;
        self.last = now;
        self.elapsed += self.delta;
        self.frames += 1;
        self.delta.as_secs_f32()
    }

    /// Duration of the previous frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Previous frame's delta in seconds.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Total time accumulated across all [`update`](Time::update) calls.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Number of frames measured so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Estimated FPS from the last frame's delta.
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates variable frame deltas and releases them as whole fixed-size
/// steps, carrying the remainder forward.
///
/// # Example
///
/// ```
/// use huginn::time::FixedStep;
///
/// let mut stepper = FixedStep::new(0.01);
/// let steps = stepper.advance(0.035); // a 35 ms frame at 10 ms steps
/// assert_eq!(steps, 3);
/// ```
pub struct FixedStep {
    step: f32,
    accumulator: f32,
}

impl FixedStep {
    /// # Panics
    ///
    /// Panics if `step` is not a positive number of seconds.
    pub fn new(step: f32) -> Self {
        assert!(step > 0.0, "fixed step must be a positive number of seconds");
        Self {
            step,
            accumulator: 0.0,
        }
    }

    /// A stepper running at `hz` steps per second.
    pub fn from_hz(hz: f32) -> Self {
        Self::new(1.0 / hz)
    }

    /// Add a frame's delta and return how many whole steps are now due.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }

    /// The step size in seconds. Pass this as `dt` for each released step.
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Accumulated time not yet big enough for a step.
    pub fn remainder(&self) -> f32 {
        self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_frames_release_no_steps() {
        let mut stepper = FixedStep::new(0.1);
        assert_eq!(stepper.advance(0.04), 0);
        assert_eq!(stepper.advance(0.04), 0);
        // 0.12 accumulated by now.
        assert_eq!(stepper.advance(0.04), 1);
    }

    #[test]
    fn long_frames_release_several_steps() {
        let mut stepper = FixedStep::new(0.01);
        assert_eq!(stepper.advance(0.035), 3);
        assert!(stepper.remainder() < 0.01);
    }

    #[test]
    fn remainder_carries_forward() {
        let mut stepper = FixedStep::new(1.0);
        stepper.advance(0.75);
        assert_eq!(stepper.remainder(), 0.75);
        assert_eq!(stepper.advance(0.25), 1);
        assert_eq!(stepper.remainder(), 0.0);
    }

    #[test]
    #[should_panic(expected = "positive")]
    fn zero_step_panics() {
        FixedStep::new(0.0);
    }

    #[test]
    fn time_counts_frames() {
        let mut time = Time::new();
        let dt = time.update();
        assert!(dt >= 0.0);
        time.update();
        assert_eq!(time.frames(), 2);
        assert!(time.elapsed() >= time.delta());
    }
}
