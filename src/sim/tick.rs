//! Fixed timestep driving
//!
//! The frame loop owns wall-clock time; the simulation only ever sees whole
//! ticks. `FrameClock` converts elapsed frame time into a tick count.

use glam::Vec2;

/// Input polled for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Directional keys held
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Pointer position in screen space
    pub pointer: Option<Vec2>,
    /// Fire button held
    pub trigger: bool,
}

/// Fixed-step accumulator
///
/// Catch-up is uncapped: a long frame yields as many ticks as it covers, so
/// outcomes depend only on total elapsed time and never on frame pacing.
#[derive(Debug, Clone)]
pub struct FrameClock {
    timestep: f32,
    accumulator: f32,
}

impl FrameClock {
    pub fn new(timestep: f32) -> Self {
        Self {
            timestep,
            accumulator: 0.0,
        }
    }

    #[inline]
    pub fn timestep(&self) -> f32 {
        self.timestep
    }

    /// Time carried into the next frame (always below one timestep)
    #[inline]
    pub fn remainder(&self) -> f32 {
        self.accumulator
    }

    /// Add a frame's elapsed time and return how many ticks it pays for
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.max(0.0);
        let mut ticks = 0;
        while self.accumulator >= self.timestep {
            self.accumulator -= self.timestep;
            ticks += 1;
        }
        ticks
    }
}
