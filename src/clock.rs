//! Frame timing

use std::time::Instant;

/// Frames longer than this are reported, they usually mean a suspended process
const SUSPENDED_FRAME: f32 = 1.0;

/// Bring a reported timestep into `[0, max_dt]`
///
/// Negative and non-finite timesteps become 0, long ones become `max_dt`.
pub fn clamp_dt(dt: f32, max_dt: f32) -> f32 {
    if !dt.is_finite() || dt < 0.0 {
        log::warn!("Discarding invalid timestep {dt}s");
        return 0.0;
    }
    if dt > SUSPENDED_FRAME {
        log::warn!("Frame took {dt}s, clamping timestep to {max_dt}s");
    }
    dt.min(max_dt)
}

/// Measures the time elapsed between consecutive frames
#[derive(Clone, Debug)]
pub struct FrameClock {
    last: Option<Instant>,
    max_dt: f32,
}

impl FrameClock {
    pub fn new(max_dt: f32) -> Self {
        Self { last: None, max_dt }
    }

    /// Clamped time since the previous tick, 0 on the first tick
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Like [`tick()`](Self::tick), at a caller-provided instant
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last = Some(now);
        clamp_dt(dt, self.max_dt)
    }
}
