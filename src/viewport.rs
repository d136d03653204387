//! Display size tracking and display-to-field resolution mapping

use glam::UVec2;

/// Field resolution whose shorter side is `short_side` cells and whose aspect
/// ratio matches `display`
///
/// Degenerate (zero-sized) displays are treated as square.
pub fn resolution_for(display: UVec2, short_side: u32) -> [u32; 2] {
    let display = display.max(UVec2::ONE);
    let short_side = short_side.max(1);
    let aspect = display.x as f32 / display.y as f32;
    let long_side = |ratio: f32| (short_side as f32 * ratio).round().max(1.0) as u32;
    if aspect >= 1.0 {
        [long_side(aspect), short_side]
    } else {
        [short_side, long_side(aspect.recip())]
    }
}

/// Remembers the last display size to detect resizes
#[derive(Clone, Debug, Default)]
pub struct DisplayTracker {
    current: Option<UVec2>,
}

impl DisplayTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest display size, returns true if it changed
    pub fn update(&mut self, size: UVec2) -> bool {
        let changed = self.current != Some(size);
        self.current = Some(size);
        changed
    }

    pub fn current(&self) -> Option<UVec2> {
        self.current
    }
}
