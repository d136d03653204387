//! Conversion of pointer interaction into splats

use crate::splat::Splat;
use glam::{UVec2, Vec2, Vec4};
use rand::Rng;

/// Squared pointer travel, in display pixels, beyond which a press becomes a drag
pub const DRAG_THRESHOLD_SQ: f32 = 9.0;

/// Dye brightness of pointer splats
const DYE_INTENSITY: f32 = 0.8;

/// Colors cycled through, one per gesture
const PALETTE: [Vec4; 6] = [
    Vec4::new(1.0, 0.0, 0.0, 1.0),
    Vec4::new(0.0, 1.0, 0.0, 1.0),
    Vec4::new(0.0, 0.0, 1.0, 1.0),
    Vec4::new(1.0, 1.0, 0.0, 1.0),
    Vec4::new(1.0, 0.0, 1.0, 1.0),
    Vec4::new(0.0, 1.0, 1.0, 1.0),
];

/// Pointer state reported by the windowing layer, in display pixels
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerEvent {
    pub position: Vec2,
    pub delta: Vec2,
    pub active: bool,
}

/// Map a display-pixel position to velocity-grid cell coordinates
pub fn display_to_field(position: Vec2, display: UVec2, field: UVec2) -> Vec2 {
    let display = display.max(UVec2::ONE).as_vec2();
    position / display * field.as_vec2() - 0.5
}

/// Turns a stream of pointer events into per-frame splats
#[derive(Clone, Debug)]
pub struct PointerTracker {
    radius: f32,
    force: f32,
    press_origin: Option<Vec2>,
    dragging: bool,
    gesture: usize,
    pending: Vec<Splat>,
}

impl PointerTracker {
    /// `radius` is in velocity cells, `force` scales pointer motion (in
    /// velocity cells per event) into splat velocity
    pub fn new(radius: f32, force: f32) -> Self {
        Self {
            radius,
            force,
            press_origin: None,
            dragging: false,
            gesture: 0,
            pending: Vec::new(),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn color(&self) -> Vec4 {
        PALETTE[self.gesture % PALETTE.len()] * DYE_INTENSITY
    }

    /// Feed one pointer event
    ///
    /// Presses that end without moving past [`DRAG_THRESHOLD_SQ`] leave a
    /// motionless dye droplet, drags push the fluid along the pointer's path.
    pub fn handle(&mut self, event: PointerEvent, display: UVec2, field: UVec2) {
        let point = display_to_field(event.position, display, field);
        match (event.active, self.press_origin) {
            (true, None) => {
                self.press_origin = Some(event.position);
                self.dragging = false;
                self.gesture += 1;
            }
            (true, Some(origin)) => {
                if (origin - event.position).length_squared() >= DRAG_THRESHOLD_SQ {
                    self.dragging = true;
                }
                if self.dragging && event.delta != Vec2::ZERO {
                    let scale = field.as_vec2() / display.max(UVec2::ONE).as_vec2();
                    let direction = event.delta * scale * self.force;
                    self.pending
                        .push(Splat::force(point, direction, self.radius).with_color(self.color()));
                }
            }
            (false, Some(_)) => {
                if !self.dragging {
                    self.pending
                        .push(Splat::force(point, Vec2::ZERO, self.radius).with_color(self.color()));
                }
                self.press_origin = None;
                self.dragging = false;
            }
            (false, None) => {}
        }
    }

    /// Splats gathered since the last call
    pub fn take_splats(&mut self) -> Vec<Splat> {
        std::mem::take(&mut self.pending)
    }
}

/// `count` splats at random positions, with random directions and hues
pub fn random_splats(
    rng: &mut impl Rng,
    count: usize,
    field: UVec2,
    radius: f32,
    max_speed: f32,
) -> Vec<Splat> {
    let size = field.as_vec2();
    (0..count)
        .map(|_| {
            let point = Vec2::new(rng.gen_range(0.0..size.x), rng.gen_range(0.0..size.y));
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let speed = rng.gen_range(0.25..=1.0) * max_speed;
            let hue = rng.gen_range(0.0..1.0);
            Splat::force(point, Vec2::from_angle(angle) * speed, radius)
                .with_color(hsv_to_rgb(hue, 1.0, 1.0) * DYE_INTENSITY)
        })
        .collect()
}

/// Opaque color from hue, saturation and value, all in [0, 1]
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> Vec4 {
    let h = hue.rem_euclid(1.0) * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - f * saturation);
    let t = value * (1.0 - (1.0 - f) * saturation);
    let (r, g, b) = match sector as u32 {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };
    Vec4::new(r, g, b, 1.0)
}
