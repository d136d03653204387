//! Localized velocity/dye impulses from user interaction
//!
//! Splats are rasterized as soon as they are injected, into impulse grids that
//! mirror the velocity and dye fields. Overlapping splats simply add up. The
//! step pipeline later folds each impulse grid into its field with a single
//! pass, then clears it.

use crate::error::ConfigError;
use crate::grid::{ChannelFormat, Grid};
use glam::{UVec2, Vec2, Vec4};
use serde::{Deserialize, Serialize};

/// Splats are truncated beyond this many radii, where exp(-9) is negligible
const CUTOFF_RADII: f32 = 3.0;

/// How a dye impulse combines with the dye already present
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DyeBlend {
    /// `dye + impulse`
    #[default]
    Additive,
    /// Per-channel `max(dye, impulse)`
    Max,
}

/// One interaction impulse
///
/// `point` and `radius` are expressed in velocity-grid cells, `direction` in
/// the velocity field's units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Splat {
    pub point: Vec2,
    pub direction: Vec2,
    pub radius: f32,
    pub color: Option<Vec4>,
}

impl Splat {
    /// Velocity-only splat
    pub fn force(point: Vec2, direction: Vec2, radius: f32) -> Self {
        Self {
            point,
            direction,
            radius,
            color: None,
        }
    }

    /// Add some dye to this splat
    pub fn with_color(self, color: Vec4) -> Self {
        Self {
            color: Some(color),
            ..self
        }
    }
}

/// Inclusive cell bounds touched since the last clear
#[derive(Copy, Clone, Debug, PartialEq)]
struct Dirty {
    min: UVec2,
    max: UVec2,
}

impl Dirty {
    fn union(this: Option<Self>, min: UVec2, max: UVec2) -> Option<Self> {
        Some(match this {
            Some(dirty) => Self {
                min: dirty.min.min(min),
                max: dirty.max.max(max),
            },
            None => Self { min, max },
        })
    }
}

/// Accumulates the splats of one frame
#[derive(Clone, Debug)]
pub struct SplatInjector {
    velocity_impulse: Grid,
    dye_impulse: Grid,
    velocity_dirty: Option<Dirty>,
    dye_dirty: Option<Dirty>,
    pending: usize,
}

impl SplatInjector {
    pub fn new(velocity_resolution: [u32; 2], dye_resolution: [u32; 2]) -> Result<Self, ConfigError> {
        let [vw, vh] = velocity_resolution;
        let [dw, dh] = dye_resolution;
        Ok(Self {
            velocity_impulse: Grid::new(vw, vh, ChannelFormat::Rg)?,
            dye_impulse: Grid::new(dw, dh, ChannelFormat::Rgba)?,
            velocity_dirty: None,
            dye_dirty: None,
            pending: 0,
        })
    }

    /// Number of splats accumulated since the last clear
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn has_velocity(&self) -> bool {
        self.velocity_dirty.is_some()
    }

    pub fn has_dye(&self) -> bool {
        self.dye_dirty.is_some()
    }

    pub fn velocity_impulse(&self) -> &Grid {
        &self.velocity_impulse
    }

    pub fn dye_impulse(&self) -> &Grid {
        &self.dye_impulse
    }

    /// Rasterize a splat into the impulse grids
    ///
    /// Splats with a non-positive or non-finite radius, or a non-finite
    /// position, have no effect.
    pub fn inject(&mut self, splat: Splat) {
        if !(splat.radius.is_finite() && splat.radius > 0.0) || !splat.point.is_finite() {
            log::warn!("Ignoring degenerate splat {splat:?}");
            return;
        }
        self.pending += 1;

        if splat.direction != Vec2::ZERO && splat.direction.is_finite() {
            let value = splat.direction.extend(0.0).extend(0.0);
            let bounds = rasterize(&mut self.velocity_impulse, &splat, Vec2::ONE, value);
            if let Some((min, max)) = bounds {
                self.velocity_dirty = Dirty::union(self.velocity_dirty, min, max);
            }
        }

        if let Some(color) = splat.color.filter(|c| c.is_finite() && *c != Vec4::ZERO) {
            let scale = self.dye_impulse.size().as_vec2() / self.velocity_impulse.size().as_vec2();
            let bounds = rasterize(&mut self.dye_impulse, &splat, scale, color);
            if let Some((min, max)) = bounds {
                self.dye_dirty = Dirty::union(self.dye_dirty, min, max);
            }
        }
    }

    /// Reset the impulse grids once the pipeline has consumed them
    pub fn clear(&mut self) {
        for (grid, dirty) in [
            (&mut self.velocity_impulse, self.velocity_dirty.take()),
            (&mut self.dye_impulse, self.dye_dirty.take()),
        ] {
            if let Some(Dirty { min, max }) = dirty {
                for y in min.y..=max.y {
                    for x in min.x..=max.x {
                        grid.set(x, y, Vec4::ZERO);
                    }
                }
            }
        }
        self.pending = 0;
    }
}

/// Add `value * exp(-d²/r²)` around the splat center into `grid`
///
/// `scale` maps velocity-grid cells to `grid` cells. Distances are measured
/// in velocity cells so that both fields see the same footprint. Returns the
/// touched cell bounds, if any.
fn rasterize(grid: &mut Grid, splat: &Splat, scale: Vec2, value: Vec4) -> Option<(UVec2, UVec2)> {
    let center = (splat.point + 0.5) * scale - 0.5;
    let extent = CUTOFF_RADII * splat.radius * scale;
    let last = grid.size().as_vec2() - 1.0;

    let lo = (center - extent).ceil().max(Vec2::ZERO);
    let hi = (center + extent).floor().min(last);
    if lo.x > hi.x || lo.y > hi.y {
        return None;
    }
    let (lo, hi) = (lo.as_uvec2(), hi.as_uvec2());

    let inv_radius_sq = 1.0 / (splat.radius * splat.radius);
    for y in lo.y..=hi.y {
        for x in lo.x..=hi.x {
            let offset = (Vec2::new(x as f32, y as f32) - center) / scale;
            let weight = (-offset.length_squared() * inv_radius_sq).exp();
            let current = grid.get(x, y);
            grid.set(x, y, current + value * weight);
        }
    }
    Some((lo, hi))
}
