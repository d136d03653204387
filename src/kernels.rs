//! Per-cell functions run by the pass executor
//!
//! Each kernel computes one output cell from a consistent snapshot of its
//! input grids, so cells can be evaluated in any order or in parallel. Inputs
//! and scalar parameters are declared by name in the kernel's
//! [`KernelSignature`]; the executor resolves them to positional slots once per
//! pass, in signature order.

use crate::grid::Grid;
use glam::{UVec2, Vec2, Vec4, Vec4Swizzles};

/// Binding names shared by kernel signatures and the passes that feed them
pub mod names {
    pub const VELOCITY: &str = "velocity";
    pub const SOURCE: &str = "source";
    pub const CURL: &str = "curl";
    pub const PRESSURE: &str = "pressure";
    pub const DIVERGENCE: &str = "divergence";
    pub const TARGET: &str = "target";
    pub const IMPULSE: &str = "impulse";

    pub const DT: &str = "dt";
    pub const DISSIPATION: &str = "dissipation";
    pub const GRID_SCALE: &str = "grid_scale";
    pub const INV_GRID_SCALE: &str = "inv_grid_scale";
    pub const GRID_SCALE_SQ: &str = "grid_scale_sq";
    pub const CURL_STRENGTH: &str = "curl_strength";
    pub const BLEND_MAX: &str = "blend_max";
}

use names::*;

/// Gradients of |curl| shorter than this are treated as zero
pub const VORTICITY_EPSILON: f32 = 1e-5;

/// Identifies one of the built-in kernels
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum KernelId {
    /// Semi-Lagrangian transport of `source` along `velocity`, with decay
    Advect,
    /// Scalar vorticity of the velocity field
    Curl,
    /// Vorticity confinement force applied to the velocity field
    Vorticity,
    /// Adds (or max-blends) an impulse grid onto a field
    ApplyImpulse,
    /// Discrete divergence of the velocity field
    Divergence,
    /// One Jacobi iteration of the pressure Poisson equation
    Jacobi,
    /// Subtracts the pressure gradient from the velocity field
    GradientSubtract,
}

impl KernelId {
    pub const ALL: [KernelId; 7] = [
        Self::Advect,
        Self::Curl,
        Self::Vorticity,
        Self::ApplyImpulse,
        Self::Divergence,
        Self::Jacobi,
        Self::GradientSubtract,
    ];

    /// Statically declared bindings of this kernel
    pub fn signature(self) -> &'static KernelSignature {
        match self {
            Self::Advect => &ADVECT,
            Self::Curl => &CURL_SIGNATURE,
            Self::Vorticity => &VORTICITY,
            Self::ApplyImpulse => &APPLY_IMPULSE,
            Self::Divergence => &DIVERGENCE_SIGNATURE,
            Self::Jacobi => &JACOBI,
            Self::GradientSubtract => &GRADIENT_SUBTRACT,
        }
    }

    /// Per-cell function implementing this kernel
    pub fn function(self) -> CellFn {
        match self {
            Self::Advect => advect,
            Self::Curl => curl,
            Self::Vorticity => vorticity,
            Self::ApplyImpulse => apply_impulse,
            Self::Divergence => divergence,
            Self::Jacobi => jacobi,
            Self::GradientSubtract => gradient_subtract,
        }
    }
}

/// Names of the grids and scalars a kernel reads
#[derive(Debug)]
pub struct KernelSignature {
    pub inputs: &'static [&'static str],
    pub params: &'static [&'static str],
    /// Inputs sampled cell for cell; the first one sets the output
    /// resolution and the others must match it
    pub output_like: &'static [&'static str],
}

impl KernelSignature {
    /// Position of an input binding
    pub fn input_slot(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|n| *n == name)
    }

    /// Position of a parameter binding
    pub fn param_slot(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|n| *n == name)
    }
}

const ADVECT: KernelSignature = KernelSignature {
    inputs: &[VELOCITY, SOURCE],
    params: &[DT, INV_GRID_SCALE, DISSIPATION],
    output_like: &[SOURCE],
};

const CURL_SIGNATURE: KernelSignature = KernelSignature {
    inputs: &[VELOCITY],
    params: &[INV_GRID_SCALE],
    output_like: &[VELOCITY],
};

const VORTICITY: KernelSignature = KernelSignature {
    inputs: &[VELOCITY, CURL],
    params: &[DT, CURL_STRENGTH, GRID_SCALE, INV_GRID_SCALE],
    output_like: &[VELOCITY, CURL],
};

const APPLY_IMPULSE: KernelSignature = KernelSignature {
    inputs: &[TARGET, IMPULSE],
    params: &[BLEND_MAX],
    output_like: &[TARGET, IMPULSE],
};

const DIVERGENCE_SIGNATURE: KernelSignature = KernelSignature {
    inputs: &[VELOCITY],
    params: &[INV_GRID_SCALE],
    output_like: &[VELOCITY],
};

const JACOBI: KernelSignature = KernelSignature {
    inputs: &[PRESSURE, DIVERGENCE],
    params: &[GRID_SCALE_SQ],
    output_like: &[PRESSURE, DIVERGENCE],
};

const GRADIENT_SUBTRACT: KernelSignature = KernelSignature {
    inputs: &[VELOCITY, PRESSURE],
    params: &[INV_GRID_SCALE],
    output_like: &[VELOCITY, PRESSURE],
};

/// Inputs of one pass, resolved to signature order
pub struct KernelArgs<'a> {
    pub inputs: Vec<&'a Grid>,
    pub params: Vec<f32>,
    pub output_size: UVec2,
}

impl KernelArgs<'_> {
    #[inline]
    fn input(&self, slot: usize) -> &Grid {
        self.inputs[slot]
    }

    #[inline]
    fn param(&self, slot: usize) -> f32 {
        self.params[slot]
    }
}

/// Per-cell kernel entry point
pub type CellFn = fn(&KernelArgs<'_>, u32, u32) -> Vec4;

#[inline]
fn scalar(value: f32) -> Vec4 {
    Vec4::new(value, 0.0, 0.0, 0.0)
}

#[inline]
fn vector(value: Vec2) -> Vec4 {
    value.extend(0.0).extend(0.0)
}

fn advect(args: &KernelArgs<'_>, x: u32, y: u32) -> Vec4 {
    let velocity = args.input(0);
    let source = args.input(1);
    let dt = args.param(0);
    let inv_grid_scale = args.param(1);
    let dissipation = args.param(2);

    // Output cells may be finer than velocity cells (dye vs velocity grids)
    let to_velocity = velocity.size().as_vec2() / args.output_size.as_vec2();
    let pos = Vec2::new(x as f32, y as f32);
    let velocity_pos = (pos + 0.5) * to_velocity - 0.5;
    let v = velocity.sample_bilinear(velocity_pos).xy();

    let traced = pos - dt * v * inv_grid_scale / to_velocity;
    source.sample_bilinear(traced) * dissipation
}

fn curl(args: &KernelArgs<'_>, x: u32, y: u32) -> Vec4 {
    let v = args.input(0);
    let inv_grid_scale = args.param(0);
    let (x, y) = (x as i32, y as i32);

    let value = v.fetch(x + 1, y).y - v.fetch(x - 1, y).y - v.fetch(x, y + 1).x
        + v.fetch(x, y - 1).x;
    scalar(0.5 * inv_grid_scale * value)
}

fn vorticity(args: &KernelArgs<'_>, x: u32, y: u32) -> Vec4 {
    let velocity = args.input(0);
    let curl = args.input(1);
    let dt = args.param(0);
    let curl_strength = args.param(1);
    let grid_scale = args.param(2);
    let inv_grid_scale = args.param(3);
    let (xi, yi) = (x as i32, y as i32);

    let magnitude = |dx, dy| curl.fetch(xi + dx, yi + dy).x.abs();
    let gradient = 0.5
        * inv_grid_scale
        * Vec2::new(
            magnitude(1, 0) - magnitude(-1, 0),
            magnitude(0, 1) - magnitude(0, -1),
        );
    let length = gradient.length();
    let normal = if length < VORTICITY_EPSILON {
        Vec2::ZERO
    } else {
        gradient / length
    };

    let omega = curl.fetch(xi, yi).x;
    let force = curl_strength * grid_scale * omega * Vec2::new(normal.y, -normal.x);
    velocity.fetch(xi, yi) + vector(force * dt)
}

fn apply_impulse(args: &KernelArgs<'_>, x: u32, y: u32) -> Vec4 {
    let target = args.input(0).get(x, y);
    let impulse = args.input(1).get(x, y);
    if args.param(0) > 0.5 {
        target.max(impulse)
    } else {
        target + impulse
    }
}

fn divergence(args: &KernelArgs<'_>, x: u32, y: u32) -> Vec4 {
    let v = args.input(0);
    let inv_grid_scale = args.param(0);
    let (x, y) = (x as i32, y as i32);

    let value = v.fetch(x + 1, y).x - v.fetch(x - 1, y).x + v.fetch(x, y + 1).y
        - v.fetch(x, y - 1).y;
    scalar(0.5 * inv_grid_scale * value)
}

fn jacobi(args: &KernelArgs<'_>, x: u32, y: u32) -> Vec4 {
    let p = args.input(0);
    let div = args.input(1);
    let grid_scale_sq = args.param(0);
    let (x, y) = (x as i32, y as i32);

    let neighbors = p.fetch(x - 1, y).x + p.fetch(x + 1, y).x + p.fetch(x, y - 1).x
        + p.fetch(x, y + 1).x;
    scalar(0.25 * (neighbors - grid_scale_sq * div.fetch(x, y).x))
}

fn gradient_subtract(args: &KernelArgs<'_>, x: u32, y: u32) -> Vec4 {
    let velocity = args.input(0);
    let p = args.input(1);
    let inv_grid_scale = args.param(0);
    let (x, y) = (x as i32, y as i32);

    let gradient = 0.5
        * inv_grid_scale
        * Vec2::new(
            p.fetch(x + 1, y).x - p.fetch(x - 1, y).x,
            p.fetch(x, y + 1).x - p.fetch(x, y - 1).x,
        );
    velocity.fetch(x, y) - vector(gradient)
}
