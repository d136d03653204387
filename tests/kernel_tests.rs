use glam::{Vec2, Vec4};
use stablefluid::executor::{BindingLayout, Pass};
use stablefluid::kernels::{VORTICITY_EPSILON, names::*};
use stablefluid::{ChannelFormat, CpuExecutor, Grid, KernelId, Parallelism, PassExecutor};

const SIZE: u32 = 9;
const CENTER: f32 = 4.0;
const CELL_SIZE: f32 = 0.5;

fn executor() -> CpuExecutor {
    let mut executor = CpuExecutor::new(Parallelism::Serial);
    for kernel in KernelId::ALL {
        let signature = kernel.signature();
        let layout = BindingLayout {
            inputs: signature.inputs,
            params: signature.params,
        };
        executor.prepare(kernel, &layout).unwrap();
    }
    executor
}

/// Grid whose cell `(x, y)` holds `f` of its physical offset from the center
fn field(format: ChannelFormat, f: impl Fn(Vec2) -> Vec4) -> Grid {
    let mut grid = Grid::new(SIZE, SIZE, format).unwrap();
    for y in 0..SIZE {
        for x in 0..SIZE {
            let offset = (Vec2::new(x as f32, y as f32) - CENTER) * CELL_SIZE;
            grid.set(x, y, f(offset));
        }
    }
    grid
}

fn run(
    kernel: KernelId,
    format: ChannelFormat,
    inputs: &[(&'static str, &Grid)],
    params: &[(&'static str, f32)],
) -> Grid {
    let mut out = Grid::new(SIZE, SIZE, format).unwrap();
    executor()
        .run_pass(
            &mut out,
            &Pass {
                kernel,
                inputs,
                params,
            },
        )
        .unwrap();
    out
}

fn interior() -> impl Iterator<Item = (u32, u32)> {
    (1..SIZE - 1).flat_map(|y| (1..SIZE - 1).map(move |x| (x, y)))
}

fn solid_body_rotation(omega: f32) -> Grid {
    field(ChannelFormat::Rg, |p| Vec4::new(-omega * p.y, omega * p.x, 0.0, 0.0))
}

fn vorticity_params(dt: f32, curl_strength: f32) -> [(&'static str, f32); 4] {
    [
        (DT, dt),
        (CURL_STRENGTH, curl_strength),
        (GRID_SCALE, CELL_SIZE),
        (INV_GRID_SCALE, CELL_SIZE.recip()),
    ]
}

#[test]
fn test_solid_body_rotation_has_twice_its_angular_velocity_as_curl() {
    let omega = 0.75;
    let velocity = solid_body_rotation(omega);
    let curl = run(
        KernelId::Curl,
        ChannelFormat::R,
        &[(VELOCITY, &velocity)],
        &[(INV_GRID_SCALE, CELL_SIZE.recip())],
    );
    for (x, y) in interior() {
        let value = curl.get(x, y).x;
        assert!((value - 2.0 * omega).abs() < 1e-5, "curl at ({x}, {y}) is {value}");
    }

    // Clockwise rotation flips the sign
    let velocity = solid_body_rotation(-omega);
    let curl = run(
        KernelId::Curl,
        ChannelFormat::R,
        &[(VELOCITY, &velocity)],
        &[(INV_GRID_SCALE, CELL_SIZE.recip())],
    );
    assert!((curl.get(4, 4).x + 2.0 * omega).abs() < 1e-5);
}

#[test]
fn test_linear_expansion_divergence() {
    let velocity = field(ChannelFormat::Rg, |p| Vec4::new(1.5 * p.x, -0.25 * p.y, 0.0, 0.0));
    let divergence = run(
        KernelId::Divergence,
        ChannelFormat::R,
        &[(VELOCITY, &velocity)],
        &[(INV_GRID_SCALE, CELL_SIZE.recip())],
    );
    for (x, y) in interior() {
        let value = divergence.get(x, y).x;
        assert!((value - 1.25).abs() < 1e-5, "divergence at ({x}, {y}) is {value}");
    }
}

#[test]
fn test_gradient_subtract_removes_pressure_gradient() {
    let velocity = Grid::new(SIZE, SIZE, ChannelFormat::Rg).unwrap();
    let pressure = field(ChannelFormat::R, |p| Vec4::new(3.0 * p.x - 2.0 * p.y, 0.0, 0.0, 0.0));
    let projected = run(
        KernelId::GradientSubtract,
        ChannelFormat::Rg,
        &[(VELOCITY, &velocity), (PRESSURE, &pressure)],
        &[(INV_GRID_SCALE, CELL_SIZE.recip())],
    );
    for (x, y) in interior() {
        let v = projected.get(x, y);
        assert!(
            (v.x + 3.0).abs() < 1e-5 && (v.y - 2.0).abs() < 1e-5,
            "velocity at ({x}, {y}) is {v}"
        );
    }
}

#[test]
fn test_jacobi_step_from_zero_pressure() {
    let pressure = Grid::new(SIZE, SIZE, ChannelFormat::R).unwrap();
    let divergence = Grid::filled(SIZE, SIZE, ChannelFormat::R, Vec4::new(2.0, 0.0, 0.0, 0.0))
        .unwrap();
    let next = run(
        KernelId::Jacobi,
        ChannelFormat::R,
        &[(PRESSURE, &pressure), (DIVERGENCE, &divergence)],
        &[(GRID_SCALE_SQ, CELL_SIZE * CELL_SIZE)],
    );
    // (0 - h² * 2) / 4 everywhere
    assert!(next.cells().iter().all(|cell| cell.x == -0.125));
}

#[test]
fn test_uniform_curl_exerts_no_confinement_force() {
    let velocity = solid_body_rotation(0.75);
    let curl = Grid::filled(SIZE, SIZE, ChannelFormat::R, Vec4::new(3.0, 0.0, 0.0, 0.0)).unwrap();
    let confined = run(
        KernelId::Vorticity,
        ChannelFormat::Rg,
        &[(VELOCITY, &velocity), (CURL, &curl)],
        &vorticity_params(0.1, 2.0),
    );
    assert_eq!(confined.cells(), velocity.cells());
}

#[test]
fn test_tiny_curl_gradient_is_treated_as_zero() {
    let velocity = solid_body_rotation(0.75);
    // Gradient of |curl| well below the threshold, but not zero
    let slope = VORTICITY_EPSILON * 0.1;
    let curl = field(ChannelFormat::R, |p| Vec4::new(1.0 + slope * p.x, 0.0, 0.0, 0.0));
    let confined = run(
        KernelId::Vorticity,
        ChannelFormat::Rg,
        &[(VELOCITY, &velocity), (CURL, &curl)],
        &vorticity_params(0.1, 2.0),
    );
    assert_eq!(confined.cells(), velocity.cells());
}

#[test]
fn test_confinement_force_is_perpendicular_to_curl_gradient() {
    let velocity = Grid::new(SIZE, SIZE, ChannelFormat::Rg).unwrap();
    // Curl equal to the cell's x index, so |curl| grows along +x
    let mut curl = Grid::new(SIZE, SIZE, ChannelFormat::R).unwrap();
    for y in 0..SIZE {
        for x in 0..SIZE {
            curl.set(x, y, Vec4::new(x as f32, 0.0, 0.0, 0.0));
        }
    }
    let (dt, curl_strength) = (0.1, 2.0);
    let confined = run(
        KernelId::Vorticity,
        ChannelFormat::Rg,
        &[(VELOCITY, &velocity), (CURL, &curl)],
        &vorticity_params(dt, curl_strength),
    );

    // force = strength * h * omega * (n.y, -n.x) with n = +x
    for (x, y) in interior() {
        let v = confined.get(x, y);
        let expected = -curl_strength * CELL_SIZE * x as f32 * dt;
        assert!(v.x.abs() < 1e-6, "velocity at ({x}, {y}) is {v}");
        assert!((v.y - expected).abs() < 1e-5, "velocity at ({x}, {y}) is {v}");
    }
}
