//! Ordered sequence of passes making up one simulation step
//!
//! Stable-fluids operator splitting: self-advection, vorticity confinement,
//! splat injection, pressure projection, then dye transport along the
//! projected velocity. Viscosity is modeled by multiplicative dissipation
//! during advection. Every stage reads front buffers, writes back buffers or
//! single-buffered scratch grids, then swaps.

use crate::clock::clamp_dt;
use crate::error::ExecutorError;
use crate::executor::{BindingLayout, Pass, PassExecutor};
use crate::kernels::{KernelId, names::*};
use crate::splat::DyeBlend;
use crate::state::SimulationState;

/// Bindings supplied by each stage, checked against the executor up front
const LAYOUTS: [(KernelId, BindingLayout); 7] = [
    (
        KernelId::Advect,
        BindingLayout {
            inputs: &[VELOCITY, SOURCE],
            params: &[DT, INV_GRID_SCALE, DISSIPATION],
        },
    ),
    (
        KernelId::Curl,
        BindingLayout {
            inputs: &[VELOCITY],
            params: &[INV_GRID_SCALE],
        },
    ),
    (
        KernelId::Vorticity,
        BindingLayout {
            inputs: &[VELOCITY, CURL],
            params: &[DT, CURL_STRENGTH, GRID_SCALE, INV_GRID_SCALE],
        },
    ),
    (
        KernelId::ApplyImpulse,
        BindingLayout {
            inputs: &[TARGET, IMPULSE],
            params: &[BLEND_MAX],
        },
    ),
    (
        KernelId::Divergence,
        BindingLayout {
            inputs: &[VELOCITY],
            params: &[INV_GRID_SCALE],
        },
    ),
    (
        KernelId::Jacobi,
        BindingLayout {
            inputs: &[PRESSURE, DIVERGENCE],
            params: &[GRID_SCALE_SQ],
        },
    ),
    (
        KernelId::GradientSubtract,
        BindingLayout {
            inputs: &[VELOCITY, PRESSURE],
            params: &[INV_GRID_SCALE],
        },
    ),
];

/// Runs simulation steps through a pass executor
#[derive(Debug)]
pub struct StepPipeline<E: PassExecutor> {
    executor: E,
}

impl<E: PassExecutor> StepPipeline<E> {
    /// Prepare every kernel of the step on `executor`
    pub fn new(mut executor: E) -> Result<Self, ExecutorError> {
        for (kernel, layout) in &LAYOUTS {
            executor.prepare(*kernel, layout)?;
        }
        Ok(Self { executor })
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Advance `state` by `dt` seconds (clamped to the configured maximum)
    ///
    /// Returns the timestep that was actually used.
    pub fn step(&mut self, state: &mut SimulationState, dt: f32) -> Result<f32, ExecutorError> {
        let dt = clamp_dt(dt, state.config().max_dt);
        self.advect_velocity(state, dt)?;
        self.compute_curl(state)?;
        self.confine_vorticity(state, dt)?;
        self.apply_splats(state)?;
        self.project(state)?;
        self.advect_dye(state, dt)?;
        Ok(dt)
    }

    /// Stage 1: semi-Lagrangian self-advection of the velocity field
    pub fn advect_velocity(&mut self, state: &mut SimulationState, dt: f32) -> Result<(), ExecutorError> {
        let inv_grid_scale = state.config().grid_scale.recip();
        let dissipation = state.config().dissipation_velocity;
        let (velocity, out) = state.velocity.front_and_back();
        self.executor.run_pass(
            out,
            &Pass {
                kernel: KernelId::Advect,
                inputs: &[(VELOCITY, velocity), (SOURCE, velocity)],
                params: &[
                    (DT, dt),
                    (INV_GRID_SCALE, inv_grid_scale),
                    (DISSIPATION, dissipation),
                ],
            },
        )?;
        state.velocity.swap();
        Ok(())
    }

    /// Stage 2: scalar vorticity into the curl scratch grid
    pub fn compute_curl(&mut self, state: &mut SimulationState) -> Result<(), ExecutorError> {
        let inv_grid_scale = state.config().grid_scale.recip();
        self.executor.run_pass(
            &mut state.curl,
            &Pass {
                kernel: KernelId::Curl,
                inputs: &[(VELOCITY, state.velocity.front())],
                params: &[(INV_GRID_SCALE, inv_grid_scale)],
            },
        )
    }

    /// Stage 3: reinject the small-scale rotation lost to numerical dissipation
    pub fn confine_vorticity(&mut self, state: &mut SimulationState, dt: f32) -> Result<(), ExecutorError> {
        let config = state.config();
        let params = [
            (DT, dt),
            (CURL_STRENGTH, config.curl_strength),
            (GRID_SCALE, config.grid_scale),
            (INV_GRID_SCALE, config.grid_scale.recip()),
        ];
        let (velocity, out) = state.velocity.front_and_back();
        self.executor.run_pass(
            out,
            &Pass {
                kernel: KernelId::Vorticity,
                inputs: &[(VELOCITY, velocity), (CURL, &state.curl)],
                params: &params,
            },
        )?;
        state.velocity.swap();
        Ok(())
    }

    /// Stage 4: fold the splats accumulated since the last step into the fields
    pub fn apply_splats(&mut self, state: &mut SimulationState) -> Result<(), ExecutorError> {
        if state.splats.has_velocity() {
            let (velocity, out) = state.velocity.front_and_back();
            self.executor.run_pass(
                out,
                &Pass {
                    kernel: KernelId::ApplyImpulse,
                    inputs: &[(TARGET, velocity), (IMPULSE, state.splats.velocity_impulse())],
                    params: &[(BLEND_MAX, 0.0)],
                },
            )?;
            state.velocity.swap();
        }
        if state.splats.has_dye() {
            let blend_max = match state.config().dye_blend {
                DyeBlend::Additive => 0.0,
                DyeBlend::Max => 1.0,
            };
            let (dye, out) = state.dye.front_and_back();
            self.executor.run_pass(
                out,
                &Pass {
                    kernel: KernelId::ApplyImpulse,
                    inputs: &[(TARGET, dye), (IMPULSE, state.splats.dye_impulse())],
                    params: &[(BLEND_MAX, blend_max)],
                },
            )?;
            state.dye.swap();
        }
        if state.splats.pending() > 0 {
            log::trace!("Applied {} splats", state.splats.pending());
        }
        state.splats.clear();
        Ok(())
    }

    /// Stages 5 to 7: make the velocity field (approximately) divergence-free
    pub fn project(&mut self, state: &mut SimulationState) -> Result<(), ExecutorError> {
        self.compute_divergence(state)?;
        self.solve_pressure(state)?;
        self.subtract_gradient(state)
    }

    /// Stage 5: discrete divergence into the divergence scratch grid
    pub fn compute_divergence(&mut self, state: &mut SimulationState) -> Result<(), ExecutorError> {
        let inv_grid_scale = state.config().grid_scale.recip();
        self.executor.run_pass(
            &mut state.divergence,
            &Pass {
                kernel: KernelId::Divergence,
                inputs: &[(VELOCITY, state.velocity.front())],
                params: &[(INV_GRID_SCALE, inv_grid_scale)],
            },
        )
    }

    /// Stage 6: fixed-count Jacobi iterations, warm-started from the last
    /// pressure field
    pub fn solve_pressure(&mut self, state: &mut SimulationState) -> Result<(), ExecutorError> {
        let grid_scale = state.config().grid_scale;
        let params = [(GRID_SCALE_SQ, grid_scale * grid_scale)];
        for _ in 0..state.config().jacobi_iterations {
            let (pressure, out) = state.pressure.front_and_back();
            self.executor.run_pass(
                out,
                &Pass {
                    kernel: KernelId::Jacobi,
                    inputs: &[(PRESSURE, pressure), (DIVERGENCE, &state.divergence)],
                    params: &params,
                },
            )?;
            state.pressure.swap();
        }
        Ok(())
    }

    /// Stage 7: subtract the pressure gradient from the velocity field
    pub fn subtract_gradient(&mut self, state: &mut SimulationState) -> Result<(), ExecutorError> {
        let inv_grid_scale = state.config().grid_scale.recip();
        let (velocity, out) = state.velocity.front_and_back();
        self.executor.run_pass(
            out,
            &Pass {
                kernel: KernelId::GradientSubtract,
                inputs: &[(VELOCITY, velocity), (PRESSURE, state.pressure.front())],
                params: &[(INV_GRID_SCALE, inv_grid_scale)],
            },
        )?;
        state.velocity.swap();
        Ok(())
    }

    /// Stage 8: transport the dye along the projected velocity field
    pub fn advect_dye(&mut self, state: &mut SimulationState, dt: f32) -> Result<(), ExecutorError> {
        let inv_grid_scale = state.config().grid_scale.recip();
        let dissipation = state.config().dissipation_dye;
        let (dye, out) = state.dye.front_and_back();
        self.executor.run_pass(
            out,
            &Pass {
                kernel: KernelId::Advect,
                inputs: &[(VELOCITY, state.velocity.front()), (SOURCE, dye)],
                params: &[
                    (DT, dt),
                    (INV_GRID_SCALE, inv_grid_scale),
                    (DISSIPATION, dissipation),
                ],
            },
        )?;
        state.dye.swap();
        Ok(())
    }
}
