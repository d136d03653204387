//! Caller-facing simulation handle

use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::executor::{CpuExecutor, PassExecutor};
use crate::grid::Grid;
use crate::pipeline::StepPipeline;
use crate::splat::Splat;
use crate::state::SimulationState;
use crate::viewport;
use glam::UVec2;

/// A fluid simulation: its fields, and the pipeline that advances them
#[derive(Debug)]
pub struct Simulation<E: PassExecutor = CpuExecutor> {
    state: SimulationState,
    pipeline: StepPipeline<E>,
    poisoned: bool,
    steps: u64,
}

impl Simulation<CpuExecutor> {
    /// Set up a simulation running on the CPU
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        let executor = CpuExecutor::new(config.parallelism);
        Self::with_executor(config, executor)
    }
}

impl<E: PassExecutor> Simulation<E> {
    /// Set up a simulation on a custom executor
    ///
    /// Fails if the configuration is invalid or if the executor cannot prepare
    /// one of the pipeline's kernels.
    pub fn with_executor(config: SimulationConfig, mut executor: E) -> Result<Self, SimulationError> {
        let state = SimulationState::new(config, &mut executor)?;
        let pipeline = StepPipeline::new(executor)?;
        Ok(Self {
            state,
            pipeline,
            poisoned: false,
            steps: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        self.state.config()
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn executor(&self) -> &E {
        self.pipeline.executor()
    }

    /// Number of completed steps since the last (re)configuration
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Queue an impulse, applied during the next step
    pub fn inject_splat(&mut self, splat: Splat) {
        self.state.inject_splat(splat);
    }

    /// Run one full step, returns the timestep actually used
    ///
    /// An executor failure leaves the buffers in an unknown state, after which
    /// every step fails until [`reconfigure()`](Self::reconfigure) is called.
    pub fn advance(&mut self, dt: f32) -> Result<f32, SimulationError> {
        if self.poisoned {
            return Err(SimulationError::Poisoned);
        }
        match self.pipeline.step(&mut self.state, dt) {
            Ok(dt) => {
                self.steps += 1;
                log::debug!("Completed step {} (dt = {dt}s)", self.steps);
                Ok(dt)
            }
            Err(error) => {
                log::error!("Simulation step failed, poisoning the simulation: {error}");
                self.poisoned = true;
                Err(error.into())
            }
        }
    }

    /// Dye field to be displayed for the current frame
    pub fn current_dye(&self) -> &Grid {
        self.state.current_dye()
    }

    /// Reallocate all fields at new resolutions, back to their rest state
    pub fn reconfigure(
        &mut self,
        velocity_resolution: [u32; 2],
        dye_resolution: [u32; 2],
    ) -> Result<(), SimulationError> {
        self.state
            .reconfigure(velocity_resolution, dye_resolution, self.pipeline.executor_mut())?;
        self.poisoned = false;
        self.steps = 0;
        Ok(())
    }

    /// Follow a display size change, returns true if the fields were reallocated
    ///
    /// The shorter side of each field keeps the configured length, the other
    /// one follows the display's aspect ratio.
    pub fn resize_display(&mut self, display: UVec2) -> Result<bool, SimulationError> {
        let config = self.config();
        let velocity = viewport::resolution_for(display, short_side(config.velocity_resolution));
        let dye = viewport::resolution_for(display, short_side(config.dye_resolution));
        if velocity == config.velocity_resolution && dye == config.dye_resolution {
            return Ok(false);
        }
        log::info!("Display resized to {}x{}", display.x, display.y);
        self.reconfigure(velocity, dye)?;
        Ok(true)
    }
}

fn short_side([width, height]: [u32; 2]) -> u32 {
    width.min(height)
}
