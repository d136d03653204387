//! Named physical fields of a simulation and their lifecycle

use crate::config::{SimulationConfig, check_resolution};
use crate::double_buffer::DoubleBufferedGrid;
use crate::error::ConfigError;
use crate::executor::PassExecutor;
use crate::grid::{ChannelFormat, Grid};
use crate::splat::{Splat, SplatInjector};
use glam::Vec4;

/// Every grid of a simulation, plus the constants that drive its evolution
///
/// All grids are allocated together for one pair of resolutions and only
/// reallocated by [`SimulationState::reconfigure`].
#[derive(Debug)]
pub struct SimulationState {
    pub(crate) velocity: DoubleBufferedGrid,
    pub(crate) dye: DoubleBufferedGrid,
    pub(crate) pressure: DoubleBufferedGrid,
    pub(crate) divergence: Grid,
    pub(crate) curl: Grid,
    pub(crate) splats: SplatInjector,
    config: SimulationConfig,
}

impl SimulationState {
    /// Validate `config` and allocate every field in its rest state
    pub fn new(config: SimulationConfig, executor: &mut impl PassExecutor) -> Result<Self, ConfigError> {
        config.validate()?;
        let [vw, vh] = config.velocity_resolution;
        let [dw, dh] = config.dye_resolution;
        let initial_dye = Vec4::from_array(config.initial_dye);

        let mut double = |width, height, format, value: Vec4| -> Result<DoubleBufferedGrid, ConfigError> {
            let mut front = executor.allocate_grid(width, height, format)?;
            let mut back = executor.allocate_grid(width, height, format)?;
            front.fill(value);
            back.fill(value);
            DoubleBufferedGrid::from_grids(front, back)
        };
        let velocity = double(vw, vh, ChannelFormat::Rg, Vec4::ZERO)?;
        let dye = double(dw, dh, ChannelFormat::Rgba, initial_dye)?;
        let pressure = double(vw, vh, ChannelFormat::R, Vec4::ZERO)?;

        let state = Self {
            velocity,
            dye,
            pressure,
            divergence: executor.allocate_grid(vw, vh, ChannelFormat::R)?,
            curl: executor.allocate_grid(vw, vh, ChannelFormat::R)?,
            splats: SplatInjector::new(config.velocity_resolution, config.dye_resolution)?,
            config,
        };
        log::info!(
            "Allocated simulation state: velocity {vw}x{vh}, dye {dw}x{dh}, {} Jacobi iterations",
            state.config.jacobi_iterations
        );
        Ok(state)
    }

    /// Reallocate every field at new resolutions and reset it to rest
    ///
    /// Pending splats are dropped, since their coordinates referred to the old
    /// resolution. On error, the current state is left untouched.
    pub fn reconfigure(
        &mut self,
        velocity_resolution: [u32; 2],
        dye_resolution: [u32; 2],
        executor: &mut impl PassExecutor,
    ) -> Result<(), ConfigError> {
        check_resolution("velocity", velocity_resolution)?;
        check_resolution("dye", dye_resolution)?;
        let config = SimulationConfig {
            velocity_resolution,
            dye_resolution,
            ..self.config.clone()
        };
        *self = Self::new(config, executor)?;
        Ok(())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn velocity(&self) -> &DoubleBufferedGrid {
        &self.velocity
    }

    pub fn dye(&self) -> &DoubleBufferedGrid {
        &self.dye
    }

    pub fn pressure(&self) -> &DoubleBufferedGrid {
        &self.pressure
    }

    /// Divergence computed by the last projection
    pub fn divergence(&self) -> &Grid {
        &self.divergence
    }

    /// Curl computed by the last step
    pub fn curl(&self) -> &Grid {
        &self.curl
    }

    /// Splats waiting for the next step
    pub fn splats(&self) -> &SplatInjector {
        &self.splats
    }

    /// Queue an interaction impulse for the next step
    pub fn inject_splat(&mut self, splat: Splat) {
        self.splats.inject(splat);
    }

    /// Read-only view of the displayable dye field
    pub fn current_dye(&self) -> &Grid {
        self.dye.front()
    }

    /// Read-only view of the current velocity field
    pub fn current_velocity(&self) -> &Grid {
        self.velocity.front()
    }
}
