//! Simulation constants and their validation

use crate::error::ConfigError;
use crate::executor::Parallelism;
use crate::splat::DyeBlend;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound on a single timestep, in seconds
pub const DEFAULT_MAX_DT: f32 = 1.0 / 60.0;

/// Everything that parametrizes a simulation instance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Velocity/pressure grid size as `[width, height]`
    pub velocity_resolution: [u32; 2],
    /// Dye grid size as `[width, height]`, may be finer than the velocity grid
    pub dye_resolution: [u32; 2],
    /// Multiplicative velocity decay per step
    pub dissipation_velocity: f32,
    /// Multiplicative dye decay per step
    pub dissipation_dye: f32,
    /// Fixed number of pressure solver iterations per step
    pub jacobi_iterations: u32,
    /// Vorticity confinement coefficient
    pub curl_strength: f32,
    /// Physical size of a velocity cell
    pub grid_scale: f32,
    /// Longest timestep a frame may advance the simulation by
    pub max_dt: f32,
    /// Default Gaussian radius of pointer splats, in velocity cells
    pub splat_radius: f32,
    /// Factor turning pointer motion (velocity cells per frame) into splat velocity
    pub splat_force: f32,
    /// How dye splats combine with the existing dye
    pub dye_blend: DyeBlend,
    /// Dye color of a freshly (re)configured simulation
    pub initial_dye: [f32; 4],
    /// Threading policy of the CPU executor
    pub parallelism: Parallelism,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            velocity_resolution: [128, 128],
            dye_resolution: [256, 256],
            dissipation_velocity: 0.98,
            dissipation_dye: 0.99,
            jacobi_iterations: 20,
            curl_strength: 1.0,
            grid_scale: 1.0,
            max_dt: DEFAULT_MAX_DT,
            splat_radius: 4.0,
            splat_force: 60.0,
            dye_blend: DyeBlend::Additive,
            initial_dye: [0.0; 4],
            parallelism: Parallelism::Parallel,
        }
    }
}

impl SimulationConfig {
    /// Parse a JSON configuration, missing keys take their default value
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every constraint on the constants, nothing gets clamped
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_resolution("velocity", self.velocity_resolution)?;
        check_resolution("dye", self.dye_resolution)?;
        if self.jacobi_iterations == 0 {
            return Err(ConfigError::NoJacobiIterations);
        }
        check_unit("dissipation_velocity", self.dissipation_velocity)?;
        check_unit("dissipation_dye", self.dissipation_dye)?;
        check_positive("grid_scale", self.grid_scale)?;
        check_positive("max_dt", self.max_dt)?;
        check_positive("splat_radius", self.splat_radius)?;
        check_non_negative("curl_strength", self.curl_strength)?;
        check_non_negative("splat_force", self.splat_force)?;
        for channel in self.initial_dye {
            check_non_negative("initial_dye", channel)?;
        }
        Ok(())
    }
}

pub(crate) fn check_resolution(field: &'static str, [width, height]: [u32; 2]) -> Result<(), ConfigError> {
    if width == 0 || height == 0 {
        return Err(ConfigError::InvalidResolution {
            field,
            width,
            height,
        });
    }
    Ok(())
}

fn check_unit(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::DissipationOutOfRange { name, value })
    }
}

fn check_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn check_non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}
