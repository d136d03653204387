//! Failure taxonomy of the simulation core

use crate::grid::ChannelFormat;
use crate::kernels::KernelId;
use thiserror::Error;

/// Invalid simulation setup, detected at construction or `reconfigure` time
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field} resolution {width}x{height}: both dimensions must be positive")]
    InvalidResolution {
        field: &'static str,
        width: u32,
        height: u32,
    },

    #[error("jacobi_iterations must be at least 1")]
    NoJacobiIterations,

    #[error("{name} = {value} is outside of [0, 1]")]
    DissipationOutOfRange { name: &'static str, value: f32 },

    #[error("{name} = {value} must be finite and strictly positive")]
    NotPositive { name: &'static str, value: f32 },

    #[error("{name} = {value} must be finite and non-negative")]
    Negative { name: &'static str, value: f32 },

    #[error("front/back shape mismatch: {front:?} vs {back:?}")]
    ShapeMismatch {
        front: ([u32; 2], ChannelFormat),
        back: ([u32; 2], ChannelFormat),
    },

    #[error("failed to parse simulation configuration")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read simulation configuration")]
    Io(#[from] std::io::Error),
}

/// Failures of the pass executor
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("kernel {0:?} is not supported by this executor")]
    UnsupportedKernel(KernelId),

    #[error("kernel {kernel:?} has no {kind} binding named {name:?}")]
    UnknownBinding {
        kernel: KernelId,
        kind: &'static str,
        name: &'static str,
    },

    #[error("kernel {kernel:?} is missing its {kind} binding {name:?}")]
    MissingBinding {
        kernel: KernelId,
        kind: &'static str,
        name: &'static str,
    },

    #[error("pass output is {actual:?} but kernel {kernel:?} must write a grid shaped like {expected:?}")]
    OutputShape {
        kernel: KernelId,
        expected: [u32; 2],
        actual: [u32; 2],
    },

    #[error("input {name:?} of kernel {kernel:?} is {actual:?} but must match the {expected:?} output")]
    InputShape {
        kernel: KernelId,
        name: &'static str,
        expected: [u32; 2],
        actual: [u32; 2],
    },

    #[error("backend failure while running {kernel:?}: {reason}")]
    Backend { kernel: KernelId, reason: String },
}

/// Top-level failure of a simulation instance
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// A previous step failed half-way, so the buffer roles can't be trusted
    #[error("simulation state was poisoned by an earlier executor failure; reconfigure to recover")]
    Poisoned,
}
