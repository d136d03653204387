//! Stable-fluids simulation core for stablefluid
//!
//! Velocity and dye live in double-buffered grids; each step runs a fixed
//! sequence of per-cell kernel passes through a [`PassExecutor`].

pub mod analysis;
pub mod clock;
pub mod config;
pub mod double_buffer;
pub mod error;
pub mod executor;
pub mod export;
pub mod grid;
pub mod input;
pub mod kernels;
pub mod pipeline;
pub mod render;
pub mod simulation;
pub mod splat;
pub mod state;
pub mod viewport;

pub use analysis::{AnalysisRecorder, FluidMetrics};
pub use clock::{FrameClock, clamp_dt};
pub use config::SimulationConfig;
pub use double_buffer::DoubleBufferedGrid;
pub use error::{ConfigError, ExecutorError, SimulationError};
pub use executor::{CpuExecutor, Parallelism, Pass, PassExecutor};
pub use export::ImageExporter;
pub use grid::{ChannelFormat, Grid, GridId};
pub use input::{PointerEvent, PointerTracker};
pub use kernels::KernelId;
pub use pipeline::StepPipeline;
pub use render::Renderer;
pub use simulation::Simulation;
pub use splat::{DyeBlend, Splat};
pub use state::SimulationState;
