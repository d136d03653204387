//! Boundary between the simulation core and the engine that runs its kernels
//!
//! A pass binds named read-only input grids, named scalars and one output grid,
//! then evaluates a kernel once per output cell. Every invocation sees the same
//! snapshot of the inputs; the borrow checker already guarantees that the
//! output is not one of them.

use crate::error::{ConfigError, ExecutorError};
use crate::grid::{ChannelFormat, Grid};
use crate::kernels::{KernelArgs, KernelId};
use glam::Vec4;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Names of the bindings a caller promises to supply to a kernel
#[derive(Copy, Clone, Debug)]
pub struct BindingLayout {
    pub inputs: &'static [&'static str],
    pub params: &'static [&'static str],
}

/// One kernel invocation over a whole output grid
#[derive(Copy, Clone)]
pub struct Pass<'a> {
    pub kernel: KernelId,
    pub inputs: &'a [(&'static str, &'a Grid)],
    pub params: &'a [(&'static str, f32)],
}

impl Pass<'_> {
    /// Names of the grids bound as inputs
    pub fn input_names(&self) -> impl Iterator<Item = &'static str> + Clone + '_ {
        self.inputs.iter().map(|(name, _)| *name)
    }

    /// Resolve named bindings to the kernel's positional slots
    pub fn resolve(&self, output: &Grid) -> Result<KernelArgs<'_>, ExecutorError> {
        let signature = self.kernel.signature();
        check_names(self.kernel, "input", signature.inputs, self.input_names())?;
        check_names(
            self.kernel,
            "param",
            signature.params,
            self.params.iter().map(|(name, _)| *name),
        )?;

        let inputs = signature
            .inputs
            .iter()
            .map(|&name| {
                self.inputs
                    .iter()
                    .find(|(bound, _)| *bound == name)
                    .map(|(_, grid)| *grid)
                    .ok_or(ExecutorError::MissingBinding {
                        kernel: self.kernel,
                        kind: "input",
                        name,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let params = signature
            .params
            .iter()
            .map(|&name| {
                self.params
                    .iter()
                    .find(|(bound, _)| *bound == name)
                    .map(|(_, value)| *value)
                    .ok_or(ExecutorError::MissingBinding {
                        kernel: self.kernel,
                        kind: "param",
                        name,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (position, &name) in signature.output_like.iter().enumerate() {
            let Some(grid) = signature.input_slot(name).map(|slot| inputs[slot]) else {
                return Err(ExecutorError::MissingBinding {
                    kernel: self.kernel,
                    kind: "input",
                    name,
                });
            };
            if grid.size() == output.size() {
                continue;
            }
            return Err(if position == 0 {
                ExecutorError::OutputShape {
                    kernel: self.kernel,
                    expected: grid.size().to_array(),
                    actual: output.size().to_array(),
                }
            } else {
                ExecutorError::InputShape {
                    kernel: self.kernel,
                    name,
                    expected: output.size().to_array(),
                    actual: grid.size().to_array(),
                }
            });
        }

        Ok(KernelArgs {
            inputs,
            params,
            output_size: output.size(),
        })
    }
}

/// Check that a set of bindings exactly covers a kernel's declared names
fn check_names(
    kernel: KernelId,
    kind: &'static str,
    declared: &'static [&'static str],
    bound: impl Iterator<Item = &'static str> + Clone,
) -> Result<(), ExecutorError> {
    if let Some(name) = bound.clone().find(|name| !declared.contains(name)) {
        return Err(ExecutorError::UnknownBinding { kernel, kind, name });
    }
    if let Some(&name) = declared
        .iter()
        .find(|name| !bound.clone().any(|bound| bound == **name))
    {
        return Err(ExecutorError::MissingBinding { kernel, kind, name });
    }
    Ok(())
}

/// Engine able to run kernel passes over grids
pub trait PassExecutor {
    /// Get a kernel ready for use with the given bindings
    ///
    /// Called once per kernel when a pipeline is built. Failing here is a fatal
    /// initialization error, there is no retry.
    fn prepare(&mut self, kernel: KernelId, layout: &BindingLayout) -> Result<(), ExecutorError>;

    /// Allocate a zeroed grid in executor-native storage
    fn allocate_grid(
        &mut self,
        width: u32,
        height: u32,
        format: ChannelFormat,
    ) -> Result<Grid, ConfigError> {
        Grid::new(width, height, format)
    }

    /// Evaluate `pass.kernel` once for every cell of `output`
    ///
    /// All writes must be visible by the time this returns.
    fn run_pass(&mut self, output: &mut Grid, pass: &Pass<'_>) -> Result<(), ExecutorError>;
}

/// How the CPU executor spreads cells over threads
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parallelism {
    /// One rayon task per grid row
    #[default]
    Parallel,
    /// Everything on the calling thread
    Serial,
}

/// Executor that evaluates kernels on the CPU
#[derive(Debug, Default)]
pub struct CpuExecutor {
    parallelism: Parallelism,
    prepared: HashSet<KernelId>,
}

impl CpuExecutor {
    pub fn new(parallelism: Parallelism) -> Self {
        Self {
            parallelism,
            prepared: HashSet::new(),
        }
    }

    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }
}

impl PassExecutor for CpuExecutor {
    fn prepare(&mut self, kernel: KernelId, layout: &BindingLayout) -> Result<(), ExecutorError> {
        let signature = kernel.signature();
        check_names(kernel, "input", signature.inputs, layout.inputs.iter().copied())?;
        check_names(kernel, "param", signature.params, layout.params.iter().copied())?;
        self.prepared.insert(kernel);
        log::debug!("Prepared kernel {kernel:?}");
        Ok(())
    }

    fn run_pass(&mut self, output: &mut Grid, pass: &Pass<'_>) -> Result<(), ExecutorError> {
        if !self.prepared.contains(&pass.kernel) {
            return Err(ExecutorError::UnsupportedKernel(pass.kernel));
        }
        let args = pass.resolve(output)?;
        let function = pass.kernel.function();
        let format = output.format();
        let width = output.width() as usize;

        let row_body = |(y, row): (usize, &mut [Vec4])| {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = format.mask(function(&args, x as u32, y as u32));
            }
        };
        match self.parallelism {
            Parallelism::Parallel => output
                .cells_mut()
                .par_chunks_mut(width)
                .enumerate()
                .for_each(row_body),
            Parallelism::Serial => output
                .cells_mut()
                .chunks_mut(width)
                .enumerate()
                .for_each(row_body),
        }
        Ok(())
    }
}
