//! Ping-pong storage for fields that a pass both reads and writes

use crate::error::ConfigError;
use crate::grid::{ChannelFormat, Grid};
use glam::Vec4;

/// Pair of identically shaped grids where one acts as the input ("front") and
/// the other as the output ("back") of the next pass
#[derive(Clone, Debug)]
pub struct DoubleBufferedGrid {
    buffers: [Grid; 2],
    back_written: bool,
}

impl DoubleBufferedGrid {
    /// Allocate both buffers, filled with `value`
    pub fn new(
        width: u32,
        height: u32,
        format: ChannelFormat,
        value: Vec4,
    ) -> Result<Self, ConfigError> {
        let front = Grid::filled(width, height, format, value)?;
        let back = Grid::filled(width, height, format, value)?;
        Self::from_grids(front, back)
    }

    /// Pair up two existing grids, which must have the same shape and format
    pub fn from_grids(front: Grid, back: Grid) -> Result<Self, ConfigError> {
        if !front.same_shape(&back) {
            return Err(ConfigError::ShapeMismatch {
                front: ([front.width(), front.height()], front.format()),
                back: ([back.width(), back.height()], back.format()),
            });
        }
        Ok(Self {
            buffers: [front, back],
            back_written: false,
        })
    }

    /// Last completed state
    pub fn front(&self) -> &Grid {
        &self.buffers[0]
    }

    /// Write target of the next pass
    pub fn back_mut(&mut self) -> &mut Grid {
        self.back_written = true;
        &mut self.buffers[1]
    }

    /// Read access to the front alongside write access to the back
    pub fn front_and_back(&mut self) -> (&Grid, &mut Grid) {
        self.back_written = true;
        let [front, back] = &mut self.buffers;
        (front, back)
    }

    /// Make the freshly written back buffer become the front one
    ///
    /// Must only be called once a pass has fully written the back buffer.
    pub fn swap(&mut self) {
        debug_assert!(
            self.back_written,
            "swapped a double buffer whose back was not written since the last swap"
        );
        let [front, back] = &mut self.buffers;
        std::mem::swap(front, back);
        self.back_written = false;
    }

    /// Reset both buffers to `value`
    pub fn fill(&mut self, value: Vec4) {
        for buffer in &mut self.buffers {
            buffer.fill(value);
        }
        self.back_written = false;
    }

    pub fn width(&self) -> u32 {
        self.front().width()
    }

    pub fn height(&self) -> u32 {
        self.front().height()
    }

    pub fn format(&self) -> ChannelFormat {
        self.front().format()
    }
}
