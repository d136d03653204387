//! Fixed-resolution 2D storage for one physical quantity
//!
//! Every cell holds a [`Vec4`]; the grid's [`ChannelFormat`] says how many of
//! its lanes are meaningful; the others are kept at zero. Cell `(x, y)` has its
//! center at the integer coordinate `(x, y)`, which is the coordinate system
//! used by [`Grid::sample_bilinear`].

use crate::error::ConfigError;
use glam::{UVec2, Vec2, Vec4};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of meaningful channels per cell
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelFormat {
    /// Scalar field (pressure, divergence, curl)
    R,
    /// 2D vector field (velocity)
    Rg,
    /// Color field (dye)
    Rgba,
}

impl ChannelFormat {
    pub fn channels(self) -> usize {
        match self {
            Self::R => 1,
            Self::Rg => 2,
            Self::Rgba => 4,
        }
    }

    /// Zero the lanes that this format does not store
    #[inline]
    pub fn mask(self, value: Vec4) -> Vec4 {
        match self {
            Self::R => Vec4::new(value.x, 0.0, 0.0, 0.0),
            Self::Rg => Vec4::new(value.x, value.y, 0.0, 0.0),
            Self::Rgba => value,
        }
    }
}

/// Opaque identity of a grid's storage, used to check for read/write aliasing
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct GridId(u64);

impl GridId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// 2D array of fixed-format samples, immutable in shape once allocated
#[derive(Debug)]
pub struct Grid {
    id: GridId,
    width: u32,
    height: u32,
    format: ChannelFormat,
    cells: Vec<Vec4>,
}

impl Grid {
    /// Allocate a zero-filled grid
    pub fn new(width: u32, height: u32, format: ChannelFormat) -> Result<Self, ConfigError> {
        Self::filled(width, height, format, Vec4::ZERO)
    }

    /// Allocate a grid with every cell set to `value` (masked to `format`)
    pub fn filled(
        width: u32,
        height: u32,
        format: ChannelFormat,
        value: Vec4,
    ) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidResolution {
                field: "grid",
                width,
                height,
            });
        }
        Ok(Self {
            id: GridId::next(),
            width,
            height,
            format,
            cells: vec![format.mask(value); width as usize * height as usize],
        })
    }

    pub fn id(&self) -> GridId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn format(&self) -> ChannelFormat {
        self.format
    }

    /// Truth that both grids can stand in for one another
    pub fn same_shape(&self, other: &Grid) -> bool {
        self.width == other.width && self.height == other.height && self.format == other.format
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Value of an in-range cell
    ///
    /// # Panics
    ///
    /// If `(x, y)` lies outside of the grid.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Vec4 {
        assert!(x < self.width && y < self.height, "cell ({x}, {y}) out of range");
        self.cells[self.index(x, y)]
    }

    /// Overwrite an in-range cell, returns false if `(x, y)` is out of range
    pub fn set(&mut self, x: u32, y: u32, value: Vec4) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let idx = self.index(x, y);
        self.cells[idx] = self.format.mask(value);
        true
    }

    /// Cell lookup with clamp-to-edge addressing
    #[inline]
    pub fn fetch(&self, x: i32, y: i32) -> Vec4 {
        let x = x.clamp(0, self.width as i32 - 1) as u32;
        let y = y.clamp(0, self.height as i32 - 1) as u32;
        self.cells[self.index(x, y)]
    }

    /// Bilinear interpolation of the four nearest cells, clamped to the edge
    #[inline]
    pub fn sample_bilinear(&self, pos: Vec2) -> Vec4 {
        let max = Vec2::new((self.width - 1) as f32, (self.height - 1) as f32);
        // NaN positions collapse onto the origin cell
        let pos = Vec2::new(
            if pos.x.is_nan() { 0.0 } else { pos.x },
            if pos.y.is_nan() { 0.0 } else { pos.y },
        )
        .clamp(Vec2::ZERO, max);

        let base = pos.floor();
        let frac = pos - base;
        let (x0, y0) = (base.x as i32, base.y as i32);

        let v00 = self.fetch(x0, y0);
        let v10 = self.fetch(x0 + 1, y0);
        let v01 = self.fetch(x0, y0 + 1);
        let v11 = self.fetch(x0 + 1, y0 + 1);

        let bottom = v00.lerp(v10, frac.x);
        let top = v01.lerp(v11, frac.x);
        bottom.lerp(top, frac.y)
    }

    /// Reset every cell to `value` (masked to the grid's format)
    pub fn fill(&mut self, value: Vec4) {
        let value = self.format.mask(value);
        self.cells.fill(value);
    }

    pub fn cells(&self) -> &[Vec4] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Vec4] {
        &mut self.cells
    }

    /// Sum of every cell, accumulated in double precision
    pub fn sum(&self) -> [f64; 4] {
        self.cells.iter().fold([0.0; 4], |mut acc, cell| {
            for (a, c) in acc.iter_mut().zip(cell.to_array()) {
                *a += f64::from(c);
            }
            acc
        })
    }

    /// Largest euclidean norm of the meaningful channels of any cell
    pub fn max_magnitude(&self) -> f32 {
        self.cells
            .iter()
            .map(|cell| cell.length())
            .fold(0.0, f32::max)
    }

    /// Raw little-endian f32 bytes of the whole grid, four lanes per cell
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }
}

/// Grids are cloned into fresh storage with a fresh identity
impl Clone for Grid {
    fn clone(&self) -> Self {
        Self {
            id: GridId::next(),
            width: self.width,
            height: self.height,
            format: self.format,
            cells: self.cells.clone(),
        }
    }
}
