//! Jump-flood propagation kernels.
//!
//! A kernel runs one JFA pass: every pixel reads its own and its eight
//! ±step neighbours' seeds from `src` and writes the nearest to `dst`.
//! A pass returns only once every pixel has been written.

use rayon::prelude::*;

use crate::error::BorderError;

/// Side of the square tiles dispatched per work item, in pixels.
pub const TILE_SIZE: u32 = 8;

/// Nearest seed found so far for one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seed {
    pub x: i32,
    pub y: i32,
}

impl Seed {
    /// No seed reached this pixel yet.
    pub const NONE: Seed = Seed {
        x: i32::MIN,
        y: i32::MIN,
    };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Squared distance from pixel (x, y), `None` for the empty seed.
    pub fn dist_sq(self, x: i32, y: i32) -> Option<i64> {
        if self.is_none() {
            return None;
        }
        let dx = (self.x - x) as i64;
        let dy = (self.y - y) as i64;
        Some(dx * dx + dy * dy)
    }
}

/// Handle to whatever executes JFA passes.
pub trait FloodKernel: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Run one pass at `step`. Must not return before `dst` is complete.
    fn dispatch_pass(
        &self,
        src: &[Seed],
        dst: &mut [Seed],
        width: u32,
        height: u32,
        step: u32,
    ) -> Result<(), BorderError>;
}

/// CPU kernel: bands of 8-row tiles on the rayon pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileKernel;

impl FloodKernel for TileKernel {
    fn name(&self) -> &str {
        "tile"
    }

    fn dispatch_pass(
        &self,
        src: &[Seed],
        dst: &mut [Seed],
        width: u32,
        height: u32,
        step: u32,
    ) -> Result<(), BorderError> {
        let len = width as usize * height as usize;
        if src.len() != len || dst.len() != len {
            return Err(BorderError::Kernel {
                kernel: self.name().to_string(),
                message: format!(
                    "buffer sizes {}/{} do not match {width}x{height}",
                    src.len(),
                    dst.len()
                ),
            });
        }
        if len == 0 {
            return Ok(());
        }

        let band = width as usize * TILE_SIZE as usize;
        dst.par_chunks_mut(band).enumerate().for_each(|(band_index, rows)| {
            let y0 = band_index as u32 * TILE_SIZE;
            for (i, out) in rows.iter_mut().enumerate() {
                let x = (i % width as usize) as i32;
                let y = (y0 as usize + i / width as usize) as i32;
                *out = nearest_candidate(src, width, height, x, y, step as i32);
            }
        });
        Ok(())
    }
}

/// Best of the 3×3 candidates at ±step around (x, y). Ties go to the
/// first candidate in row-major offset order.
pub(crate) fn nearest_candidate(
    src: &[Seed],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    step: i32,
) -> Seed {
    let mut best = Seed::NONE;
    let mut best_d = i64::MAX;
    for dy in [-step, 0, step] {
        let ny = y + dy;
        if ny < 0 || ny >= height as i32 {
            continue;
        }
        for dx in [-step, 0, step] {
            let nx = x + dx;
            if nx < 0 || nx >= width as i32 {
                continue;
            }
            let candidate = src[ny as usize * width as usize + nx as usize];
            if let Some(d) = candidate.dist_sq(x, y) {
                if d < best_d {
                    best_d = d;
                    best = candidate;
                }
            }
        }
    }
    best
}
