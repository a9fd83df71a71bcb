//! Two-channel border distance field via jump flooding.
//!
//! Channel 0 holds the distance to the nearest same-group border,
//! channel 1 to the nearest different-group border. Both are normalized
//! to `0..=1` against the configured radius; 1 means no border nearby.

pub mod kernel;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use image::{ImageBuffer, ImageFormat, LumaA, Rgba, RgbaImage};
use log::{info, warn};
use rayon::prelude::*;

use crate::adjacency::RegionPair;
use crate::config::{BorderConfig, ClassificationPolicy};
use crate::error::BorderError;
use crate::fit::{classify, BorderKind};
use crate::owners::OwnerLookup;
use crate::raster::{Pixel, RegionRaster};

pub use kernel::{FloodKernel, Seed, TileKernel, TILE_SIZE};

/// Float image backing a [`DistanceField`].
pub type FieldImage = ImageBuffer<LumaA<f32>, Vec<f32>>;

const ORTHOGONAL: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Which discontinuity a seed pixel sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedKind {
    SameGroup,
    DifferentGroup,
}

impl SeedKind {
    fn bit(self) -> u8 {
        match self {
            SeedKind::SameGroup => 1,
            SeedKind::DifferentGroup => 2,
        }
    }

    fn channel(self) -> usize {
        match self {
            SeedKind::SameGroup => 0,
            SeedKind::DifferentGroup => 1,
        }
    }
}

impl From<BorderKind> for SeedKind {
    fn from(kind: BorderKind) -> Self {
        match kind {
            BorderKind::SameGroup => SeedKind::SameGroup,
            BorderKind::DifferentGroup => SeedKind::DifferentGroup,
        }
    }
}

/// Normalized two-channel distance image.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceField {
    image: FieldImage,
}

impl DistanceField {
    /// Uniform field meaning "no borders anywhere".
    pub fn no_borders(width: u32, height: u32) -> Self {
        Self {
            image: ImageBuffer::from_pixel(width, height, LumaA([1.0, 1.0])),
        }
    }

    pub fn from_image(image: FieldImage) -> Self {
        Self { image }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// `[same_group, different_group]` at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Option<[f32; 2]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    pub fn image(&self) -> &FieldImage {
        &self.image
    }

    pub fn into_image(self) -> FieldImage {
        self.image
    }

    /// True if every sample is 1.0 in both channels.
    pub fn is_no_borders(&self) -> bool {
        self.image.as_raw().iter().all(|&v| v == 1.0)
    }

    /// Pack into 8-bit RGBA: red = same group, green = different group.
    pub fn to_rgba8(&self) -> RgbaImage {
        let (w, h) = self.dimensions();
        RgbaImage::from_fn(w, h, |x, y| {
            let [same, different] = self.image.get_pixel(x, y).0;
            Rgba([to_u8(same), to_u8(different), 0, 255])
        })
    }

    pub fn save_png(&self, path: &Path) -> Result<(), BorderError> {
        self.to_rgba8()
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| BorderError::Render(format!("{}: {e}", path.display())))
    }
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Builds distance fields on a [`FloodKernel`].
#[derive(Clone)]
pub struct DistanceFieldGenerator {
    kernel: Option<Arc<dyn FloodKernel>>,
    radius: f32,
    downsample: u32,
    policy: ClassificationPolicy,
}

impl std::fmt::Debug for DistanceFieldGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceFieldGenerator")
            .field("kernel", &self.kernel_name())
            .field("radius", &self.radius)
            .field("downsample", &self.downsample)
            .field("policy", &self.policy)
            .finish()
    }
}

impl DistanceFieldGenerator {
    /// `kernel` may be absent; generation then yields the no-borders field.
    pub fn new(kernel: Option<Arc<dyn FloodKernel>>, config: &BorderConfig) -> Self {
        Self {
            kernel,
            radius: config.distance_radius.max(f32::MIN_POSITIVE),
            downsample: config.distance_downsample.max(1),
            policy: config.classification,
        }
    }

    /// Generator on the built-in rayon kernel.
    pub fn with_tile_kernel(config: &BorderConfig) -> Self {
        Self::new(Some(Arc::new(TileKernel)), config)
    }

    pub fn kernel_name(&self) -> Option<&str> {
        self.kernel.as_deref().map(|k| k.name())
    }

    /// Output size for a `width`×`height` raster.
    pub fn output_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        (width.div_ceil(self.downsample), height.div_ceil(self.downsample))
    }

    /// Never fails: kernel problems degrade to the no-borders field.
    pub fn generate(&self, raster: &RegionRaster, owners: &dyn OwnerLookup) -> DistanceField {
        let t_start = Instant::now();
        let (w, h) = raster.dimensions();
        let (out_w, out_h) = self.output_dimensions(w, h);

        let Some(kernel) = self.kernel.as_deref() else {
            warn!("no flood kernel available; distance field left empty");
            return DistanceField::no_borders(out_w, out_h);
        };

        let mask = seed_mask(raster, owners, self.policy);
        let mut channels: [Vec<f32>; 2] = [Vec::new(), Vec::new()];
        let mut seed_counts = [0usize; 2];
        for kind in [SeedKind::SameGroup, SeedKind::DifferentGroup] {
            let seeds = seeds_of(&mask, w, kind);
            seed_counts[kind.channel()] = seeds.iter().filter(|s| !s.is_none()).count();
            let distances = if seed_counts[kind.channel()] == 0 {
                vec![1.0; seeds.len()]
            } else {
                match jump_flood(kernel, seeds, w, h) {
                    Ok(nearest) => self.normalize(&nearest, w),
                    Err(e) => {
                        warn!("flood kernel '{}' failed: {e}; distance field left empty", kernel.name());
                        return DistanceField::no_borders(out_w, out_h);
                    }
                }
            };
            channels[kind.channel()] = distances;
        }

        let field = self.assemble(&channels, w, h);
        info!(
            "  Distance    {}x{} \u{2192} {}x{}, {} + {} seeds, radius {}, {} kernel  ({}ms)",
            w,
            h,
            out_w,
            out_h,
            seed_counts[0],
            seed_counts[1],
            self.radius,
            kernel.name(),
            t_start.elapsed().as_millis(),
        );
        field
    }

    fn normalize(&self, nearest: &[Seed], width: u32) -> Vec<f32> {
        nearest
            .par_iter()
            .enumerate()
            .map(|(i, seed)| {
                let x = (i % width as usize) as i32;
                let y = (i / width as usize) as i32;
                match seed.dist_sq(x, y) {
                    Some(d2) => ((d2 as f64).sqrt() as f32).min(self.radius) / self.radius,
                    None => 1.0,
                }
            })
            .collect()
    }

    /// Interleave both channels, block-averaging when downsampling.
    fn assemble(&self, channels: &[Vec<f32>; 2], width: u32, height: u32) -> DistanceField {
        let f = self.downsample;
        let (out_w, out_h) = self.output_dimensions(width, height);
        let image = ImageBuffer::from_fn(out_w, out_h, |ox, oy| {
            let mut sum = [0.0f32; 2];
            let mut n = 0u32;
            for y in oy * f..((oy + 1) * f).min(height) {
                for x in ox * f..((ox + 1) * f).min(width) {
                    let i = y as usize * width as usize + x as usize;
                    sum[0] += channels[0][i];
                    sum[1] += channels[1][i];
                    n += 1;
                }
            }
            LumaA([sum[0] / n as f32, sum[1] / n as f32])
        });
        DistanceField { image }
    }
}

/// Per-pixel seed bits: 1 = same-group border, 2 = different-group border.
///
/// A pixel seeds when one of its 4-neighbours belongs to another
/// non-background region. Background never seeds.
pub fn seed_mask(
    raster: &RegionRaster,
    owners: &dyn OwnerLookup,
    policy: ClassificationPolicy,
) -> Vec<u8> {
    let width = raster.width() as usize;
    let mut mask = vec![0u8; raster.ids().len()];
    mask.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, bits) in row.iter_mut().enumerate() {
            let p = Pixel::new(x as i32, y as i32);
            let id = raster.region_at(p);
            if id.is_background() {
                continue;
            }
            for &(dx, dy) in &ORTHOGONAL {
                let Some(other) = raster.get(p.offset(dx, dy)) else {
                    continue;
                };
                if let Some(pair) = RegionPair::new(id, other) {
                    *bits |= SeedKind::from(classify(pair, owners, policy)).bit();
                }
            }
        }
    });
    mask
}

fn seeds_of(mask: &[u8], width: u32, kind: SeedKind) -> Vec<Seed> {
    mask.iter()
        .enumerate()
        .map(|(i, &bits)| {
            if bits & kind.bit() != 0 {
                Seed::new((i % width as usize) as i32, (i / width as usize) as i32)
            } else {
                Seed::NONE
            }
        })
        .collect()
}

/// Jump-flood `seeds` to nearest-seed assignments.
///
/// Steps run from half the next power of two of the larger side down
/// to 1, ping-ponging between two buffers.
pub fn jump_flood(
    kernel: &dyn FloodKernel,
    seeds: Vec<Seed>,
    width: u32,
    height: u32,
) -> Result<Vec<Seed>, BorderError> {
    let mut src = seeds;
    let mut dst = vec![Seed::NONE; src.len()];
    let mut step = width.max(height).next_power_of_two() / 2;
    while step >= 1 {
        kernel.dispatch_pass(&src, &mut dst, width, height, step)?;
        std::mem::swap(&mut src, &mut dst);
        step /= 2;
    }
    Ok(src)
}
