//! Owned lifecycle around the whole border pipeline.
//!
//! `initialize` builds every output, `regenerate` rebuilds all of them
//! and swaps them in only if the rebuild succeeded, `shutdown` releases
//! them. No state lives outside the `BorderSystem` value.

use std::sync::Arc;
use std::time::Instant;

use log::info;

use crate::adjacency::{self, AdjacencyGraph};
use crate::config::BorderConfig;
use crate::curves::{build_curve_cache, CurveCache, CurveStats};
use crate::distance::{DistanceField, DistanceFieldGenerator, FloodKernel};
use crate::error::BorderError;
use crate::junction::JunctionSet;
use crate::owners::OwnerLookup;
use crate::raster::{RegionPixelIndex, RegionRaster};

/// Everything one generation produces.
#[derive(Debug, Clone)]
struct Outputs {
    adjacency: AdjacencyGraph,
    junctions: JunctionSet,
    curves: CurveCache,
    curve_stats: CurveStats,
    distance: DistanceField,
}

#[derive(Debug)]
pub struct BorderSystem {
    config: BorderConfig,
    raster: RegionRaster,
    index: RegionPixelIndex,
    generator: DistanceFieldGenerator,
    outputs: Outputs,
    generation: u64,
}

impl BorderSystem {
    /// Build adjacency, curves and the distance field from scratch.
    ///
    /// `kernel` runs distance-field propagation; without one the field
    /// is the uniform no-borders field.
    pub fn initialize(
        config: BorderConfig,
        raster: RegionRaster,
        index: RegionPixelIndex,
        owners: &dyn OwnerLookup,
        kernel: Option<Arc<dyn FloodKernel>>,
    ) -> Result<Self, BorderError> {
        config.validate()?;
        check_index(&raster, &index)?;
        let generator = DistanceFieldGenerator::new(kernel, &config);
        let outputs = build(&config, &raster, &index, &generator, owners)?;
        Ok(Self {
            config,
            raster,
            index,
            generator,
            outputs,
            generation: 1,
        })
    }

    /// Rebuild everything against new owner data.
    ///
    /// On error the previous outputs stay in place untouched.
    pub fn regenerate(&mut self, owners: &dyn OwnerLookup) -> Result<(), BorderError> {
        let outputs = build(&self.config, &self.raster, &self.index, &self.generator, owners)?;
        self.outputs = outputs;
        self.generation += 1;
        Ok(())
    }

    /// Release all caches.
    pub fn shutdown(self) {
        info!(
            "  Shutdown    released {} borders after {} generations",
            self.outputs.curves.len(),
            self.generation
        );
    }

    pub fn config(&self) -> &BorderConfig {
        &self.config
    }

    pub fn raster(&self) -> &RegionRaster {
        &self.raster
    }

    pub fn adjacency(&self) -> &AdjacencyGraph {
        &self.outputs.adjacency
    }

    pub fn junctions(&self) -> &JunctionSet {
        &self.outputs.junctions
    }

    pub fn curves(&self) -> &CurveCache {
        &self.outputs.curves
    }

    pub fn curve_stats(&self) -> &CurveStats {
        &self.outputs.curve_stats
    }

    pub fn distance_field(&self) -> &DistanceField {
        &self.outputs.distance
    }

    /// Number of successful builds, starting at 1.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The vector path and the distance field share no state and run side by side.
fn build(
    config: &BorderConfig,
    raster: &RegionRaster,
    index: &RegionPixelIndex,
    generator: &DistanceFieldGenerator,
    owners: &dyn OwnerLookup,
) -> Result<Outputs, BorderError> {
    let t_start = Instant::now();
    let (vector, distance) = rayon::join(
        || -> Result<_, BorderError> {
            let adjacency = adjacency::scan(raster, config)?;
            let junctions = JunctionSet::detect(raster);
            let (curves, curve_stats) =
                build_curve_cache(raster, index, &adjacency, &junctions, owners, config)?;
            Ok((adjacency, junctions, curves, curve_stats))
        },
        || generator.generate(raster, owners),
    );
    let (adjacency, junctions, curves, curve_stats) = vector?;
    let (w, h) = raster.dimensions();
    info!(
        "  Result      {}x{} px \u{00b7} {} regions \u{00b7} {} borders \u{00b7} {} segments  ({}ms)",
        w,
        h,
        adjacency.region_count(),
        adjacency.edge_count(),
        curves.segment_count(),
        t_start.elapsed().as_millis(),
    );
    Ok(Outputs {
        adjacency,
        junctions,
        curves,
        curve_stats,
        distance,
    })
}

/// Every indexed pixel lies in the raster and carries its region's id.
fn check_index(raster: &RegionRaster, index: &RegionPixelIndex) -> Result<(), BorderError> {
    for region in index.regions() {
        for &p in index.pixels_of(region) {
            match raster.get(p) {
                Some(id) if id == region => {}
                Some(id) => {
                    return Err(BorderError::InvalidRaster(format!(
                        "pixel index lists ({}, {}) under region {region}, raster has {id}",
                        p.x, p.y
                    )))
                }
                None => {
                    return Err(BorderError::InvalidRaster(format!(
                        "pixel index lists ({}, {}) outside the {}x{} raster",
                        p.x,
                        p.y,
                        raster.width(),
                        raster.height()
                    )))
                }
            }
        }
    }
    Ok(())
}
