//! region-borders: region-ID raster → adjacency graph, smooth borders
//! and border distance fields.
//!
//! Every pixel of the input raster carries a region id (0 = background).
//! From that the crate derives which regions touch, one set of cubic
//! Bézier curves per touching pair, and a two-channel distance field to
//! the nearest same-group and different-group border.
//!
//! # Example
//!
//! ```no_run
//! use region_borders::{BorderConfig, BorderSystem, NoOwners, RegionPixelIndex, TileKernel};
//! use region_borders::{bitmap, definitions::Definitions};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let config = BorderConfig::default();
//! let defs = Definitions::load(Path::new("definition.csv"))?;
//! let raster = bitmap::load_region_raster(Path::new("provinces.png"), &defs, &config)?;
//! let index = RegionPixelIndex::build(&raster);
//! let system = BorderSystem::initialize(config, raster, index, &NoOwners, Some(Arc::new(TileKernel)))?;
//! println!("{} borders", system.curves().len());
//! # Ok::<(), region_borders::BorderError>(())
//! ```

#![forbid(unsafe_code)]

mod config;

pub mod adjacency;
pub mod bitmap;
pub mod border;
pub mod curves;
pub mod definitions;
pub mod distance;
pub mod error;
pub mod fit;
pub mod junction;
pub mod owners;
pub mod raster;
pub mod render;
pub mod simplify;
pub mod snap;
pub mod system;

// Re-export kurbo so downstream users get the same version
// used by BorderSegment.curve (kurbo::CubicBez).
pub use kurbo;

pub use adjacency::{AdjacencyGraph, RegionPair};
pub use config::{BorderConfig, ClassificationPolicy, Connectivity};
pub use curves::{build_curve_cache, CurveCache, CurveStats};
pub use distance::{DistanceField, DistanceFieldGenerator, FloodKernel, SeedKind, TileKernel};
pub use error::BorderError;
pub use fit::{BorderKind, BorderSegment};
pub use junction::{Junction, JunctionSet};
pub use owners::{GroupId, NoOwners, OwnerLookup, OwnerTable};
pub use raster::{Pixel, RegionId, RegionPixelIndex, RegionRaster};
pub use snap::{snap_endpoints, SnapReport};
pub use system::BorderSystem;
