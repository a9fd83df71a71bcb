//! Single-pass adjacency scanners.
//!
//! Each pixel only tests its right, bottom and (8-connected) lower
//! diagonal neighbours. Left and top were covered when those pixels
//! were visited, so every touching pair is seen at least once.

use log::{debug, info, warn};
use rayon::prelude::*;

use super::pair_set::PairKeySet;
use super::{AdjacencyGraph, RegionPair};
use crate::config::{BorderConfig, Connectivity};
use crate::error::BorderError;
use crate::raster::{Pixel, RegionId, RegionRaster};

const FORWARD_C4: [(i32, i32); 2] = [(1, 0), (0, 1)];
const FORWARD_C8: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (-1, 1)];

/// Occupancy fraction above which the parallel scanner warns.
const CAPACITY_WARN_RATIO: f64 = 0.9;

fn forward_offsets(connectivity: Connectivity) -> &'static [(i32, i32)] {
    match connectivity {
        Connectivity::Four => &FORWARD_C4,
        Connectivity::Eight => &FORWARD_C8,
    }
}

/// Result of the parallel scanner, with capacity bookkeeping.
#[derive(Debug, Clone)]
pub struct ParallelScan {
    pub graph: AdjacencyGraph,
    /// Distinct pairs stored in the shared set.
    pub stored: usize,
    /// Insert attempts rejected because the set was full.
    pub dropped: usize,
    pub capacity: usize,
}

/// Scan with the variant selected in `config`.
pub fn scan(raster: &RegionRaster, config: &BorderConfig) -> Result<AdjacencyGraph, BorderError> {
    config.validate()?;
    let graph = if config.parallel_scan {
        scan_parallel(raster, config.connectivity, config.pair_capacity).graph
    } else {
        scan_sequential(raster, config.connectivity)
    };
    info!(
        "  Scan        {} regions, {} borders ({:?}-connected{})",
        graph.region_count(),
        graph.edge_count(),
        config.connectivity,
        if config.parallel_scan { ", parallel" } else { "" },
    );
    Ok(graph)
}

/// Sequential scan: one pass, inserting straight into the graph.
pub fn scan_sequential(raster: &RegionRaster, connectivity: Connectivity) -> AdjacencyGraph {
    let offsets = forward_offsets(connectivity);
    let mut graph = AdjacencyGraph::new();
    for_each_forward_pair(raster, offsets, 0..raster.height() as i32, |a, b| {
        graph.insert_pair(a, b);
    });
    graph
}

/// Parallel scan over rows with a shared lock-free pair set.
///
/// Blocks until every row has been scanned.
pub fn scan_parallel(
    raster: &RegionRaster,
    connectivity: Connectivity,
    capacity: usize,
) -> ParallelScan {
    let offsets = forward_offsets(connectivity);
    let set = PairKeySet::with_capacity(capacity);

    (0..raster.height() as i32).into_par_iter().for_each(|y| {
        for_each_forward_pair(raster, offsets, y..y + 1, |a, b| {
            if let Some(pair) = RegionPair::new(a, b) {
                set.insert(pair.key());
            }
        });
    });

    let stored = set.len();
    let dropped = set.dropped();
    if stored as f64 >= set.capacity() as f64 * CAPACITY_WARN_RATIO {
        warn!(
            "adjacency pair set at {stored}/{} slots; raise pair_capacity",
            set.capacity()
        );
    }
    if dropped > 0 {
        warn!("adjacency pair set full: {dropped} inserts dropped, graph is incomplete");
    }

    let graph: AdjacencyGraph = set.keys().filter_map(RegionPair::from_key).collect();
    debug!("parallel scan stored {stored} pairs");
    ParallelScan {
        graph,
        stored,
        dropped,
        capacity: set.capacity(),
    }
}

fn for_each_forward_pair(
    raster: &RegionRaster,
    offsets: &[(i32, i32)],
    rows: std::ops::Range<i32>,
    mut visit: impl FnMut(RegionId, RegionId),
) {
    let width = raster.width() as i32;
    for y in rows {
        for x in 0..width {
            let p = Pixel::new(x, y);
            let id = raster.region_at(p);
            if id.is_background() {
                continue;
            }
            for &(dx, dy) in offsets {
                match raster.get(p.offset(dx, dy)) {
                    Some(other) if other != id && !other.is_background() => visit(id, other),
                    _ => {}
                }
            }
        }
    }
}
