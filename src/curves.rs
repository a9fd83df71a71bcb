//! The border curve cache and the pipeline that fills it.
//!
//! Per adjacent pair, in parallel: extract → bridge → trace → fit.
//! Then one global snapping pass over every segment.

use std::collections::BTreeMap;
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use crate::adjacency::{AdjacencyGraph, RegionPair};
use crate::border::{bridge_gaps, extract_border_pixels, trace_chains};
use crate::config::BorderConfig;
use crate::error::BorderError;
use crate::fit::{classify, fit_border, BorderKind, BorderSegment};
use crate::junction::JunctionSet;
use crate::owners::OwnerLookup;
use crate::raster::{RegionPixelIndex, RegionRaster};
use crate::snap::{snap_endpoints, SnapReport};

/// Fitted segments of every border, keyed by canonical pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveCache {
    segments: BTreeMap<RegionPair, Vec<BorderSegment>>,
}

impl CurveCache {
    /// Segments of `pair`, in chain order. Empty if the pair has none.
    pub fn get(&self, pair: RegionPair) -> &[BorderSegment] {
        self.segments.get(&pair).map_or(&[], Vec::as_slice)
    }

    pub fn segment_mut(&mut self, pair: RegionPair, index: usize) -> Option<&mut BorderSegment> {
        self.segments.get_mut(&pair)?.get_mut(index)
    }

    /// Replace the segments of `pair`. Empty lists are not stored.
    pub fn insert(&mut self, pair: RegionPair, segments: Vec<BorderSegment>) {
        if segments.is_empty() {
            self.segments.remove(&pair);
        } else {
            self.segments.insert(pair, segments);
        }
    }

    /// Pairs in ascending canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (RegionPair, &Vec<BorderSegment>)> + '_ {
        self.segments.iter().map(|(&pair, segs)| (pair, segs))
    }

    pub fn pairs(&self) -> impl Iterator<Item = RegionPair> + '_ {
        self.segments.keys().copied()
    }

    pub fn segments(&self) -> impl Iterator<Item = &BorderSegment> + '_ {
        self.segments.values().flatten()
    }

    /// Number of pairs with at least one segment.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.values().map(Vec::len).sum()
    }

    /// Every segment is tagged with the key it is stored under.
    pub fn is_consistent(&self) -> bool {
        self.segments
            .iter()
            .all(|(&pair, segs)| pair.a() < pair.b() && segs.iter().all(|s| s.pair == pair))
    }
}

/// Counters gathered while building the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurveStats {
    pub pairs: usize,
    /// Pairs whose border pixel set came out empty.
    pub empty_pairs: usize,
    pub chains: usize,
    pub segments: usize,
    pub different_group: usize,
    pub bridged: usize,
    pub unresolved_junctions: usize,
    pub snap: SnapReport,
}

/// Build the full cache for every pair in `graph`.
pub fn build_curve_cache(
    raster: &RegionRaster,
    index: &RegionPixelIndex,
    graph: &AdjacencyGraph,
    junctions: &JunctionSet,
    owners: &dyn OwnerLookup,
    config: &BorderConfig,
) -> Result<(CurveCache, CurveStats), BorderError> {
    config.validate()?;
    let t_start = Instant::now();
    let mut cache = CurveCache::default();
    let mut stats = CurveStats::default();

    // Classification reads owner data only; workers see geometry only.
    let work: Vec<(RegionPair, BorderKind)> = graph
        .pairs()
        .map(|pair| (pair, classify(pair, owners, config.classification)))
        .collect();
    let borders: Vec<PairBorder> = work
        .par_iter()
        .map(|&(pair, kind)| trace_pair(raster, index, junctions, pair, kind, config))
        .collect();

    for border in borders {
        stats.pairs += 1;
        if border.empty {
            stats.empty_pairs += 1;
            continue;
        }
        stats.bridged += border.bridged;
        stats.unresolved_junctions += border.unresolved;
        if border.chains == 0 {
            continue;
        }
        stats.chains += border.chains;
        if border.kind == BorderKind::DifferentGroup {
            stats.different_group += 1;
        }
        cache.insert(border.pair, border.segments);
    }

    stats.snap = snap_endpoints(
        &mut cache,
        junctions,
        config.snap_distance,
        config.snap_interior_joints,
    );
    stats.segments = cache.segment_count();

    info!(
        "  Curves      {} borders \u{2192} {} chains \u{2192} {} segments ({} between groups)  ({}ms)",
        cache.len(),
        stats.chains,
        stats.segments,
        stats.different_group,
        t_start.elapsed().as_millis(),
    );
    Ok((cache, stats))
}

/// Everything one pair contributes to the cache.
struct PairBorder {
    pair: RegionPair,
    kind: BorderKind,
    empty: bool,
    bridged: usize,
    unresolved: usize,
    chains: usize,
    segments: Vec<BorderSegment>,
}

fn trace_pair(
    raster: &RegionRaster,
    index: &RegionPixelIndex,
    junctions: &JunctionSet,
    pair: RegionPair,
    kind: BorderKind,
    config: &BorderConfig,
) -> PairBorder {
    let mut result = PairBorder {
        pair,
        kind,
        empty: false,
        bridged: 0,
        unresolved: 0,
        chains: 0,
        segments: Vec::new(),
    };
    let mut border = extract_border_pixels(raster, index, pair, junctions);
    if border.is_empty() {
        debug!("border {pair}: no pixels, skipped");
        result.empty = true;
        return result;
    }

    let bridge = bridge_gaps(raster, junctions, &mut border, config.bridge_max_depth);
    result.bridged = bridge.bridged;
    result.unresolved = bridge.unresolved.len();

    let chains = trace_chains(&border);
    if chains.is_empty() {
        debug!("border {pair}: {} pixels, no chain long enough", border.len());
        return result;
    }
    result.chains = chains.len();
    for (chain_index, chain) in chains.iter().enumerate() {
        result
            .segments
            .extend(fit_border(chain, pair, kind, chain_index as u32, config));
    }
    result
}
