//! Gap bridging: connect isolated junction pixels to their border.
//!
//! A junction added for pair (A, B) may sit next to a third region's
//! pixels only, with no 8-neighbour in the border set. A bounded BFS over
//! A/B boundary pixels and qualifying junctions finds the shortest way
//! back to the set, and that path is spliced in.

use std::collections::{BTreeSet, HashMap, VecDeque};

use log::debug;

use super::BorderPixels;
use crate::adjacency::RegionPair;
use crate::junction::JunctionSet;
use crate::raster::{Pixel, RegionRaster};

/// Outcome of bridging one pair's junctions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeReport {
    /// Junctions that were connected by a spliced path.
    pub bridged: usize,
    /// Pixels added by splicing.
    pub added: usize,
    /// Junctions left disconnected (depth exceeded or no route).
    pub unresolved: Vec<Pixel>,
}

/// Splice every isolated junction of `border` into the set.
///
/// Never fails; unreachable junctions stay disconnected and are reported.
pub fn bridge_gaps(
    raster: &RegionRaster,
    junctions: &JunctionSet,
    border: &mut BorderPixels,
    max_depth: usize,
) -> BridgeReport {
    let mut report = BridgeReport::default();
    let Some(pair) = border.pair else {
        return report;
    };

    let isolated: Vec<Pixel> = border
        .junctions
        .iter()
        .copied()
        .filter(|&j| !border.has_neighbor(j))
        .collect();

    for start in isolated {
        // An earlier splice may already have reached this one.
        if border.has_neighbor(start) {
            continue;
        }
        match shortest_path(raster, junctions, pair, &border.pixels, start, max_depth) {
            Some(path) => {
                report.bridged += 1;
                for p in path {
                    if border.pixels.insert(p) {
                        report.added += 1;
                    }
                }
            }
            None => {
                debug!(
                    "border {pair}: junction ({}, {}) not within {max_depth} steps of its border",
                    start.x, start.y
                );
                report.unresolved.push(start);
            }
        }
    }
    report
}

/// Pixel on the A/B boundary, from either side, or a junction of both.
fn is_traversable(
    raster: &RegionRaster,
    junctions: &JunctionSet,
    pair: RegionPair,
    p: Pixel,
) -> bool {
    match raster.get(p) {
        Some(id) if id == pair.a() => raster.touches_region(p, pair.b()),
        Some(id) if id == pair.b() => raster.touches_region(p, pair.a()),
        Some(_) => junctions.is_junction_for(p, pair),
        None => false,
    }
}

/// BFS from `start` to the nearest pixel of `targets` other than itself.
///
/// Returns the intermediate pixels (start and goal excluded).
fn shortest_path(
    raster: &RegionRaster,
    junctions: &JunctionSet,
    pair: RegionPair,
    targets: &BTreeSet<Pixel>,
    start: Pixel,
    max_depth: usize,
) -> Option<Vec<Pixel>> {
    let mut parent: HashMap<Pixel, Pixel> = HashMap::new();
    let mut queue: VecDeque<(Pixel, usize)> = VecDeque::new();
    parent.insert(start, start);
    queue.push_back((start, 0));

    while let Some((p, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for n in p.neighbors() {
            if parent.contains_key(&n) {
                continue;
            }
            if targets.contains(&n) {
                let mut path = Vec::new();
                let mut cur = p;
                while cur != start {
                    path.push(cur);
                    cur = parent[&cur];
                }
                path.reverse();
                return Some(path);
            }
            if is_traversable(raster, junctions, pair, n) {
                parent.insert(n, p);
                queue.push_back((n, depth + 1));
            }
        }
    }
    None
}
