//! Endpoint snapping across all borders.
//!
//! Borders around one junction are extracted and fitted independently,
//! so their endpoints drift apart by a pixel or two. One global pass
//! moves every endpoint that touches a junction pixel onto the centroid
//! of its meeting point, dragging the adjacent handle along. Ends that
//! touch no junction, such as those on the raster frame or against
//! background, stay where they are.

use std::collections::{BTreeSet, HashMap};

use kurbo::Point;
use log::{debug, info};

use crate::adjacency::RegionPair;
use crate::curves::CurveCache;
use crate::fit::{pin_end, pin_start};
use crate::junction::{JunctionCluster, JunctionSet};
use crate::raster::Pixel;

/// An endpoint anchors to a junction pixel whose centre is this close.
/// Covers the diagonal neighbour of a junction pixel.
const JUNCTION_REACH: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Start,
    End,
}

#[derive(Debug, Clone, Copy)]
struct EndpointRef {
    pair: RegionPair,
    segment: usize,
    end: End,
    /// Set for the first and last endpoint of a chain: (chain number, which end).
    terminal: Option<(usize, End)>,
}

/// Summary of one snapping run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapReport {
    pub endpoints: usize,
    /// Endpoints attached to a meeting point.
    pub anchored: usize,
    /// Meeting points that received at least one moved endpoint.
    pub clusters: usize,
    pub moved: usize,
}

/// Meeting points plus lookups from pixel and from centroid.
struct Anchors {
    points: Vec<JunctionCluster>,
    by_pixel: HashMap<Pixel, usize>,
    by_centroid: HashMap<(u64, u64), usize>,
}

impl Anchors {
    fn new(junctions: &JunctionSet) -> Self {
        let points = junctions.meeting_points();
        let mut by_pixel = HashMap::new();
        let mut by_centroid = HashMap::new();
        for (k, m) in points.iter().enumerate() {
            by_pixel.extend(m.pixels.iter().map(|&p| (p, k)));
            by_centroid.entry(point_key(m.centroid)).or_insert(k);
        }
        Self {
            points,
            by_pixel,
            by_centroid,
        }
    }

    /// Meeting point an endpoint of `pair` at `p` belongs to.
    ///
    /// An endpoint already on a centroid is settled there; otherwise the
    /// nearest junction pixel of the pair within reach decides.
    fn target(&self, junctions: &JunctionSet, pair: RegionPair, p: Point) -> Option<usize> {
        if let Some(&k) = self.by_centroid.get(&point_key(p)) {
            return Some(k);
        }
        junctions
            .for_pair(pair)
            .map(|j| (j.position, j.position.center().distance(p)))
            .filter(|&(_, d)| d <= JUNCTION_REACH)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .and_then(|(pixel, _)| self.by_pixel.get(&pixel).copied())
    }
}

fn point_key(p: Point) -> (u64, u64) {
    (p.x.to_bits(), p.y.to_bits())
}

/// Snap endpoints of every segment in `cache` onto junction meeting points.
///
/// No endpoint moves further than `snap_distance`. The start of a chain
/// wins over its own end when both reach the same meeting point, so short
/// borders are not collapsed. With `interior_joints` false, only the two
/// ends of each chain are indexed; joints inside a chain are already
/// continuous. Running this twice moves nothing the second time.
pub fn snap_endpoints(
    cache: &mut CurveCache,
    junctions: &JunctionSet,
    snap_distance: f64,
    interior_joints: bool,
) -> SnapReport {
    let refs = collect_endpoints(cache, interior_joints);
    let mut report = SnapReport {
        endpoints: refs.len(),
        ..SnapReport::default()
    };
    if refs.is_empty() || junctions.is_empty() || snap_distance <= 0.0 {
        return report;
    }

    let anchors = Anchors::new(junctions);
    let positions: Vec<Point> = refs.iter().map(|r| position(cache, r)).collect();
    let targets: Vec<Option<usize>> = refs
        .iter()
        .zip(&positions)
        .map(|(r, &p)| anchors.target(junctions, r.pair, p))
        .collect();
    report.anchored = targets.iter().flatten().count();

    let chain_starts: HashMap<usize, usize> = refs
        .iter()
        .enumerate()
        .filter_map(|(i, r)| match r.terminal {
            Some((chain, End::Start)) => Some((chain, i)),
            _ => None,
        })
        .collect();

    let mut used: BTreeSet<usize> = BTreeSet::new();
    for (i, r) in refs.iter().enumerate() {
        let Some(k) = targets[i] else {
            continue;
        };
        let centroid = anchors.points[k].centroid;
        let p = positions[i];
        if p == centroid {
            continue;
        }
        if let Some((chain, End::End)) = r.terminal {
            let start = chain_starts.get(&chain).copied();
            if start.is_some_and(|s| targets[s] == Some(k) && positions[s] != p) {
                debug!("border {}: both chain ends reach one junction, end kept", r.pair);
                continue;
            }
        }
        if p.distance(centroid) > snap_distance {
            debug!(
                "border {}: endpoint ({:.2}, {:.2}) beyond snap distance of its junction",
                r.pair, p.x, p.y
            );
            continue;
        }
        let Some(seg) = cache.segment_mut(r.pair, r.segment) else {
            continue;
        };
        match r.end {
            End::Start => pin_start(&mut seg.curve, centroid),
            End::End => pin_end(&mut seg.curve, centroid),
        }
        used.insert(k);
        report.moved += 1;
    }
    report.clusters = used.len();

    info!(
        "  Snap        {} endpoints, {} anchored, {} moved onto {} junctions",
        report.endpoints, report.anchored, report.moved, report.clusters
    );
    report
}

fn collect_endpoints(cache: &CurveCache, interior_joints: bool) -> Vec<EndpointRef> {
    let mut refs = Vec::new();
    let mut chain_number = 0;
    for (pair, segments) in cache.iter() {
        for (i, seg) in segments.iter().enumerate() {
            let starts_chain = i == 0 || segments[i - 1].chain != seg.chain;
            let ends_chain = i + 1 == segments.len() || segments[i + 1].chain != seg.chain;
            if interior_joints || starts_chain {
                refs.push(EndpointRef {
                    pair,
                    segment: i,
                    end: End::Start,
                    terminal: starts_chain.then_some((chain_number, End::Start)),
                });
            }
            if interior_joints || ends_chain {
                refs.push(EndpointRef {
                    pair,
                    segment: i,
                    end: End::End,
                    terminal: ends_chain.then_some((chain_number, End::End)),
                });
            }
            if ends_chain {
                chain_number += 1;
            }
        }
    }
    refs
}

fn position(cache: &CurveCache, r: &EndpointRef) -> Point {
    let seg = &cache.get(r.pair)[r.segment];
    match r.end {
        End::Start => seg.curve.p0,
        End::End => seg.curve.p3,
    }
}
