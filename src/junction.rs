//! Junction detection: pixels where three or more regions meet.
//!
//! One global pass, shared by every border. The resulting set is
//! immutable for the rest of a generation cycle.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use kurbo::Point;
use log::info;

use crate::adjacency::RegionPair;
use crate::raster::{Pixel, RegionId, RegionRaster};

/// A pixel whose 3×3 window holds at least three distinct regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junction {
    pub position: Pixel,
    /// Sorted, distinct, background-free.
    pub regions: Vec<RegionId>,
}

impl Junction {
    pub fn contains(&self, region: RegionId) -> bool {
        self.regions.binary_search(&region).is_ok()
    }

    pub fn contains_pair(&self, pair: RegionPair) -> bool {
        self.contains(pair.a()) && self.contains(pair.b())
    }
}

/// A group of 8-connected junction pixels with identical region sets.
///
/// One physical meeting point is several pixels wide on a raster.
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionCluster {
    pub regions: Vec<RegionId>,
    pub pixels: Vec<Pixel>,
    /// Mean of the pixel centres.
    pub centroid: Point,
}

#[derive(Debug, Clone, Default)]
pub struct JunctionSet {
    junctions: Vec<Junction>,
    by_position: HashMap<Pixel, usize>,
    by_pair: BTreeMap<RegionPair, Vec<usize>>,
}

impl JunctionSet {
    /// Scan the whole raster once.
    pub fn detect(raster: &RegionRaster) -> Self {
        let mut junctions = Vec::new();
        let mut window: Vec<RegionId> = Vec::with_capacity(9);
        for y in 0..raster.height() as i32 {
            for x in 0..raster.width() as i32 {
                let p = Pixel::new(x, y);
                window.clear();
                for n in std::iter::once(p).chain(p.neighbors()) {
                    match raster.get(n) {
                        Some(id) if !id.is_background() => window.push(id),
                        _ => {}
                    }
                }
                window.sort_unstable();
                window.dedup();
                if window.len() >= 3 {
                    junctions.push(Junction {
                        position: p,
                        regions: window.clone(),
                    });
                }
            }
        }
        let set = Self::from_junctions(junctions);
        info!(
            "  Junctions   {} pixels in {} clusters",
            set.len(),
            set.clusters().len()
        );
        set
    }

    pub fn from_junctions(junctions: Vec<Junction>) -> Self {
        let mut by_position = HashMap::with_capacity(junctions.len());
        let mut by_pair: BTreeMap<RegionPair, Vec<usize>> = BTreeMap::new();
        for (i, j) in junctions.iter().enumerate() {
            by_position.insert(j.position, i);
            for (k, &a) in j.regions.iter().enumerate() {
                for &b in &j.regions[k + 1..] {
                    if let Some(pair) = RegionPair::new(a, b) {
                        by_pair.entry(pair).or_default().push(i);
                    }
                }
            }
        }
        Self {
            junctions,
            by_position,
            by_pair,
        }
    }

    pub fn get(&self, p: Pixel) -> Option<&Junction> {
        self.by_position.get(&p).map(|&i| &self.junctions[i])
    }

    pub fn is_junction(&self, p: Pixel) -> bool {
        self.by_position.contains_key(&p)
    }

    /// True if `p` is a junction whose regions include both sides of `pair`.
    pub fn is_junction_for(&self, p: Pixel, pair: RegionPair) -> bool {
        self.get(p).is_some_and(|j| j.contains_pair(pair))
    }

    /// Junctions whose region set is a superset of `pair`, in raster order.
    pub fn for_pair(&self, pair: RegionPair) -> impl Iterator<Item = &Junction> + '_ {
        self.by_pair
            .get(&pair)
            .into_iter()
            .flatten()
            .map(|&i| &self.junctions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Junction> + '_ {
        self.junctions.iter()
    }

    pub fn len(&self) -> usize {
        self.junctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }

    /// Group junction pixels with identical region sets.
    pub fn clusters(&self) -> Vec<JunctionCluster> {
        self.group(|a, b| a.regions == b.regions)
    }

    /// Group all 8-connected junction pixels into physical meeting points.
    ///
    /// Where four or more regions meet, neighbouring junction pixels see
    /// different subsets of them; a meeting point carries their union.
    pub fn meeting_points(&self) -> Vec<JunctionCluster> {
        self.group(|_, _| true)
    }

    fn group(&self, joins: impl Fn(&Junction, &Junction) -> bool) -> Vec<JunctionCluster> {
        let mut seen: BTreeSet<usize> = BTreeSet::new();
        let mut clusters = Vec::new();
        for (start, junction) in self.junctions.iter().enumerate() {
            if !seen.insert(start) {
                continue;
            }
            let mut pixels = vec![junction.position];
            let mut regions: BTreeSet<RegionId> = junction.regions.iter().copied().collect();
            let mut stack = vec![start];
            while let Some(i) = stack.pop() {
                let current = &self.junctions[i];
                for n in current.position.neighbors() {
                    let Some(&k) = self.by_position.get(&n) else {
                        continue;
                    };
                    if joins(junction, &self.junctions[k]) && seen.insert(k) {
                        pixels.push(n);
                        regions.extend(self.junctions[k].regions.iter().copied());
                        stack.push(k);
                    }
                }
            }
            pixels.sort_unstable();
            let sum = pixels
                .iter()
                .fold(Point::ZERO, |acc, p| acc + p.center().to_vec2());
            let centroid = (sum.to_vec2() / pixels.len() as f64).to_point();
            clusters.push(JunctionCluster {
                regions: regions.into_iter().collect(),
                pixels,
                centroid,
            });
        }
        clusters
    }
}
