//! Region adjacency: which regions share a border.
//!
//! 1. Directional raster scan (sequential or rayon-parallel)
//! 2. Symmetric `region → neighbours` graph
//! 3. Semicolon-delimited export

pub mod export;
pub mod pair_set;
pub mod scan;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::raster::RegionId;

pub use scan::{scan, scan_parallel, scan_sequential, ParallelScan};

/// Unordered region pair stored canonically with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionPair {
    a: RegionId,
    b: RegionId,
}

impl RegionPair {
    /// Canonical pair, or `None` when both ids are equal or either is background.
    pub fn new(x: RegionId, y: RegionId) -> Option<Self> {
        if x == y || x.is_background() || y.is_background() {
            return None;
        }
        let (a, b) = if x < y { (x, y) } else { (y, x) };
        Some(Self { a, b })
    }

    #[inline]
    pub fn a(self) -> RegionId {
        self.a
    }

    #[inline]
    pub fn b(self) -> RegionId {
        self.b
    }

    /// Packed key: smaller id in the high 32 bits, larger in the low 32 bits.
    #[inline]
    pub fn key(self) -> u64 {
        ((self.a.0 as u64) << 32) | self.b.0 as u64
    }

    pub fn from_key(key: u64) -> Option<Self> {
        let hi = (key >> 32) as u32;
        let lo = (key & 0xFFFF_FFFF) as u32;
        let a = RegionId(u16::try_from(hi).ok()?);
        let b = RegionId(u16::try_from(lo).ok()?);
        Self::new(a, b)
    }

    pub fn contains(self, id: RegionId) -> bool {
        self.a == id || self.b == id
    }

    /// The other region of the pair.
    pub fn other(self, id: RegionId) -> Option<RegionId> {
        if id == self.a {
            Some(self.b)
        } else if id == self.b {
            Some(self.a)
        } else {
            None
        }
    }
}

impl std::fmt::Display for RegionPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.a, self.b)
    }
}

/// Symmetric, irreflexive adjacency between regions. Background never appears.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyGraph {
    neighbors: BTreeMap<RegionId, BTreeSet<RegionId>>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `x` and `y` touch. Returns false for self-pairs,
    /// background, or an edge that was already present.
    pub fn insert_pair(&mut self, x: RegionId, y: RegionId) -> bool {
        match RegionPair::new(x, y) {
            Some(pair) => self.insert(pair),
            None => false,
        }
    }

    pub fn insert(&mut self, pair: RegionPair) -> bool {
        let added = self.neighbors.entry(pair.a).or_default().insert(pair.b);
        self.neighbors.entry(pair.b).or_default().insert(pair.a);
        added
    }

    pub fn neighbors(&self, region: RegionId) -> impl Iterator<Item = RegionId> + '_ {
        self.neighbors
            .get(&region)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn neighbor_set(&self, region: RegionId) -> Option<&BTreeSet<RegionId>> {
        self.neighbors.get(&region)
    }

    pub fn are_adjacent(&self, x: RegionId, y: RegionId) -> bool {
        self.neighbors.get(&x).is_some_and(|set| set.contains(&y))
    }

    /// Regions with at least one neighbour.
    pub fn regions(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.neighbors.keys().copied()
    }

    /// Every undirected edge once, in ascending `(a, b)` order.
    pub fn pairs(&self) -> impl Iterator<Item = RegionPair> + '_ {
        self.neighbors.iter().flat_map(|(&a, set)| {
            set.range(a..)
                .filter_map(move |&b| RegionPair::new(a, b))
        })
    }

    pub fn edge_count(&self) -> usize {
        self.neighbors.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn region_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Check symmetry, irreflexivity and background exclusion.
    pub fn is_consistent(&self) -> bool {
        self.neighbors.iter().all(|(&a, set)| {
            !a.is_background()
                && !set.contains(&a)
                && !set.contains(&RegionId::BACKGROUND)
                && set.iter().all(|b| self.are_adjacent(*b, a))
        })
    }
}

impl FromIterator<RegionPair> for AdjacencyGraph {
    fn from_iter<I: IntoIterator<Item = RegionPair>>(iter: I) -> Self {
        let mut graph = AdjacencyGraph::new();
        for pair in iter {
            graph.insert(pair);
        }
        graph
    }
}
