//! Per-pair border pixels: extraction, gap bridging and chain tracing.
//!
//! For one adjacent pair (A, B):
//! 1. Collect A's pixels touching B, plus shared junction pixels
//! 2. Splice isolated junction pixels in with a bounded BFS
//! 3. Order the scattered pixels into strictly 8-adjacent chains

pub mod bridge;
pub mod chain;
pub mod extract;

use std::collections::BTreeSet;

use crate::adjacency::RegionPair;
use crate::raster::Pixel;

pub use bridge::{bridge_gaps, BridgeReport};
pub use chain::{trace_chains, BorderChain, MIN_CHAIN_LEN};
pub use extract::extract_border_pixels;

/// Unordered border pixels of one region pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BorderPixels {
    pub pair: Option<RegionPair>,
    pub pixels: BTreeSet<Pixel>,
    /// Junction pixels added to `pixels`.
    pub junctions: BTreeSet<Pixel>,
}

impl BorderPixels {
    pub fn new(pair: RegionPair) -> Self {
        Self {
            pair: Some(pair),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// True if some 8-neighbour of `p` is in the set.
    pub fn has_neighbor(&self, p: Pixel) -> bool {
        p.neighbors().any(|n| self.pixels.contains(&n))
    }
}
