//! Chain tracing: scattered border pixels → ordered polylines.

use std::collections::BTreeSet;

use super::BorderPixels;
use crate::raster::Pixel;

/// Chains shorter than this are rasterization noise.
pub const MIN_CHAIN_LEN: usize = 3;

/// Ordered border pixels; consecutive pixels are 8-adjacent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorderChain {
    pub pixels: Vec<Pixel>,
}

impl BorderChain {
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Length and adjacency invariants hold.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() >= MIN_CHAIN_LEN
            && self.pixels.windows(2).all(|w| w[0].touches(w[1]))
    }

    /// Pixel centres in raster units.
    pub fn points(&self) -> Vec<kurbo::Point> {
        self.pixels.iter().map(|p| p.center()).collect()
    }
}

/// Extract every chain from `border` until no pixel is left.
///
/// Deterministic for identical input: seeds and steps follow row-major
/// order and a fixed neighbour order (orthogonal before diagonal).
pub fn trace_chains(border: &BorderPixels) -> Vec<BorderChain> {
    let mut remaining: BTreeSet<Pixel> = border.pixels.clone();
    let mut chains = Vec::new();

    while let Some(seed) = pick_seed(&remaining, &border.junctions) {
        remaining.remove(&seed);
        let forward = walk(seed, &mut remaining);
        // A seed in the middle of a border still has unvisited pixels on its
        // other side. Walk them too and prepend them reversed, so the chain
        // runs from the far end of the backward part to the end of the forward part.
        let backward = walk(seed, &mut remaining);

        let mut pixels = Vec::with_capacity(forward.len() + backward.len() + 1);
        pixels.extend(backward.into_iter().rev());
        pixels.push(seed);
        pixels.extend(forward);

        if pixels.len() >= MIN_CHAIN_LEN {
            chains.push(BorderChain { pixels });
        }
    }
    chains
}

/// Junction first, then a chain end (at most one remaining neighbour),
/// then whatever comes first.
fn pick_seed(remaining: &BTreeSet<Pixel>, junctions: &BTreeSet<Pixel>) -> Option<Pixel> {
    if let Some(&j) = junctions.iter().find(|j| remaining.contains(j)) {
        return Some(j);
    }
    // With no junction left, a pixel with at most one remaining neighbour is
    // a chain end, so the forward walk covers the whole chain. Closed loops
    // have no such pixel and start at their first pixel in row-major order.
    remaining
        .iter()
        .copied()
        .find(|&p| p.neighbors().filter(|n| remaining.contains(n)).count() <= 1)
        .or_else(|| remaining.first().copied())
}

/// Greedy walk to the nearest unvisited 8-neighbour until a gap is hit.
fn walk(start: Pixel, remaining: &mut BTreeSet<Pixel>) -> Vec<Pixel> {
    let mut path = Vec::new();
    let mut current = start;
    // Neighbour order puts squared distance 1 before 2.
    while let Some(next) = current.neighbors().find(|n| remaining.contains(n)) {
        remaining.remove(&next);
        path.push(next);
        current = next;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::RegionPair;
    use crate::raster::RegionId;

    fn border_of(pixels: &[(i32, i32)]) -> BorderPixels {
        let mut border = BorderPixels::new(RegionPair::new(RegionId(1), RegionId(2)).unwrap());
        border.pixels.extend(pixels.iter().map(|&(x, y)| Pixel::new(x, y)));
        border
    }

    #[test]
    fn straight_column_is_one_chain() {
        let chains = trace_chains(&border_of(&[(1, 2), (1, 0), (1, 3), (1, 1)]));
        assert_eq!(chains.len(), 1);
        let expected: Vec<Pixel> = (0..4).map(|y| Pixel::new(1, y)).collect();
        assert_eq!(chains[0].pixels, expected);
        assert!(chains[0].is_valid());
    }

    #[test]
    fn disjoint_segments_give_two_chains() {
        let chains = trace_chains(&border_of(&[
            (0, 0), (1, 0), (2, 0),
            (7, 5), (8, 6), (9, 7), (10, 8),
        ]));
        assert_eq!(chains.len(), 2);
        assert!(chains.iter().all(BorderChain::is_valid));
    }

    #[test]
    fn short_fragments_are_discarded() {
        let chains = trace_chains(&border_of(&[(0, 0), (1, 1), (5, 5), (9, 0), (9, 1), (9, 2)]));
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].len(), 3);
    }

    #[test]
    fn seeds_at_junction() {
        let mut border = border_of(&[(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]);
        border.junctions.insert(Pixel::new(4, 0));
        let chains = trace_chains(&border);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].pixels.first(), Some(&Pixel::new(4, 0)));
        assert_eq!(chains[0].pixels.last(), Some(&Pixel::new(0, 0)));
    }

    #[test]
    fn middle_seed_extends_both_ways() {
        let mut border = border_of(&[(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]);
        border.junctions.insert(Pixel::new(2, 0));
        let chains = trace_chains(&border);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].len(), 5);
        assert!(chains[0].is_valid());
    }

    #[test]
    fn closed_loop_is_fully_traced() {
        let ring = [(1, 0), (2, 0), (3, 1), (3, 2), (2, 3), (1, 3), (0, 2), (0, 1)];
        let chains = trace_chains(&border_of(&ring));
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].len(), ring.len());
        assert!(chains[0].is_valid());
    }
}
