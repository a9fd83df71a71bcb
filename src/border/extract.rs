use crate::adjacency::RegionPair;
use crate::junction::JunctionSet;
use crate::raster::{RegionPixelIndex, RegionRaster};

use super::BorderPixels;

/// Collect the border pixels shared by `pair`.
///
/// Only A's precomputed pixel list is visited: each A pixel with an
/// 8-neighbour in B is kept. Junctions containing both regions are added
/// too, since they may only touch a third region's pixels.
pub fn extract_border_pixels(
    raster: &RegionRaster,
    index: &RegionPixelIndex,
    pair: RegionPair,
    junctions: &JunctionSet,
) -> BorderPixels {
    let mut border = BorderPixels::new(pair);
    for &p in index.pixels_of(pair.a()) {
        if raster.touches_region(p, pair.b()) {
            border.pixels.insert(p);
        }
    }
    for junction in junctions.for_pair(pair) {
        border.pixels.insert(junction.position);
        border.junctions.insert(junction.position);
    }
    border
}
