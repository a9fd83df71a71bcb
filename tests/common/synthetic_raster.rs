use region_borders::{RegionId, RegionRaster};

/// Raster from a per-pixel id function.
pub fn raster_from_fn(width: u32, height: u32, id_at: impl Fn(u32, u32) -> u16) -> RegionRaster {
    assert!(width > 0 && height > 0, "raster dimensions must be positive");
    let ids = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| RegionId(id_at(x, y)))
        .collect();
    RegionRaster::new(width, height, ids).expect("synthetic raster is valid")
}

/// Two vertical bands: `left` for x < split, `right` elsewhere.
pub fn two_bands(width: u32, height: u32, split: u32, left: u16, right: u16) -> RegionRaster {
    raster_from_fn(width, height, |x, _| if x < split { left } else { right })
}

/// Regions 1 (top left) and 2 (bottom left) beside region 3 (right half).
/// All three meet around pixel (size/2, size/2).
pub fn t_junction(size: u32) -> RegionRaster {
    let half = size / 2;
    raster_from_fn(size, size, |x, y| match (x < half, y < half) {
        (true, true) => 1,
        (true, false) => 2,
        (false, _) => 3,
    })
}

/// Nearest-site partition with ids `1..=sites`, sites placed by a fixed LCG,
/// plus a background rectangle in the middle.
pub fn voronoi_with_hole(width: u32, height: u32, sites: usize, seed: u64) -> RegionRaster {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as u32
    };
    let points: Vec<(i64, i64)> = (0..sites)
        .map(|_| ((next() % width) as i64, (next() % height) as i64))
        .collect();
    let (hx0, hx1) = (width * 2 / 5, width * 3 / 5);
    let (hy0, hy1) = (height * 2 / 5, height * 3 / 5);
    raster_from_fn(width, height, |x, y| {
        if (hx0..hx1).contains(&x) && (hy0..hy1).contains(&y) {
            return 0;
        }
        let (x, y) = (x as i64, y as i64);
        let nearest = points
            .iter()
            .enumerate()
            .min_by_key(|(_, &(px, py))| (px - x).pow(2) + (py - y).pow(2))
            .map(|(i, _)| i)
            .unwrap_or(0);
        nearest as u16 + 1
    })
}
