//! Region-ID raster and the per-region pixel index built at load time.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BorderError;

/// Identifier of a region encoded in the raster.
///
/// `0` is background ("no region") and never stored as a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u16);

impl RegionId {
    pub const BACKGROUND: RegionId = RegionId(0);
    /// Largest valid region id. `u16::MAX` is reserved.
    pub const MAX: RegionId = RegionId(65534);

    #[inline]
    pub fn is_background(self) -> bool {
        self.0 == 0
    }
}

impl From<u16> for RegionId {
    fn from(v: u16) -> Self {
        RegionId(v)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer pixel coordinate. Orders row-major (y, then x).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub x: i32,
    pub y: i32,
}

impl Pixel {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    #[inline]
    pub fn dist_sq(self, other: Pixel) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// True for the 8 surrounding pixels (not for `self`).
    #[inline]
    pub fn touches(self, other: Pixel) -> bool {
        self != other && self.dist_sq(other) <= 2
    }

    /// Pixel centre in raster units.
    #[inline]
    pub fn center(self) -> kurbo::Point {
        kurbo::Point::new(self.x as f64 + 0.5, self.y as f64 + 0.5)
    }

    /// The 8 neighbours, orthogonal ones first.
    pub fn neighbors(self) -> impl Iterator<Item = Pixel> {
        NEIGHBORS_8.iter().map(move |&(dx, dy)| self.offset(dx, dy))
    }
}

impl Ord for Pixel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Pixel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Orthogonal offsets first so walks prefer straight steps over diagonals.
pub(crate) const NEIGHBORS_8: [(i32, i32); 8] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
    (1, -1),
];

/// A W×H raster of region ids, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRaster {
    width: u32,
    height: u32,
    ids: Vec<RegionId>,
}

impl RegionRaster {
    /// Build a raster, validating its shape and id range.
    pub fn new(width: u32, height: u32, ids: Vec<RegionId>) -> Result<Self, BorderError> {
        if width == 0 || height == 0 {
            return Err(BorderError::InvalidRaster(format!(
                "empty raster ({width}x{height})"
            )));
        }
        let expected = width as usize * height as usize;
        if ids.len() != expected {
            return Err(BorderError::InvalidRaster(format!(
                "{width}x{height} raster needs {expected} ids, got {}",
                ids.len()
            )));
        }
        if let Some(pos) = ids.iter().position(|id| *id > RegionId::MAX) {
            let (x, y) = (pos as u32 % width, pos as u32 / width);
            return Err(BorderError::InvalidRaster(format!(
                "region id {} at ({x}, {y}) exceeds {}",
                ids[pos],
                RegionId::MAX
            )));
        }
        Ok(Self { width, height, ids })
    }

    /// Convenience constructor from raw `u16` rows (top row first).
    pub fn from_rows(rows: &[&[u16]]) -> Result<Self, BorderError> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        if rows.iter().any(|r| r.len() as u32 != width) {
            return Err(BorderError::InvalidRaster("ragged rows".to_string()));
        }
        let ids = rows.iter().flat_map(|r| r.iter().map(|&v| RegionId(v))).collect();
        Self::new(width, height, ids)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn ids(&self) -> &[RegionId] {
        &self.ids
    }

    #[inline]
    pub fn contains(&self, p: Pixel) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as u32) < self.width && (p.y as u32) < self.height
    }

    /// Region at `p`, or `None` outside the raster.
    #[inline]
    pub fn get(&self, p: Pixel) -> Option<RegionId> {
        if self.contains(p) {
            Some(self.ids[p.y as usize * self.width as usize + p.x as usize])
        } else {
            None
        }
    }

    /// Region at `p`, treating outside pixels as background.
    #[inline]
    pub fn region_at(&self, p: Pixel) -> RegionId {
        self.get(p).unwrap_or(RegionId::BACKGROUND)
    }

    /// True if any of the 8 neighbours of `p` belongs to `region`.
    pub fn touches_region(&self, p: Pixel, region: RegionId) -> bool {
        p.neighbors().any(|n| self.get(n) == Some(region))
    }
}

/// Precomputed `region → pixels` lists, in row-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionPixelIndex {
    pixels: BTreeMap<RegionId, Vec<Pixel>>,
}

impl RegionPixelIndex {
    /// One pass over the raster; background is not indexed.
    pub fn build(raster: &RegionRaster) -> Self {
        let mut pixels: BTreeMap<RegionId, Vec<Pixel>> = BTreeMap::new();
        let width = raster.width() as usize;
        for (i, &id) in raster.ids().iter().enumerate() {
            if id.is_background() {
                continue;
            }
            let p = Pixel::new((i % width) as i32, (i / width) as i32);
            pixels.entry(id).or_default().push(p);
        }
        Self { pixels }
    }

    /// Index supplied by an external loader.
    pub fn from_map(pixels: BTreeMap<RegionId, Vec<Pixel>>) -> Self {
        Self { pixels }
    }

    pub fn pixels_of(&self, region: RegionId) -> &[Pixel] {
        self.pixels.get(&region).map_or(&[], Vec::as_slice)
    }

    pub fn regions(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.pixels.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Deterministic colour for a region id, spread over the RGB cube.
///
/// Never returns black, which is reserved for background.
pub fn region_color(id: RegionId) -> [u8; 3] {
    if id.is_background() {
        return [0, 0, 0];
    }
    let v = id.0 as u32;
    // Each channel lands in 1..=255.
    [
        ((v * 67) % 255 + 1) as u8,
        ((v * 131) % 255 + 1) as u8,
        ((v * 199) % 255 + 1) as u8,
    ]
}
