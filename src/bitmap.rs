use std::path::Path;

use image::{ImageReader, RgbImage};
use log::{debug, warn};

use crate::config::BorderConfig;
use crate::definitions::Definitions;
use crate::error::BorderError;
use crate::raster::{RegionId, RegionRaster};

/// Load a colour-coded region map and convert it to a region-id raster.
///
/// Near-black pixels are background; other colours are looked up in `defs`.
pub fn load_region_raster(
    path: &Path,
    defs: &Definitions,
    config: &BorderConfig,
) -> Result<RegionRaster, BorderError> {
    let img = ImageReader::open(path)
        .map_err(|e| BorderError::ImageLoad(e.to_string()))?
        .decode()
        .map_err(|e| BorderError::ImageLoad(e.to_string()))?
        .into_rgb8();
    debug!(
        "loaded {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );
    raster_from_rgb(&img, defs, config)
}

/// Map an in-memory RGB image to region ids.
pub fn raster_from_rgb(
    img: &RgbImage,
    defs: &Definitions,
    config: &BorderConfig,
) -> Result<RegionRaster, BorderError> {
    let (width, height) = img.dimensions();
    let threshold = config.background_threshold;
    let mut ids = Vec::with_capacity(width as usize * height as usize);
    let mut unknown = 0usize;

    for (x, y, pixel) in img.enumerate_pixels() {
        let rgb = pixel.0;
        if rgb.iter().all(|&c| c <= threshold) {
            ids.push(RegionId::BACKGROUND);
            continue;
        }
        match defs.region_for_color(rgb) {
            Some(id) => ids.push(id),
            None if config.strict_colors => {
                return Err(BorderError::UnknownColor { x, y, rgb });
            }
            None => {
                unknown += 1;
                ids.push(RegionId::BACKGROUND);
            }
        }
    }

    if unknown > 0 {
        warn!("{unknown} pixels have colours missing from the definition table; loaded as background");
    }
    RegionRaster::new(width, height, ids)
}
