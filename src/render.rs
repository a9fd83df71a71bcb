//! Raster previews of the curve cache.
//!
//! Regions are filled with their palette colour at an integer scale,
//! then every cached border is stroked on top via tiny-skia: thin grey
//! for same-group borders, thick black for borders between groups.

use std::path::Path;

use kurbo::Point;

use crate::curves::CurveCache;
use crate::error::BorderError;
use crate::fit::{BorderKind, BorderSegment};
use crate::raster::{region_color, Pixel, RegionRaster};

/// Stroke width of same-group borders, in output pixels.
const SAME_GROUP_WIDTH: f32 = 1.0;
/// Stroke width of different-group borders, in output pixels.
const DIFFERENT_GROUP_WIDTH: f32 = 2.5;

/// A border as one tiny-skia path in output pixels, one subpath per chain.
fn border_path(segments: &[BorderSegment], scale: f32) -> Option<tiny_skia::Path> {
    let at = |p: Point| (p.x as f32 * scale, p.y as f32 * scale);
    let mut pb = tiny_skia::PathBuilder::new();
    let mut previous: Option<&BorderSegment> = None;
    for seg in segments {
        let c = seg.curve;
        let continues = previous.is_some_and(|p| p.chain == seg.chain && p.curve.p3 == c.p0);
        if !continues {
            let (x, y) = at(c.p0);
            pb.move_to(x, y);
        }
        let ((x1, y1), (x2, y2), (x, y)) = (at(c.p1), at(c.p2), at(c.p3));
        pb.cubic_to(x1, y1, x2, y2, x, y);
        previous = Some(seg);
    }
    pb.finish()
}

/// Encode a pixmap to PNG bytes.
fn encode_png(pixmap: &tiny_skia::Pixmap) -> Result<Vec<u8>, BorderError> {
    let mut buf = Vec::new();
    let mut encoder = png::Encoder::new(&mut buf, pixmap.width(), pixmap.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .map_err(|e| BorderError::Render(e.to_string()))?;
    writer
        .write_image_data(pixmap.data())
        .map_err(|e| BorderError::Render(e.to_string()))?;
    drop(writer);
    Ok(buf)
}

/// Rasterize regions and borders at `scale` output pixels per raster pixel.
pub fn render_pixmap(
    raster: &RegionRaster,
    cache: &CurveCache,
    scale: u32,
) -> Result<tiny_skia::Pixmap, BorderError> {
    let scale = scale.max(1);
    let (w, h) = raster.dimensions();
    let (out_w, out_h) = (w * scale, h * scale);
    let mut pixmap = tiny_skia::Pixmap::new(out_w, out_h)
        .ok_or_else(|| BorderError::Render(format!("cannot allocate {out_w}x{out_h} pixmap")))?;

    // ── Region fill ──
    for y in 0..out_h {
        for x in 0..out_w {
            let id = raster.region_at(Pixel::new((x / scale) as i32, (y / scale) as i32));
            let [r, g, b] = region_color(id);
            if let Some(pm) = tiny_skia::PremultipliedColorU8::from_rgba(r, g, b, 255) {
                pixmap.pixels_mut()[(y * out_w + x) as usize] = pm;
            }
        }
    }

    // ── Borders ──
    let mut same = tiny_skia::Paint::default();
    same.set_color_rgba8(90, 90, 90, 255);
    same.anti_alias = true;
    let mut different = tiny_skia::Paint::default();
    different.set_color(tiny_skia::Color::BLACK);
    different.anti_alias = true;

    // Different-group borders go last so they sit on top.
    for pass in [BorderKind::SameGroup, BorderKind::DifferentGroup] {
        let (paint, width) = match pass {
            BorderKind::SameGroup => (&same, SAME_GROUP_WIDTH),
            BorderKind::DifferentGroup => (&different, DIFFERENT_GROUP_WIDTH),
        };
        let stroke = tiny_skia::Stroke {
            width,
            line_cap: tiny_skia::LineCap::Round,
            line_join: tiny_skia::LineJoin::Round,
            ..tiny_skia::Stroke::default()
        };
        for (_, segments) in cache.iter() {
            if segments.first().map(|s| s.kind) != Some(pass) {
                continue;
            }
            if let Some(sk_path) = border_path(segments, scale as f32) {
                pixmap.stroke_path(&sk_path, paint, &stroke, tiny_skia::Transform::identity(), None);
            }
        }
    }
    Ok(pixmap)
}

/// Render a preview and write it as PNG.
pub fn render_preview(
    raster: &RegionRaster,
    cache: &CurveCache,
    scale: u32,
    output_path: &Path,
) -> Result<(), BorderError> {
    let pixmap = render_pixmap(raster, cache, scale)?;
    std::fs::write(output_path, encode_png(&pixmap)?)?;
    Ok(())
}
