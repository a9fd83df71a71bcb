//! Curve fitting: border chains → tagged cubic Bézier segments.
//!
//! Per chain:
//! 1. Pixel centres in raster units
//! 2. RDP-simplify, then split at sharp turns
//! 3. Chaikin-smooth and tessellate each piece
//! 4. Two-pass cubic fitting via kurbo
//! 5. Tag with the canonical pair and border class

use kurbo::{
    fit_to_bezpath_opt, simplify::SimplifyBezPath, BezPath, CubicBez, PathSeg, Point, Vec2,
};
use serde::{Deserialize, Serialize};

use crate::adjacency::RegionPair;
use crate::border::BorderChain;
use crate::config::{BorderConfig, ClassificationPolicy};
use crate::owners::OwnerLookup;
use crate::simplify;

/// Points closer than this are treated as duplicates before fitting.
const DUPLICATE_TOLERANCE: f64 = 1e-9;

/// Whether a border separates regions of the same owner group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BorderKind {
    SameGroup,
    DifferentGroup,
}

/// One fitted cubic of a region pair's border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderSegment {
    pub curve: CubicBez,
    pub pair: RegionPair,
    pub kind: BorderKind,
    /// Index of the chain this segment belongs to, within its pair.
    pub chain: u32,
}

/// Classify a pair from owner data only. Geometry is never consulted.
pub fn classify(
    pair: RegionPair,
    owners: &dyn OwnerLookup,
    policy: ClassificationPolicy,
) -> BorderKind {
    let a = owners.owner_of(pair.a());
    let b = owners.owner_of(pair.b());
    let different = match policy {
        ClassificationPolicy::OwnerFirst => a != b,
        ClassificationPolicy::OwnedOnly => matches!((a, b), (Some(x), Some(y)) if x != y),
    };
    if different {
        BorderKind::DifferentGroup
    } else {
        BorderKind::SameGroup
    }
}

/// Prepare a chain's polylines: RDP → corner split → Chaikin → tessellation.
///
/// Consecutive pieces share their split vertex exactly.
pub fn prepare_polylines(chain: &BorderChain, config: &BorderConfig) -> Vec<Vec<Point>> {
    let simplified = simplify::simplify(&chain.points(), config.rdp_epsilon);
    simplify::split_at_corners(&simplified, config.corner_angle_threshold)
        .into_iter()
        .map(|piece| {
            let smoothed = simplify::smooth(&piece, config.smooth_iterations);
            simplify::tessellate(&smoothed, config.max_segment_length)
        })
        .collect()
}

/// Fit one chain and tag every resulting segment.
pub fn fit_border(
    chain: &BorderChain,
    pair: RegionPair,
    kind: BorderKind,
    chain_index: u32,
    config: &BorderConfig,
) -> Vec<BorderSegment> {
    prepare_polylines(chain, config)
        .iter()
        .flat_map(|piece| fit_points(piece, config.fit_accuracy))
        .map(|curve| BorderSegment {
            curve,
            pair,
            kind,
            chain: chain_index,
        })
        .collect()
}

/// Fit cubics through an open polyline. Endpoints are kept exactly.
pub fn fit_points(points: &[Point], accuracy: f64) -> Vec<CubicBez> {
    let points = simplify::dedup(points, DUPLICATE_TOLERANCE);
    let (first, last) = match (points.first(), points.last()) {
        (Some(&f), Some(&l)) if points.len() >= 2 => (f, l),
        _ => return Vec::new(),
    };
    if points.len() == 2 {
        return vec![line_to_cubic(first, last)];
    }

    let path = points_to_path(&points);
    let fitted = two_pass_fit(&path, accuracy);
    let mut cubics: Vec<CubicBez> = fitted
        .segments()
        .map(|seg| match seg {
            PathSeg::Line(line) => line_to_cubic(line.p0, line.p1),
            PathSeg::Quad(quad) => quad.raise(),
            PathSeg::Cubic(cubic) => cubic,
        })
        .collect();
    if cubics.is_empty() {
        return vec![line_to_cubic(first, last)];
    }

    // Fitting evaluates the source numerically; pin the exact endpoints.
    if let Some(c) = cubics.first_mut() {
        pin_start(c, first);
    }
    if let Some(c) = cubics.last_mut() {
        pin_end(c, last);
    }
    cubics
}

/// Two-pass fitting: polyline → curves → minimal curves.
///
/// Smooth curves simplify far better than noisy pixel
/// polylines, so the second pass removes most joints.
fn two_pass_fit(path: &BezPath, accuracy: f64) -> BezPath {
    let pass1 = fit_to_bezpath_opt(
        &SimplifyBezPath::new(path.elements().iter().copied()),
        accuracy,
    );
    fit_to_bezpath_opt(
        &SimplifyBezPath::new(pass1.elements().iter().copied()),
        accuracy,
    )
}

fn points_to_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some(&first) = points.first() {
        path.move_to(first);
        for &p in &points[1..] {
            path.line_to(p);
        }
    }
    path
}

fn line_to_cubic(p0: Point, p1: Point) -> CubicBez {
    CubicBez::new(p0, p0.lerp(p1, 1.0 / 3.0), p0.lerp(p1, 2.0 / 3.0), p1)
}

/// Move the start point, dragging its handle along.
pub(crate) fn pin_start(c: &mut CubicBez, p: Point) {
    let delta: Vec2 = p - c.p0;
    c.p0 = p;
    c.p1 += delta;
}

/// Move the end point, dragging its handle along.
pub(crate) fn pin_end(c: &mut CubicBez, p: Point) {
    let delta: Vec2 = p - c.p3;
    c.p3 = p;
    c.p2 += delta;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owners::{GroupId, NoOwners, OwnerTable};
    use crate::raster::{Pixel, RegionId};
    use kurbo::ParamCurve;
    use std::time::{Duration, Instant};

    fn pair() -> RegionPair {
        RegionPair::new(RegionId(1), RegionId(2)).unwrap()
    }

    #[test]
    fn straight_chain_fits_endpoints_exactly() {
        let chain = BorderChain {
            pixels: (0..4).map(|y| Pixel::new(1, y)).collect(),
        };
        let segs = fit_border(&chain, pair(), BorderKind::SameGroup, 0, &BorderConfig::default());
        assert!(!segs.is_empty());
        assert_eq!(segs[0].curve.p0, Point::new(1.5, 0.5));
        assert_eq!(segs.last().unwrap().curve.p3, Point::new(1.5, 3.5));
        assert!(segs.iter().all(|s| s.pair == pair()));
    }

    #[test]
    fn folded_chain_fits_in_bounded_time() {
        // Greedy trace of a two-pixel-wide border, doubling back at both ends.
        let coords = [
            (8, 39), (7, 39), (7, 38), (8, 38), (9, 38), (9, 39), (9, 40), (10, 40),
            (11, 40), (12, 40), (12, 41), (13, 41), (14, 41), (15, 41), (16, 41), (16, 42),
            (17, 42), (18, 42), (19, 42), (20, 42), (20, 43), (21, 43), (22, 43), (23, 43),
            (24, 43), (24, 42), (23, 42),
        ];
        let chain = BorderChain {
            pixels: coords.iter().map(|&(x, y)| Pixel::new(x, y)).collect(),
        };
        assert!(chain.is_valid());

        let started = Instant::now();
        let segs = fit_border(&chain, pair(), BorderKind::SameGroup, 0, &BorderConfig::default());
        let elapsed = started.elapsed();
        assert!(elapsed < Duration::from_secs(5), "fitting took {elapsed:?}");

        assert_eq!(segs[0].curve.p0, Point::new(8.5, 39.5));
        assert_eq!(segs.last().unwrap().curve.p3, Point::new(23.5, 42.5));
        for w in segs.windows(2) {
            assert!(w[0].curve.p3.distance(w[1].curve.p0) < 1e-9);
        }
    }

    #[test]
    fn right_angle_keeps_its_corner() {
        let chain = BorderChain {
            pixels: (0..6)
                .map(|x| Pixel::new(x, 0))
                .chain((1..6).map(|y| Pixel::new(5, y)))
                .collect(),
        };
        let segs = fit_border(&chain, pair(), BorderKind::SameGroup, 0, &BorderConfig::default());
        let corner = Point::new(5.5, 0.5);
        assert!(segs.iter().any(|s| s.curve.p3 == corner));
    }

    #[test]
    fn curved_polyline_is_continuous_and_close() {
        let points: Vec<Point> = (0..=40)
            .map(|i| {
                let t = i as f64 / 40.0 * std::f64::consts::PI;
                Point::new(20.0 * t.cos(), 20.0 * t.sin())
            })
            .collect();
        let cubics = fit_points(&points, 0.25);
        assert!(!cubics.is_empty());
        assert_eq!(cubics[0].p0, points[0]);
        assert_eq!(cubics.last().unwrap().p3, *points.last().unwrap());
        for w in cubics.windows(2) {
            assert!(w[0].p3.distance(w[1].p0) < 1e-9);
        }
        for c in &cubics {
            let mid = c.eval(0.5);
            let r = mid.to_vec2().hypot();
            assert!((r - 20.0).abs() < 1.0, "radius {r}");
        }
    }

    #[test]
    fn degenerate_input_yields_nothing() {
        assert!(fit_points(&[], 1.0).is_empty());
        assert!(fit_points(&[Point::new(1.0, 1.0), Point::new(1.0, 1.0)], 1.0).is_empty());
    }

    #[test]
    fn classification_follows_policy() {
        let mut owners = OwnerTable::new();
        owners.assign(RegionId(1), GroupId(7));
        let p = pair();
        assert_eq!(
            classify(p, &owners, ClassificationPolicy::OwnerFirst),
            BorderKind::DifferentGroup
        );
        assert_eq!(
            classify(p, &owners, ClassificationPolicy::OwnedOnly),
            BorderKind::SameGroup
        );
        owners.assign(RegionId(2), GroupId(7));
        assert_eq!(
            classify(p, &owners, ClassificationPolicy::OwnerFirst),
            BorderKind::SameGroup
        );
        owners.assign(RegionId(2), GroupId(8));
        assert_eq!(
            classify(p, &owners, ClassificationPolicy::OwnedOnly),
            BorderKind::DifferentGroup
        );
        assert_eq!(
            classify(p, &NoOwners, ClassificationPolicy::OwnerFirst),
            BorderKind::SameGroup
        );
    }
}
