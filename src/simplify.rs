//! Polyline preparation before curve fitting.
//!
//! Independent steps, normally run in this order:
//! 1. RDP-simplify the pixel staircase
//! 2. Split at sharp turns
//! 3. Chaikin corner cutting per piece (endpoints pinned)
//! 4. Tessellate long segments to near-uniform spacing

use std::f64::consts::PI;

use geo::{LineString, Simplify};
use kurbo::{Point, Vec2};

/// Ramer–Douglas–Peucker simplification. Both endpoints are kept.
pub fn simplify(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() <= 2 || epsilon <= 0.0 {
        return points.to_vec();
    }
    let line: LineString<f64> = points.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>().into();
    line.simplify(&epsilon)
        .into_inner()
        .into_iter()
        .map(|coord| Point::new(coord.x, coord.y))
        .collect()
}

/// Chaikin corner cutting, `iterations` times.
///
/// Every segment is replaced by its 1/4 and 3/4 points; the original
/// first and last points are re-inserted unchanged each iteration so
/// junction coordinates survive smoothing exactly.
pub fn smooth(points: &[Point], iterations: usize) -> Vec<Point> {
    if iterations == 0 || points.len() < 3 {
        return points.to_vec();
    }
    let first = points[0];
    let last = points[points.len() - 1];
    let mut current = points.to_vec();
    for _ in 0..iterations {
        let mut next = Vec::with_capacity(current.len() * 2);
        next.push(first);
        for w in current.windows(2) {
            next.push(w[0].lerp(w[1], 0.25));
            next.push(w[0].lerp(w[1], 0.75));
        }
        next.push(last);
        current = next;
    }
    current
}

/// Split an open polyline at every vertex that turns sharper than
/// `max_turn` radians, and wherever a piece has turned through half a
/// revolution. Split vertices end one piece and start the next.
///
/// Pixel chains fold back on themselves where a border is two pixels
/// wide; curve fitting needs each piece free of such cusps.
pub fn split_at_corners(points: &[Point], max_turn: f64) -> Vec<Vec<Point>> {
    if points.len() < 3 {
        return vec![points.to_vec()];
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut turned = 0.0;
    for i in 1..points.len() - 1 {
        let turn = turn_angle(points[i] - points[i - 1], points[i + 1] - points[i]);
        if turn > max_turn || turned + turn > PI {
            pieces.push(points[start..=i].to_vec());
            start = i;
            turned = 0.0;
        } else {
            turned += turn;
        }
    }
    pieces.push(points[start..].to_vec());
    pieces
}

/// Unsigned angle between two vectors, in radians [0, pi].
fn turn_angle(a: Vec2, b: Vec2) -> f64 {
    a.cross(b).atan2(a.dot(b)).abs()
}

/// Subdivide every segment longer than `max_segment_length` into equal parts.
pub fn tessellate(points: &[Point], max_segment_length: f64) -> Vec<Point> {
    if points.len() < 2 || max_segment_length <= 0.0 {
        return points.to_vec();
    }
    let mut result = Vec::with_capacity(points.len());
    result.push(points[0]);
    for w in points.windows(2) {
        let length = w[0].distance(w[1]);
        if length > max_segment_length {
            let parts = (length / max_segment_length).ceil() as usize;
            for k in 1..parts {
                result.push(w[0].lerp(w[1], k as f64 / parts as f64));
            }
        }
        result.push(w[1]);
    }
    result
}

/// Drop consecutive points closer than `tolerance`, keeping the last point.
pub fn dedup(points: &[Point], tolerance: f64) -> Vec<Point> {
    let mut result: Vec<Point> = Vec::with_capacity(points.len());
    for (i, &p) in points.iter().enumerate() {
        let is_last = i + 1 == points.len();
        let kept = result.len();
        match result.last_mut() {
            Some(prev) if prev.distance(p) <= tolerance => {
                if is_last && kept > 1 {
                    *prev = p;
                }
            }
            _ => result.push(p),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn rdp_collapses_collinear_run() {
        let line = pts(&[(0.0, 0.0), (1.0, 0.1), (2.0, -0.1), (3.0, 0.0)]);
        assert_eq!(simplify(&line, 0.5), pts(&[(0.0, 0.0), (3.0, 0.0)]));
    }

    #[test]
    fn rdp_keeps_far_point() {
        let corner = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 5.0), (3.0, 0.0), (4.0, 0.0)]);
        let out = simplify(&corner, 0.5);
        assert!(out.contains(&Point::new(2.0, 5.0)));
        assert_eq!(out.first(), corner.first());
        assert_eq!(out.last(), corner.last());
    }

    #[test]
    fn chaikin_pins_endpoints() {
        let zigzag = pts(&[(0.0, 0.0), (4.0, 4.0), (8.0, 0.0), (12.0, 4.0)]);
        for iterations in 1..4 {
            let out = smooth(&zigzag, iterations);
            assert_eq!(out.first(), zigzag.first());
            assert_eq!(out.last(), zigzag.last());
        }
        // One pass: endpoints + 2 per segment.
        assert_eq!(smooth(&zigzag, 1).len(), 2 + 2 * 3);
        assert_eq!(smooth(&zigzag, 1)[1], Point::new(1.0, 1.0));
    }

    #[test]
    fn tessellate_bounds_segment_length() {
        let line = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 1.0)]);
        let out = tessellate(&line, 3.0);
        assert_eq!(out.len(), 6);
        assert!(out.windows(2).all(|w| w[0].distance(w[1]) <= 3.0 + 1e-9));
        assert_eq!(out[1], Point::new(2.5, 0.0));
    }

    #[test]
    fn dedup_keeps_endpoints() {
        let line = pts(&[(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (1.0, 1e-12)]);
        assert_eq!(dedup(&line, 1e-9), pts(&[(0.0, 0.0), (1.0, 1e-12)]));
        // A lone first point is never replaced.
        assert_eq!(dedup(&pts(&[(0.0, 0.0), (0.0, 1e-12)]), 1e-9), pts(&[(0.0, 0.0)]));
    }

    #[test]
    fn u_turn_splits_at_both_corners() {
        let u = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 1.0), (0.0, 1.0)]);
        let pieces = split_at_corners(&u, 1.0);
        assert_eq!(
            pieces,
            vec![
                pts(&[(0.0, 0.0), (4.0, 0.0)]),
                pts(&[(4.0, 0.0), (4.0, 1.0)]),
                pts(&[(4.0, 1.0), (0.0, 1.0)]),
            ]
        );
    }

    #[test]
    fn gentle_arc_stays_whole() {
        let arc: Vec<Point> = (0..10)
            .map(|i| {
                let a = (i as f64 * 10.0).to_radians();
                Point::new(10.0 * a.cos(), 10.0 * a.sin())
            })
            .collect();
        assert_eq!(split_at_corners(&arc, 1.0), vec![arc]);
    }

    #[test]
    fn long_turn_splits_after_half_revolution() {
        // 25 degrees per vertex: the eighth interior vertex would pass 180.
        let circle: Vec<Point> = (0..15)
            .map(|i| {
                let a = (i as f64 * 25.0).to_radians();
                Point::new(10.0 * a.cos(), 10.0 * a.sin())
            })
            .collect();
        let pieces = split_at_corners(&circle, 1.0);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].len(), 9);
        assert_eq!(pieces[0].last(), pieces[1].first());
        assert_eq!(pieces[1].last(), circle.last());
    }
}
