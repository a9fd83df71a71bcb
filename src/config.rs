use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BorderError;

/// All border-generation parameters in one struct.
/// Serializable so presets can be saved next to map data and
/// adjusted without recompiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderConfig {
    // -- Raster stage --
    /// Pixels whose red, green and blue channels are all at or below this
    /// value load as background (black is reserved for "no region").
    pub background_threshold: u8,
    /// If true, colours missing from the definition table are an error.
    /// Otherwise they load as background with a warning.
    pub strict_colors: bool,

    // -- Adjacency stage --
    /// Neighbourhood used when deciding two regions touch.
    pub connectivity: Connectivity,
    /// Use the rayon scanner instead of the sequential one.
    pub parallel_scan: bool,
    /// Slot count of the lock-free pair set used by the parallel scanner.
    /// Pairs beyond this are dropped, so size it generously.
    pub pair_capacity: usize,

    // -- Border pixel stage --
    /// Maximum BFS depth when splicing isolated junction pixels into a border.
    pub bridge_max_depth: usize,

    // -- Polyline stage --
    /// RDP simplification epsilon in raster units.
    pub rdp_epsilon: f64,
    /// Turn angle (radians) above which a simplified polyline is split
    /// before smoothing and fitting. Lower = more corners.
    /// ~0.5 (30 deg) keeps blocky borders angular, ~1.0 (57 deg) suits organic ones.
    pub corner_angle_threshold: f64,
    /// Chaikin corner-cutting iterations. 0 = no smoothing.
    pub smooth_iterations: usize,
    /// Longest allowed polyline segment before curve fitting, raster units.
    pub max_segment_length: f64,

    // -- Curve fitting --
    /// Accuracy for kurbo `fit_to_bezpath_opt` in raster units.
    /// Smaller = more segments, closer fit.
    pub fit_accuracy: f64,
    /// How region pairs are split into SameGroup / DifferentGroup borders.
    pub classification: ClassificationPolicy,

    // -- Endpoint snapping --
    /// Furthest an endpoint moves when snapped onto its junction (raster units).
    pub snap_distance: f64,
    /// Also snap the joints between consecutive segments of one chain.
    /// Off by default: joints are already continuous.
    pub snap_interior_joints: bool,

    // -- Distance field --
    /// Distance (raster units) at which the normalized field saturates to 1.
    pub distance_radius: f32,
    /// Output downsampling factor per axis. 1 = full resolution.
    pub distance_downsample: u32,
}

/// Pixel neighbourhood used for adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Right and bottom neighbours only.
    Four,
    /// Right, bottom and both lower diagonals.
    Eight,
}

/// Precedence used when classifying a border between two regions.
///
/// Every border is a region boundary. Whether it is also an owner
/// boundary depends on the owner lookup; this decides which wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationPolicy {
    /// Owner boundaries win: differing owners give `DifferentGroup`,
    /// including owned-vs-unowned. Two unowned regions are `SameGroup`.
    OwnerFirst,
    /// Region boundaries win: only two regions that both have an owner,
    /// and different ones, give `DifferentGroup`.
    OwnedOnly,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            background_threshold: 8,
            strict_colors: false,
            connectivity: Connectivity::Eight,
            parallel_scan: true,
            pair_capacity: 1 << 18,
            bridge_max_depth: 10,
            rdp_epsilon: 0.75,
            corner_angle_threshold: 1.0,
            smooth_iterations: 2,
            max_segment_length: 2.0,
            fit_accuracy: 0.5,
            classification: ClassificationPolicy::OwnerFirst,
            snap_distance: 10.0,
            snap_interior_joints: false,
            distance_radius: 8.0,
            distance_downsample: 1,
        }
    }
}

impl BorderConfig {
    /// Load a JSON preset. Missing fields take their default values.
    pub fn from_json_file(path: &Path) -> Result<Self, BorderError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Reject parameter combinations the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), BorderError> {
        let invalid = |msg: &str| Err(BorderError::Config(msg.to_string()));
        if self.pair_capacity == 0 {
            return invalid("pair_capacity must be > 0");
        }
        if self.snap_distance.is_nan() || self.snap_distance < 0.0 {
            return invalid("snap_distance must be >= 0");
        }
        if self.corner_angle_threshold.is_nan() || self.corner_angle_threshold <= 0.0 {
            return invalid("corner_angle_threshold must be > 0");
        }
        if self.max_segment_length.is_nan() || self.max_segment_length <= 0.0 {
            return invalid("max_segment_length must be > 0");
        }
        if self.fit_accuracy.is_nan() || self.fit_accuracy <= 0.0 {
            return invalid("fit_accuracy must be > 0");
        }
        if self.distance_radius.is_nan() || self.distance_radius <= 0.0 {
            return invalid("distance_radius must be > 0");
        }
        if self.distance_downsample == 0 {
            return invalid("distance_downsample must be >= 1");
        }
        Ok(())
    }
}
