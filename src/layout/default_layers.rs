//! Constructors for the well-known voxel layers.
//!
//! Each function adds its layer to a layout if not already present and
//! returns the layer index. Adding is idempotent, so integration
//! pipelines can demand the layers they consume without coordinating.

use super::{DataType, MapLayout};

/// `occupancy`: log-odds occupancy, one `f32` per voxel.
pub const OCCUPANCY: &str = "occupancy";
/// `mean`: packed sub-voxel mean position plus sample count.
pub const MEAN: &str = "mean";
/// `traversal`: accumulated ray length through the voxel.
pub const TRAVERSAL: &str = "traversal";
/// `covariance`: upper-triangular 3x3 covariance for NDT.
pub const COVARIANCE: &str = "covariance";
/// `clearance`: range to the nearest occupied voxel.
pub const CLEARANCE: &str = "clearance";
/// `intensity`: sensor intensity mean and variance.
pub const INTENSITY: &str = "intensity";
/// `hit_miss_count`: raw hit/miss tallies.
pub const HIT_MISS_COUNT: &str = "hit_miss_count";
/// `semantic`: class label with confidence.
pub const SEMANTIC: &str = "semantic";
/// `touch_time`: approximate last-update time, millisecond quantised.
pub const TOUCH_TIME: &str = "touch_time";
/// `incident_normal`: packed average incident-ray normal.
pub const INCIDENT_NORMAL: &str = "incident_normal";

/// Occupancy value of a voxel that has never been observed.
///
/// A reserved negative sentinel rather than NaN so that
/// `value >= threshold` and `UNOBSERVED < value` remain plain float
/// comparisons, matching the update kernel.
pub const UNOBSERVED_OCCUPANCY: f32 = f32::NEG_INFINITY;

/// True if `name` is one of the reserved layer names.
pub fn is_well_known(name: &str) -> bool {
    matches!(
        name,
        OCCUPANCY
            | MEAN
            | TRAVERSAL
            | COVARIANCE
            | CLEARANCE
            | INTENSITY
            | HIT_MISS_COUNT
            | SEMANTIC
            | TOUCH_TIME
            | INCIDENT_NORMAL
    )
}

/// Add the `occupancy` layer: one `f32` initialised to
/// [`UNOBSERVED_OCCUPANCY`].
pub fn add_occupancy(layout: &mut MapLayout) -> usize {
    if let Some(index) = layout.occupancy_layer() {
        return index;
    }
    let layer = layout.add_layer(OCCUPANCY, 0);
    layer
        .voxel_layout_mut()
        .add_member(OCCUPANCY, DataType::F32, u64::from(UNOBSERVED_OCCUPANCY.to_bits()));
    layer.index()
}

/// Add the `mean` layer: packed coordinate plus sample count.
pub fn add_voxel_mean(layout: &mut MapLayout) -> usize {
    if let Some(index) = layout.mean_layer() {
        return index;
    }
    let layer = layout.add_layer(MEAN, 0);
    layer
        .voxel_layout_mut()
        .add_member("coord", DataType::U32, 0)
        .add_member("count", DataType::U32, 0);
    layer.index()
}

/// Add the `traversal` layer: accumulated in-voxel ray length.
pub fn add_traversal(layout: &mut MapLayout) -> usize {
    if let Some(index) = layout.traversal_layer() {
        return index;
    }
    let layer = layout.add_layer(TRAVERSAL, 0);
    layer.voxel_layout_mut().add_member(TRAVERSAL, DataType::F32, 0);
    layer.index()
}

/// Add the `covariance` layer: upper-triangular covariance, packed as
/// P00, P01, P11, P02, P12, P22.
pub fn add_covariance(layout: &mut MapLayout) -> usize {
    if let Some(index) = layout.covariance_layer() {
        return index;
    }
    let layer = layout.add_layer(COVARIANCE, 0);
    let voxel = layer.voxel_layout_mut();
    for member in ["p00", "p01", "p11", "p02", "p12", "p22"] {
        voxel.add_member(member, DataType::F32, 0);
    }
    layer.index()
}

/// Add the `clearance` layer: one `f32`, -1 meaning unknown.
pub fn add_clearance(layout: &mut MapLayout) -> usize {
    if let Some(index) = layout.clearance_layer() {
        return index;
    }
    let layer = layout.add_layer(CLEARANCE, 0);
    layer
        .voxel_layout_mut()
        .add_member(CLEARANCE, DataType::F32, u64::from((-1.0f32).to_bits()));
    layer.index()
}

/// Add the `intensity` layer: mean and variance of sample intensity.
pub fn add_intensity(layout: &mut MapLayout) -> usize {
    if let Some(index) = layout.intensity_layer() {
        return index;
    }
    let layer = layout.add_layer(INTENSITY, 0);
    layer
        .voxel_layout_mut()
        .add_member("mean", DataType::F32, 0)
        .add_member("cov", DataType::F32, 0);
    layer.index()
}

/// Add the `hit_miss_count` layer: raw hit and miss tallies.
pub fn add_hit_miss_count(layout: &mut MapLayout) -> usize {
    if let Some(index) = layout.hit_miss_count_layer() {
        return index;
    }
    let layer = layout.add_layer(HIT_MISS_COUNT, 0);
    layer
        .voxel_layout_mut()
        .add_member("hit_count", DataType::U32, 0)
        .add_member("miss_count", DataType::U32, 0);
    layer.index()
}

/// Add the `semantic` layer: label, state and probability.
pub fn add_semantic(layout: &mut MapLayout) -> usize {
    if let Some(index) = layout.semantic_layer() {
        return index;
    }
    let layer = layout.add_layer(SEMANTIC, 0);
    layer
        .voxel_layout_mut()
        .add_member("label", DataType::U16, 0)
        .add_member("state_label", DataType::U16, 0)
        .add_member("prob_label", DataType::F32, 0);
    layer.index()
}

/// Add the `touch_time` layer.
pub fn add_touch_time(layout: &mut MapLayout) -> usize {
    if let Some(index) = layout.touch_time_layer() {
        return index;
    }
    let layer = layout.add_layer(TOUCH_TIME, 0);
    layer.voxel_layout_mut().add_member("touch", DataType::U32, 0);
    layer.index()
}

/// Add the `incident_normal` layer.
pub fn add_incident_normal(layout: &mut MapLayout) -> usize {
    if let Some(index) = layout.incident_normal_layer() {
        return index;
    }
    let layer = layout.add_layer(INCIDENT_NORMAL, 0);
    layer
        .voxel_layout_mut()
        .add_member("packed_normal", DataType::U32, 0);
    layer.index()
}
