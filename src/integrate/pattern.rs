//! Reusable ray patterns and the clearing sweep.

use super::RayFlags;
use crate::error::Result;
use crate::map::OccupancyMap;
use glam::{DQuat, DVec3};

/// A source of pattern points: endpoint offsets anchored at a common
/// origin.
///
/// Implementors only supply [`points`](Self::points); ray building is
/// shared. Specialised patterns (cones, fans, imported scans) are
/// distinct types implementing this trait.
pub trait PatternPoints {
    /// The endpoint offsets of the pattern, relative to its origin.
    fn points(&self) -> &[DVec3];

    /// Number of points in the pattern.
    fn point_count(&self) -> usize {
        self.points().len()
    }

    /// Build a ray set from the pattern: `rays` is cleared and filled
    /// with `2 * point_count()` entries where every even entry is
    /// `position` and every odd entry is
    /// `position + scaling * (rotation * offset)`.
    ///
    /// Returns the number of elements written.
    fn build_rays(
        &self,
        rays: &mut Vec<DVec3>,
        position: DVec3,
        rotation: DQuat,
        scaling: f64,
    ) -> usize {
        let points = self.points();
        rays.clear();
        rays.reserve(points.len() * 2);
        for &offset in points {
            rays.push(position);
            rays.push(position + (rotation * offset) * scaling);
        }
        rays.len()
    }
}

/// A concrete, user-populated pattern: an ordered list of endpoint
/// offsets.
#[derive(Clone, Debug, Default)]
pub struct RayPattern {
    points: Vec<DVec3>,
}

impl RayPattern {
    /// Create an empty pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single endpoint offset.
    pub fn add_point(&mut self, point: DVec3) -> &mut Self {
        self.points.push(point);
        self
    }

    /// Append a set of endpoint offsets.
    pub fn add_points(&mut self, points: &[DVec3]) -> &mut Self {
        self.points.extend_from_slice(points);
        self
    }
}

impl PatternPoints for RayPattern {
    #[inline]
    fn points(&self) -> &[DVec3] {
        &self.points
    }
}

/// Applies a [`PatternPoints`] as a clearing sweep.
///
/// The sweep integrates the pattern's rays with endpoint-as-free,
/// stop-on-first-occupied, clear-only policy: free space along each ray
/// is reasserted up to the first legitimately occupied voxel, resetting
/// transient false positives without eroding real obstacles.
pub struct ClearingPattern {
    pattern: Box<dyn PatternPoints>,
    ray_set: Vec<DVec3>,
}

impl ClearingPattern {
    /// Flags applied by the clearing sweep.
    pub const FLAGS: RayFlags = RayFlags::END_POINT_AS_FREE
        .union(RayFlags::STOP_ON_FIRST_OCCUPIED)
        .union(RayFlags::CLEAR_ONLY);

    /// Create a clearing pattern taking ownership of `pattern`.
    pub fn new(pattern: Box<dyn PatternPoints>) -> Self {
        Self {
            pattern,
            ray_set: Vec::new(),
        }
    }

    /// The wrapped pattern.
    #[inline]
    pub fn pattern(&self) -> &dyn PatternPoints {
        self.pattern.as_ref()
    }

    /// Apply the pattern to `map` at the given pose. Returns the number
    /// of rays integrated.
    pub fn apply(
        &mut self,
        map: &mut OccupancyMap,
        position: DVec3,
        rotation: DQuat,
        scaling: f64,
    ) -> Result<usize> {
        self.pattern
            .build_rays(&mut self.ray_set, position, rotation, scaling);
        map.integrate_rays(&self.ray_set, Self::FLAGS)
    }

    /// Build and expose the ray set for the given pose without applying
    /// it, for callers that want to inspect or post-process the rays.
    pub fn build_ray_set(&mut self, position: DVec3, rotation: DQuat, scaling: f64) -> &[DVec3] {
        self.pattern
            .build_rays(&mut self.ray_set, position, rotation, scaling);
        &self.ray_set
    }

    /// The most recently built ray set.
    #[inline]
    pub fn last_ray_set(&self) -> &[DVec3] {
        &self.ray_set
    }
}
