//! Batched line-segment key queries.

use crate::core::Key;
use crate::error::{MapError, Result};
use crate::grid::LineWalker;
use crate::map::OccupancyMap;
use glam::DVec3;
use log::warn;

/// Computes the voxel key lists for a batch of line segments without
/// mutating the map.
///
/// Results are a flat key list plus, per segment, the start index and
/// key count within it. Output order matches input order regardless of
/// processing order.
#[derive(Default)]
pub struct LineKeysQuery {
    rays: Vec<DVec3>,
    result_indices: Vec<usize>,
    result_counts: Vec<usize>,
    keys: Vec<Key>,
}

impl LineKeysQuery {
    /// Create an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one segment.
    pub fn add_ray(&mut self, start: DVec3, end: DVec3) -> &mut Self {
        self.rays.push(start);
        self.rays.push(end);
        self
    }

    /// Replace the segment set with a flat, even-length array of
    /// start/end pairs.
    pub fn set_rays(&mut self, rays: &[DVec3]) -> Result<()> {
        if rays.len() % 2 != 0 {
            return Err(MapError::InvalidArgument(format!(
                "ray array length must be even, got {}",
                rays.len()
            )));
        }
        self.rays.clear();
        self.rays.extend_from_slice(rays);
        Ok(())
    }

    /// Number of segments queued.
    #[inline]
    pub fn ray_count(&self) -> usize {
        self.rays.len() / 2
    }

    /// Execute the query against `map`, replacing any previous results.
    ///
    /// Segments with non-finite coordinates produce an empty key list
    /// (count 0) and a diagnostic, keeping result positions aligned with
    /// input positions.
    pub fn execute(&mut self, map: &OccupancyMap) -> Result<()> {
        self.result_indices.clear();
        self.result_counts.clear();
        self.keys.clear();

        let geom = map.geometry();
        for pair in self.rays.chunks_exact(2) {
            let (start, end) = (pair[0], pair[1]);
            self.result_indices.push(self.keys.len());
            if !(start.is_finite() && end.is_finite()) {
                warn!("skipping non-finite segment {:?} -> {:?}", start, end);
                self.result_counts.push(0);
                continue;
            }
            let before = self.keys.len();
            self.keys.extend(LineWalker::new(geom, start, end));
            self.result_counts.push(self.keys.len() - before);
        }
        Ok(())
    }

    /// Per-segment start offsets into [`keys`](Self::keys).
    #[inline]
    pub fn result_indices(&self) -> &[usize] {
        &self.result_indices
    }

    /// Per-segment key counts.
    #[inline]
    pub fn result_counts(&self) -> &[usize] {
        &self.result_counts
    }

    /// The flat key list, segments in input order.
    #[inline]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Keys of one segment.
    pub fn segment_keys(&self, segment: usize) -> &[Key] {
        let start = self.result_indices[segment];
        &self.keys[start..start + self.result_counts[segment]]
    }

    /// Drop queued segments and results.
    pub fn reset(&mut self) {
        self.rays.clear();
        self.result_indices.clear();
        self.result_counts.clear();
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::OccupancyMapConfig;

    fn test_map() -> OccupancyMap {
        OccupancyMap::new(OccupancyMapConfig {
            resolution: 1.0,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_batch_indices_and_counts() {
        let map = test_map();
        let mut query = LineKeysQuery::new();
        query
            .add_ray(DVec3::new(0.5, 0.5, 0.5), DVec3::new(3.5, 0.5, 0.5))
            .add_ray(DVec3::new(0.5, 0.5, 0.5), DVec3::new(0.5, 2.5, 0.5));
        query.execute(&map).unwrap();

        assert_eq!(query.result_indices(), &[0, 4]);
        assert_eq!(query.result_counts(), &[4, 3]);
        assert_eq!(query.keys().len(), 7);

        for (x, key) in query.segment_keys(0).iter().enumerate() {
            assert_eq!(key.local(), [x as u8, 0, 0]);
        }
        for (y, key) in query.segment_keys(1).iter().enumerate() {
            assert_eq!(key.local(), [0, y as u8, 0]);
        }
    }

    #[test]
    fn test_does_not_mutate_map() {
        let map = test_map();
        let mut query = LineKeysQuery::new();
        query.add_ray(DVec3::ZERO, DVec3::new(5.0, 5.0, 5.0));
        query.execute(&map).unwrap();
        assert_eq!(map.region_count(), 0);
    }

    #[test]
    fn test_non_finite_segment_keeps_alignment() {
        let map = test_map();
        let mut query = LineKeysQuery::new();
        query
            .add_ray(DVec3::new(f64::INFINITY, 0.0, 0.0), DVec3::ZERO)
            .add_ray(DVec3::new(0.5, 0.5, 0.5), DVec3::new(1.5, 0.5, 0.5));
        query.execute(&map).unwrap();

        assert_eq!(query.result_counts(), &[0, 2]);
        assert_eq!(query.result_indices(), &[0, 0]);
        assert!(query.segment_keys(0).is_empty());
        assert_eq!(query.segment_keys(1).len(), 2);
    }

    #[test]
    fn test_reset_and_reexecute() {
        let map = test_map();
        let mut query = LineKeysQuery::new();
        query.add_ray(DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0));
        query.execute(&map).unwrap();
        assert_eq!(query.ray_count(), 1);

        query.reset();
        assert_eq!(query.ray_count(), 0);
        assert!(query.keys().is_empty());

        query.add_ray(DVec3::ZERO, DVec3::new(0.0, 1.5, 0.0));
        query.execute(&map).unwrap();
        assert_eq!(query.result_counts(), &[2]);
    }

    #[test]
    fn test_set_rays_validates_length() {
        let mut query = LineKeysQuery::new();
        assert!(query.set_rays(&[DVec3::ZERO]).is_err());
        assert!(query.set_rays(&[DVec3::ZERO, DVec3::X]).is_ok());
        assert_eq!(query.ray_count(), 1);
    }
}
