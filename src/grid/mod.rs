//! Grid geometry and line traversal.

mod walker;

pub use walker::LineWalker;

use crate::core::{Key, RegionCoord};
use glam::DVec3;

/// World/grid conversion parameters of a map.
///
/// A small copyable bundle so traversal can run while the map itself is
/// mutably borrowed for updates.
#[derive(Clone, Copy, Debug)]
pub struct MapGeometry {
    /// World position of the grid origin (minimum corner of the voxel at
    /// region (0,0,0), local (0,0,0)).
    pub origin: DVec3,
    /// Voxel edge length in metres.
    pub resolution: f64,
    /// Voxels per region along each axis.
    pub region_dim: [u8; 3],
}

impl MapGeometry {
    /// Global integer voxel coordinate containing `point`.
    ///
    /// Cells are half-open on the positive side: a point exactly on a
    /// boundary belongs to the voxel above it. Negative coordinates use
    /// floor semantics.
    pub fn global_coord(&self, point: DVec3) -> [i32; 3] {
        let mut g = [0i32; 3];
        for i in 0..3 {
            let scaled = ((point[i] - self.origin[i]) / self.resolution).floor();
            g[i] = scaled.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
        }
        g
    }

    /// Key of the voxel containing `point`.
    #[inline]
    pub fn voxel_key(&self, point: DVec3) -> Key {
        Key::from_global(self.global_coord(point), self.region_dim)
    }

    /// World position of the centre of `key`'s voxel.
    pub fn voxel_centre(&self, key: Key) -> DVec3 {
        let g = key.to_global(self.region_dim);
        DVec3::new(
            self.origin.x + (f64::from(g[0]) + 0.5) * self.resolution,
            self.origin.y + (f64::from(g[1]) + 0.5) * self.resolution,
            self.origin.z + (f64::from(g[2]) + 0.5) * self.resolution,
        )
    }

    /// World position of a region's minimum corner.
    pub fn region_origin(&self, region: RegionCoord) -> DVec3 {
        DVec3::new(
            self.origin.x + f64::from(region[0]) * f64::from(self.region_dim[0]) * self.resolution,
            self.origin.y + f64::from(region[1]) * f64::from(self.region_dim[1]) * self.resolution,
            self.origin.z + f64::from(region[2]) * f64::from(self.region_dim[2]) * self.resolution,
        )
    }

    /// World position of a region's centre.
    pub fn region_centre(&self, region: RegionCoord) -> DVec3 {
        self.region_origin(region) + 0.5 * self.region_spatial_dim()
    }

    /// Spatial extent of one region.
    pub fn region_spatial_dim(&self) -> DVec3 {
        DVec3::new(
            f64::from(self.region_dim[0]) * self.resolution,
            f64::from(self.region_dim[1]) * self.resolution,
            f64::from(self.region_dim[2]) * self.resolution,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn geometry() -> MapGeometry {
        MapGeometry {
            origin: DVec3::ZERO,
            resolution: 0.25,
            region_dim: [32, 32, 32],
        }
    }

    #[test]
    fn test_voxel_key_floor_semantics() {
        let geom = geometry();
        assert_eq!(geom.global_coord(DVec3::new(0.3, 0.3, 0.3)), [1, 1, 1]);
        assert_eq!(geom.global_coord(DVec3::new(-0.1, -0.1, -0.1)), [-1, -1, -1]);
        // Upper boundary belongs to the next voxel.
        assert_eq!(geom.global_coord(DVec3::new(0.25, 0.0, 0.0)), [1, 0, 0]);
    }

    #[test]
    fn test_key_centre_round_trip() {
        let geom = geometry();
        let points = [
            DVec3::new(0.3, 0.3, 0.3),
            DVec3::new(-1.7, 2.4, -0.01),
            DVec3::new(100.0, -100.0, 0.125),
        ];
        for p in points {
            let key = geom.voxel_key(p);
            let centre = geom.voxel_centre(key);
            for i in 0..3 {
                assert!(
                    (centre[i] - p[i]).abs() <= geom.resolution / 2.0 + 1e-12,
                    "centre {:?} too far from {:?}",
                    centre,
                    p
                );
            }
            assert_eq!(geom.voxel_key(centre), key);
        }
    }

    #[test]
    fn test_region_origin_and_centre() {
        let geom = geometry();
        let origin = geom.region_origin([1, 0, -1]);
        assert_relative_eq!(origin.x, 8.0);
        assert_relative_eq!(origin.y, 0.0);
        assert_relative_eq!(origin.z, -8.0);

        let centre = geom.region_centre([0, 0, 0]);
        assert_relative_eq!(centre.x, 4.0);
        assert_relative_eq!(centre.y, 4.0);
        assert_relative_eq!(centre.z, 4.0);
    }
}
