//! Occupancy map configuration.

use crate::error::{MapError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for an occupancy map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancyMapConfig {
    /// Voxel size in metres.
    pub resolution: f64,

    /// Voxels per region along each axis. Regions are the allocation
    /// unit of the sparse map.
    pub region_voxel_dim: [u8; 3],

    /// World position of the voxel grid origin: the minimum corner of
    /// voxel `(region (0,0,0), local (0,0,0))`.
    pub origin: [f64; 3],

    /// Log-odds increment for a hit (endpoint) observation.
    ///
    /// Must be positive. Typical: 0.9
    pub hit_value: f32,

    /// Log-odds increment for a miss (pass-through) observation.
    ///
    /// Must be negative. Typical: -0.7
    pub miss_value: f32,

    /// Minimum log-odds value (clamp).
    pub min_value: f32,

    /// Maximum log-odds value (clamp).
    pub max_value: f32,

    /// Log-odds value at and above which a voxel is classified occupied.
    pub occupancy_threshold_value: f32,

    /// Blend weight for sub-voxel mean refinement in the `mean` layer.
    pub sub_voxel_weighting: f64,
}

impl Default for OccupancyMapConfig {
    fn default() -> Self {
        Self {
            resolution: 0.1,
            region_voxel_dim: [32, 32, 32],
            origin: [0.0, 0.0, 0.0],
            hit_value: 0.9,
            miss_value: -0.7,
            min_value: -50.0,
            max_value: 50.0,
            occupancy_threshold_value: 0.5,
            sub_voxel_weighting: 0.3,
        }
    }
}

impl OccupancyMapConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(MapError::InvalidArgument(format!(
                "resolution must be finite and positive, got {}",
                self.resolution
            )));
        }
        if self.region_voxel_dim.iter().any(|&d| d == 0) {
            return Err(MapError::InvalidArgument(format!(
                "region voxel dimensions must be non-zero, got {:?}",
                self.region_voxel_dim
            )));
        }
        if self.origin.iter().any(|o| !o.is_finite()) {
            return Err(MapError::InvalidArgument(format!(
                "origin must be finite, got {:?}",
                self.origin
            )));
        }
        if !(self.hit_value > 0.0) {
            return Err(MapError::InvalidArgument(format!(
                "hit value must be positive, got {}",
                self.hit_value
            )));
        }
        if !(self.miss_value < 0.0) {
            return Err(MapError::InvalidArgument(format!(
                "miss value must be negative, got {}",
                self.miss_value
            )));
        }
        if !(self.min_value < self.max_value) {
            return Err(MapError::InvalidArgument(format!(
                "clamp range is empty: [{}, {}]",
                self.min_value, self.max_value
            )));
        }
        if !self.occupancy_threshold_value.is_finite() {
            return Err(MapError::InvalidArgument(
                "occupancy threshold must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(OccupancyMapConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_resolution() {
        let config = OccupancyMapConfig {
            resolution: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MapError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_zero_region_dim() {
        let config = OccupancyMapConfig {
            region_voxel_dim: [32, 0, 32],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_hit_miss_signs() {
        let config = OccupancyMapConfig {
            hit_value: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = OccupancyMapConfig {
            miss_value: 0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
