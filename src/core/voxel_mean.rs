//! Packed sub-voxel mean coordinate codec.
//!
//! The `mean` layer refines each occupied voxel's position below the
//! voxel resolution. The refined position is stored as a single `u32`
//! packing three 10-bit axis values, each quantising the offset from the
//! voxel centre over `[-0.5, +0.5) * resolution`, plus a `u32` sample
//! count. The compact form keeps the layer at 8 bytes per voxel and is
//! shared bit-for-bit with the parallel update kernel.

use glam::DVec3;

/// Quantisation steps per axis (10 bits).
const AXIS_STEPS: u32 = 1023;
const AXIS_BITS: u32 = 10;
const AXIS_MASK: u32 = (1 << AXIS_BITS) - 1;

/// Sub-voxel mean data for one voxel: packed mean offset plus sample count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoxelMean {
    /// Packed mean offset from the voxel centre (see [`pack_offset`]).
    pub coord: u32,
    /// Number of samples folded into the mean (saturating).
    pub count: u32,
}

/// Pack an offset from the voxel centre into the 10-bit-per-axis form.
///
/// Each axis of `offset` is expected in `[-0.5, +0.5) * resolution`;
/// out-of-range values clamp to the voxel bounds.
pub fn pack_offset(offset: DVec3, resolution: f64) -> u32 {
    let mut packed = 0u32;
    for (i, v) in [offset.x, offset.y, offset.z].into_iter().enumerate() {
        let normalised = (v / resolution + 0.5).clamp(0.0, 1.0);
        let q = (normalised * f64::from(AXIS_STEPS)).round() as u32;
        packed |= q.min(AXIS_STEPS) << (AXIS_BITS * i as u32);
    }
    packed
}

/// Unpack a 10-bit-per-axis mean coordinate into an offset from the
/// voxel centre.
pub fn unpack_offset(packed: u32, resolution: f64) -> DVec3 {
    let axis = |i: u32| {
        let q = (packed >> (AXIS_BITS * i)) & AXIS_MASK;
        (f64::from(q) / f64::from(AXIS_STEPS) - 0.5) * resolution
    };
    DVec3::new(axis(0), axis(1), axis(2))
}

/// Fold a new sample into the running mean.
///
/// `sample_offset` is the sample position relative to the voxel centre.
/// The blend weight is `max(weighting, 1 / (count + 1))`: a plain
/// running mean while the count is small, converging to exponential
/// smoothing at `weighting` once the voxel has seen many samples.
pub fn update_mean(mean: VoxelMean, sample_offset: DVec3, resolution: f64, weighting: f64) -> VoxelMean {
    let weight = weighting.max(1.0 / f64::from(mean.count.saturating_add(1)));
    let current = unpack_offset(mean.coord, resolution);
    let next = current + (sample_offset - current) * weight;
    VoxelMean {
        coord: pack_offset(next, resolution),
        count: mean.count.saturating_add(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pack_unpack_round_trip() {
        let resolution = 0.1;
        let offsets = [
            DVec3::ZERO,
            DVec3::new(0.04, -0.04, 0.02),
            DVec3::new(-0.0499, 0.0499, 0.0),
        ];
        for offset in offsets {
            let unpacked = unpack_offset(pack_offset(offset, resolution), resolution);
            for i in 0..3 {
                // One quantisation step is resolution / 1023.
                assert_relative_eq!(unpacked[i], offset[i], epsilon = resolution / 1000.0);
            }
        }
    }

    #[test]
    fn test_pack_clamps_out_of_range() {
        let resolution = 0.1;
        let packed = pack_offset(DVec3::new(1.0, -1.0, 0.0), resolution);
        let unpacked = unpack_offset(packed, resolution);
        assert!(unpacked.x <= 0.05 && unpacked.x >= 0.049);
        assert!(unpacked.y >= -0.05 && unpacked.y <= -0.049);
    }

    #[test]
    fn test_first_sample_takes_position() {
        let resolution = 0.2;
        let sample = DVec3::new(0.05, -0.03, 0.08);
        let mean = update_mean(VoxelMean::default(), sample, resolution, 0.3);
        assert_eq!(mean.count, 1);
        let unpacked = unpack_offset(mean.coord, resolution);
        for i in 0..3 {
            assert_relative_eq!(unpacked[i], sample[i], epsilon = resolution / 500.0);
        }
    }

    #[test]
    fn test_running_mean_converges() {
        let resolution = 0.2;
        let sample = DVec3::new(0.06, 0.0, -0.04);
        let mut mean = VoxelMean::default();
        for _ in 0..50 {
            mean = update_mean(mean, sample, resolution, 0.3);
        }
        assert_eq!(mean.count, 50);
        let unpacked = unpack_offset(mean.coord, resolution);
        assert_relative_eq!(unpacked.x, sample.x, epsilon = 1e-3);
        assert_relative_eq!(unpacked.z, sample.z, epsilon = 1e-3);
    }

    #[test]
    fn test_count_saturates() {
        let mean = VoxelMean { coord: 0, count: u32::MAX };
        let updated = update_mean(mean, DVec3::ZERO, 0.1, 0.3);
        assert_eq!(updated.count, u32::MAX);
    }
}
