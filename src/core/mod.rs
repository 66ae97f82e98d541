//! Fundamental types: voxel keys and the sub-voxel mean codec.

mod key;
mod voxel_mean;

pub use key::{Key, RegionCoord};
pub use voxel_mean::{pack_offset, unpack_offset, update_mean, VoxelMean};
