//! Borrow-scoped voxel access handles.
//!
//! [`Voxel`] reads one voxel through the map's layout; [`VoxelMut`]
//! additionally writes, keeping chunk stamps and valid-index hints
//! consistent. Handles borrow the map (or its chunk storage) and so
//! cannot outlive it, nor survive eviction, by construction.

use super::{OccupancyMap, OccupancyType};
use crate::core::{unpack_offset, Key, VoxelMean};
use crate::layout::default_layers::UNOBSERVED_OCCUPANCY;
use crate::layout::MapLayout;
use crate::map::chunk::MapChunk;
use glam::DVec3;

/// Read-only view of one voxel.
#[derive(Clone, Copy)]
pub struct Voxel<'a> {
    pub(super) map: &'a OccupancyMap,
    pub(super) chunk: &'a MapChunk,
    pub(super) key: Key,
}

impl<'a> Voxel<'a> {
    /// The voxel's key.
    #[inline]
    pub fn key(&self) -> Key {
        self.key
    }

    /// The owning chunk.
    #[inline]
    pub fn chunk(&self) -> &'a MapChunk {
        self.chunk
    }

    /// Log-odds occupancy value; [`UNOBSERVED_OCCUPANCY`] if the layout
    /// has no occupancy layer.
    pub fn occupancy(&self) -> f32 {
        let layout = self.map.layout();
        match layout.occupancy_layer().and_then(|i| layout.layer_by_index(i)) {
            Some(layer) => {
                let index = layer.voxel_index(self.key, self.map.region_voxel_dim());
                self.chunk.read_f32(layer, index, 0)
            }
            None => UNOBSERVED_OCCUPANCY,
        }
    }

    /// Classify this voxel against the map's occupancy threshold.
    #[inline]
    pub fn occupancy_type(&self) -> OccupancyType {
        self.map.classify(self.occupancy())
    }

    /// Sub-voxel mean data, if the layout carries a `mean` layer.
    pub fn voxel_mean(&self) -> Option<VoxelMean> {
        let layout = self.map.layout();
        let layer = layout.mean_layer().and_then(|i| layout.layer_by_index(i))?;
        let index = layer.voxel_index(self.key, self.map.region_voxel_dim());
        Some(VoxelMean {
            coord: self.chunk.read_u32(layer, index, 0),
            count: self.chunk.read_u32(layer, index, 4),
        })
    }

    /// Best-known position of the voxel's content: the refined mean if
    /// the `mean` layer has samples, otherwise the voxel centre.
    pub fn position(&self) -> DVec3 {
        let centre = self.map.voxel_centre(self.key);
        match self.voxel_mean() {
            Some(mean) if mean.count > 0 => {
                centre + unpack_offset(mean.coord, self.map.resolution())
            }
            _ => centre,
        }
    }

    /// Accumulated ray traversal length, if the layout carries a
    /// `traversal` layer.
    pub fn traversal(&self) -> Option<f32> {
        let layout = self.map.layout();
        let layer = layout.traversal_layer().and_then(|i| layout.layer_by_index(i))?;
        let index = layer.voxel_index(self.key, self.map.region_voxel_dim());
        Some(self.chunk.read_f32(layer, index, 0))
    }
}

/// Mutable view of one voxel.
pub struct VoxelMut<'a> {
    pub(super) chunk: &'a mut MapChunk,
    pub(super) layout: &'a MapLayout,
    pub(super) region_dim: [u8; 3],
    pub(super) key: Key,
    /// Stamp recorded on the chunk for any write through this handle.
    pub(super) stamp: u64,
}

impl<'a> VoxelMut<'a> {
    /// The voxel's key.
    #[inline]
    pub fn key(&self) -> Key {
        self.key
    }

    /// Log-odds occupancy value; [`UNOBSERVED_OCCUPANCY`] if the layout
    /// has no occupancy layer.
    pub fn occupancy(&self) -> f32 {
        match self
            .layout
            .occupancy_layer()
            .and_then(|i| self.layout.layer_by_index(i))
        {
            Some(layer) => {
                let index = layer.voxel_index(self.key, self.region_dim);
                self.chunk.read_f32(layer, index, 0)
            }
            None => UNOBSERVED_OCCUPANCY,
        }
    }

    /// Directly set the log-odds occupancy value, bypassing the hit/miss
    /// accumulation. The value is written as given; callers wanting
    /// clamped Bayesian updates should integrate rays instead.
    pub fn set_occupancy(&mut self, value: f32) {
        if let Some(layer) = self
            .layout
            .occupancy_layer()
            .and_then(|i| self.layout.layer_by_index(i))
        {
            let index = layer.voxel_index(self.key, self.region_dim);
            self.chunk.write_f32(layer, index, 0, value);
            self.chunk.update_valid_bounds(index as u32);
            self.chunk.touch(self.stamp);
        }
    }
}
