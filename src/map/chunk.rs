//! Per-region voxel storage.
//!
//! A [`MapChunk`] holds one region's voxel data as a set of parallel
//! byte buffers, one per layer in the map layout, each sized by the
//! layer's sub-sampled extent and initialised by replicating the layer's
//! default fill pattern. Chunks carry update stamps and advisory
//! first/last valid-index hints used to accelerate iteration.

use crate::core::RegionCoord;
use crate::error::{MapError, Result};
use crate::layout::{MapLayer, MapLayout};

/// Storage for one region of the map.
#[derive(Clone, Debug)]
pub struct MapChunk {
    region: RegionCoord,
    /// One byte buffer per layer, in layout order.
    buffers: Vec<Vec<u8>>,
    /// Map stamp at allocation time.
    allocated_stamp: u64,
    /// Map stamp of the most recent write.
    touched_stamp: u64,
    /// Advisory hint: smallest occupancy-layer voxel index ever written.
    first_valid_index: Option<u32>,
    /// Advisory hint: largest occupancy-layer voxel index ever written.
    last_valid_index: Option<u32>,
}

impl MapChunk {
    /// Allocate and fill a chunk for `region` according to `layout`.
    ///
    /// Fails with [`MapError::ResourceExhausted`] if a layer buffer
    /// cannot be allocated.
    pub(crate) fn new(
        region: RegionCoord,
        layout: &MapLayout,
        region_dim: [u8; 3],
        stamp: u64,
    ) -> Result<Self> {
        let mut buffers = Vec::new();
        buffers
            .try_reserve_exact(layout.layer_count())
            .map_err(|_| MapError::ResourceExhausted("chunk layer table".to_string()))?;

        for layer in layout.layers() {
            let size = layer.layer_byte_size(region_dim);
            let mut buffer = Vec::new();
            buffer.try_reserve_exact(size).map_err(|_| {
                MapError::ResourceExhausted(format!(
                    "layer '{}' buffer ({} bytes)",
                    layer.name(),
                    size
                ))
            })?;
            let pattern = layer.voxel_layout().fill_pattern();
            if pattern.is_empty() {
                buffer.resize(size, 0);
            } else {
                for _ in 0..layer.volume(region_dim) {
                    buffer.extend_from_slice(&pattern);
                }
            }
            debug_assert_eq!(buffer.len(), size);
            buffers.push(buffer);
        }

        Ok(Self {
            region,
            buffers,
            allocated_stamp: stamp,
            touched_stamp: stamp,
            first_valid_index: None,
            last_valid_index: None,
        })
    }

    /// The region coordinate this chunk stores.
    #[inline]
    pub fn region(&self) -> RegionCoord {
        self.region
    }

    /// Map stamp at allocation.
    #[inline]
    pub fn allocated_stamp(&self) -> u64 {
        self.allocated_stamp
    }

    /// Map stamp of the most recent write.
    #[inline]
    pub fn touched_stamp(&self) -> u64 {
        self.touched_stamp
    }

    pub(crate) fn touch(&mut self, stamp: u64) {
        self.touched_stamp = stamp;
    }

    /// Smallest occupancy voxel index ever written, if any.
    #[inline]
    pub fn first_valid_index(&self) -> Option<u32> {
        self.first_valid_index
    }

    /// Largest occupancy voxel index ever written, if any.
    #[inline]
    pub fn last_valid_index(&self) -> Option<u32> {
        self.last_valid_index
    }

    pub(crate) fn update_valid_bounds(&mut self, voxel_index: u32) {
        self.first_valid_index = Some(match self.first_valid_index {
            Some(first) => first.min(voxel_index),
            None => voxel_index,
        });
        self.last_valid_index = Some(match self.last_valid_index {
            Some(last) => last.max(voxel_index),
            None => voxel_index,
        });
    }

    /// Raw bytes of one layer's buffer.
    #[inline]
    pub fn layer_bytes(&self, layer_index: usize) -> &[u8] {
        &self.buffers[layer_index]
    }

    /// Mutable raw bytes of one layer's buffer.
    #[inline]
    pub fn layer_bytes_mut(&mut self, layer_index: usize) -> &mut [u8] {
        &mut self.buffers[layer_index]
    }

    #[inline]
    fn member_range(layer: &MapLayer, voxel_index: usize, member_offset: usize, size: usize) -> std::ops::Range<usize> {
        let start = voxel_index * layer.voxel_byte_size() + member_offset;
        start..start + size
    }

    /// Read an `f32` member of a voxel in `layer`.
    #[inline]
    pub fn read_f32(&self, layer: &MapLayer, voxel_index: usize, member_offset: usize) -> f32 {
        let range = Self::member_range(layer, voxel_index, member_offset, 4);
        let bytes = &self.buffers[layer.index()][range];
        f32::from_le_bytes(bytes.try_into().expect("4 byte slice"))
    }

    /// Write an `f32` member of a voxel in `layer`.
    #[inline]
    pub fn write_f32(&mut self, layer: &MapLayer, voxel_index: usize, member_offset: usize, value: f32) {
        let range = Self::member_range(layer, voxel_index, member_offset, 4);
        self.buffers[layer.index()][range].copy_from_slice(&value.to_le_bytes());
    }

    /// Read a `u32` member of a voxel in `layer`.
    #[inline]
    pub fn read_u32(&self, layer: &MapLayer, voxel_index: usize, member_offset: usize) -> u32 {
        let range = Self::member_range(layer, voxel_index, member_offset, 4);
        let bytes = &self.buffers[layer.index()][range];
        u32::from_le_bytes(bytes.try_into().expect("4 byte slice"))
    }

    /// Write a `u32` member of a voxel in `layer`.
    #[inline]
    pub fn write_u32(&mut self, layer: &MapLayer, voxel_index: usize, member_offset: usize, value: u32) {
        let range = Self::member_range(layer, voxel_index, member_offset, 4);
        self.buffers[layer.index()][range].copy_from_slice(&value.to_le_bytes());
    }
}
