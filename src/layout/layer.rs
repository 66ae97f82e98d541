//! A single named layer of the voxel schema.

use super::voxel_layout::VoxelLayout;
use super::MapLayoutMatch;
use crate::core::Key;

/// One parallel voxel array in every chunk: a name, a position in the
/// layout, an optional sub-sampling factor and the intra-voxel layout.
///
/// A `subsampling` of `s` scales each region dimension by `1 << s`, so
/// one layer voxel covers `8^s` map voxels. Sub-sampled layers trade
/// precision for memory on coarse data such as clearance estimates.
#[derive(Clone, Debug)]
pub struct MapLayer {
    name: String,
    index: usize,
    subsampling: u16,
    voxel_layout: VoxelLayout,
}

impl MapLayer {
    pub(super) fn new(name: &str, index: usize, subsampling: u16) -> Self {
        Self {
            name: name.to_string(),
            index,
            subsampling,
            voxel_layout: VoxelLayout::new(),
        }
    }

    /// Layer name. Names need not be unique; lookups return the first match.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of this layer in the owning layout.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    pub(super) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Sub-sampling exponent (0..3).
    #[inline]
    pub fn subsampling(&self) -> u16 {
        self.subsampling
    }

    /// The intra-voxel layout.
    #[inline]
    pub fn voxel_layout(&self) -> &VoxelLayout {
        &self.voxel_layout
    }

    /// Mutable voxel layout, for populating a freshly added layer.
    #[inline]
    pub fn voxel_layout_mut(&mut self) -> &mut VoxelLayout {
        &mut self.voxel_layout
    }

    /// Bytes per voxel in this layer.
    #[inline]
    pub fn voxel_byte_size(&self) -> usize {
        self.voxel_layout.voxel_byte_size()
    }

    /// Layer dimensions for a region of `region_dim` voxels, accounting
    /// for sub-sampling. Never collapses below one voxel per axis.
    #[inline]
    pub fn dimensions(&self, region_dim: [u8; 3]) -> [usize; 3] {
        let mut dims = [0usize; 3];
        for i in 0..3 {
            dims[i] = (usize::from(region_dim[i]) >> self.subsampling).max(1);
        }
        dims
    }

    /// Number of layer voxels in a region.
    #[inline]
    pub fn volume(&self, region_dim: [u8; 3]) -> usize {
        let d = self.dimensions(region_dim);
        d[0] * d[1] * d[2]
    }

    /// Total byte size of this layer's buffer for one region.
    #[inline]
    pub fn layer_byte_size(&self, region_dim: [u8; 3]) -> usize {
        self.volume(region_dim) * self.voxel_byte_size()
    }

    /// Linear index of `key`'s voxel within this layer's buffer.
    ///
    /// The caller must have validated the key's local coordinate against
    /// the map's region dimensions.
    #[inline]
    pub fn voxel_index(&self, key: Key, region_dim: [u8; 3]) -> usize {
        let dims = self.dimensions(region_dim);
        let local = key.local();
        let x = usize::from(local[0]) >> self.subsampling;
        let y = usize::from(local[1]) >> self.subsampling;
        let z = usize::from(local[2]) >> self.subsampling;
        x + dims[0] * (y + dims[1] * z)
    }

    /// Compare two layers for schema compatibility.
    pub fn check_equivalent(&self, other: &MapLayer) -> MapLayoutMatch {
        if self.subsampling != other.subsampling {
            return MapLayoutMatch::Different;
        }
        if !self.voxel_layout.matches_equivalent(&other.voxel_layout) {
            return MapLayoutMatch::Different;
        }
        if self.name == other.name && self.voxel_layout.matches_exact(&other.voxel_layout) {
            MapLayoutMatch::Exact
        } else {
            MapLayoutMatch::Equivalent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::voxel_layout::DataType;

    #[test]
    fn test_dimensions_subsampling() {
        let layer = MapLayer::new("coarse", 0, 2);
        assert_eq!(layer.dimensions([32, 32, 32]), [8, 8, 8]);
        assert_eq!(layer.dimensions([2, 2, 2]), [1, 1, 1]);

        let full = MapLayer::new("full", 0, 0);
        assert_eq!(full.dimensions([32, 16, 8]), [32, 16, 8]);
        assert_eq!(full.volume([32, 16, 8]), 32 * 16 * 8);
    }

    #[test]
    fn test_voxel_index_row_major() {
        let mut layer = MapLayer::new("occupancy", 0, 0);
        layer.voxel_layout_mut().add_member("occupancy", DataType::F32, 0);
        let dim = [4, 4, 4];

        assert_eq!(layer.voxel_index(Key::new([0, 0, 0], [0, 0, 0]), dim), 0);
        assert_eq!(layer.voxel_index(Key::new([0, 0, 0], [1, 0, 0]), dim), 1);
        assert_eq!(layer.voxel_index(Key::new([0, 0, 0], [0, 1, 0]), dim), 4);
        assert_eq!(layer.voxel_index(Key::new([0, 0, 0], [0, 0, 1]), dim), 16);
        assert_eq!(layer.voxel_index(Key::new([0, 0, 0], [3, 3, 3]), dim), 63);
    }

    #[test]
    fn test_check_equivalent() {
        let mut a = MapLayer::new("occupancy", 0, 0);
        a.voxel_layout_mut().add_member("occupancy", DataType::F32, 0);
        let mut b = MapLayer::new("occupancy", 1, 0);
        b.voxel_layout_mut().add_member("occupancy", DataType::F32, 0);
        let mut c = MapLayer::new("odds", 0, 0);
        c.voxel_layout_mut().add_member("value", DataType::F32, 0);
        let mut d = MapLayer::new("occupancy", 0, 1);
        d.voxel_layout_mut().add_member("occupancy", DataType::F32, 0);

        assert_eq!(a.check_equivalent(&b), MapLayoutMatch::Exact);
        assert_eq!(a.check_equivalent(&c), MapLayoutMatch::Equivalent);
        assert_eq!(a.check_equivalent(&d), MapLayoutMatch::Different);
    }
}
