//! Voxel schema: ordered, named layers of per-voxel data.
//!
//! A [`MapLayout`] is the ordered set of [`MapLayer`]s every chunk in a
//! map allocates. Layer order fixes buffer order in chunks, so the
//! layout of a populated map is immutable; the map gates mutable access
//! accordingly.

pub mod default_layers;
mod layer;
mod voxel_layout;

pub use layer::MapLayer;
pub use voxel_layout::{DataType, VoxelLayout, VoxelMember};

/// Result of comparing two layouts (or two layers).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum MapLayoutMatch {
    /// Layouts are incompatible.
    Different,
    /// Voxel structures and well-known roles match; user layer names may
    /// differ.
    Equivalent,
    /// Identical names and voxel structures in the same order.
    Exact,
}

/// Cached indices of the well-known layers.
#[derive(Clone, Copy, Debug, Default)]
struct WellKnownIndices {
    occupancy: Option<usize>,
    mean: Option<usize>,
    traversal: Option<usize>,
    covariance: Option<usize>,
    clearance: Option<usize>,
    intensity: Option<usize>,
    hit_miss_count: Option<usize>,
    semantic: Option<usize>,
    touch_time: Option<usize>,
    incident_normal: Option<usize>,
}

/// Ordered list of layers defining chunk storage.
#[derive(Clone, Debug, Default)]
pub struct MapLayout {
    layers: Vec<MapLayer>,
    known: WellKnownIndices,
}

impl MapLayout {
    /// Create an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all layers, resulting in an empty layout.
    ///
    /// Only legal on a map holding no chunks; [`crate::OccupancyMap`]
    /// enforces this through its layout access gate.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.known = WellKnownIndices::default();
    }

    /// Add a layer. The returned layer's voxel layout starts empty and
    /// should be populated before any chunk is allocated.
    pub fn add_layer(&mut self, name: &str, subsampling: u16) -> &mut MapLayer {
        let index = self.layers.len();
        self.layers.push(MapLayer::new(name, index, subsampling));
        self.cache_known(index);
        self.layers.last_mut().expect("just pushed")
    }

    /// Number of layers.
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// All layers in index order.
    #[inline]
    pub fn layers(&self) -> &[MapLayer] {
        &self.layers
    }

    /// Layer by index.
    #[inline]
    pub fn layer_by_index(&self, index: usize) -> Option<&MapLayer> {
        self.layers.get(index)
    }

    pub(crate) fn layer_by_index_mut(&mut self, index: usize) -> Option<&mut MapLayer> {
        self.layers.get_mut(index)
    }

    /// First layer matching `name`.
    pub fn layer_by_name(&self, name: &str) -> Option<&MapLayer> {
        self.layers.iter().find(|layer| layer.name() == name)
    }

    /// Index of the first layer matching `name`.
    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name() == name)
    }

    /// Cached index of the `occupancy` layer.
    #[inline]
    pub fn occupancy_layer(&self) -> Option<usize> {
        self.known.occupancy
    }

    /// Cached index of the `mean` layer.
    #[inline]
    pub fn mean_layer(&self) -> Option<usize> {
        self.known.mean
    }

    /// Cached index of the `traversal` layer.
    #[inline]
    pub fn traversal_layer(&self) -> Option<usize> {
        self.known.traversal
    }

    /// Cached index of the `covariance` layer.
    #[inline]
    pub fn covariance_layer(&self) -> Option<usize> {
        self.known.covariance
    }

    /// Cached index of the `clearance` layer.
    #[inline]
    pub fn clearance_layer(&self) -> Option<usize> {
        self.known.clearance
    }

    /// Cached index of the `intensity` layer.
    #[inline]
    pub fn intensity_layer(&self) -> Option<usize> {
        self.known.intensity
    }

    /// Cached index of the `hit_miss_count` layer.
    #[inline]
    pub fn hit_miss_count_layer(&self) -> Option<usize> {
        self.known.hit_miss_count
    }

    /// Cached index of the `semantic` layer.
    #[inline]
    pub fn semantic_layer(&self) -> Option<usize> {
        self.known.semantic
    }

    /// Cached index of the `touch_time` layer.
    #[inline]
    pub fn touch_time_layer(&self) -> Option<usize> {
        self.known.touch_time
    }

    /// Cached index of the `incident_normal` layer.
    #[inline]
    pub fn incident_normal_layer(&self) -> Option<usize> {
        self.known.incident_normal
    }

    /// Keep only the named layers, preserving their relative order, and
    /// repack indices to be contiguous.
    pub fn filter_layers(&mut self, preserve: &[&str]) {
        self.layers.retain(|layer| preserve.contains(&layer.name()));
        self.reindex();
    }

    /// Keep only the layers at the given indices and repack.
    pub fn filter_layers_by_index(&mut self, preserve: &[usize]) {
        let mut keep = 0usize;
        for i in 0..self.layers.len() {
            if preserve.contains(&i) {
                self.layers.swap(keep, i);
                keep += 1;
            }
        }
        self.layers.truncate(keep);
        self.reindex();
    }

    /// Compare this layout against `other`.
    ///
    /// [`MapLayoutMatch::Exact`] requires identical names and voxel
    /// layouts in the same order. [`MapLayoutMatch::Equivalent`]
    /// tolerates differing user layer names but requires matching voxel
    /// structures and matching well-known-name roles.
    pub fn check_equivalent(&self, other: &MapLayout) -> MapLayoutMatch {
        if self.layers.len() != other.layers.len() {
            return MapLayoutMatch::Different;
        }
        let mut result = MapLayoutMatch::Exact;
        for (a, b) in self.layers.iter().zip(&other.layers) {
            match a.check_equivalent(b) {
                MapLayoutMatch::Different => return MapLayoutMatch::Different,
                MapLayoutMatch::Equivalent => {
                    // A name mismatch on a well-known layer changes its
                    // role: the layouts are not interchangeable.
                    if a.name() != b.name()
                        && (default_layers::is_well_known(a.name())
                            || default_layers::is_well_known(b.name()))
                    {
                        return MapLayoutMatch::Different;
                    }
                    result = MapLayoutMatch::Equivalent;
                }
                MapLayoutMatch::Exact => {}
            }
        }
        result
    }

    /// Pair up layers shared with `other`: first by name, then by
    /// equivalent voxel layout among the unmatched remainder. Returns
    /// `(this_index, other_index)` pairs.
    pub fn overlap(&self, other: &MapLayout) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        let mut claimed = vec![false; other.layers.len()];

        for (i, layer) in self.layers.iter().enumerate() {
            if let Some(j) = other
                .layers
                .iter()
                .position(|o| !claimed[o.index()] && o.name() == layer.name())
            {
                claimed[j] = true;
                pairs.push((i, j));
            }
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if pairs.iter().any(|&(a, _)| a == i) {
                continue;
            }
            if let Some(j) = other.layers.iter().position(|o| {
                !claimed[o.index()] && layer.check_equivalent(o) != MapLayoutMatch::Different
            }) {
                claimed[j] = true;
                pairs.push((i, j));
            }
        }
        pairs.sort_unstable();
        pairs
    }

    fn reindex(&mut self) {
        for (index, layer) in self.layers.iter_mut().enumerate() {
            layer.set_index(index);
        }
        self.known = WellKnownIndices::default();
        for index in 0..self.layers.len() {
            self.cache_known(index);
        }
    }

    /// Record `index` in the well-known cache if its name is reserved.
    /// First match wins, matching name lookup semantics.
    fn cache_known(&mut self, index: usize) {
        use self::default_layers as dl;
        let name = self.layers[index].name();
        let slot = match name {
            dl::OCCUPANCY => &mut self.known.occupancy,
            dl::MEAN => &mut self.known.mean,
            dl::TRAVERSAL => &mut self.known.traversal,
            dl::COVARIANCE => &mut self.known.covariance,
            dl::CLEARANCE => &mut self.known.clearance,
            dl::INTENSITY => &mut self.known.intensity,
            dl::HIT_MISS_COUNT => &mut self.known.hit_miss_count,
            dl::SEMANTIC => &mut self.known.semantic,
            dl::TOUCH_TIME => &mut self.known.touch_time,
            dl::INCIDENT_NORMAL => &mut self.known.incident_normal,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupancy_and_clearance() -> MapLayout {
        let mut layout = MapLayout::new();
        default_layers::add_occupancy(&mut layout);
        default_layers::add_clearance(&mut layout);
        layout
    }

    #[test]
    fn test_add_layer_and_lookup() {
        let layout = occupancy_and_clearance();
        assert_eq!(layout.layer_count(), 2);
        assert_eq!(layout.occupancy_layer(), Some(0));
        assert_eq!(layout.clearance_layer(), Some(1));
        assert_eq!(layout.mean_layer(), None);
        assert_eq!(layout.layer_index("clearance"), Some(1));
        assert!(layout.layer_by_name("occupancy").is_some());
        assert!(layout.layer_by_name("missing").is_none());
    }

    #[test]
    fn test_first_match_wins_for_duplicate_names() {
        let mut layout = MapLayout::new();
        default_layers::add_occupancy(&mut layout);
        layout
            .add_layer("occupancy", 0)
            .voxel_layout_mut()
            .add_member("occupancy", DataType::F64, 0);
        assert_eq!(layout.layer_count(), 2);
        assert_eq!(layout.occupancy_layer(), Some(0));
        assert_eq!(
            layout.layer_by_name("occupancy").unwrap().voxel_byte_size(),
            8
        );
    }

    #[test]
    fn test_filter_layers_repacks() {
        let mut layout = occupancy_and_clearance();
        default_layers::add_voxel_mean(&mut layout);

        layout.filter_layers(&["occupancy", "mean"]);
        assert_eq!(layout.layer_count(), 2);
        assert_eq!(layout.occupancy_layer(), Some(0));
        assert_eq!(layout.mean_layer(), Some(1));
        assert_eq!(layout.clearance_layer(), None);
        assert_eq!(layout.layer_by_index(1).unwrap().index(), 1);
    }

    #[test]
    fn test_filter_by_index() {
        let mut layout = occupancy_and_clearance();
        default_layers::add_voxel_mean(&mut layout);

        layout.filter_layers_by_index(&[0, 2]);
        assert_eq!(layout.layer_count(), 2);
        assert_eq!(layout.layer_by_index(1).unwrap().name(), "mean");
        assert_eq!(layout.mean_layer(), Some(1));
    }

    #[test]
    fn test_check_equivalent_levels() {
        let a = occupancy_and_clearance();
        let b = occupancy_and_clearance();
        assert_eq!(a.check_equivalent(&b), MapLayoutMatch::Exact);

        // Same structure, different user layer name.
        let mut c = MapLayout::new();
        default_layers::add_occupancy(&mut c);
        c.add_layer("user_range", 0)
            .voxel_layout_mut()
            .add_member("range", DataType::F32, 0);
        let mut d = MapLayout::new();
        default_layers::add_occupancy(&mut d);
        d.add_layer("other_range", 0)
            .voxel_layout_mut()
            .add_member("range", DataType::F32, 0);
        assert_eq!(c.check_equivalent(&d), MapLayoutMatch::Equivalent);

        // Renaming a well-known layer changes its role.
        assert_eq!(a.check_equivalent(&c), MapLayoutMatch::Different);

        let mut e = MapLayout::new();
        default_layers::add_occupancy(&mut e);
        assert_eq!(a.check_equivalent(&e), MapLayoutMatch::Different);
    }

    #[test]
    fn test_overlap_by_name_then_structure() {
        let mut a = MapLayout::new();
        default_layers::add_occupancy(&mut a);
        default_layers::add_voxel_mean(&mut a);
        a.add_layer("aux", 0)
            .voxel_layout_mut()
            .add_member("value", DataType::F32, 0);

        let mut b = MapLayout::new();
        default_layers::add_voxel_mean(&mut b);
        default_layers::add_occupancy(&mut b);
        b.add_layer("renamed_aux", 0)
            .voxel_layout_mut()
            .add_member("value", DataType::F32, 0);

        let pairs = a.overlap(&b);
        assert_eq!(pairs, vec![(0, 1), (1, 0), (2, 2)]);
    }
}
