//! The sparse occupancy map.
//!
//! An [`OccupancyMap`] is a hash table of regions, each lazily allocated
//! as a [`MapChunk`] on first write. Voxel values are log-odds occupancy
//! probabilities updated additively with clamping; a reserved sentinel
//! ([`UNOBSERVED_OCCUPANCY`]) distinguishes "never observed" from any
//! numeric value.

pub mod chunk;
pub mod config;
mod voxel;

pub use chunk::MapChunk;
pub use config::OccupancyMapConfig;
pub use voxel::{Voxel, VoxelMut};

use crate::core::{Key, RegionCoord};
use crate::error::{MapError, Result};
use crate::grid::{LineWalker, MapGeometry};
use crate::integrate::{RayFlags, RayIntegrator};
use crate::layout::default_layers::{self, UNOBSERVED_OCCUPANCY};
use crate::layout::MapLayout;
use glam::DVec3;
use log::{debug, trace};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Classification of an occupancy value against the map threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupancyType {
    /// No evidence has been recorded for the voxel.
    Unobserved,
    /// Observed with log-odds below the occupancy threshold.
    Free,
    /// Observed with log-odds at or above the occupancy threshold.
    Occupied,
}

pub(crate) type RegionTable = HashMap<RegionCoord, MapChunk, ahash::RandomState>;

/// Sparse, region-chunked 3-D occupancy map.
pub struct OccupancyMap {
    config: OccupancyMapConfig,
    layout: MapLayout,
    regions: RegionTable,
    /// Monotonic update counter; advanced by every write batch.
    stamp: u64,
}

impl OccupancyMap {
    /// Create a map with the default layout (occupancy layer only).
    pub fn new(config: OccupancyMapConfig) -> Result<Self> {
        let mut layout = MapLayout::new();
        default_layers::add_occupancy(&mut layout);
        Self::with_layout(config, layout)
    }

    /// Create a map with a custom layout.
    pub fn with_layout(config: OccupancyMapConfig, layout: MapLayout) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            layout,
            regions: RegionTable::default(),
            stamp: 0,
        })
    }

    /// Map configuration.
    #[inline]
    pub fn config(&self) -> &OccupancyMapConfig {
        &self.config
    }

    /// Voxel size in metres.
    #[inline]
    pub fn resolution(&self) -> f64 {
        self.config.resolution
    }

    /// Voxels per region along each axis.
    #[inline]
    pub fn region_voxel_dim(&self) -> [u8; 3] {
        self.config.region_voxel_dim
    }

    /// World position of the voxel grid origin.
    #[inline]
    pub fn origin(&self) -> DVec3 {
        DVec3::from_array(self.config.origin)
    }

    /// The map's conversion geometry as a copyable bundle.
    #[inline]
    pub fn geometry(&self) -> MapGeometry {
        MapGeometry {
            origin: self.origin(),
            resolution: self.config.resolution,
            region_dim: self.config.region_voxel_dim,
        }
    }

    /// The voxel schema.
    #[inline]
    pub fn layout(&self) -> &MapLayout {
        &self.layout
    }

    /// Mutable access to the voxel schema.
    ///
    /// Fails with [`MapError::LayoutLocked`] once any chunk exists:
    /// chunk buffers are dimensioned by the layout, so reshaping a
    /// populated map would corrupt storage.
    pub fn layout_mut(&mut self) -> Result<&mut MapLayout> {
        if self.regions.is_empty() {
            Ok(&mut self.layout)
        } else {
            Err(MapError::LayoutLocked)
        }
    }

    /// Current update stamp.
    #[inline]
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    /// Advance and return the update stamp. Chunks written afterwards
    /// record the returned value.
    #[inline]
    pub fn touch(&mut self) -> u64 {
        self.stamp += 1;
        self.stamp
    }

    /// Number of allocated regions.
    #[inline]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Remove every chunk, returning the map to the unobserved state.
    /// The layout is retained.
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Key of the voxel containing `point`.
    #[inline]
    pub fn voxel_key(&self, point: DVec3) -> Key {
        self.geometry().voxel_key(point)
    }

    /// World position of the centre of `key`'s voxel.
    #[inline]
    pub fn voxel_centre(&self, key: Key) -> DVec3 {
        self.geometry().voxel_centre(key)
    }

    /// World position of a region's minimum corner.
    #[inline]
    pub fn region_origin(&self, region: RegionCoord) -> DVec3 {
        self.geometry().region_origin(region)
    }

    /// Step `key` by `delta` voxels along `axis`, carrying into the
    /// region coordinate as needed.
    #[inline]
    pub fn step_key(&self, key: Key, axis: usize, delta: i32) -> Key {
        key.stepped(axis, delta, self.config.region_voxel_dim)
    }

    // ------------------------------------------------------------------
    // Chunk and voxel access
    // ------------------------------------------------------------------

    /// The chunk for `region`, if allocated.
    #[inline]
    pub fn region(&self, region: RegionCoord) -> Option<&MapChunk> {
        self.regions.get(&region)
    }

    /// The chunk for `region`, optionally creating it.
    ///
    /// Returns `Ok(None)` when the chunk is absent and `create` is
    /// false. Creation failure reports [`MapError::ResourceExhausted`].
    pub fn region_mut(&mut self, region: RegionCoord, create: bool) -> Result<Option<&mut MapChunk>> {
        if create {
            self.regions
                .try_reserve(1)
                .map_err(|_| MapError::ResourceExhausted("region table".to_string()))?;
        }
        let stamp = self.stamp;
        match self.regions.entry(region) {
            Entry::Occupied(entry) => Ok(Some(entry.into_mut())),
            Entry::Vacant(entry) => {
                if create {
                    trace!("allocating region {:?}", region);
                    let chunk = MapChunk::new(
                        region,
                        &self.layout,
                        self.config.region_voxel_dim,
                        stamp,
                    )?;
                    Ok(Some(entry.insert(chunk)))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Read-only handle for the voxel at `key`.
    ///
    /// `None` when the key is invalid for this map or its region has
    /// never been allocated (an unobserved lookup).
    pub fn voxel(&self, key: Key) -> Option<Voxel<'_>> {
        if key.is_null() || !key.is_local_valid(self.config.region_voxel_dim) {
            return None;
        }
        let chunk = self.regions.get(&key.region())?;
        Some(Voxel {
            map: self,
            chunk,
            key,
        })
    }

    /// Mutable handle for the voxel at `key`, allocating its chunk if
    /// needed.
    pub fn voxel_mut(&mut self, key: Key) -> Result<VoxelMut<'_>> {
        if key.is_null() || !key.is_local_valid(self.config.region_voxel_dim) {
            return Err(MapError::InvalidKey(key));
        }
        let stamp = self.touch();
        let region_dim = self.config.region_voxel_dim;
        self.regions
            .try_reserve(1)
            .map_err(|_| MapError::ResourceExhausted("region table".to_string()))?;
        let chunk = match self.regions.entry(key.region()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                trace!("allocating region {:?}", key.region());
                entry.insert(MapChunk::new(key.region(), &self.layout, region_dim, stamp)?)
            }
        };
        Ok(VoxelMut {
            chunk,
            layout: &self.layout,
            region_dim,
            key,
            stamp,
        })
    }

    /// Log-odds occupancy at `key`; [`UNOBSERVED_OCCUPANCY`] for absent
    /// or invalid voxels.
    pub fn occupancy(&self, key: Key) -> f32 {
        self.voxel(key)
            .map(|voxel| voxel.occupancy())
            .unwrap_or(UNOBSERVED_OCCUPANCY)
    }

    /// Classify a log-odds value against the map threshold.
    #[inline]
    pub fn classify(&self, value: f32) -> OccupancyType {
        if value == UNOBSERVED_OCCUPANCY {
            OccupancyType::Unobserved
        } else if value >= self.config.occupancy_threshold_value {
            OccupancyType::Occupied
        } else {
            OccupancyType::Free
        }
    }

    /// Classification of the voxel at `key`.
    #[inline]
    pub fn occupancy_type(&self, key: Key) -> OccupancyType {
        self.classify(self.occupancy(key))
    }

    // ------------------------------------------------------------------
    // Eviction
    // ------------------------------------------------------------------

    /// Remove chunks whose last write predates `before_stamp`. Returns
    /// the number of chunks removed.
    ///
    /// Outstanding voxel handles cannot survive this call: it takes the
    /// map mutably.
    pub fn expire_regions(&mut self, before_stamp: u64) -> usize {
        let before = self.regions.len();
        self.regions
            .retain(|_, chunk| chunk.touched_stamp() >= before_stamp);
        let removed = before - self.regions.len();
        if removed > 0 {
            debug!("expired {} regions before stamp {}", removed, before_stamp);
        }
        removed
    }

    /// Remove chunks whose region centre lies farther than `max_dist`
    /// from `origin`. Returns the number of chunks removed.
    pub fn remove_distance_regions(&mut self, origin: DVec3, max_dist: f64) -> usize {
        let geom = self.geometry();
        let before = self.regions.len();
        self.regions
            .retain(|&region, _| geom.region_centre(region).distance(origin) <= max_dist);
        let removed = before - self.regions.len();
        if removed > 0 {
            debug!("removed {} regions beyond {} m", removed, max_dist);
        }
        removed
    }

    // ------------------------------------------------------------------
    // Integration and traversal
    // ------------------------------------------------------------------

    /// Integrate a batch of rays.
    ///
    /// `rays` is a flat, even-length array of `(origin, endpoint)`
    /// pairs. See [`RayIntegrator`] for the update semantics and
    /// [`RayFlags`] for the policy switches. Returns the number of rays
    /// integrated (non-finite rays are skipped with a diagnostic).
    pub fn integrate_rays(&mut self, rays: &[DVec3], flags: RayFlags) -> Result<usize> {
        RayIntegrator::new().integrate_rays(self, rays, flags)
    }

    /// Collect the keys of voxels intersected by a segment into `out`
    /// (cleared first), optionally omitting the final (end point) voxel.
    pub fn calculate_segment_keys(
        &self,
        out: &mut Vec<Key>,
        start: DVec3,
        end: DVec3,
        include_end_point: bool,
    ) -> Result<()> {
        if !(start.is_finite() && end.is_finite()) {
            return Err(MapError::InvalidArgument(format!(
                "segment coordinates must be finite: {start:?} -> {end:?}"
            )));
        }
        out.clear();
        out.extend(LineWalker::new(self.geometry(), start, end));
        if !include_end_point {
            out.pop();
        }
        Ok(())
    }

    /// Split borrows for the ray integrator: the region table, layout,
    /// configuration and stamp counter.
    pub(crate) fn integration_parts(
        &mut self,
    ) -> (&mut RegionTable, &MapLayout, &OccupancyMapConfig, &mut u64) {
        (
            &mut self.regions,
            &self.layout,
            &self.config,
            &mut self.stamp,
        )
    }
}
