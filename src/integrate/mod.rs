//! Ray integration: the map's ingestion pipeline.
//!
//! For each `(origin, endpoint)` pair the integrator walks the segment
//! with [`LineWalker`], applies a miss update to every traversed voxel
//! and a hit update to the endpoint voxel, subject to the [`RayFlags`]
//! policy. Updates are additive log-odds with clamping; an unobserved
//! voxel integrates its first update from zero.

mod pattern;

pub use pattern::{ClearingPattern, PatternPoints, RayPattern};

use crate::core::{update_mean, Key, VoxelMean};
use crate::error::{MapError, Result};
use crate::grid::LineWalker;
use crate::layout::default_layers::UNOBSERVED_OCCUPANCY;
use crate::map::chunk::MapChunk;
use crate::map::OccupancyMap;
use glam::DVec3;
use log::warn;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Policy switches for [`RayIntegrator::integrate_rays`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RayFlags(u32);

impl RayFlags {
    /// No special handling.
    pub const NONE: RayFlags = RayFlags(0);
    /// Abort a ray at the first already-occupied voxel encountered,
    /// before updating it.
    pub const STOP_ON_FIRST_OCCUPIED: RayFlags = RayFlags(1 << 0);
    /// Only apply miss updates; never apply a hit at the endpoint.
    pub const CLEAR_ONLY: RayFlags = RayFlags(1 << 1);
    /// Treat the endpoint voxel as traversed (miss) rather than a hit.
    pub const END_POINT_AS_FREE: RayFlags = RayFlags(1 << 2);
    /// Skip the origin voxel in miss updates.
    pub const EXCLUDE_ORIGIN: RayFlags = RayFlags(1 << 3);
    /// Do not update the endpoint voxel at all.
    pub const EXCLUDE_SAMPLE: RayFlags = RayFlags(1 << 4);
    /// Only modify voxels that already hold a value; never allocate.
    pub const EXCLUDE_UNOBSERVED: RayFlags = RayFlags(1 << 5);

    /// Raw bit representation.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if every flag in `other` is set in `self`.
    #[inline]
    pub const fn contains(self, other: RayFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if no flag is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Combine flag sets (const-friendly `|`).
    #[inline]
    pub const fn union(self, other: RayFlags) -> RayFlags {
        RayFlags(self.0 | other.0)
    }
}

impl BitOr for RayFlags {
    type Output = RayFlags;
    #[inline]
    fn bitor(self, rhs: RayFlags) -> RayFlags {
        self.union(rhs)
    }
}

impl BitOrAssign for RayFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: RayFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for RayFlags {
    type Output = RayFlags;
    #[inline]
    fn bitand(self, rhs: RayFlags) -> RayFlags {
        RayFlags(self.0 & rhs.0)
    }
}

/// One walked voxel with its segment parameter interval.
#[derive(Clone, Copy)]
struct WalkedVoxel {
    key: Key,
    entry: f64,
    exit: f64,
}

/// Integrates batches of sensor rays into an [`OccupancyMap`].
///
/// The integrator owns a reusable walk buffer, so reusing one instance
/// across calls avoids per-ray allocation. Rays are processed in input
/// order; within a ray, updates apply in walk order. Chunk lookups are
/// amortised by processing each run of keys sharing a region against a
/// single chunk borrow.
#[derive(Default)]
pub struct RayIntegrator {
    walk: Vec<WalkedVoxel>,
}

impl RayIntegrator {
    /// Create an integrator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Integrate a flat, even-length array of `(origin, endpoint)`
    /// pairs under `flags`.
    ///
    /// Returns the number of rays integrated. Rays with non-finite
    /// coordinates are skipped with a diagnostic. An odd-length array is
    /// rejected without touching the map; allocation failure aborts the
    /// current ray cleanly, leaving prior rays applied.
    pub fn integrate_rays(
        &mut self,
        map: &mut OccupancyMap,
        rays: &[DVec3],
        flags: RayFlags,
    ) -> Result<usize> {
        if rays.len() % 2 != 0 {
            return Err(MapError::InvalidArgument(format!(
                "ray array length must be even, got {}",
                rays.len()
            )));
        }
        if map.layout().occupancy_layer().is_none() {
            return Err(MapError::LayerNotFound(
                crate::layout::default_layers::OCCUPANCY.to_string(),
            ));
        }

        let mut integrated = 0usize;
        for pair in rays.chunks_exact(2) {
            let (origin, sample) = (pair[0], pair[1]);
            if !(origin.is_finite() && sample.is_finite()) {
                warn!("skipping non-finite ray {:?} -> {:?}", origin, sample);
                continue;
            }
            self.integrate_ray(map, origin, sample, flags)?;
            integrated += 1;
        }
        Ok(integrated)
    }

    fn integrate_ray(
        &mut self,
        map: &mut OccupancyMap,
        origin: DVec3,
        sample: DVec3,
        flags: RayFlags,
    ) -> Result<()> {
        let geom = map.geometry();

        self.walk.clear();
        let mut walker = LineWalker::new(geom, origin, sample);
        while let Some(key) = walker.next() {
            self.walk.push(WalkedVoxel {
                key,
                entry: walker.entry_time(),
                exit: walker.exit_time(),
            });
        }
        let segment_length = walker.segment_length();
        let end_key = walker.end_key();
        let start_key = self.walk.first().map(|w| w.key).unwrap_or(Key::NULL);

        // Sample offset from the end voxel centre, for mean refinement.
        let sample_offset = sample - geom.voxel_centre(end_key);

        let create = !flags.contains(RayFlags::EXCLUDE_UNOBSERVED);

        let (regions, layout, config, stamp) = map.integration_parts();
        *stamp += 1;
        let stamp = *stamp;

        let occupancy_layer = layout
            .occupancy_layer()
            .and_then(|i| layout.layer_by_index(i))
            .ok_or_else(|| MapError::LayerNotFound("occupancy".to_string()))?;
        let mean_layer = layout.mean_layer().and_then(|i| layout.layer_by_index(i));
        let traversal_layer = layout
            .traversal_layer()
            .and_then(|i| layout.layer_by_index(i));
        let hit_miss_layer = layout
            .hit_miss_count_layer()
            .and_then(|i| layout.layer_by_index(i));
        let region_dim = config.region_voxel_dim;

        let mut i = 0usize;
        while i < self.walk.len() {
            let region = self.walk[i].key.region();
            let mut j = i;
            while j < self.walk.len() && self.walk[j].key.region() == region {
                j += 1;
            }

            // One chunk borrow per run of keys in the same region.
            if create {
                regions
                    .try_reserve(1)
                    .map_err(|_| MapError::ResourceExhausted("region table".to_string()))?;
            }
            let chunk = match regions.entry(region) {
                std::collections::hash_map::Entry::Occupied(entry) => Some(entry.into_mut()),
                std::collections::hash_map::Entry::Vacant(entry) => {
                    if create {
                        Some(entry.insert(MapChunk::new(region, layout, region_dim, stamp)?))
                    } else {
                        None
                    }
                }
            };
            let Some(chunk) = chunk else {
                // Unobserved region under EXCLUDE_UNOBSERVED: nothing to
                // modify and nothing that can stop the ray.
                i = j;
                continue;
            };

            let mut touched = false;
            for walked in &self.walk[i..j] {
                let voxel_index = occupancy_layer.voxel_index(walked.key, region_dim);
                let current = chunk.read_f32(occupancy_layer, voxel_index, 0);

                if flags.contains(RayFlags::STOP_ON_FIRST_OCCUPIED)
                    && current >= config.occupancy_threshold_value
                {
                    if touched {
                        chunk.touch(stamp);
                    }
                    return Ok(());
                }

                let unobserved = current == UNOBSERVED_OCCUPANCY;
                if flags.contains(RayFlags::EXCLUDE_UNOBSERVED) && unobserved {
                    continue;
                }

                let is_sample = walked.key == end_key;
                let hit = if is_sample {
                    if flags.contains(RayFlags::EXCLUDE_SAMPLE) {
                        continue;
                    }
                    !(flags.contains(RayFlags::END_POINT_AS_FREE)
                        || flags.contains(RayFlags::CLEAR_ONLY))
                } else {
                    if walked.key == start_key && flags.contains(RayFlags::EXCLUDE_ORIGIN) {
                        continue;
                    }
                    false
                };

                let delta = if hit { config.hit_value } else { config.miss_value };
                let base = if unobserved { 0.0 } else { current.max(config.min_value) };
                let next = (base + delta).clamp(config.min_value, config.max_value);
                chunk.write_f32(occupancy_layer, voxel_index, 0, next);
                chunk.update_valid_bounds(voxel_index as u32);
                touched = true;

                if let Some(layer) = traversal_layer {
                    let index = layer.voxel_index(walked.key, region_dim);
                    let in_voxel = ((walked.exit - walked.entry) * segment_length) as f32;
                    let total = chunk.read_f32(layer, index, 0) + in_voxel;
                    chunk.write_f32(layer, index, 0, total);
                }

                if let Some(layer) = hit_miss_layer {
                    let index = layer.voxel_index(walked.key, region_dim);
                    let offset = if hit { 0 } else { 4 };
                    let count = chunk.read_u32(layer, index, offset).saturating_add(1);
                    chunk.write_u32(layer, index, offset, count);
                }

                if hit {
                    if let Some(layer) = mean_layer {
                        let index = layer.voxel_index(walked.key, region_dim);
                        let mean = VoxelMean {
                            coord: chunk.read_u32(layer, index, 0),
                            count: chunk.read_u32(layer, index, 4),
                        };
                        let updated = update_mean(
                            mean,
                            sample_offset,
                            config.resolution,
                            config.sub_voxel_weighting,
                        );
                        chunk.write_u32(layer, index, 0, updated.coord);
                        chunk.write_u32(layer, index, 4, updated.count);
                    }
                }
            }
            if touched {
                chunk.touch(stamp);
            }
            i = j;
        }
        Ok(())
    }
}
