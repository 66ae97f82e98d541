//! # Akash-Map: 3D Probabilistic Occupancy Mapping
//!
//! A sparse, region-chunked voxel map that ingests streams of sensor
//! rays and maintains per-voxel log-odds occupancy probabilities via
//! Bayesian updates along each ray.
//!
//! ## Features
//!
//! - **Region-chunked sparse storage**: voxels are allocated in
//!   fixed-size regions keyed by integer coordinates; memory grows only
//!   where the sensor has looked
//! - **Layered voxel schema**: each chunk hosts parallel per-layer
//!   arrays (occupancy, sub-voxel mean, traversal, covariance, ...) with
//!   per-layer sub-sampling and configurable fill values
//! - **Deterministic ray traversal**: a 3D DDA with fixed tie-breaking,
//!   suitable for bit-for-bit parity with a parallel update kernel
//! - **Policy-flagged integration**: clearing sweeps, stop-on-occupied,
//!   endpoint-as-free and exclusion filters through one pipeline
//!
//! ## Quick Start
//!
//! ```rust
//! use akash_map::{OccupancyMap, OccupancyMapConfig, OccupancyType, RayFlags};
//! use glam::DVec3;
//!
//! let mut map = OccupancyMap::new(OccupancyMapConfig {
//!     resolution: 0.25,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! // Each ray is an (origin, endpoint) pair in a flat array.
//! let rays = [DVec3::new(0.3, 0.3, 0.3), DVec3::new(1.1, 1.1, 1.1)];
//! map.integrate_rays(&rays, RayFlags::NONE).unwrap();
//!
//! let end = map.voxel_key(DVec3::new(1.1, 1.1, 1.1));
//! assert_eq!(map.occupancy_type(end), OccupancyType::Occupied);
//! ```
//!
//! ## Architecture
//!
//! ```text
//!                    ┌───────────────────┐
//!                    │    Sensor rays    │
//!                    │ (origin,endpoint) │
//!                    └─────────┬─────────┘
//!                              │
//!                              ▼
//!   ┌──────────────┐  ┌───────────────┐  ┌────────────────┐
//!   │  RayPattern/ │─►│ RayIntegrator │◄─│    RayFlags    │
//!   │ ClearingPat. │  │  (update law) │  │    (policy)    │
//!   └──────────────┘  └───────┬───────┘  └────────────────┘
//!                             │ walk
//!                             ▼
//!                     ┌──────────────┐
//!                     │  LineWalker  │  deterministic 3D DDA
//!                     └───────┬──────┘
//!                             │ keys
//!                             ▼
//!   ┌─────────────────────────────────────────────────┐
//!   │                 OccupancyMap                    │
//!   │  region table ──► MapChunk ──► layer buffers    │
//!   │  (sparse hash)    (per region) (MapLayout)      │
//!   └─────────────────────────────────────────────────┘
//!                             ▲
//!                             │ no mutation
//!                     ┌───────┴──────┐
//!                     │ LineKeysQuery│  batched key lists
//!                     └──────────────┘
//! ```
//!
//! ## Coordinates and semantics
//!
//! World positions are metres ([`glam::DVec3`]). A voxel is addressed by
//! a [`Key`]: a signed 16-bit region coordinate plus an 8-bit in-region
//! coordinate. Cells are half-open on the positive side and negative
//! coordinates floor, so `voxel_key` is deterministic everywhere.
//!
//! Occupancy is log-odds: a voxel is *occupied* at or above the
//! configured threshold, *free* below it, and *unobserved* while holding
//! the reserved sentinel ([`UNOBSERVED_OCCUPANCY`]). Updates are
//! additive with clamping to the configured range.
//!
//! ## Concurrency
//!
//! The map is not internally synchronised: one writer at a time, readers
//! only while no writer is active. Voxel handles borrow the map and so
//! cannot outlive it or survive eviction.

pub mod core;
pub mod error;
pub mod grid;
pub mod integrate;
pub mod layout;
pub mod map;
pub mod query;

pub use crate::core::{Key, RegionCoord, VoxelMean};
pub use crate::error::{MapError, Result};
pub use crate::grid::{LineWalker, MapGeometry};
pub use crate::integrate::{ClearingPattern, PatternPoints, RayFlags, RayIntegrator, RayPattern};
pub use crate::layout::default_layers::{self, UNOBSERVED_OCCUPANCY};
pub use crate::layout::{DataType, MapLayer, MapLayout, MapLayoutMatch, VoxelLayout};
pub use crate::map::{MapChunk, OccupancyMap, OccupancyMapConfig, OccupancyType, Voxel, VoxelMut};
pub use crate::query::LineKeysQuery;
