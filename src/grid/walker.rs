//! Deterministic 3-D voxel traversal.
//!
//! [`LineWalker`] enumerates the voxels intersected by a world-space
//! line segment using a 3-D digital differential analyser
//! (Amanatides-Woo). The sequence starts at the voxel containing the
//! start point, ends at the voxel containing the end point (inclusive)
//! and visits each voxel exactly once, with consecutive keys differing
//! by one step along one axis.
//!
//! Determinism contract: the step axis is the axis with the smallest
//! accumulated boundary-crossing parameter, compared with `<=` and ties
//! broken in axis order x, y, z. A parallel traversal kernel must make
//! identical choices for the key sequences to match bit for bit.

use super::MapGeometry;
use crate::core::Key;
use glam::DVec3;

/// Iterator over the keys of voxels intersected by a line segment.
///
/// Alongside each key the walker tracks the segment parameter at which
/// the voxel is entered and left ([`entry_time`](Self::entry_time) /
/// [`exit_time`](Self::exit_time), in `[0, 1]` of the segment), so
/// callers can attribute in-voxel path lengths without re-walking.
pub struct LineWalker {
    region_dim: [u8; 3],
    end_key: Key,
    current: Key,
    /// Segment parameter of the next boundary crossing per axis.
    t_max: [f64; 3],
    /// Segment parameter advance per voxel step per axis.
    t_delta: [f64; 3],
    step_dir: [i32; 3],
    entry_t: f64,
    exit_t: f64,
    segment_length: f64,
    /// Exact remaining axis steps to the end voxel; guards against
    /// floating point drift ever walking past it.
    steps_remaining: u32,
    started: bool,
    done: bool,
}

impl LineWalker {
    /// Create a walker for the segment from `start` to `end`.
    pub fn new(geom: MapGeometry, start: DVec3, end: DVec3) -> Self {
        let direction = end - start;
        let segment_length = direction.length();

        let mut g = geom.global_coord(start);
        let end_key = geom.voxel_key(end);

        let mut step_dir = [0i32; 3];
        let mut t_max = [f64::INFINITY; 3];
        let mut t_delta = [f64::INFINITY; 3];

        for i in 0..3 {
            if direction[i] > 0.0 {
                step_dir[i] = 1;
            } else if direction[i] < 0.0 {
                step_dir[i] = -1;
            }
            // A start exactly on a voxel boundary enters the voxel in
            // the direction of travel.
            if step_dir[i] < 0 {
                let scaled = (start[i] - geom.origin[i]) / geom.resolution;
                if scaled == scaled.floor() {
                    g[i] -= 1;
                }
            }
        }

        for i in 0..3 {
            if step_dir[i] != 0 {
                let boundary_cell = if step_dir[i] > 0 { g[i] + 1 } else { g[i] };
                let boundary = geom.origin[i] + f64::from(boundary_cell) * geom.resolution;
                t_max[i] = (boundary - start[i]) / direction[i];
                t_delta[i] = geom.resolution / direction[i].abs();
            }
        }

        let current = Key::from_global(g, geom.region_dim);
        let end_global = end_key.to_global(geom.region_dim);
        let steps_remaining = (0..3)
            .map(|i| end_global[i].abs_diff(g[i]))
            .sum::<u32>();

        Self {
            region_dim: geom.region_dim,
            end_key,
            current,
            t_max,
            t_delta,
            step_dir,
            entry_t: 0.0,
            exit_t: 0.0,
            segment_length,
            steps_remaining,
            started: false,
            done: false,
        }
    }

    /// Length of the walked segment in metres.
    #[inline]
    pub fn segment_length(&self) -> f64 {
        self.segment_length
    }

    /// Segment parameter in `[0, 1]` at which the most recently yielded
    /// voxel was entered.
    #[inline]
    pub fn entry_time(&self) -> f64 {
        self.entry_t
    }

    /// Segment parameter in `[0, 1]` at which the most recently yielded
    /// voxel is left (1 for the final voxel).
    #[inline]
    pub fn exit_time(&self) -> f64 {
        self.exit_t
    }

    /// Key of the final voxel of the walk.
    #[inline]
    pub fn end_key(&self) -> Key {
        self.end_key
    }

    /// Smallest pending boundary-crossing parameter, clamped to the
    /// segment.
    #[inline]
    fn next_crossing(&self) -> f64 {
        self.t_max[0].min(self.t_max[1]).min(self.t_max[2]).clamp(0.0, 1.0)
    }

    /// The axis to step: smallest `t_max`, ties resolved x before y
    /// before z.
    #[inline]
    fn step_axis(&self) -> usize {
        if self.t_max[0] <= self.t_max[1] && self.t_max[0] <= self.t_max[2] {
            0
        } else if self.t_max[1] <= self.t_max[2] {
            1
        } else {
            2
        }
    }
}

impl Iterator for LineWalker {
    type Item = Key;

    fn next(&mut self) -> Option<Key> {
        if self.done {
            return None;
        }

        if !self.started {
            self.started = true;
            self.entry_t = 0.0;
            if self.current == self.end_key {
                self.exit_t = 1.0;
                self.done = true;
            } else {
                self.exit_t = self.next_crossing();
            }
            return Some(self.current);
        }

        if self.steps_remaining == 0 {
            // Floating point drift never walked onto the end voxel; land
            // on it directly so the sequence still terminates there.
            self.current = self.end_key;
            self.entry_t = self.exit_t;
            self.exit_t = 1.0;
            self.done = true;
            return Some(self.current);
        }

        let axis = self.step_axis();
        self.steps_remaining -= 1;
        self.entry_t = self.t_max[axis].clamp(0.0, 1.0);
        self.t_max[axis] += self.t_delta[axis];
        self.current = self.current.stepped(axis, self.step_dir[axis], self.region_dim);

        if self.current == self.end_key {
            self.exit_t = 1.0;
            self.done = true;
        } else {
            self.exit_t = self.next_crossing();
        }
        Some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn geometry(resolution: f64) -> MapGeometry {
        MapGeometry {
            origin: DVec3::ZERO,
            resolution,
            region_dim: [32, 32, 32],
        }
    }

    fn walk(resolution: f64, start: DVec3, end: DVec3) -> Vec<Key> {
        LineWalker::new(geometry(resolution), start, end).collect()
    }

    #[test]
    fn test_axis_walk() {
        let keys = walk(1.0, DVec3::ZERO, DVec3::new(3.0, 0.0, 0.0));
        assert_eq!(keys.len(), 4);
        for (x, key) in keys.iter().enumerate() {
            assert_eq!(key.region(), [0, 0, 0]);
            assert_eq!(key.local(), [x as u8, 0, 0]);
        }
    }

    #[test]
    fn test_degenerate_ray_emits_one_key() {
        let p = DVec3::new(0.6, 0.6, 0.6);
        let keys = walk(0.25, p, p);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0], geometry(0.25).voxel_key(p));
    }

    #[test]
    fn test_walk_endpoints_and_adjacency() {
        let geom = geometry(0.25);
        let segments = [
            (DVec3::new(0.3, 0.3, 0.3), DVec3::new(1.1, 1.1, 1.1)),
            (DVec3::new(-0.7, 0.2, 0.9), DVec3::new(1.3, -0.8, 0.1)),
            (DVec3::new(5.1, 5.05, 4.9), DVec3::new(-5.0, -2.5, 0.125)),
        ];
        for (start, end) in segments {
            let keys: Vec<Key> = LineWalker::new(geom, start, end).collect();
            assert_eq!(*keys.first().unwrap(), geom.voxel_key(start));
            assert_eq!(*keys.last().unwrap(), geom.voxel_key(end));

            // Consecutive keys differ by one step on exactly one axis,
            // and no key repeats.
            for pair in keys.windows(2) {
                let a = pair[0].to_global(geom.region_dim);
                let b = pair[1].to_global(geom.region_dim);
                let diff: i32 = (0..3).map(|i| (a[i] - b[i]).abs()).sum();
                assert_eq!(diff, 1, "non-adjacent keys {:?} -> {:?}", pair[0], pair[1]);
            }
            let mut unique = keys.clone();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), keys.len(), "duplicate keys in walk");
        }
    }

    #[test]
    fn test_boundary_start_enters_in_travel_direction() {
        // Start exactly on the boundary x = 2.0 travelling -x: the walk
        // must begin in the voxel below the boundary.
        let keys = walk(1.0, DVec3::new(2.0, 0.5, 0.5), DVec3::new(0.5, 0.5, 0.5));
        assert_eq!(keys[0].local(), [1, 0, 0]);
        assert_eq!(keys.last().unwrap().local(), [0, 0, 0]);

        // Travelling +x from the same point stays in the upper voxel.
        let keys = walk(1.0, DVec3::new(2.0, 0.5, 0.5), DVec3::new(3.5, 0.5, 0.5));
        assert_eq!(keys[0].local(), [2, 0, 0]);
    }

    #[test]
    fn test_tie_break_prefers_x_then_y() {
        // A perfect diagonal hits every boundary pair simultaneously;
        // the tie must resolve x before y before z.
        let keys = walk(1.0, DVec3::new(0.5, 0.5, 0.5), DVec3::new(2.5, 2.5, 0.5));
        let locals: Vec<[u8; 3]> = keys.iter().map(|k| k.local()).collect();
        assert_eq!(
            locals,
            vec![
                [0, 0, 0],
                [1, 0, 0],
                [1, 1, 0],
                [2, 1, 0],
                [2, 2, 0],
            ]
        );
    }

    #[test]
    fn test_entry_exit_times_partition_segment() {
        let geom = geometry(0.25);
        let start = DVec3::new(0.3, 0.3, 0.3);
        let end = DVec3::new(1.1, 0.9, 0.55);
        let mut walker = LineWalker::new(geom, start, end);

        let mut previous_exit = 0.0;
        let mut total = 0.0;
        while let Some(_key) = walker.next() {
            assert_relative_eq!(walker.entry_time(), previous_exit, epsilon = 1e-12);
            assert!(walker.exit_time() >= walker.entry_time());
            total += walker.exit_time() - walker.entry_time();
            previous_exit = walker.exit_time();
        }
        assert_relative_eq!(previous_exit, 1.0, epsilon = 1e-12);
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_walk_crosses_region_boundaries() {
        // 32 voxel regions at 1.0 resolution: x = 31.5 .. 33.5 crosses
        // into region (1,0,0).
        let keys = walk(1.0, DVec3::new(31.5, 0.5, 0.5), DVec3::new(33.5, 0.5, 0.5));
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0].region(), [0, 0, 0]);
        assert_eq!(keys[0].local(), [31, 0, 0]);
        assert_eq!(keys[1].region(), [1, 0, 0]);
        assert_eq!(keys[1].local(), [0, 0, 0]);
        assert_eq!(keys[2].local(), [1, 0, 0]);
    }

    #[test]
    fn test_reverse_walk_mirrors_forward() {
        let geom = geometry(0.25);
        // Offsets chosen away from voxel boundaries so no tie-break is
        // exercised in either direction.
        let start = DVec3::new(0.31, 0.17, 0.83);
        let end = DVec3::new(1.94, 1.02, 0.11);

        let forward: Vec<Key> = LineWalker::new(geom, start, end).collect();
        let mut backward: Vec<Key> = LineWalker::new(geom, end, start).collect();
        backward.reverse();
        assert_eq!(forward, backward);
    }
}
