//! Voxel addressing.
//!
//! A [`Key`] names one voxel in the sparse map as a pair of coordinates:
//! the *region* coordinate selects a chunk in the sparse region table and
//! the *local* coordinate selects a voxel within that chunk. Region
//! coordinates are signed 16-bit per axis; local coordinates are unsigned
//! 8-bit and always less than the map's region voxel dimensions.
//!
//! Keys are totally ordered region-major (then local) and hashable, so
//! they can serve as set/map keys in query results.

/// Region coordinate: addresses one chunk in the sparse region table.
pub type RegionCoord = [i16; 3];

/// A voxel address: `(region, local)`.
///
/// The null key (see [`Key::NULL`]) is a reserved marker meaning
/// "no voxel"; it never addresses storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    region: RegionCoord,
    local: [u8; 3],
}

impl Key {
    /// Marker key denoting "no voxel".
    pub const NULL: Key = Key {
        region: [i16::MAX; 3],
        local: [u8::MAX; 3],
    };

    /// Create a key from region and local coordinates.
    ///
    /// The local coordinate is not range checked here; the map validates
    /// against its region dimensions on use.
    #[inline]
    pub fn new(region: RegionCoord, local: [u8; 3]) -> Self {
        Self { region, local }
    }

    /// The region (chunk) coordinate.
    #[inline]
    pub fn region(&self) -> RegionCoord {
        self.region
    }

    /// The in-region voxel coordinate.
    #[inline]
    pub fn local(&self) -> [u8; 3] {
        self.local
    }

    /// True if this is the reserved null marker.
    #[inline]
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Convert to a global (map-wide) integer voxel coordinate.
    ///
    /// With `|region| <= i16::MAX` and `dim <= 255` the result always
    /// fits an `i32` per axis.
    #[inline]
    pub fn to_global(&self, region_dim: [u8; 3]) -> [i32; 3] {
        let mut g = [0i32; 3];
        for i in 0..3 {
            g[i] = i32::from(self.region[i]) * i32::from(region_dim[i]) + i32::from(self.local[i]);
        }
        g
    }

    /// Build a key from a global integer voxel coordinate.
    ///
    /// Uses Euclidean division so negative coordinates split correctly;
    /// region coordinates outside the representable `i16` range saturate
    /// onto the boundary voxel.
    pub fn from_global(global: [i32; 3], region_dim: [u8; 3]) -> Self {
        let mut region = [0i16; 3];
        let mut local = [0u8; 3];
        for i in 0..3 {
            let dim = i32::from(region_dim[i]);
            let r = global[i].div_euclid(dim);
            if r > i32::from(i16::MAX) {
                region[i] = i16::MAX;
                local[i] = region_dim[i] - 1;
            } else if r < i32::from(i16::MIN) {
                region[i] = i16::MIN;
                local[i] = 0;
            } else {
                region[i] = r as i16;
                local[i] = global[i].rem_euclid(dim) as u8;
            }
        }
        Self { region, local }
    }

    /// Step the key by `delta` voxels along `axis` (0 = x, 1 = y, 2 = z),
    /// carrying between local and region coordinates.
    pub fn stepped(&self, axis: usize, delta: i32, region_dim: [u8; 3]) -> Self {
        debug_assert!(axis < 3);
        let mut g = self.to_global(region_dim);
        g[axis] += delta;
        Self::from_global(g, region_dim)
    }

    /// Check the local coordinate against the map's region dimensions.
    #[inline]
    pub fn is_local_valid(&self, region_dim: [u8; 3]) -> bool {
        (0..3).all(|i| self.local[i] < region_dim[i])
    }
}

impl Default for Key {
    fn default() -> Self {
        Self::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIM: [u8; 3] = [32, 32, 32];

    #[test]
    fn test_null_key() {
        assert!(Key::NULL.is_null());
        assert!(!Key::new([0, 0, 0], [0, 0, 0]).is_null());
        assert_eq!(Key::default(), Key::NULL);
    }

    #[test]
    fn test_global_round_trip() {
        let cases = [
            [0, 0, 0],
            [31, 31, 31],
            [32, 0, 0],
            [-1, -1, -1],
            [-32, -33, 100],
            [1000, -1000, 12345],
        ];
        for g in cases {
            let key = Key::from_global(g, DIM);
            assert_eq!(key.to_global(DIM), g, "round trip for {:?}", g);
        }
    }

    #[test]
    fn test_negative_coordinates_floor() {
        // Global -1 belongs to region -1, local dim-1.
        let key = Key::from_global([-1, -1, -1], DIM);
        assert_eq!(key.region(), [-1, -1, -1]);
        assert_eq!(key.local(), [31, 31, 31]);
    }

    #[test]
    fn test_step_carries_region() {
        let key = Key::new([0, 0, 0], [31, 0, 0]);
        let stepped = key.stepped(0, 1, DIM);
        assert_eq!(stepped.region(), [1, 0, 0]);
        assert_eq!(stepped.local(), [0, 0, 0]);

        let back = stepped.stepped(0, -1, DIM);
        assert_eq!(back, key);

        let far = key.stepped(1, -33, DIM);
        assert_eq!(far.region(), [0, -2, 0]);
        assert_eq!(far.local(), [31, 31, 0]);
    }

    #[test]
    fn test_region_major_ordering() {
        let a = Key::new([0, 0, 0], [31, 31, 31]);
        let b = Key::new([1, 0, 0], [0, 0, 0]);
        assert!(a < b);

        let c = Key::new([0, 0, 0], [0, 0, 1]);
        let d = Key::new([0, 0, 0], [0, 1, 0]);
        assert!(c < d);
    }

    #[test]
    fn test_saturation_at_range_limits() {
        let key = Key::from_global([i32::from(i16::MAX) * 32 + 100, 0, 0], DIM);
        assert_eq!(key.region()[0], i16::MAX);
        assert_eq!(key.local()[0], 31);

        let key = Key::from_global([i32::from(i16::MIN) * 32 - 100, 0, 0], DIM);
        assert_eq!(key.region()[0], i16::MIN);
        assert_eq!(key.local()[0], 0);
    }
}
