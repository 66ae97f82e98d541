//! Intra-voxel data layout.
//!
//! A [`VoxelLayout`] describes the bytes of one voxel within a layer as
//! an ordered list of named, typed members with default values. The
//! layout is a schema only; chunk buffers replicate its fill pattern and
//! typed reads/writes resolve member offsets through it.

/// Scalar type of a voxel member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl DataType {
    /// Size of the member type in bytes.
    #[inline]
    pub fn byte_size(self) -> usize {
        match self {
            DataType::I8 | DataType::U8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::I32 | DataType::U32 | DataType::F32 => 4,
            DataType::I64 | DataType::U64 | DataType::F64 => 8,
        }
    }
}

/// One named member of a voxel structure.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelMember {
    name: String,
    data_type: DataType,
    /// Default value as a u64 bit pattern; the low `byte_size()` bytes
    /// are the member's initial byte image.
    default_bits: u64,
    /// Byte offset within the voxel.
    offset: usize,
}

impl VoxelMember {
    /// Member name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member scalar type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Default value bit pattern.
    #[inline]
    pub fn default_bits(&self) -> u64 {
        self.default_bits
    }

    /// Byte offset of the member within the voxel.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Ordered member list defining the bytes of one voxel in a layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoxelLayout {
    members: Vec<VoxelMember>,
    /// Sum of member sizes, before 8-byte rounding.
    packed_size: usize,
}

impl VoxelLayout {
    /// Create an empty voxel layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a member. Members pack sequentially in insertion order.
    pub fn add_member(&mut self, name: &str, data_type: DataType, default_bits: u64) -> &mut Self {
        self.members.push(VoxelMember {
            name: name.to_string(),
            data_type,
            default_bits,
            offset: self.packed_size,
        });
        self.packed_size += data_type.byte_size();
        self
    }

    /// Number of members.
    #[inline]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Member by position.
    #[inline]
    pub fn member(&self, index: usize) -> Option<&VoxelMember> {
        self.members.get(index)
    }

    /// First member matching `name`.
    pub fn member_by_name(&self, name: &str) -> Option<&VoxelMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// All members in order.
    #[inline]
    pub fn members(&self) -> &[VoxelMember] {
        &self.members
    }

    /// Voxel byte size: the packed member size rounded up to a multiple
    /// of 8 bytes.
    #[inline]
    pub fn voxel_byte_size(&self) -> usize {
        if self.packed_size == 0 {
            0
        } else {
            (self.packed_size + 7) & !7
        }
    }

    /// Build the per-voxel fill pattern: each member's default bits,
    /// little-endian, truncated to the member size, with zero padding up
    /// to the aligned voxel size.
    pub fn fill_pattern(&self) -> Vec<u8> {
        let mut pattern = vec![0u8; self.voxel_byte_size()];
        for member in &self.members {
            let bytes = member.default_bits.to_le_bytes();
            let size = member.data_type.byte_size();
            pattern[member.offset..member.offset + size].copy_from_slice(&bytes[..size]);
        }
        pattern
    }

    /// Structural equivalence: same member types at the same offsets.
    /// Member names and defaults may differ.
    pub fn matches_equivalent(&self, other: &VoxelLayout) -> bool {
        self.members.len() == other.members.len()
            && self
                .members
                .iter()
                .zip(&other.members)
                .all(|(a, b)| a.data_type == b.data_type && a.offset == b.offset)
    }

    /// Exact match: structural equivalence plus identical member names.
    pub fn matches_exact(&self, other: &VoxelLayout) -> bool {
        self.matches_equivalent(other)
            && self
                .members
                .iter()
                .zip(&other.members)
                .all(|(a, b)| a.name == b.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_offsets_and_size() {
        let mut layout = VoxelLayout::new();
        layout
            .add_member("timestamp", DataType::F64, 0)
            .add_member("x", DataType::F32, 0)
            .add_member("y", DataType::F32, 0)
            .add_member("z", DataType::F32, 0);

        assert_eq!(layout.member_count(), 4);
        assert_eq!(layout.member(0).unwrap().offset(), 0);
        assert_eq!(layout.member(1).unwrap().offset(), 8);
        assert_eq!(layout.member(3).unwrap().offset(), 16);
        // 20 packed bytes round up to 24.
        assert_eq!(layout.voxel_byte_size(), 24);
    }

    #[test]
    fn test_empty_layout_is_zero_sized() {
        assert_eq!(VoxelLayout::new().voxel_byte_size(), 0);
        assert!(VoxelLayout::new().fill_pattern().is_empty());
    }

    #[test]
    fn test_fill_pattern_truncates_defaults() {
        let mut layout = VoxelLayout::new();
        let bits = f32::NEG_INFINITY.to_bits();
        layout.add_member("occupancy", DataType::F32, u64::from(bits));

        let pattern = layout.fill_pattern();
        assert_eq!(pattern.len(), 8);
        assert_eq!(&pattern[..4], &bits.to_le_bytes());
        assert_eq!(&pattern[4..], &[0u8; 4]);
    }

    #[test]
    fn test_equivalence_ignores_names() {
        let mut a = VoxelLayout::new();
        a.add_member("mean", DataType::F32, 0).add_member("cov", DataType::F32, 0);
        let mut b = VoxelLayout::new();
        b.add_member("m", DataType::F32, 0).add_member("c", DataType::F32, 0);
        let mut c = VoxelLayout::new();
        c.add_member("mean", DataType::F32, 0).add_member("cov", DataType::U32, 0);

        assert!(a.matches_equivalent(&b));
        assert!(!a.matches_exact(&b));
        assert!(a.matches_exact(&a.clone()));
        assert!(!a.matches_equivalent(&c));
    }
}
