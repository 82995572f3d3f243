//! Array descriptor interface.
//!
//! The descriptor type is owned by an external collaborator (the
//! compiler's runtime support for non-contiguous data). This module
//! declares its shape and does the safe part, walking element
//! offsets from extents and byte strides in array-element order,
//! while all memory access through `base` stays in the ABI crate.

pub const MAX_RANK: usize = 15;

/// Element type of a described object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum TypeCode {
    Integer64 = 1,
    Real32 = 2,
    Real64 = 3,
    Complex32 = 4,
    Complex64 = 5,
    Logical = 6,
    Character = 7,
}

impl TypeCode {
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            1 => Some(TypeCode::Integer64),
            2 => Some(TypeCode::Real32),
            3 => Some(TypeCode::Real64),
            4 => Some(TypeCode::Complex32),
            5 => Some(TypeCode::Complex64),
            6 => Some(TypeCode::Logical),
            7 => Some(TypeCode::Character),
            _ => None,
        }
    }
}

/// One dimension: extent and byte stride.
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct Dimension {
    pub extent: i64,
    pub byte_stride: i64,
}

/// Describes base address, element width, type, rank, extents and
/// strides of a (possibly non-contiguous) data object.
///
/// `base` is carried as an address, never dereferenced here.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Descriptor {
    pub base: usize,
    pub elem_bytes: usize,
    pub type_code: i32,
    pub rank: usize,
    pub dims: [Dimension; MAX_RANK],
}

impl Descriptor {
    /// A scalar of the given type and width.
    pub fn scalar(base: usize, type_code: TypeCode, elem_bytes: usize) -> Self {
        Self {
            base,
            elem_bytes,
            type_code: type_code as i32,
            rank: 0,
            dims: [Dimension::default(); MAX_RANK],
        }
    }

    /// A rank-1 array with the given extent and byte stride.
    pub fn vector(
        base: usize,
        type_code: TypeCode,
        elem_bytes: usize,
        extent: i64,
        byte_stride: i64,
    ) -> Self {
        let mut dims = [Dimension::default(); MAX_RANK];
        dims[0] = Dimension { extent, byte_stride };
        Self {
            base,
            elem_bytes,
            type_code: type_code as i32,
            rank: 1,
            dims,
        }
    }

    pub fn type_code(&self) -> Option<TypeCode> {
        TypeCode::from_i32(self.type_code)
    }

    /// Rank clamped to the representable maximum; descriptors arrive
    /// from outside the crate and are not trusted.
    pub fn effective_rank(&self) -> usize {
        self.rank.min(MAX_RANK)
    }

    pub fn element_count(&self) -> usize {
        let mut count: usize = 1;
        for d in &self.dims[..self.effective_rank()] {
            count = count.saturating_mul(d.extent.max(0) as usize);
        }
        count
    }

    /// Byte offsets of every element relative to `base`, first
    /// dimension varying fastest.
    pub fn element_offsets(&self) -> OffsetIter<'_> {
        let rank = self.effective_rank();
        OffsetIter {
            desc: self,
            index: vec![0; rank],
            exhausted: self.dims[..rank].iter().any(|d| d.extent <= 0) && rank > 0,
        }
    }
}

/// Odometer over a descriptor's index space.
pub struct OffsetIter<'a> {
    desc: &'a Descriptor,
    index: Vec<i64>,
    exhausted: bool,
}

impl Iterator for OffsetIter<'_> {
    type Item = isize;

    fn next(&mut self) -> Option<isize> {
        if self.exhausted {
            return None;
        }
        let rank = self.desc.effective_rank();
        let offset: isize = self
            .index
            .iter()
            .zip(&self.desc.dims[..rank])
            .map(|(i, d)| (*i * d.byte_stride) as isize)
            .sum();

        if rank == 0 {
            self.exhausted = true;
            return Some(offset);
        }
        // Advance the odometer, first dimension fastest.
        let mut dim = 0;
        loop {
            self.index[dim] += 1;
            if self.index[dim] < self.desc.dims[dim].extent {
                break;
            }
            self.index[dim] = 0;
            dim += 1;
            if dim == rank {
                self.exhausted = true;
                break;
            }
        }
        Some(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_offsets() {
        let d = Descriptor::scalar(0x1000, TypeCode::Integer64, 8);
        let offs: Vec<isize> = d.element_offsets().collect();
        assert_eq!(offs, vec![0]);
        assert_eq!(d.element_count(), 1);
    }

    #[test]
    fn test_contiguous_vector() {
        let d = Descriptor::vector(0x1000, TypeCode::Real64, 8, 4, 8);
        let offs: Vec<isize> = d.element_offsets().collect();
        assert_eq!(offs, vec![0, 8, 16, 24]);
    }

    #[test]
    fn test_strided_vector() {
        let d = Descriptor::vector(0, TypeCode::Real32, 4, 3, 12);
        let offs: Vec<isize> = d.element_offsets().collect();
        assert_eq!(offs, vec![0, 12, 24]);
    }

    #[test]
    fn test_rank2_column_major() {
        let mut d = Descriptor::vector(0, TypeCode::Integer64, 8, 2, 8);
        d.rank = 2;
        d.dims[1] = Dimension {
            extent: 3,
            byte_stride: 16,
        };
        let offs: Vec<isize> = d.element_offsets().collect();
        // First dimension varies fastest.
        assert_eq!(offs, vec![0, 8, 16, 24, 32, 40]);
        assert_eq!(d.element_count(), 6);
    }

    #[test]
    fn test_zero_extent_is_empty() {
        let d = Descriptor::vector(0, TypeCode::Logical, 4, 0, 4);
        assert_eq!(d.element_offsets().count(), 0);
        assert_eq!(d.element_count(), 0);
    }

    #[test]
    fn test_type_code_round_trip() {
        assert_eq!(TypeCode::from_i32(3), Some(TypeCode::Real64));
        assert_eq!(TypeCode::from_i32(99), None);
    }
}
