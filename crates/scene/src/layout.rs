//! Fixed byte layouts consumed by the path tracing programs.
//!
//! Every GPU-visible struct is described once here as a [`Layout`]: a list of
//! named fields with explicit offsets plus the total stride. The `#[repr(C)]`
//! records that actually get cast to bytes are checked against these schemas
//! at compile time, and the WGSL structs in the renderer crate mirror the same
//! offsets. Moving a field is an edit to the schema and its record, and a
//! breaking change for the shaders.
//!
//! All multi-byte values are little-endian.

use std::ops::Range;

use crate::error::DecodeError;

/// Primitive (or nested) type stored at a field offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    U32,
    F32,
    /// Three packed `f32` values, 12 bytes, no trailing pad.
    Vec3,
    /// A nested layout stored inline.
    Struct(&'static Layout),
}

impl FieldKind {
    pub const fn size(self) -> usize {
        match self {
            FieldKind::U32 | FieldKind::F32 => 4,
            FieldKind::Vec3 => 12,
            FieldKind::Struct(layout) => layout.size,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub offset: usize,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind, offset: usize) -> Self {
        Self { name, kind, offset }
    }

    pub const fn end(&self) -> usize {
        self.offset + self.kind.size()
    }

    pub const fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }
}

/// Declarative description of one packed struct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub name: &'static str,
    /// Total encoded size; doubles as the array stride for repeated records.
    pub size: usize,
    pub fields: &'static [Field],
}

impl Layout {
    /// Fields must be sorted by offset, 4-byte aligned, non-overlapping and
    /// contained in `size`.
    pub const fn is_well_formed(&self) -> bool {
        let mut cursor = 0;
        let mut index = 0;
        while index < self.fields.len() {
            let field = &self.fields[index];
            if field.offset < cursor || field.offset % 4 != 0 {
                return false;
            }
            cursor = field.end();
            index += 1;
        }
        cursor <= self.size && self.size % 4 == 0
    }

    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Bytes of the stride not covered by any field (alignment gaps and tail).
    pub fn padding(&self) -> usize {
        self.size - self.fields.iter().map(|field| field.kind.size()).sum::<usize>()
    }

    /// The first `size` bytes of `bytes`, ready for `bytemuck::pod_read_unaligned`.
    pub fn record<'a>(&self, bytes: &'a [u8]) -> Result<&'a [u8], DecodeError> {
        bytes.get(..self.size).ok_or(DecodeError::Truncated {
            layout: self.name,
            expected: self.size,
            actual: bytes.len(),
        })
    }
}
