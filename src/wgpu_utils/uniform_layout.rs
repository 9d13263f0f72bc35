//! Byte layout of a WGSL uniform block
//!
//! Offsets follow the WGSL uniform address space rules so a program's block
//! can be filled field by field and uploaded as one contiguous struct.

use crate::gfx::backend::{UniformKind, UniformValue};

fn size_align(kind: UniformKind) -> (usize, usize) {
    match kind {
        UniformKind::Bool | UniformKind::Int | UniformKind::Float => (4, 4),
        UniformKind::Vec2 => (8, 8),
        UniformKind::Vec3 => (12, 16),
        UniformKind::Vec4 => (16, 16),
        UniformKind::Mat4 => (64, 16),
    }
}

fn align_to(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    name: String,
    kind: UniformKind,
    offset: usize,
}

/// Field offsets of one uniform struct
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UniformLayout {
    fields: Vec<Field>,
    size: usize,
}

impl UniformLayout {
    pub fn new(fields: &[(String, UniformKind)]) -> Self {
        let mut offset = 0;
        let mut laid_out = Vec::with_capacity(fields.len());

        for (name, kind) in fields {
            let (size, align) = size_align(*kind);
            offset = align_to(offset, align);
            laid_out.push(Field {
                name: name.clone(),
                kind: *kind,
                offset,
            });
            offset += size;
        }

        // Uniform structs are padded to a multiple of 16; an empty block
        // still needs a non-zero binding size.
        let size = align_to(offset.max(1), 16);

        Self {
            fields: laid_out,
            size,
        }
    }

    /// Index of a field, used as its uniform location
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// `(offset, kind)` of the field at `index`
    pub fn field(&self, index: usize) -> Option<(usize, UniformKind)> {
        self.fields.get(index).map(|field| (field.offset, field.kind))
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|field| field.name.as_str())
    }

    /// Total struct size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Encodes `value` into `block` at `offset`
    pub fn write(block: &mut [u8], offset: usize, value: UniformValue) {
        let bytes: Vec<u8> = match value {
            UniformValue::Bool(b) => u32::from(b).to_le_bytes().to_vec(),
            UniformValue::Int(i) => i.to_le_bytes().to_vec(),
            UniformValue::Float(f) => f.to_le_bytes().to_vec(),
            UniformValue::Vec2(v) => bytemuck::cast_slice(&v).to_vec(),
            UniformValue::Vec3(v) => bytemuck::cast_slice(&v).to_vec(),
            UniformValue::Vec4(v) => bytemuck::cast_slice(&v).to_vec(),
            UniformValue::Mat4(m) => bytemuck::cast_slice(&m).to_vec(),
        };
        if let Some(target) = block.get_mut(offset..offset + bytes.len()) {
            target.copy_from_slice(&bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(kinds: &[(&str, UniformKind)]) -> Vec<(String, UniformKind)> {
        kinds
            .iter()
            .map(|(name, kind)| (name.to_string(), *kind))
            .collect()
    }

    #[test]
    fn test_matrices_are_packed_back_to_back() {
        let layout = UniformLayout::new(&fields(&[
            ("projection", UniformKind::Mat4),
            ("view", UniformKind::Mat4),
            ("model", UniformKind::Mat4),
        ]));
        assert_eq!(layout.field(2), Some((128, UniformKind::Mat4)));
        assert_eq!(layout.size(), 192);
    }

    #[test]
    fn test_vec3_is_aligned_to_16_bytes() {
        let layout = UniformLayout::new(&fields(&[
            ("time", UniformKind::Float),
            ("light", UniformKind::Vec3),
            ("strength", UniformKind::Float),
        ]));
        assert_eq!(layout.field(0), Some((0, UniformKind::Float)));
        assert_eq!(layout.field(1), Some((16, UniformKind::Vec3)));
        // A scalar fits in the vec3's trailing padding
        assert_eq!(layout.field(2), Some((28, UniformKind::Float)));
        assert_eq!(layout.size(), 32);
    }

    #[test]
    fn test_write_encodes_little_endian() {
        let mut block = vec![0u8; 16];
        UniformLayout::write(&mut block, 4, UniformValue::Bool(true));
        UniformLayout::write(&mut block, 8, UniformValue::Float(1.0));
        assert_eq!(&block[4..8], &[1, 0, 0, 0]);
        assert_eq!(&block[8..12], &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_empty_layout_still_has_size() {
        assert_eq!(UniformLayout::new(&[]).size(), 16);
    }
}
