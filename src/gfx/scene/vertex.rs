//! # Vertex Data Structures
//!
//! Per-corner vertex attributes in the layout the backends upload: three
//! parallel streams plus a `u32` index list.

use crate::gfx::scene::obj::ObjModel;

/// Shader location of each vertex attribute stream
pub const POSITION_LOCATION: u32 = 0;
pub const NORMAL_LOCATION: u32 = 1;
pub const TEXCOORD_LOCATION: u32 = 2;

/// Parallel attribute arrays addressed by a shared index list.
///
/// Built by [`flatten`](MeshAttributes::flatten), every face corner becomes
/// its own vertex. Corners that share a position are not merged, so
/// `indices` is always `0..vertex_count()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshAttributes {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshAttributes {
    /// Expands every face corner of `model` into a unique vertex.
    ///
    /// `model` must have passed bounds checking, which [`parse_obj`](super::obj::parse_obj)
    /// guarantees.
    pub fn flatten(model: &ObjModel) -> Self {
        let vertex_count = 3 * model.faces.len();
        let mut attributes = Self {
            positions: Vec::with_capacity(vertex_count),
            normals: Vec::with_capacity(vertex_count),
            texcoords: Vec::with_capacity(vertex_count),
            indices: Vec::with_capacity(vertex_count),
        };

        for corner in model.faces.iter().flat_map(|face| face.corners.iter()) {
            attributes.indices.push(attributes.positions.len() as u32);
            attributes.positions.push(model.positions[corner.position]);
            attributes.texcoords.push(model.texcoords[corner.texcoord]);
            attributes.normals.push(model.normals[corner.normal]);
        }
        attributes
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::obj::{parse_obj, tests::QUAD};

    #[test]
    fn test_quad_flattens_to_six_sequential_vertices() {
        let attributes = MeshAttributes::flatten(&parse_obj(QUAD).unwrap());
        assert_eq!(attributes.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(attributes.vertex_count(), 6);
        assert_eq!(attributes.normals.len(), 6);
        assert_eq!(attributes.texcoords.len(), 6);

        // Corner order is preserved: second triangle is 1, 3, 4
        assert_eq!(attributes.positions[3], [-1.0, -1.0, 0.0]);
        assert_eq!(attributes.positions[4], [1.0, 1.0, 0.0]);
        assert_eq!(attributes.texcoords[5], [0.0, 1.0]);
    }

    #[test]
    fn test_shared_corners_are_not_deduplicated() {
        let source = "v 0 0 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 1/1/1 1/1/1\nf 1/1/1 1/1/1 1/1/1\n";
        let attributes = MeshAttributes::flatten(&parse_obj(source).unwrap());
        assert_eq!(attributes.vertex_count(), 6);
        assert!(attributes.positions.iter().all(|p| *p == [0.0; 3]));
        assert_eq!(attributes.indices, (0..6).collect::<Vec<u32>>());
    }

    #[test]
    fn test_empty_model() {
        let attributes = MeshAttributes::flatten(&ObjModel::default());
        assert_eq!(attributes, MeshAttributes::default());
    }
}
