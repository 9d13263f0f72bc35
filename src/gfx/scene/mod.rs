//! # Scene Management Module
//!
//! Geometry ingestion and the scene graph.
//!
//! ## Key Components
//!
//! - [`parse_obj`] - OBJ text to independently indexed attribute streams
//! - [`MeshAttributes`] - per-corner flattening of a parsed model
//! - [`Mesh`] - uploaded geometry with its texture list and draw call
//! - [`SceneTree`] - arena of [`SceneNode`]s resolving world transforms
//!
//! ## Usage
//!
//! ```
//! use std::rc::Rc;
//! use cgmath::{Matrix4, SquareMatrix};
//! use trellis::gfx::backend::HeadlessBackend;
//! use trellis::gfx::scene::{Mesh, SceneNode, SceneTree};
//!
//! let backend = Rc::new(HeadlessBackend::default());
//! let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\n";
//! let triangle = Rc::new(Mesh::from_obj_source(&backend, "Triangle", source).unwrap());
//!
//! let mut tree = SceneTree::new();
//! let root = tree.add_node(SceneNode::Transform(Matrix4::identity()), None).unwrap();
//! tree.add_node(SceneNode::Mesh(triangle), Some(root)).unwrap();
//! assert_eq!(tree.root().unwrap(), root);
//! ```

pub mod mesh;
pub mod obj;
pub mod scene_tree;
pub mod vertex;

pub use mesh::Mesh;
pub use obj::{parse_obj, Corner, Face, ObjModel};
pub use scene_tree::{NodeId, SceneNode, SceneTree};
pub use vertex::MeshAttributes;
