//! # Scene Graph
//!
//! An arena of nodes where each node stores the handle of its parent. The
//! tree owns every node; a node's parent must already be in the tree when the
//! node is added, so parent chains always terminate.
//!
//! The single-root invariant is not enforced by [`SceneTree::add_node`].
//! It is only checked when [`SceneTree::root`] is queried, so a tree may hold
//! several parentless nodes between insertions.

use std::rc::Rc;

use cgmath::{Matrix4, SquareMatrix};

use crate::error::SceneError;

/// Stable handle to a node inside one [`SceneTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Node payload
#[derive(Debug)]
pub enum SceneNode<M> {
    /// Local transform, composed onto the parent's world transform
    Transform(Matrix4<f32>),
    /// Attachment point for a shared mesh; contributes no transform of its own
    Mesh(Rc<M>),
}

impl<M> SceneNode<M> {
    pub fn mesh(&self) -> Option<&Rc<M>> {
        match self {
            SceneNode::Transform(_) => None,
            SceneNode::Mesh(mesh) => Some(mesh),
        }
    }

    /// The node's own contribution to its world transform
    pub fn local_transform(&self) -> Matrix4<f32> {
        match self {
            SceneNode::Transform(local) => *local,
            SceneNode::Mesh(_) => Matrix4::identity(),
        }
    }
}

#[derive(Debug)]
struct Entry<M> {
    node: SceneNode<M>,
    parent: Option<NodeId>,
}

#[derive(Debug)]
pub struct SceneTree<M> {
    entries: Vec<Entry<M>>,
}

impl<M> Default for SceneTree<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> SceneTree<M> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends `node` under `parent`, or as a parentless node.
    ///
    /// Fails only if `parent` does not belong to this tree.
    pub fn add_node(
        &mut self,
        node: SceneNode<M>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SceneError> {
        if let Some(parent) = parent {
            self.check(parent)?;
        }
        let id = NodeId(self.entries.len());
        self.entries.push(Entry { node, parent });
        log::trace!("added scene node {id:?} under {parent:?}");
        Ok(id)
    }

    /// Finds the one node without a parent
    pub fn root(&self) -> Result<NodeId, SceneError> {
        let mut roots = self
            .iter()
            .filter(|(id, _)| self.entries[id.0].parent.is_none())
            .map(|(id, _)| id);

        match (roots.next(), roots.next()) {
            (None, _) => Err(SceneError::NoRoot),
            (Some(root), None) => Ok(root),
            (Some(first), Some(second)) => Err(SceneError::MultipleRoots { first, second }),
        }
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, SceneError> {
        Ok(self.entry(id)?.parent)
    }

    pub fn node(&self, id: NodeId) -> Result<&SceneNode<M>, SceneError> {
        Ok(&self.entry(id)?.node)
    }

    /// Mesh carried by `id`, if it is a mesh node
    pub fn mesh(&self, id: NodeId) -> Result<Option<&Rc<M>>, SceneError> {
        Ok(self.entry(id)?.node.mesh())
    }

    /// Composes local transforms from the top of `id`'s parent chain down to
    /// `id`, with each parent as the left operand.
    ///
    /// `_dt` is the frame delta; no node animates yet. The result is
    /// recomputed on every call.
    pub fn resolve_world_transform(
        &self,
        id: NodeId,
        _dt: f32,
    ) -> Result<Matrix4<f32>, SceneError> {
        let mut entry = self.entry(id)?;
        let mut world = entry.node.local_transform();
        while let Some(parent) = entry.parent {
            entry = self.entry(parent)?;
            world = entry.node.local_transform() * world;
        }
        Ok(world)
    }

    /// Nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode<M>)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (NodeId(index), &entry.node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check(&self, id: NodeId) -> Result<(), SceneError> {
        self.entry(id).map(|_| ())
    }

    fn entry(&self, id: NodeId) -> Result<&Entry<M>, SceneError> {
        self.entries.get(id.0).ok_or(SceneError::UnknownNode(id))
    }
}
