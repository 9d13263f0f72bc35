//! Error types
//!
//! Every failure in the core is raised to the immediate caller. Model and
//! scene errors are structural; texture-slot errors are recoverable mid-frame.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use crate::gfx::scene::scene_tree::NodeId;

/// Vertex attribute stream referenced by a face corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Position,
    TexCoord,
    Normal,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stream::Position => "position",
            Stream::TexCoord => "texture coordinate",
            Stream::Normal => "normal",
        })
    }
}

/// Structural or numeric failure while parsing a model file.
///
/// Line numbers are 1-based and refer to the source text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedModel {
    #[error("line {line}: `{tag}` needs {expected} components, found {found}")]
    MissingComponents {
        line: usize,
        tag: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: `{token}` is not a number")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: `{token}` is not a valid 1-based index")]
    InvalidIndex { line: usize, token: String },

    #[error("line {line}: face corner `{token}` must be `position/texcoord/normal`")]
    IncompleteCorner { line: usize, token: String },

    #[error("line {line}: face has {found} corners, only triangles are supported")]
    NonTriangularFace { line: usize, found: usize },

    #[error("line {line}: {stream} index {index} is out of bounds ({len} defined)")]
    IndexOutOfBounds {
        line: usize,
        stream: Stream,
        index: usize,
        len: usize,
    },
}

/// Failure to build a [`Mesh`](crate::gfx::scene::Mesh).
#[derive(Debug, Error)]
pub enum MeshLoadError {
    #[error("failed to read model `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed model `{origin}`")]
    Malformed {
        origin: String,
        #[source]
        source: MalformedModel,
    },
}

/// Texture-slot contract violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    #[error("texture not registered: {0}")]
    NotRegistered(String),

    #[error("texture is not enabled: {0}")]
    NotEnabled(String),

    #[error("cannot enable `{name}`: all {capacity} texture slots are in use")]
    SlotExhausted { name: String, capacity: usize },
}

/// Scene-tree structural violations, detected at query time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("scene tree has no root node")]
    NoRoot,

    #[error("scene tree has more than one root ({first:?} and {second:?})")]
    MultipleRoots { first: NodeId, second: NodeId },

    #[error("node {0:?} does not belong to this scene tree")]
    UnknownNode(NodeId),
}

/// Failure produced by the image-decoding collaborator
#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("failed to decode image `{}`", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("expected {expected} bytes of RGBA8 pixels for {width}x{height}, got {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Failure reported by a graphics backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("shader program `{label}` failed to compile: {message}")]
    ShaderCompile { label: String, message: String },
}

/// Anything that can go wrong while driving a frame
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("device has not been started")]
    NotStarted,

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Image(#[from] ImageLoadError),
}
