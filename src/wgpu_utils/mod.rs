// src/wgpu_utils/mod.rs
//! WGPU utility functions and helpers
//!
//! Provides the small wrappers the wgpu backend is built from.

pub mod binding_types;
pub mod uniform_buffer;
pub mod uniform_layout;

// Re-export main types
pub use binding_types::*;
pub use uniform_buffer::DynamicUniformBuffer;
pub use uniform_layout::UniformLayout;
