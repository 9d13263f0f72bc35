// src/lib.rs
//! Trellis
//!
//! A small scene-graph renderer built on wgpu: hierarchical transforms, OBJ
//! mesh ingestion and bounded texture-slot binding.

pub mod config;
pub mod error;
pub mod gfx;
pub mod logging;
pub mod prelude;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use config::RendererConfig;
pub use gfx::Device;
