//! # Graphics Module
//!
//! Everything between a parsed model and a backend draw call.
//!
//! ## Architecture Overview
//!
//! - **Backend** ([`backend`]) - the [`GraphicsBackend`](backend::GraphicsBackend) capability set, with wgpu and headless implementations
//! - **Resources** ([`resources`]) - RAII buffer, program and texture wrappers, plus the texture slot allocator
//! - **Scene** ([`scene`]) - OBJ ingestion, meshes and the scene graph
//! - **Camera** ([`camera`]) - view and projection matrices
//! - **Device** ([`device`]) - the per-frame render loop
//!
//! ## Usage
//!
//! ```
//! use std::rc::Rc;
//! use trellis::config::RendererConfig;
//! use trellis::gfx::{backend::HeadlessBackend, Device};
//!
//! let mut device = Device::new(Rc::new(HeadlessBackend::default()), RendererConfig::default());
//! device.startup((800, 600)).unwrap();
//! assert_eq!(device.draw(0.016).unwrap(), 0);
//! ```

pub mod backend;
pub mod camera;
pub mod device;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::{Camera, Projection};
pub use device::Device;
