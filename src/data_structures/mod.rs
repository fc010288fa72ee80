//! Model data structures: geometry, materials, indexing, GPU buffers and export.
//!
//! - `geometry` holds the decoded attribute arrays, primitives and meshes
//! - `material` contains materials and material sets
//! - `index_buffer` deduplicates vertices and builds per-material index groups
//! - `gpu` uploads indexed geometry and draws it
//! - `export` writes Wavefront OBJ files
//! - `model` ties the above together behind [`Renderable`](crate::render::Renderable)
//! - `texture` contains render attachments

pub mod export;
pub mod geometry;
pub mod gpu;
pub mod index_buffer;
pub mod material;
pub mod model;
pub mod texture;
