//! pakview
//!
//! The core of a viewer for archived game assets. Archives are consumed
//! through a small collaborator interface, their records are decoded on
//! demand into cached, type-tagged resources, and model geometry is indexed
//! into deduplicated GPU buffers the first time it is drawn. Models can also
//! be exported to Wavefront OBJ.
//!
//! High-level modules
//! - `context`: GPU device, queue and the shared pipelines
//! - `data_structures`: geometry, materials, index building, GPU buffers, OBJ export
//! - `pipelines`: wgpu render pipelines and shaders
//! - `render`: the [`Renderable`](render::Renderable) capability
//! - `resources`: asset ids, archives, decoders and the caching resource manager
//!

pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod render;
pub mod resources;

pub use cgmath;
pub use wgpu;
