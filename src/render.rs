//! The renderable capability.
//!
//! Any decoded resource that represents visible geometry implements
//! [`Renderable`]; the viewport reaches it through
//! [`Resource::as_renderable`](crate::resources::Resource::as_renderable)
//! without knowing the concrete type.

use std::path::Path;

use cgmath::Matrix4;

use crate::{context::Context, data_structures::geometry::BoundingBox};

pub trait Renderable {
    /// Records the draw calls for this resource. GPU buffers are created on
    /// the first call.
    fn draw(&self, ctx: &Context, pass: &mut wgpu::RenderPass<'_>);

    /// Outlines [`bounding_box`](Self::bounding_box) with lines.
    fn draw_bounding_box(&self, ctx: &Context, pass: &mut wgpu::RenderPass<'_>);

    /// Stores the matrices used by the next draw.
    fn update_view_projection_uniforms(&self, view: Matrix4<f32>, projection: Matrix4<f32>);

    /// Writes the geometry to an OBJ file. Failures are logged and reported
    /// as `false`.
    fn export_to_obj(&self, path: &Path) -> bool;

    fn bounding_box(&self) -> BoundingBox;
}
