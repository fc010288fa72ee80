//! Render pipelines and their shaders.
//!
//! - `basic` holds the shared pipeline builder
//! - `model` draws indexed model geometry (one pipeline per topology and blend mode)
//! - `bounds` outlines bounding boxes
//! - `view` is the view/projection uniform every pipeline binds at group 0

pub mod basic;
pub mod bounds;
pub mod model;
pub mod view;

use crate::pipelines::{
    bounds::mk_bounds_pipeline,
    model::ModelPipelines,
    view::view_bind_group_layout,
};

/// Every pipeline the crate draws with, built once per [`Context`](crate::context::Context).
#[derive(Debug)]
pub struct Pipelines {
    pub view_layout: wgpu::BindGroupLayout,
    pub model: ModelPipelines,
    pub bounds: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let view_layout = view_bind_group_layout(device);
        let model = ModelPipelines::new(device, color_format, &view_layout);
        let bounds = mk_bounds_pipeline(device, color_format, &view_layout);
        Self {
            view_layout,
            model,
            bounds,
        }
    }
}
