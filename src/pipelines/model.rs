//! Pipelines for indexed model geometry.
//!
//! Every attribute lives in its own vertex buffer, bound at a fixed slot:
//!
//! | slot | attribute | format |
//! |------|-----------|--------|
//! | 0 | position | `Float32x3` |
//! | 1 | normal | `Float32x3` |
//! | 2, 3 | color 0, 1 (packed RGBA8) | `Uint32` |
//! | 4..=10 | texture coordinates 0..=6 | `Float32x2` |

use std::collections::HashMap;

use crate::{data_structures::texture::Texture, pipelines::basic::mk_render_pipeline};

/// Number of vertex buffers a model binds.
pub const VERTEX_BUFFER_COUNT: usize = 11;

pub const POSITION_SLOT: u32 = 0;
pub const NORMAL_SLOT: u32 = 1;
pub const COLOR_SLOT: u32 = 2;
pub const TEX_COORD_SLOT: u32 = 4;

/// The topologies model groups are drawn with after upload conversion.
pub const MODEL_TOPOLOGIES: [wgpu::PrimitiveTopology; 5] = [
    wgpu::PrimitiveTopology::PointList,
    wgpu::PrimitiveTopology::LineList,
    wgpu::PrimitiveTopology::LineStrip,
    wgpu::PrimitiveTopology::TriangleList,
    wgpu::PrimitiveTopology::TriangleStrip,
];

static POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
static NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
static COLOR_ATTRIBUTES: [[wgpu::VertexAttribute; 1]; 2] = [
    wgpu::vertex_attr_array![2 => Uint32],
    wgpu::vertex_attr_array![3 => Uint32],
];
static TEX_COORD_ATTRIBUTES: [[wgpu::VertexAttribute; 1]; 7] = [
    wgpu::vertex_attr_array![4 => Float32x2],
    wgpu::vertex_attr_array![5 => Float32x2],
    wgpu::vertex_attr_array![6 => Float32x2],
    wgpu::vertex_attr_array![7 => Float32x2],
    wgpu::vertex_attr_array![8 => Float32x2],
    wgpu::vertex_attr_array![9 => Float32x2],
    wgpu::vertex_attr_array![10 => Float32x2],
];

fn layout<T>(attributes: &'static [wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<T>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

/// Buffer layouts for all [`VERTEX_BUFFER_COUNT`] slots, in slot order.
pub fn vertex_layouts() -> Vec<wgpu::VertexBufferLayout<'static>> {
    let mut layouts = vec![
        layout::<[f32; 3]>(&POSITION_ATTRIBUTES),
        layout::<[f32; 3]>(&NORMAL_ATTRIBUTES),
    ];
    layouts.extend(COLOR_ATTRIBUTES.iter().map(|a| layout::<u32>(a)));
    layouts.extend(TEX_COORD_ATTRIBUTES.iter().map(|a| layout::<[f32; 2]>(a)));
    layouts
}

/// One pipeline per (topology, transparent) pair.
#[derive(Debug)]
pub struct ModelPipelines {
    pipelines: HashMap<(wgpu::PrimitiveTopology, bool), wgpu::RenderPipeline>,
}

impl ModelPipelines {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        view_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Model Pipeline Layout"),
            bind_group_layouts: &[Some(view_bind_group_layout)],
            immediate_size: 0,
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Model Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("model.wgsl").into()),
        });
        let vertex_layouts = vertex_layouts();

        let mut pipelines = HashMap::new();
        for topology in MODEL_TOPOLOGIES {
            for transparent in [false, true] {
                let (label, blend) = if transparent {
                    ("Transparent Model Pipeline", wgpu::BlendState::ALPHA_BLENDING)
                } else {
                    ("Model Pipeline", wgpu::BlendState::REPLACE)
                };
                let pipeline = mk_render_pipeline(
                    device,
                    label,
                    &layout,
                    color_format,
                    Some(blend),
                    Some(Texture::DEPTH_FORMAT),
                    &vertex_layouts,
                    topology,
                    &shader,
                );
                pipelines.insert((topology, transparent), pipeline);
            }
        }
        Self { pipelines }
    }

    pub fn get(
        &self,
        topology: wgpu::PrimitiveTopology,
        transparent: bool,
    ) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&(topology, transparent))
    }
}
