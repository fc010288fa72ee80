use crate::{data_structures::texture::Texture, pipelines::basic::mk_render_pipeline};

static BOUNDS_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

/// Position-only line list used to outline bounding boxes.
pub fn bounds_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &BOUNDS_ATTRIBUTES,
    }
}

pub fn mk_bounds_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    view_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Bounds Pipeline Layout"),
        bind_group_layouts: &[Some(view_bind_group_layout)],
        immediate_size: 0,
    });
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Bounds Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("bounds.wgsl").into()),
    });
    mk_render_pipeline(
        device,
        "Bounds Pipeline",
        &layout,
        color_format,
        Some(wgpu::BlendState::REPLACE),
        Some(Texture::DEPTH_FORMAT),
        &[bounds_vertex_layout()],
        wgpu::PrimitiveTopology::LineList,
        &shader,
    )
}
