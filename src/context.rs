use anyhow::Context as _;

use crate::pipelines::{Pipelines, model::VERTEX_BUFFER_COUNT};

/// GPU device, queue and the pipelines renderables draw with.
///
/// The viewport that owns the window builds one with [`Context::new`] from its
/// own device; tests and offline tools use [`Context::headless`].
#[derive(Debug)]
pub struct Context {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub color_format: wgpu::TextureFormat,
    pub pipelines: Pipelines,
}

impl Context {
    /// Limits a device needs to draw models. Models bind one vertex buffer per
    /// attribute, more than the default limit allows.
    pub fn required_limits() -> wgpu::Limits {
        wgpu::Limits {
            max_vertex_buffers: VERTEX_BUFFER_COUNT as u32,
            ..wgpu::Limits::default()
        }
    }

    /// `device` must have been requested with at least [`Context::required_limits`].
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let pipelines = Pipelines::new(&device, color_format);
        Self {
            device,
            queue,
            color_format,
            pipelines,
        }
    }

    /// A context without a surface, rendering into `color_format` textures.
    pub async fn headless(color_format: wgpu::TextureFormat) -> anyhow::Result<Self> {
        log::info!("WGPU setup (headless)");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("pakview device"),
                required_features: wgpu::Features::empty(),
                required_limits: Self::required_limits(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                ..Default::default()
            })
            .await
            .context("failed to create a device")?;

        Ok(Self::new(device, queue, color_format))
    }
}
