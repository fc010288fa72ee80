//! Decoded models and their lazily built GPU representation.
//!
//! [`ModelData`] moves through `Unindexed -> Indexed -> Uploaded` at most once
//! per step; each step is kept in a [`OnceCell`] so repeated requests return
//! the cached result. [`Model`] adds the header data and material sets and
//! implements [`Renderable`].

use std::{
    cell::{Cell, OnceCell},
    io::{self, Write},
    path::Path,
};

use cgmath::Matrix4;
use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        export::{self, ObjOffsets},
        geometry::{BoundingBox, Mesh, VertexAttributes},
        gpu::GpuModel,
        index_buffer::{self, IndexedGeometry},
        material::MaterialSet,
    },
    pipelines::view::{ViewBinding, ViewUniform},
    render::Renderable,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelState {
    Unindexed,
    Indexed,
    Uploaded,
}

/// Geometry of a model plus its one-shot indexed and uploaded forms.
#[derive(Debug)]
pub struct ModelData {
    attributes: VertexAttributes,
    meshes: Vec<Mesh>,
    indexed: OnceCell<IndexedGeometry>,
    gpu: OnceCell<GpuModel>,
}

impl ModelData {
    pub fn new(attributes: VertexAttributes, meshes: Vec<Mesh>) -> Self {
        Self {
            attributes,
            meshes,
            indexed: OnceCell::new(),
            gpu: OnceCell::new(),
        }
    }

    pub fn attributes(&self) -> &VertexAttributes {
        &self.attributes
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn state(&self) -> ModelState {
        if self.gpu.get().is_some() {
            ModelState::Uploaded
        } else if self.indexed.get().is_some() {
            ModelState::Indexed
        } else {
            ModelState::Unindexed
        }
    }

    /// Builds the index groups against `materials`. Only the first call does
    /// any work; later calls return the same geometry whatever set they pass.
    pub fn index(&self, materials: &MaterialSet) -> &IndexedGeometry {
        self.indexed
            .get_or_init(|| index_buffer::build(&self.attributes, &self.meshes, materials))
    }

    pub fn indexed(&self) -> Option<&IndexedGeometry> {
        self.indexed.get()
    }

    /// Indexes if needed, then creates the device buffers once.
    pub fn upload(&self, device: &wgpu::Device, materials: &MaterialSet) -> &GpuModel {
        let geometry = self.index(materials);
        self.gpu.get_or_init(|| GpuModel::upload(device, geometry))
    }

    pub fn gpu(&self) -> Option<&GpuModel> {
        self.gpu.get()
    }

    /// Draws with the cached buffers, uploading on first use.
    pub fn draw(
        &self,
        ctx: &Context,
        pass: &mut wgpu::RenderPass<'_>,
        materials: &MaterialSet,
        view: &ViewBinding,
    ) {
        self.upload(&ctx.device, materials).draw(ctx, pass, materials, view);
    }

    pub fn export<W: Write>(&self, out: &mut W, offsets: &mut ObjOffsets) -> io::Result<()> {
        export::write_model(out, &self.attributes, &self.meshes, offsets)
    }
}

/// A decoded `CMDL` model.
#[derive(Debug)]
pub struct Model {
    pub version: u32,
    pub flags: u32,
    bounding_box: BoundingBox,
    material_sets: Vec<MaterialSet>,
    data: ModelData,
    view: Cell<ViewUniform>,
    view_binding: OnceCell<ViewBinding>,
    bounds_buffer: OnceCell<wgpu::Buffer>,
}

impl Model {
    pub fn new(
        version: u32,
        flags: u32,
        bounding_box: BoundingBox,
        material_sets: Vec<MaterialSet>,
        data: ModelData,
    ) -> Self {
        Self {
            version,
            flags,
            bounding_box,
            material_sets,
            data,
            view: Cell::new(ViewUniform::new()),
            view_binding: OnceCell::new(),
            bounds_buffer: OnceCell::new(),
        }
    }

    pub fn data(&self) -> &ModelData {
        &self.data
    }

    pub fn material_sets(&self) -> &[MaterialSet] {
        &self.material_sets
    }

    /// The set the model is drawn with: the first one, or an empty set.
    pub fn material_set(&self) -> &MaterialSet {
        self.material_sets
            .first()
            .unwrap_or(MaterialSet::empty())
    }

    pub fn state(&self) -> ModelState {
        self.data.state()
    }

    /// Indexes against the current material set.
    pub fn index(&self) -> &IndexedGeometry {
        self.data.index(self.material_set())
    }

    pub fn view_uniform(&self) -> ViewUniform {
        self.view.get()
    }

    fn view_binding(&self, ctx: &Context) -> &ViewBinding {
        let binding = self
            .view_binding
            .get_or_init(|| ViewBinding::new(&ctx.device, &ctx.pipelines.view_layout));
        binding.write(&ctx.queue, &self.view.get());
        binding
    }
}

impl Renderable for Model {
    fn draw(&self, ctx: &Context, pass: &mut wgpu::RenderPass<'_>) {
        let view = self.view_binding(ctx);
        self.data.draw(ctx, pass, self.material_set(), view);
    }

    fn draw_bounding_box(&self, ctx: &Context, pass: &mut wgpu::RenderPass<'_>) {
        let view = self.view_binding(ctx);
        let buffer = self.bounds_buffer.get_or_init(|| {
            ctx.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Bounds Buffer"),
                    contents: bytemuck::cast_slice(&self.bounding_box.edges()),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });
        pass.set_pipeline(&ctx.pipelines.bounds);
        pass.set_bind_group(0, &view.bind_group, &[]);
        pass.set_vertex_buffer(0, buffer.slice(..));
        pass.draw(0..24, 0..1);
    }

    fn update_view_projection_uniforms(&self, view: Matrix4<f32>, projection: Matrix4<f32>) {
        self.view.set(ViewUniform::from_matrices(view, projection));
    }

    fn export_to_obj(&self, path: &Path) -> bool {
        match export::export_models_to_obj(path, &[self]) {
            Ok(()) => true,
            Err(e) => {
                log::error!("failed to export model to {}: {e}", path.display());
                false
            }
        }
    }

    fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }
}
