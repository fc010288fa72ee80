//! Device buffers for indexed model geometry.
//!
//! wgpu draws neither quads nor fans and only honours restart indices for
//! strips, so [`gpu_indices`] rewrites each [`IndexGroup`] into something the
//! rasterizer accepts before upload. The CPU groups are left untouched.

use std::collections::BTreeMap;

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        geometry::{TEX_COORD_CHANNELS, Topology},
        index_buffer::{IndexGroup, IndexedGeometry, PRIMITIVE_RESTART},
        material::MaterialSet,
    },
    pipelines::{
        model::{COLOR_SLOT, NORMAL_SLOT, POSITION_SLOT, TEX_COORD_SLOT},
        view::ViewBinding,
    },
};

/// Converts a group's indices into a wgpu topology and index list.
///
/// List topologies lose their restart sentinels and any trailing partial
/// face of a primitive. Fans and quads become triangle lists, strips keep
/// their sentinels. `None` for topologies that can't be drawn.
pub fn gpu_indices(group: &IndexGroup) -> Option<(wgpu::PrimitiveTopology, Vec<u32>)> {
    let runs = group
        .indices
        .split(|&index| index == PRIMITIVE_RESTART)
        .filter(|run| !run.is_empty());
    let whole_faces = |arity: usize| -> Vec<u32> {
        group
            .indices
            .split(|&index| index == PRIMITIVE_RESTART)
            .flat_map(|run| run.chunks_exact(arity))
            .flatten()
            .copied()
            .collect()
    };

    let converted = match group.topology {
        Topology::Points => (wgpu::PrimitiveTopology::PointList, whole_faces(1)),
        Topology::Lines => (wgpu::PrimitiveTopology::LineList, whole_faces(2)),
        Topology::Triangles => (wgpu::PrimitiveTopology::TriangleList, whole_faces(3)),
        Topology::LineStrip => (wgpu::PrimitiveTopology::LineStrip, group.indices.clone()),
        Topology::TriangleStrip => (
            wgpu::PrimitiveTopology::TriangleStrip,
            group.indices.clone(),
        ),
        Topology::TriangleFan => {
            let mut triangles = Vec::new();
            for run in runs {
                for pair in run[1..].windows(2) {
                    triangles.extend([run[0], pair[0], pair[1]]);
                }
            }
            (wgpu::PrimitiveTopology::TriangleList, triangles)
        }
        Topology::Quads => {
            let mut triangles = Vec::new();
            for quad in runs.flat_map(|run| run.chunks_exact(4)) {
                triangles.extend([quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]]);
            }
            (wgpu::PrimitiveTopology::TriangleList, triangles)
        }
        Topology::Other(_) => return None,
    };
    Some(converted)
}

#[derive(Debug)]
struct GpuGroup {
    topology: wgpu::PrimitiveTopology,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Uploaded vertex and index buffers of one model.
///
/// Buffers are destroyed on drop. A `GpuModel` only exists after a
/// successful upload.
#[derive(Debug)]
pub struct GpuModel {
    vertex_buffers: Vec<wgpu::Buffer>,
    groups: BTreeMap<u32, Vec<GpuGroup>>,
}

fn vertex_buffer<T: bytemuck::Pod>(
    device: &wgpu::Device,
    label: &str,
    data: &[T],
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

impl GpuModel {
    pub fn upload(device: &wgpu::Device, geometry: &IndexedGeometry) -> Self {
        let buffers = &geometry.buffers;
        let mut vertex_buffers = Vec::new();
        if !buffers.is_empty() {
            vertex_buffers.push(vertex_buffer(device, "Position Buffer", &buffers.positions));
            vertex_buffers.push(vertex_buffer(device, "Normal Buffer", &buffers.normals));
            for colors in &buffers.colors {
                vertex_buffers.push(vertex_buffer(device, "Color Buffer", colors));
            }
            for coords in &buffers.tex_coords {
                vertex_buffers.push(vertex_buffer(device, "Tex Coord Buffer", coords));
            }
        }

        let mut groups: BTreeMap<u32, Vec<GpuGroup>> = BTreeMap::new();
        for group in &geometry.groups {
            let Some((topology, indices)) = gpu_indices(group) else {
                continue;
            };
            if indices.is_empty() || vertex_buffers.is_empty() {
                continue;
            }
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            groups.entry(group.material).or_default().push(GpuGroup {
                topology,
                index_buffer,
                index_count: indices.len() as u32,
            });
        }

        log::debug!(
            "uploaded {} vertices in {} buffers, {} materials",
            buffers.len(),
            vertex_buffers.len(),
            groups.len()
        );
        Self {
            vertex_buffers,
            groups,
        }
    }

    /// Number of device buffers owned, vertex and index.
    pub fn buffer_count(&self) -> usize {
        self.vertex_buffers.len() + self.groups.values().map(Vec::len).sum::<usize>()
    }

    /// Binds every attribute buffer and issues one indexed draw per group.
    /// Opaque materials are drawn before transparent ones.
    pub fn draw(
        &self,
        ctx: &Context,
        pass: &mut wgpu::RenderPass<'_>,
        materials: &MaterialSet,
        view: &ViewBinding,
    ) {
        if self.vertex_buffers.is_empty() {
            return;
        }
        pass.set_bind_group(0, &view.bind_group, &[]);
        let slots = [POSITION_SLOT, NORMAL_SLOT, COLOR_SLOT, COLOR_SLOT + 1]
            .into_iter()
            .chain(TEX_COORD_SLOT..TEX_COORD_SLOT + TEX_COORD_CHANNELS as u32);
        for (slot, buffer) in slots.zip(&self.vertex_buffers) {
            pass.set_vertex_buffer(slot, buffer.slice(..));
        }

        for transparent in [false, true] {
            for (material, groups) in &self.groups {
                if materials.material(*material).is_transparent() != transparent {
                    continue;
                }
                for group in groups {
                    let Some(pipeline) = ctx.pipelines.model.get(group.topology, transparent)
                    else {
                        log::warn!("no pipeline for {:?}", group.topology);
                        continue;
                    };
                    pass.set_pipeline(pipeline);
                    pass.set_index_buffer(group.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..group.index_count, 0, 0..1);
                }
            }
        }
    }
}

impl Drop for GpuModel {
    fn drop(&mut self) {
        for buffer in &self.vertex_buffers {
            buffer.destroy();
        }
        for group in self.groups.values().flatten() {
            group.index_buffer.destroy();
        }
    }
}
