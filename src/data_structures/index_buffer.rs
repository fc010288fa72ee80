//! Vertex deduplication and index buffer building.
//!
//! Decoded primitives index every attribute separately, which GPUs can't
//! consume. [`build`] resolves each [`VertexDescriptor`] into a full
//! [`InternedVertex`], interns equal vertices into one shared buffer and
//! collects the resulting indices into [`IndexGroup`]s keyed by topology and
//! material. Every primitive's run of indices ends with [`PRIMITIVE_RESTART`].
//!
//! Interning and group lookup are scoped to the mesh being indexed: a vertex
//! is only shared with vertices the same mesh interned, and each mesh opens its
//! own groups (carrying the mesh pivot).

use std::collections::HashMap;

use crate::data_structures::{
    geometry::{
        COLOR_CHANNELS, Mesh, TEX_COORD_CHANNELS, Topology, VertexAttributes, VertexDescriptor,
    },
    material::{Material, MaterialSet},
};

/// Index value that ends a primitive inside a shared index buffer.
pub const PRIMITIVE_RESTART: u32 = 0xFFFF_FFFF;

const KEY_WORDS: usize = 3 + 3 + COLOR_CHANNELS + TEX_COORD_CHANNELS * 2;

/// A fully resolved vertex as the GPU sees it.
///
/// Channels the material does not expose stay zero, so descriptors that only
/// differ in hidden channels intern to the same vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InternedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub colors: [u32; COLOR_CHANNELS],
    pub tex_coords: [[f32; 2]; TEX_COORD_CHANNELS],
}

impl InternedVertex {
    /// Builds the vertex `desc` describes, reading only the channels
    /// `material` reports present. Out-of-range indices read as zero.
    pub fn resolve(
        material: &Material,
        desc: &VertexDescriptor,
        attributes: &VertexAttributes,
    ) -> Self {
        let mut vertex = Self::default();
        if material.has_position() {
            vertex.position = fetch(&attributes.positions, desc.position);
        }
        if material.has_normal() {
            vertex.normal = fetch(&attributes.normals, desc.normal);
        }
        for c in 0..COLOR_CHANNELS {
            if material.has_color(c) {
                vertex.colors[c] = fetch(&attributes.colors, desc.color[c]);
            }
        }
        for t in 0..TEX_COORD_CHANNELS {
            if material.has_uv(t) {
                let source = if t == 0 && material.is_lightmapped() {
                    &attributes.lightmap_coords
                } else {
                    &attributes.tex_coords
                };
                vertex.tex_coords[t] = fetch(source, desc.tex_coord[t]);
            }
        }
        vertex
    }

    /// Bit pattern of every field; equal keys mean structurally equal vertices.
    /// Negative zero is keyed as zero.
    fn key(&self) -> [u32; KEY_WORDS] {
        let mut key = [0; KEY_WORDS];
        let floats = self
            .position
            .iter()
            .chain(&self.normal)
            .chain(self.tex_coords.iter().flatten());
        let mut words = floats
            .map(|&f| if f == 0.0 { 0 } else { f.to_bits() })
            .chain(self.colors);
        for slot in key.iter_mut() {
            *slot = words.next().unwrap_or_default();
        }
        key
    }
}

fn fetch<T: Copy + Default>(array: &[T], index: u16) -> T {
    array.get(index as usize).copied().unwrap_or_default()
}

/// Indices of one (topology, material) run, built for one mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexGroup {
    pub topology: Topology,
    pub material: u32,
    pub pivot: [f32; 3],
    pub indices: Vec<u32>,
}

impl IndexGroup {
    /// Number of primitives, i.e. restart sentinels, in the group.
    pub fn primitive_count(&self) -> usize {
        self.indices
            .iter()
            .filter(|&&index| index == PRIMITIVE_RESTART)
            .count()
    }
}

/// One flat array per vertex attribute, all the same length and ready for upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlatBuffers {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: [Vec<u32>; COLOR_CHANNELS],
    pub tex_coords: [Vec<[f32; 2]>; TEX_COORD_CHANNELS],
}

impl FlatBuffers {
    fn from_vertices(vertices: &[InternedVertex]) -> Self {
        let mut buffers = Self::default();
        buffers.positions = vertices.iter().map(|v| v.position).collect();
        buffers.normals = vertices.iter().map(|v| v.normal).collect();
        for (c, colors) in buffers.colors.iter_mut().enumerate() {
            *colors = vertices.iter().map(|v| v.colors[c]).collect();
        }
        for (t, coords) in buffers.tex_coords.iter_mut().enumerate() {
            *coords = vertices.iter().map(|v| v.tex_coords[t]).collect();
        }
        buffers
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Result of indexing a model's geometry against a material set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexedGeometry {
    /// Unique vertices in final order.
    pub vertices: Vec<InternedVertex>,
    pub groups: Vec<IndexGroup>,
    pub buffers: FlatBuffers,
    /// Descriptors that went through interning.
    pub descriptors_processed: usize,
}

fn group_for(
    groups: &mut Vec<IndexGroup>,
    mesh_start: usize,
    topology: Topology,
    mesh: &Mesh,
) -> usize {
    if let Some(offset) = groups[mesh_start..]
        .iter()
        .position(|g| g.topology == topology && g.material == mesh.material)
    {
        return mesh_start + offset;
    }
    groups.push(IndexGroup {
        topology,
        material: mesh.material,
        pivot: mesh.pivot,
        indices: Vec::new(),
    });
    groups.len() - 1
}

/// Interns every descriptor of `meshes` and groups the indices.
///
/// Primitives with a known topology keep all their descriptors, including a
/// trailing partial face; [`gpu_indices`](crate::data_structures::gpu::gpu_indices)
/// trims those at upload. Primitives of unknown topology are skipped.
pub fn build(
    attributes: &VertexAttributes,
    meshes: &[Mesh],
    materials: &MaterialSet,
) -> IndexedGeometry {
    let mut vertices: Vec<InternedVertex> = Vec::new();
    let mut groups: Vec<IndexGroup> = Vec::new();
    let mut interned: HashMap<[u32; KEY_WORDS], u32> = HashMap::new();
    let mut descriptors_processed = 0;

    for mesh in meshes {
        let material = materials.material(mesh.material);
        let mesh_start = groups.len();
        interned.clear();

        for primitive in &mesh.primitives {
            if primitive.topology.arity().is_none() {
                log::debug!("skipping {:?} primitive", primitive.topology);
                continue;
            }
            let group = group_for(&mut groups, mesh_start, primitive.topology, mesh);
            for desc in &primitive.vertices {
                let vertex = InternedVertex::resolve(material, desc, attributes);
                let index = *interned.entry(vertex.key()).or_insert_with(|| {
                    vertices.push(vertex);
                    (vertices.len() - 1) as u32
                });
                groups[group].indices.push(index);
                descriptors_processed += 1;
            }
            groups[group].indices.push(PRIMITIVE_RESTART);
        }
    }

    log::debug!(
        "indexed {} descriptors into {} unique vertices across {} groups",
        descriptors_processed,
        vertices.len(),
        groups.len()
    );

    let buffers = FlatBuffers::from_vertices(&vertices);
    IndexedGeometry {
        vertices,
        groups,
        buffers,
        descriptors_processed,
    }
}
