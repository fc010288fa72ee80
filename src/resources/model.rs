//! `CMDL` model decoding.
//!
//! A model is a 32-byte aligned header followed by data sections whose sizes
//! the header lists. Sections come in a fixed order:
//!
//! 1. one section per material set
//! 2. positions (`3 x f32`)
//! 3. normals (`3 x f32`, or `3 x i16 / 32768` with [`SHORT_NORMALS`])
//! 4. colors (packed RGBA8 `u32`)
//! 5. texture coordinates (`2 x f32`)
//! 6. lightmap coordinates (`2 x i16 / 32768`), only with [`LIGHTMAP_UVS`]
//! 7. the surface table (`u32` count, then one `u32` per surface)
//! 8. one section per surface
//!
//! A surface carries a GX display list; each vertex of a primitive holds one
//! `u16` index for every attribute its material reports present.

use crate::{
    data_structures::{
        geometry::{
            BoundingBox, COLOR_CHANNELS, Mesh, Primitive, TEX_COORD_CHANNELS, Topology,
            VertexAttributes, VertexDescriptor,
        },
        material::{Material, MaterialSet},
        model::{Model, ModelData},
    },
    resources::{
        ResourceData,
        error::DecodeError,
        ids::FourCC,
        reader::BigEndianReader,
    },
};

pub const CMDL: FourCC = FourCC::new(b"CMDL");
pub const CMDL_MAGIC: u32 = 0xDEAD_BABE;
pub const CMDL_VERSION: u32 = 2;

/// Header flag: normals are stored as shorts.
pub const SHORT_NORMALS: u32 = 0x2;
/// Header flag: a lightmap coordinate section is present.
pub const LIGHTMAP_UVS: u32 = 0x4;

const SECTION_ALIGNMENT: u64 = 32;
const SHORT_SCALE: f32 = 1.0 / 32768.0;

struct Sections {
    offsets: Vec<(u64, u64)>,
    next: usize,
}

impl Sections {
    /// Positions the reader at the start of the next section and returns its size.
    fn next(&mut self, reader: &mut BigEndianReader) -> Result<u64, DecodeError> {
        let (start, size) = *self.offsets.get(self.next).ok_or_else(|| {
            DecodeError::Malformed(format!("missing data section {}", self.next))
        })?;
        self.next += 1;
        reader.seek(start)?;
        Ok(size)
    }
}

pub fn decode_model(data: &[u8]) -> Result<Model, DecodeError> {
    let mut reader = BigEndianReader::new(data);
    reader.expect_magic(CMDL_MAGIC)?;
    let version = reader.u32()?;
    if version != CMDL_VERSION {
        return Err(DecodeError::UnsupportedVersion {
            format: CMDL,
            version,
        });
    }
    let flags = reader.u32()?;
    let bounding_box = BoundingBox::new(reader.vec3()?, reader.vec3()?);
    let section_count = reader.count(4)?;
    let material_set_count = reader.u32()? as usize;
    let mut sizes = Vec::with_capacity(section_count);
    for _ in 0..section_count {
        sizes.push(u64::from(reader.u32()?));
    }
    reader.align(SECTION_ALIGNMENT)?;

    let mut start = reader.position();
    let mut offsets = Vec::with_capacity(section_count);
    for size in sizes {
        if start + size > reader.len() {
            return Err(DecodeError::Malformed(format!(
                "section at {start:#X} of {size:#X} bytes overruns the model"
            )));
        }
        offsets.push((start, size));
        start += size;
    }
    let mut sections = Sections { offsets, next: 0 };

    let mut material_sets = Vec::with_capacity(material_set_count.min(section_count));
    for _ in 0..material_set_count {
        let size = sections.next(&mut reader)?;
        material_sets.push(read_material_set(&mut reader, size)?);
    }

    let mut attributes = VertexAttributes::default();
    let size = sections.next(&mut reader)?;
    for _ in 0..size / 12 {
        attributes.positions.push(reader.vec3()?);
    }
    let size = sections.next(&mut reader)?;
    if flags & SHORT_NORMALS != 0 {
        for _ in 0..size / 6 {
            attributes.normals.push([
                f32::from(reader.i16()?) * SHORT_SCALE,
                f32::from(reader.i16()?) * SHORT_SCALE,
                f32::from(reader.i16()?) * SHORT_SCALE,
            ]);
        }
    } else {
        for _ in 0..size / 12 {
            attributes.normals.push(reader.vec3()?);
        }
    }
    let size = sections.next(&mut reader)?;
    for _ in 0..size / 4 {
        attributes.colors.push(reader.u32()?);
    }
    let size = sections.next(&mut reader)?;
    for _ in 0..size / 8 {
        attributes.tex_coords.push([reader.f32()?, reader.f32()?]);
    }
    if flags & LIGHTMAP_UVS != 0 {
        let size = sections.next(&mut reader)?;
        for _ in 0..size / 4 {
            attributes.lightmap_coords.push([
                f32::from(reader.i16()?) * SHORT_SCALE,
                f32::from(reader.i16()?) * SHORT_SCALE,
            ]);
        }
    }

    sections.next(&mut reader)?;
    let surface_count = reader.count(4)?;
    // descriptors follow the attribute layout of the first set's materials
    let materials = material_sets.first().unwrap_or(MaterialSet::empty());
    let mut meshes = Vec::with_capacity(surface_count);
    for index in 0..surface_count {
        let size = sections.next(&mut reader)?;
        let mesh = read_surface(&mut reader, size, materials)
            .map_err(|e| DecodeError::Malformed(format!("surface {index}: {e}")))?;
        meshes.push(mesh);
    }

    log::debug!(
        "decoded model: {} material sets, {} positions, {} surfaces",
        material_sets.len(),
        attributes.positions.len(),
        meshes.len()
    );
    Ok(Model::new(
        version,
        flags,
        bounding_box,
        material_sets,
        ModelData::new(attributes, meshes),
    ))
}

fn read_material_set(reader: &mut BigEndianReader, size: u64) -> Result<MaterialSet, DecodeError> {
    let section_end = reader.position() + size;
    let texture_count = reader.count(4)?;
    let mut texture_ids = Vec::with_capacity(texture_count);
    for _ in 0..texture_count {
        texture_ids.push(reader.asset_id()?);
    }
    let material_count = reader.count(4)?;
    let mut ends = Vec::with_capacity(material_count);
    for _ in 0..material_count {
        ends.push(u64::from(reader.u32()?));
    }

    let materials_start = reader.position();
    let mut materials = Vec::with_capacity(material_count);
    for end in ends {
        let end = materials_start + end;
        if end > section_end {
            return Err(DecodeError::Malformed(format!(
                "material ends at {end:#X}, past its set ({section_end:#X})"
            )));
        }
        let flags = reader.u32()?;
        let index_count = reader.count(4)?;
        let mut texture_indices = Vec::with_capacity(index_count);
        for _ in 0..index_count {
            texture_indices.push(reader.u32()?);
        }
        let vertex_attributes = reader.u32()?;
        if reader.position() > end {
            return Err(DecodeError::Malformed(
                "material header overruns its end offset".to_owned(),
            ));
        }
        materials.push(Material {
            flags,
            texture_indices,
            vertex_attributes,
        });
        reader.seek(end)?;
    }
    Ok(MaterialSet::new(materials, texture_ids))
}

fn read_surface(
    reader: &mut BigEndianReader,
    size: u64,
    materials: &MaterialSet,
) -> Result<Mesh, DecodeError> {
    let start = reader.position();
    let pivot = reader.vec3()?;
    let material = reader.u32()?;
    let _mantissa = reader.u16()?;
    let display_list_size = u64::from(reader.u16()?);
    reader.skip(8)?;
    let extra_size = u64::from(reader.u32()?);
    let _normal = reader.vec3()?;
    reader.skip(extra_size)?;
    reader.align(SECTION_ALIGNMENT)?;

    let display_list_end = reader.position() + display_list_size;
    if display_list_end > start + size {
        return Err(DecodeError::Malformed(format!(
            "display list of {display_list_size:#X} bytes overruns the surface"
        )));
    }

    let layout = materials.material(material);
    let mut primitives = Vec::new();
    while reader.position() < display_list_end {
        let opcode = reader.u8()?;
        if opcode == 0 {
            break;
        }
        let vertex_count = reader.u16()?;
        let mut vertices = Vec::with_capacity(usize::from(vertex_count));
        for _ in 0..vertex_count {
            vertices.push(read_descriptor(reader, layout)?);
        }
        if reader.position() > display_list_end {
            return Err(DecodeError::Malformed(
                "primitive overruns the display list".to_owned(),
            ));
        }
        primitives.push(Primitive {
            topology: Topology::from_opcode(opcode),
            vertices,
        });
    }

    Ok(Mesh {
        material,
        pivot,
        primitives,
    })
}

fn read_descriptor(
    reader: &mut BigEndianReader,
    layout: &Material,
) -> Result<VertexDescriptor, DecodeError> {
    let mut desc = VertexDescriptor::default();
    if layout.has_position() {
        desc.position = reader.u16()?;
    }
    if layout.has_normal() {
        desc.normal = reader.u16()?;
    }
    for c in 0..COLOR_CHANNELS {
        if layout.has_color(c) {
            desc.color[c] = reader.u16()?;
        }
    }
    for t in 0..TEX_COORD_CHANNELS {
        if layout.has_uv(t) {
            desc.tex_coord[t] = reader.u16()?;
        }
    }
    Ok(desc)
}

pub fn decode(data: &[u8]) -> Result<ResourceData, DecodeError> {
    Ok(ResourceData::Model(decode_model(data)?))
}

