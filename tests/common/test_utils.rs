use std::{
    cell::Cell,
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};

use pakview::resources::{
    archive::{Archive, MemoryArchive},
    model::{CMDL_MAGIC, CMDL_VERSION, LIGHTMAP_UVS, SHORT_NORMALS},
    string_table::STRG_MAGIC,
    world::{MLVL_MAGIC, MLVL_VERSION},
};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Big-endian byte writer for building archive records by hand.
#[derive(Default)]
pub(crate) struct BeWriter(pub(crate) Vec<u8>);

impl BeWriter {
    pub(crate) fn u8(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    pub(crate) fn u16(&mut self, v: u16) -> &mut Self {
        self.0.extend(v.to_be_bytes());
        self
    }

    pub(crate) fn i16(&mut self, v: i16) -> &mut Self {
        self.0.extend(v.to_be_bytes());
        self
    }

    pub(crate) fn u32(&mut self, v: u32) -> &mut Self {
        self.0.extend(v.to_be_bytes());
        self
    }

    pub(crate) fn f32(&mut self, v: f32) -> &mut Self {
        self.0.extend(v.to_be_bytes());
        self
    }

    pub(crate) fn fourcc(&mut self, tag: &[u8; 4]) -> &mut Self {
        self.0.extend(tag);
        self
    }

    pub(crate) fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.0.extend(data);
        self
    }

    pub(crate) fn pad_to(&mut self, alignment: usize) -> &mut Self {
        while self.0.len() % alignment != 0 {
            self.0.push(0);
        }
        self
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

/// A `STRG` record holding `languages`, every language with the same number of strings.
pub(crate) fn strg_bytes(languages: &[(&[u8; 4], &[&str])]) -> Vec<u8> {
    let string_count = languages.first().map_or(0, |(_, s)| s.len());

    let mut blocks = Vec::new();
    let mut block_offsets = Vec::new();
    for (_, strings) in languages {
        let mut encoded = Vec::new();
        let mut offsets = Vec::new();
        let table_size = strings.len() * 4;
        for s in strings.iter() {
            offsets.push((table_size + encoded.len()) as u32);
            for unit in s.encode_utf16() {
                encoded.extend(unit.to_be_bytes());
            }
            encoded.extend([0, 0]);
        }
        let mut block = BeWriter::default();
        block.u32((table_size + encoded.len()) as u32);
        for offset in offsets {
            block.u32(offset);
        }
        block.bytes(&encoded);
        block_offsets.push(blocks.len() as u32);
        blocks.extend(block.0);
    }

    let mut w = BeWriter::default();
    w.u32(STRG_MAGIC)
        .u32(0)
        .u32(languages.len() as u32)
        .u32(string_count as u32);
    for ((language, _), offset) in languages.iter().zip(block_offsets) {
        w.fourcc(language).u32(offset);
    }
    w.bytes(&blocks);
    w.0
}

pub(crate) struct MaterialFixture {
    pub(crate) flags: u32,
    pub(crate) texture_indices: Vec<u32>,
    pub(crate) vertex_attributes: u32,
}

pub(crate) struct SurfaceFixture {
    pub(crate) center: [f32; 3],
    pub(crate) material: u32,
    /// (opcode, vertices); each vertex lists one index per present attribute.
    pub(crate) primitives: Vec<(u8, Vec<Vec<u16>>)>,
}

#[derive(Default)]
pub(crate) struct CmdlFixture {
    pub(crate) flags: u32,
    pub(crate) bounds: ([f32; 3], [f32; 3]),
    pub(crate) material_sets: Vec<(Vec<u32>, Vec<MaterialFixture>)>,
    pub(crate) positions: Vec<[f32; 3]>,
    pub(crate) normals: Vec<[f32; 3]>,
    pub(crate) colors: Vec<u32>,
    pub(crate) tex_coords: Vec<[f32; 2]>,
    pub(crate) lightmap_coords: Vec<[i16; 2]>,
    pub(crate) surfaces: Vec<SurfaceFixture>,
}

/// Serializes `model` as a `CMDL` record.
pub(crate) fn cmdl_bytes(model: &CmdlFixture) -> Vec<u8> {
    let mut sections: Vec<Vec<u8>> = Vec::new();

    for (texture_ids, materials) in &model.material_sets {
        let mut w = BeWriter::default();
        w.u32(texture_ids.len() as u32);
        for id in texture_ids {
            w.u32(*id);
        }
        w.u32(materials.len() as u32);
        let mut body = BeWriter::default();
        let mut ends = Vec::new();
        for material in materials {
            body.u32(material.flags)
                .u32(material.texture_indices.len() as u32);
            for index in &material.texture_indices {
                body.u32(*index);
            }
            body.u32(material.vertex_attributes);
            // trailing material data the decoder skips
            body.u32(0xCAFE_F00D);
            ends.push(body.len() as u32);
        }
        for end in ends {
            w.u32(end);
        }
        w.bytes(&body.0).pad_to(32);
        sections.push(w.0);
    }

    let mut w = BeWriter::default();
    for p in &model.positions {
        w.f32(p[0]).f32(p[1]).f32(p[2]);
    }
    sections.push(w.pad_to(32).0.clone());

    let mut w = BeWriter::default();
    for n in &model.normals {
        if model.flags & SHORT_NORMALS != 0 {
            for c in n {
                w.i16((c * 32768.0).clamp(-32768.0, 32767.0) as i16);
            }
        } else {
            w.f32(n[0]).f32(n[1]).f32(n[2]);
        }
    }
    sections.push(w.pad_to(32).0.clone());

    let mut w = BeWriter::default();
    for c in &model.colors {
        w.u32(*c);
    }
    sections.push(w.pad_to(32).0.clone());

    let mut w = BeWriter::default();
    for uv in &model.tex_coords {
        w.f32(uv[0]).f32(uv[1]);
    }
    sections.push(w.pad_to(32).0.clone());

    if model.flags & LIGHTMAP_UVS != 0 {
        let mut w = BeWriter::default();
        for uv in &model.lightmap_coords {
            w.i16(uv[0]).i16(uv[1]);
        }
        sections.push(w.pad_to(32).0.clone());
    }

    let mut w = BeWriter::default();
    w.u32(model.surfaces.len() as u32);
    for _ in &model.surfaces {
        w.u32(0);
    }
    sections.push(w.pad_to(32).0.clone());

    for surface in &model.surfaces {
        let mut display_list = BeWriter::default();
        for (opcode, vertices) in &surface.primitives {
            display_list.u8(*opcode).u16(vertices.len() as u16);
            for vertex in vertices {
                for index in vertex {
                    display_list.u16(*index);
                }
            }
        }
        display_list.u8(0).pad_to(32);

        let mut w = BeWriter::default();
        w.f32(surface.center[0])
            .f32(surface.center[1])
            .f32(surface.center[2])
            .u32(surface.material)
            .u16(0x8000)
            .u16(display_list.len() as u16)
            .u32(0)
            .u32(0)
            .u32(0)
            .f32(0.0)
            .f32(0.0)
            .f32(1.0)
            .pad_to(32)
            .bytes(&display_list.0);
        sections.push(w.0);
    }

    let (min, max) = model.bounds;
    let mut w = BeWriter::default();
    w.u32(CMDL_MAGIC).u32(CMDL_VERSION).u32(model.flags);
    for v in min.iter().chain(&max) {
        w.f32(*v);
    }
    w.u32(sections.len() as u32)
        .u32(model.material_sets.len() as u32);
    for section in &sections {
        w.u32(section.len() as u32);
    }
    w.pad_to(32);
    for section in &sections {
        w.bytes(section);
    }
    w.0
}

/// A retail `MLVL` with one memory relay and an area per (name STRG id, MREA id).
pub(crate) fn mlvl_bytes(name_id: u32, skybox_id: u32, areas: &[(u32, u32)]) -> Vec<u8> {
    let mut w = BeWriter::default();
    w.u32(MLVL_MAGIC)
        .u32(MLVL_VERSION)
        .u32(name_id)
        .u32(0x1000)
        .u32(skybox_id);
    w.u32(1).u32(0xAAAA).u32(0xBBBB).u16(7).u8(1);
    w.u32(areas.len() as u32).u32(1);
    for (index, (area_name, area_id)) in areas.iter().enumerate() {
        w.u32(*area_name);
        for i in 0..12 {
            w.f32(if i % 5 == 0 { 1.0 } else { 0.0 });
        }
        for v in [-1.0, -1.0, -1.0, 1.0, 1.0, 1.0] {
            w.f32(v);
        }
        w.u32(*area_id).u32(index as u32);
        w.u32(1).u16(0);
        w.u32(0);
        w.u32(1).u32(0x2000).fourcc(b"TXTR");
        w.u32(1).u32(0);
        // one dock with one connection and two coordinates
        w.u32(1).u32(1).u32(0).u32(0);
        w.u32(2).f32(0.0).f32(0.0).f32(0.0).f32(1.0).f32(1.0).f32(1.0);
    }
    w.0
}

/// An opener serving clones of `archives` by filename and counting calls.
pub(crate) fn memory_opener(
    archives: Vec<MemoryArchive>,
    opens: Rc<Cell<usize>>,
) -> impl Fn(&Path) -> anyhow::Result<Box<dyn Archive>> {
    let archives: HashMap<PathBuf, MemoryArchive> = archives
        .into_iter()
        .map(|archive| (archive.filename().to_path_buf(), archive))
        .collect();
    move |path: &Path| {
        opens.set(opens.get() + 1);
        archives
            .get(path)
            .cloned()
            .map(|archive| Box::new(archive) as Box<dyn Archive>)
            .ok_or_else(|| anyhow::anyhow!("no archive at {}", path.display()))
    }
}
