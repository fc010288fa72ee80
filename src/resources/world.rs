//! `MLVL` world descriptions.
//!
//! Only the parts the viewer uses are kept: the name and skybox references,
//! memory relays and the area list. Everything after the areas is ignored.

use std::{path::Path, rc::Rc};

use crate::resources::{
    Resource, ResourceData,
    error::DecodeError,
    ids::{AssetId, FourCC},
    manager::ResourceManager,
    model::CMDL,
    reader::BigEndianReader,
    string_table::STRG,
};

pub const MLVL: FourCC = FourCC::new(b"MLVL");
pub const MLVL_MAGIC: u32 = 0xDEAF_BABE;
/// Retail layout.
pub const MLVL_VERSION: u32 = 0x11;
/// Early layout, without a save world reference.
pub const MLVL_VERSION_EARLY: u32 = 0x0D;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryRelay {
    pub memory_id: u32,
    pub target_id: u32,
    pub message: u16,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dock {
    /// (area index, dock index) pairs this dock connects to.
    pub connections: Vec<(u32, u32)>,
    pub coordinates: Vec<[f32; 3]>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorldArea {
    pub name_id: AssetId,
    /// Row-major 3x4 transform.
    pub transform: [f32; 12],
    pub bounding_box: [f32; 6],
    pub area_id: AssetId,
    pub internal_id: u32,
    pub attached_areas: Vec<u16>,
    pub dependencies: Vec<(AssetId, FourCC)>,
    pub dependency_offsets: Vec<u32>,
    pub docks: Vec<Dock>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct World {
    pub version: u32,
    pub name_id: AssetId,
    pub save_world_id: AssetId,
    pub skybox_id: AssetId,
    pub relays: Vec<MemoryRelay>,
    pub areas: Vec<WorldArea>,
}

impl World {
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = BigEndianReader::new(data);
        reader.expect_magic(MLVL_MAGIC)?;
        let version = reader.u32()?;
        if version != MLVL_VERSION && version != MLVL_VERSION_EARLY {
            return Err(DecodeError::UnsupportedVersion {
                format: MLVL,
                version,
            });
        }
        let name_id = reader.asset_id()?;
        let save_world_id = if version == MLVL_VERSION {
            reader.asset_id()?
        } else {
            AssetId::INVALID
        };
        let skybox_id = reader.asset_id()?;

        let relay_count = reader.count(11)?;
        let mut relays = Vec::with_capacity(relay_count);
        for _ in 0..relay_count {
            relays.push(MemoryRelay {
                memory_id: reader.u32()?,
                target_id: reader.u32()?,
                message: reader.u16()?,
                active: reader.u8()? != 0,
            });
        }

        let area_count = reader.count(4)?;
        reader.skip(4)?;
        let mut areas = Vec::with_capacity(area_count);
        for index in 0..area_count {
            let area = read_area(&mut reader)
                .map_err(|e| DecodeError::Malformed(format!("area {index}: {e}")))?;
            areas.push(area);
        }

        Ok(Self {
            version,
            name_id,
            save_world_id,
            skybox_id,
            relays,
            areas,
        })
    }

    pub fn area(&self, area_id: AssetId) -> Option<&WorldArea> {
        self.areas.iter().find(|area| area.area_id == area_id)
    }

    /// Name of the area whose `MREA` is `area_id`.
    ///
    /// The name table is looked up in `archive` when given, otherwise in every
    /// loaded archive, and is evicted again once read. Unknown areas and
    /// missing tables give an empty string.
    pub fn area_name(
        &self,
        area_id: AssetId,
        manager: &mut ResourceManager,
        archive: Option<&Path>,
    ) -> String {
        let Some(area) = self.area(area_id) else {
            return String::new();
        };
        if !area.name_id.is_valid() {
            return String::new();
        }
        let table = match archive {
            Some(archive) => manager.load_resource_from_pak(archive, area.name_id, Some(STRG)),
            None => manager.load_resource(area.name_id, Some(STRG)),
        };
        let Some(table) = table else {
            return String::new();
        };
        let name = table
            .as_string_table()
            .and_then(|strings| strings.string(0))
            .unwrap_or_default()
            .to_owned();
        if let Err(e) = manager.destroy_resource(table.id) {
            log::debug!("area name table already evicted: {e}");
        }
        name
    }

    /// The skybox model, loaded from `archive`, the world's own archive.
    pub fn skybox_model(
        &self,
        manager: &mut ResourceManager,
        archive: &Path,
    ) -> Option<Rc<Resource>> {
        manager
            .load_resource_from_pak(archive, self.skybox_id, Some(CMDL))
            .filter(|resource| resource.as_renderable().is_some())
    }
}

fn read_area(reader: &mut BigEndianReader) -> Result<WorldArea, DecodeError> {
    let name_id = reader.asset_id()?;
    let mut transform = [0.0; 12];
    for value in &mut transform {
        *value = reader.f32()?;
    }
    let mut bounding_box = [0.0; 6];
    for value in &mut bounding_box {
        *value = reader.f32()?;
    }
    let area_id = reader.asset_id()?;
    let internal_id = reader.u32()?;

    let attached_count = reader.count(2)?;
    let mut attached_areas = Vec::with_capacity(attached_count);
    for _ in 0..attached_count {
        attached_areas.push(reader.u16()?);
    }
    reader.skip(4)?;

    let dependency_count = reader.count(8)?;
    let mut dependencies = Vec::with_capacity(dependency_count);
    for _ in 0..dependency_count {
        dependencies.push((reader.asset_id()?, reader.fourcc()?));
    }
    let offset_count = reader.count(4)?;
    let mut dependency_offsets = Vec::with_capacity(offset_count);
    for _ in 0..offset_count {
        dependency_offsets.push(reader.u32()?);
    }

    let dock_count = reader.count(8)?;
    let mut docks = Vec::with_capacity(dock_count);
    for _ in 0..dock_count {
        let connection_count = reader.count(8)?;
        let mut connections = Vec::with_capacity(connection_count);
        for _ in 0..connection_count {
            connections.push((reader.u32()?, reader.u32()?));
        }
        let coordinate_count = reader.count(12)?;
        let mut coordinates = Vec::with_capacity(coordinate_count);
        for _ in 0..coordinate_count {
            coordinates.push(reader.vec3()?);
        }
        docks.push(Dock {
            connections,
            coordinates,
        });
    }

    Ok(WorldArea {
        name_id,
        transform,
        bounding_box,
        area_id,
        internal_id,
        attached_areas,
        dependencies,
        dependency_offsets,
        docks,
    })
}

pub fn decode(data: &[u8]) -> Result<ResourceData, DecodeError> {
    Ok(ResourceData::World(World::decode(data)?))
}
