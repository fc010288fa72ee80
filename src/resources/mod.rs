//! Archived resources: identifiers, the archive collaborator, decoders and
//! the caching [`ResourceManager`](manager::ResourceManager).
//!
//! - `ids` holds [`AssetId`] and [`FourCC`]
//! - `archive` is the interface archives are consumed through
//! - `manager` caches decoded resources and dispatches to registered loaders
//! - `model`, `string_table` and `world` are the built-in decoders

use std::path::PathBuf;

use crate::{
    data_structures::model::Model,
    render::Renderable,
    resources::{
        error::DecodeError,
        ids::{AssetId, FourCC},
        string_table::StringTable,
        world::World,
    },
};

pub mod archive;
pub mod error;
pub mod ids;
pub mod manager;
pub mod model;
pub(crate) mod reader;
pub mod string_table;
pub mod world;

/// Decodes the raw bytes of one archive record.
pub type ResourceDecoder = Box<dyn Fn(&[u8]) -> Result<ResourceData, DecodeError>>;

/// The decoded payload of a resource.
#[derive(Debug)]
pub enum ResourceData {
    Model(Model),
    StringTable(StringTable),
    World(World),
}

/// A decoded resource tagged with where it came from.
#[derive(Debug)]
pub struct Resource {
    pub id: AssetId,
    pub tag: FourCC,
    /// Filename of the archive the resource was decoded from.
    pub source: PathBuf,
    pub data: ResourceData,
}

impl Resource {
    /// The renderable capability, present for resources with visible geometry.
    pub fn as_renderable(&self) -> Option<&dyn Renderable> {
        match &self.data {
            ResourceData::Model(model) => Some(model),
            ResourceData::StringTable(_) | ResourceData::World(_) => None,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match &self.data {
            ResourceData::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_string_table(&self) -> Option<&StringTable> {
        match &self.data {
            ResourceData::StringTable(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_world(&self) -> Option<&World> {
        match &self.data {
            ResourceData::World(world) => Some(world),
            _ => None,
        }
    }
}
