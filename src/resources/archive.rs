//! The archive collaborator.
//!
//! Parsing the binary container format is not this crate's business: the
//! [`ResourceManager`] only consumes archives through the [`Archive`] trait and
//! opens them through an injected [`ArchiveOpener`]. [`MemoryArchive`] is the
//! in-memory implementation used by tests and by callers that already hold
//! record bytes.
//!
//! [`ResourceManager`]: crate::resources::manager::ResourceManager

use std::path::{Path, PathBuf};

use crate::resources::ids::{AssetId, FourCC};

/// One record of an archive's resource table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceRecord {
    pub id: AssetId,
    pub tag: FourCC,
    pub size: u32,
}

pub trait Archive {
    /// The path the archive was opened from. Used as its identity.
    fn filename(&self) -> &Path;

    fn resources(&self) -> Vec<ResourceRecord>;

    fn resources_by_type(&self, tag: FourCC) -> Vec<ResourceRecord> {
        self.resources()
            .into_iter()
            .filter(|record| record.tag == tag)
            .collect()
    }

    /// Raw (uncompressed) bytes of a record, `None` if the archive has no such record.
    fn load_data(&self, id: AssetId, tag: FourCC) -> Option<Vec<u8>>;

    /// Drops repeated records so every (id, tag) pair is listed once.
    fn remove_duplicates(&mut self);
}

/// Opens archives by path.
pub trait ArchiveOpener {
    fn open(&self, path: &Path) -> anyhow::Result<Box<dyn Archive>>;
}

impl<F> ArchiveOpener for F
where
    F: Fn(&Path) -> anyhow::Result<Box<dyn Archive>>,
{
    fn open(&self, path: &Path) -> anyhow::Result<Box<dyn Archive>> {
        self(path)
    }
}

/// An archive whose records live in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryArchive {
    filename: PathBuf,
    records: Vec<(ResourceRecord, Vec<u8>)>,
}

impl MemoryArchive {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            records: Vec::new(),
        }
    }

    pub fn insert(&mut self, tag: FourCC, id: AssetId, data: Vec<u8>) {
        let record = ResourceRecord {
            id,
            tag,
            size: data.len() as u32,
        };
        self.records.push((record, data));
    }

    pub fn with_resource(mut self, tag: FourCC, id: AssetId, data: Vec<u8>) -> Self {
        self.insert(tag, id, data);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Archive for MemoryArchive {
    fn filename(&self) -> &Path {
        &self.filename
    }

    fn resources(&self) -> Vec<ResourceRecord> {
        self.records.iter().map(|(record, _)| *record).collect()
    }

    fn load_data(&self, id: AssetId, tag: FourCC) -> Option<Vec<u8>> {
        self.records
            .iter()
            .find(|(record, _)| record.id == id && record.tag == tag)
            .map(|(_, data)| data.clone())
    }

    fn remove_duplicates(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.records
            .retain(|(record, _)| seen.insert((record.id, record.tag)));
    }
}
