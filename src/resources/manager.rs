//! Caching resource manager.
//!
//! The [`ResourceManager`] owns the loaded archives, a cache of decoded
//! resources keyed by [`AssetId`] and the per-tag loader registry. Lookups go
//! through the cache first; on a miss the archives are searched in load order
//! and the record is handed to the loader registered for its tag.
//!
//! Nothing here fails loudly. Unreadable archives, unknown tags and broken
//! records all end as "not available" (`None` / `false`), and an id whose
//! decoder failed once is remembered so it is never decoded again until
//! [`ResourceManager::clear`].

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::resources::{
    Resource, ResourceData, ResourceDecoder,
    archive::{Archive, ArchiveOpener, ResourceRecord},
    error::{DecodeError, ResourceError},
    ids::{AssetId, FourCC},
    model::{self, CMDL},
    string_table::{self, STRG},
    world::{self, MLVL},
};

/// Extension of archive files picked up by [`ResourceManager::initialize`].
pub const ARCHIVE_EXTENSION: &str = "pak";

type ArchiveObserver = Box<dyn FnMut(&dyn Archive)>;

pub struct ResourceManager {
    opener: Box<dyn ArchiveOpener>,
    archives: Vec<Box<dyn Archive>>,
    loaders: HashMap<FourCC, ResourceDecoder>,
    cache: HashMap<AssetId, Rc<Resource>>,
    load_errors: HashSet<AssetId>,
    observers: Vec<ArchiveObserver>,
}

impl ResourceManager {
    /// A manager with no archives and no loaders, opening archives with `opener`.
    pub fn new(opener: impl ArchiveOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            archives: Vec::new(),
            loaders: HashMap::new(),
            cache: HashMap::new(),
            load_errors: HashSet::new(),
            observers: Vec::new(),
        }
    }

    /// Registers the built-in `CMDL`, `STRG` and `MLVL` decoders.
    pub fn register_default_loaders(&mut self) {
        self.register_loader(CMDL, model::decode);
        self.register_loader(STRG, string_table::decode);
        self.register_loader(MLVL, world::decode);
    }

    /// Registers `decoder` for `tag`. The first registration for a tag wins;
    /// later ones are ignored and `false` is returned.
    pub fn register_loader<F>(&mut self, tag: FourCC, decoder: F) -> bool
    where
        F: Fn(&[u8]) -> Result<ResourceData, DecodeError> + 'static,
    {
        if self.loaders.contains_key(&tag) {
            log::warn!("a loader for {tag} is already registered, ignoring the new one");
            return false;
        }
        self.loaders.insert(tag, Box::new(decoder));
        log::info!("registered loader for {tag}");
        true
    }

    pub fn has_loader(&self, tag: FourCC) -> bool {
        self.loaders.contains_key(&tag)
    }

    /// Calls `observer` with every archive loaded from now on.
    pub fn on_archive_loaded(&mut self, observer: impl FnMut(&dyn Archive) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Loads every `.pak` file (any case) directly inside `base_directory`.
    /// Returns the number of archives newly loaded.
    pub fn initialize(&mut self, base_directory: &Path) -> usize {
        log::info!("searching for archives in {}", base_directory.display());
        let entries = match fs::read_dir(base_directory) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("cannot read {}: {e}", base_directory.display());
                return 0;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_archive(path))
            .collect();
        paths.sort();

        let before = self.archives.len();
        for path in paths {
            self.load_pak(&path);
        }
        self.archives.len() - before
    }

    /// Opens the archive at `path` unless one with that filename is already
    /// loaded. Returns whether the archive is available afterwards.
    pub fn load_pak(&mut self, path: &Path) -> bool {
        if self.archive_index(path).is_some() {
            return true;
        }
        let mut archive = match self.opener.open(path) {
            Ok(archive) => archive,
            Err(e) => {
                log::warn!("failed to load archive {}: {e:#}", path.display());
                return false;
            }
        };
        archive.remove_duplicates();
        for observer in &mut self.observers {
            observer(archive.as_ref());
        }
        log::info!(
            "loaded archive {} ({} resources)",
            path.display(),
            archive.resources().len()
        );
        self.archives.push(archive);
        true
    }

    pub fn archives(&self) -> impl Iterator<Item = &dyn Archive> {
        self.archives.iter().map(|archive| archive.as_ref())
    }

    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }

    fn archive_index(&self, path: &Path) -> Option<usize> {
        self.archives
            .iter()
            .position(|archive| archive.filename() == path)
    }

    /// Returns the cached resource for `id`, decoding it from the first
    /// archive that holds it on a miss. `tag` restricts the search to records
    /// of that type.
    pub fn load_resource(&mut self, id: AssetId, tag: Option<FourCC>) -> Option<Rc<Resource>> {
        if let Some(lookup) = self.lookup(id) {
            return lookup;
        }
        (0..self.archives.len()).find_map(|index| self.load_from_archive(index, id, tag))
    }

    /// Like [`load_resource`](Self::load_resource), but only searches the
    /// loaded archive named `archive`. The cache is shared with every other
    /// lookup.
    pub fn load_resource_from_pak(
        &mut self,
        archive: &Path,
        id: AssetId,
        tag: Option<FourCC>,
    ) -> Option<Rc<Resource>> {
        if let Some(lookup) = self.lookup(id) {
            return lookup;
        }
        let Some(index) = self.archive_index(archive) else {
            log::debug!("archive {} is not loaded", archive.display());
            return None;
        };
        self.load_from_archive(index, id, tag)
    }

    /// `Some` when the answer doesn't need an archive: a cache hit, or `None`
    /// for invalid and previously failed ids.
    fn lookup(&self, id: AssetId) -> Option<Option<Rc<Resource>>> {
        if !id.is_valid() || self.load_errors.contains(&id) {
            return Some(None);
        }
        self.cache.get(&id).map(|resource| Some(Rc::clone(resource)))
    }

    fn load_from_archive(
        &mut self,
        index: usize,
        id: AssetId,
        tag: Option<FourCC>,
    ) -> Option<Rc<Resource>> {
        let archive = &self.archives[index];
        let records = match tag {
            Some(tag) => archive.resources_by_type(tag),
            None => archive.resources(),
        };
        let record = records.into_iter().find(|record| record.id == id)?;
        self.attempt_load(index, record)
    }

    fn attempt_load(&mut self, index: usize, record: ResourceRecord) -> Option<Rc<Resource>> {
        let Some(decoder) = self.loaders.get(&record.tag) else {
            log::debug!("no loader for {} {}", record.tag, record.id);
            return None;
        };
        let archive = &self.archives[index];
        let Some(bytes) = archive.load_data(record.id, record.tag) else {
            log::warn!(
                "{} {} is listed in {} but has no data",
                record.tag,
                record.id,
                archive.filename().display()
            );
            return None;
        };

        match decoder(&bytes) {
            Ok(data) => {
                let resource = Rc::new(Resource {
                    id: record.id,
                    tag: record.tag,
                    source: archive.filename().to_path_buf(),
                    data,
                });
                self.cache.insert(record.id, Rc::clone(&resource));
                Some(resource)
            }
            Err(e) => {
                log::error!("failed to decode {} {}: {e}", record.tag, record.id);
                self.load_errors.insert(record.id);
                None
            }
        }
    }

    /// Evicts `id` from the cache. Holders of the resource keep their handle;
    /// the next lookup decodes it again.
    pub fn destroy_resource(&mut self, id: AssetId) -> Result<(), ResourceError> {
        self.cache
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::NotCached(id))
    }

    /// Drops every cached resource and forgets failed ids. Archives stay loaded.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.load_errors.clear();
    }

    /// The cached resource for `id`, without touching any archive.
    pub fn cached(&self, id: AssetId) -> Option<Rc<Resource>> {
        self.cache.get(&id).cloned()
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Whether `id` failed to decode and is being skipped.
    pub fn has_failed(&self, id: AssetId) -> bool {
        self.load_errors.contains(&id)
    }
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
}
