use std::{
    cell::{Cell, RefCell},
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use pakview::resources::{
    ResourceData,
    archive::MemoryArchive,
    error::{DecodeError, ResourceError},
    ids::{AssetId, FourCC},
    manager::ResourceManager,
    model::CMDL,
    string_table::{self, STRG, StringTable},
    world::MLVL,
};

use crate::common::test_utils::{CmdlFixture, cmdl_bytes, init_logger, memory_opener, strg_bytes};

mod common;

const GREETING: u32 = 0xAB;

fn greeting_archive(name: &str) -> MemoryArchive {
    MemoryArchive::new(name).with_resource(
        STRG,
        AssetId::from(GREETING),
        strg_bytes(&[(b"ENGL", &["Hello"])]),
    )
}

fn manager_with(archives: Vec<MemoryArchive>) -> (ResourceManager, Rc<Cell<usize>>) {
    init_logger();
    let opens = Rc::new(Cell::new(0));
    let mut manager = ResourceManager::new(memory_opener(archives, Rc::clone(&opens)));
    manager.register_default_loaders();
    (manager, opens)
}

#[test]
fn should_register_default_loaders() {
    let (manager, _) = manager_with(vec![]);

    assert!(manager.has_loader(CMDL));
    assert!(manager.has_loader(STRG));
    assert!(manager.has_loader(MLVL));
    assert!(!manager.has_loader(FourCC::new(b"TXTR")));
}

#[test]
fn should_decode_and_cache_string_tables() {
    let (mut manager, _) = manager_with(vec![greeting_archive("a.pak")]);
    assert!(manager.load_pak(Path::new("a.pak")));

    let first = manager
        .load_resource(AssetId::from(GREETING), Some(STRG))
        .unwrap();
    let second = manager.load_resource(AssetId::from(GREETING), None).unwrap();

    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(first.tag, STRG);
    assert_eq!(first.source, PathBuf::from("a.pak"));
    assert_eq!(first.as_string_table().unwrap().string(0), Some("Hello"));
    assert!(first.as_renderable().is_none());
    assert_eq!(manager.cached_count(), 1);
}

#[test]
fn should_filter_by_type_tag() {
    let (mut manager, _) = manager_with(vec![greeting_archive("a.pak")]);
    manager.load_pak(Path::new("a.pak"));

    assert!(
        manager
            .load_resource(AssetId::from(GREETING), Some(CMDL))
            .is_none()
    );
    assert_eq!(manager.cached_count(), 0);
}

#[test]
fn should_not_load_the_invalid_id() {
    let archive = greeting_archive("a.pak").with_resource(
        STRG,
        AssetId::INVALID,
        strg_bytes(&[(b"ENGL", &["nobody"])]),
    );
    let (mut manager, _) = manager_with(vec![archive]);
    manager.load_pak(Path::new("a.pak"));

    assert!(manager.load_resource(AssetId::INVALID, None).is_none());
    assert!(
        manager
            .load_resource_from_pak(Path::new("a.pak"), AssetId::INVALID, None)
            .is_none()
    );
    assert_eq!(manager.cached_count(), 0);
}

#[test]
fn should_skip_records_without_a_loader() {
    let archive = MemoryArchive::new("a.pak").with_resource(
        FourCC::new(b"TXTR"),
        AssetId::from(0x5u32),
        vec![1, 2, 3],
    );
    let (mut manager, _) = manager_with(vec![archive]);
    manager.load_pak(Path::new("a.pak"));

    assert!(manager.load_resource(AssetId::from(0x5u32), None).is_none());
    assert!(!manager.has_failed(AssetId::from(0x5u32)));
}

#[test]
fn should_remember_failed_decodes() {
    init_logger();
    let archive = MemoryArchive::new("a.pak").with_resource(
        FourCC::new(b"BAD!"),
        AssetId::from(0x7u32),
        vec![0; 8],
    );
    let calls = Rc::new(Cell::new(0));
    let mut manager = ResourceManager::new(memory_opener(vec![archive], Rc::new(Cell::new(0))));
    let counter = Rc::clone(&calls);
    manager.register_loader(FourCC::new(b"BAD!"), move |_: &[u8]| {
        counter.set(counter.get() + 1);
        Err(DecodeError::Malformed("always broken".to_owned()))
    });
    manager.load_pak(Path::new("a.pak"));

    assert!(manager.load_resource(AssetId::from(0x7u32), None).is_none());
    assert!(manager.load_resource(AssetId::from(0x7u32), None).is_none());
    assert!(
        manager
            .load_resource_from_pak(Path::new("a.pak"), AssetId::from(0x7u32), None)
            .is_none()
    );

    assert_eq!(calls.get(), 1);
    assert!(manager.has_failed(AssetId::from(0x7u32)));

    manager.clear();
    assert!(!manager.has_failed(AssetId::from(0x7u32)));
    assert!(manager.load_resource(AssetId::from(0x7u32), None).is_none());
    assert_eq!(calls.get(), 2);
}

#[test]
fn should_keep_the_first_registered_loader() {
    let (mut manager, _) = manager_with(vec![greeting_archive("a.pak")]);
    manager.load_pak(Path::new("a.pak"));

    let replaced = manager.register_loader(STRG, |_: &[u8]| {
        Ok(ResourceData::StringTable(StringTable::new(vec![(
            FourCC::new(b"ENGL"),
            vec!["replaced".to_owned()],
        )])))
    });

    assert!(!replaced);
    let resource = manager.load_resource(AssetId::from(GREETING), None).unwrap();
    assert_eq!(resource.as_string_table().unwrap().string(0), Some("Hello"));
}

#[test]
fn should_use_custom_loaders() {
    init_logger();
    let mut manager = ResourceManager::new(memory_opener(
        vec![greeting_archive("a.pak")],
        Rc::new(Cell::new(0)),
    ));
    assert!(manager.register_loader(STRG, string_table::decode));
    manager.load_pak(Path::new("a.pak"));

    assert!(manager.load_resource(AssetId::from(GREETING), None).is_some());
    assert!(manager.cached(AssetId::from(GREETING)).is_some());
}

#[test]
fn should_open_each_archive_once() {
    let (mut manager, opens) = manager_with(vec![greeting_archive("a.pak")]);

    assert!(manager.load_pak(Path::new("a.pak")));
    assert!(manager.load_pak(Path::new("a.pak")));

    assert_eq!(manager.archive_count(), 1);
    assert_eq!(opens.get(), 1);
}

#[test]
fn should_report_archives_that_fail_to_open() {
    let (mut manager, opens) = manager_with(vec![]);

    assert!(!manager.load_pak(Path::new("missing.pak")));

    assert_eq!(manager.archive_count(), 0);
    assert_eq!(opens.get(), 1);
}

#[test]
fn should_drop_duplicate_records_on_load() {
    let archive = greeting_archive("a.pak").with_resource(
        STRG,
        AssetId::from(GREETING),
        strg_bytes(&[(b"ENGL", &["Shadowed"])]),
    );
    assert_eq!(archive.len(), 2);
    let (mut manager, _) = manager_with(vec![archive]);
    manager.load_pak(Path::new("a.pak"));

    let archive = manager.archives().next().unwrap();
    assert_eq!(archive.resources().len(), 1);
    let resource = manager.load_resource(AssetId::from(GREETING), None).unwrap();
    assert_eq!(resource.as_string_table().unwrap().string(0), Some("Hello"));
}

#[test]
fn should_search_archives_in_load_order() {
    let first = MemoryArchive::new("a.pak").with_resource(
        STRG,
        AssetId::from(GREETING),
        strg_bytes(&[(b"ENGL", &["from a"])]),
    );
    let second = MemoryArchive::new("b.pak")
        .with_resource(
            STRG,
            AssetId::from(GREETING),
            strg_bytes(&[(b"ENGL", &["from b"])]),
        )
        .with_resource(
            STRG,
            AssetId::from(0xCDu32),
            strg_bytes(&[(b"ENGL", &["only b"])]),
        );
    let (mut manager, _) = manager_with(vec![first, second]);
    manager.load_pak(Path::new("a.pak"));
    manager.load_pak(Path::new("b.pak"));

    let greeting = manager.load_resource(AssetId::from(GREETING), None).unwrap();
    assert_eq!(greeting.source, PathBuf::from("a.pak"));
    let other = manager.load_resource(AssetId::from(0xCDu32), None).unwrap();
    assert_eq!(other.source, PathBuf::from("b.pak"));
}

#[test]
fn should_load_from_a_named_archive() {
    let (mut manager, _) = manager_with(vec![greeting_archive("a.pak"), greeting_archive("b.pak")]);
    manager.load_pak(Path::new("a.pak"));
    manager.load_pak(Path::new("b.pak"));

    assert!(
        manager
            .load_resource_from_pak(Path::new("c.pak"), AssetId::from(GREETING), None)
            .is_none()
    );
    let from_b = manager
        .load_resource_from_pak(Path::new("b.pak"), AssetId::from(GREETING), Some(STRG))
        .unwrap();
    assert_eq!(from_b.source, PathBuf::from("b.pak"));

    // the cache is shared, so a later lookup in a.pak hits the b.pak copy
    let from_a = manager
        .load_resource_from_pak(Path::new("a.pak"), AssetId::from(GREETING), None)
        .unwrap();
    assert!(Rc::ptr_eq(&from_a, &from_b));
}

#[test]
fn should_destroy_cached_resources() {
    let (mut manager, _) = manager_with(vec![greeting_archive("a.pak")]);
    manager.load_pak(Path::new("a.pak"));
    let id = AssetId::from(GREETING);
    let first = manager.load_resource(id, None).unwrap();

    assert_eq!(manager.destroy_resource(id), Ok(()));
    assert_eq!(manager.destroy_resource(id), Err(ResourceError::NotCached(id)));
    assert!(manager.cached(id).is_none());

    // holders keep their handle, the next lookup decodes again
    assert_eq!(first.as_string_table().unwrap().string(0), Some("Hello"));
    let second = manager.load_resource(id, None).unwrap();
    assert!(!Rc::ptr_eq(&first, &second));
}

#[test]
fn should_clear_the_cache_but_keep_archives() {
    let (mut manager, _) = manager_with(vec![greeting_archive("a.pak")]);
    manager.load_pak(Path::new("a.pak"));
    manager.load_resource(AssetId::from(GREETING), None).unwrap();

    manager.clear();

    assert_eq!(manager.cached_count(), 0);
    assert_eq!(manager.archive_count(), 1);
    assert!(manager.load_resource(AssetId::from(GREETING), None).is_some());
}

#[test]
fn should_decode_models_into_renderables() {
    let archive = MemoryArchive::new("a.pak").with_resource(
        CMDL,
        AssetId::from(0x10u32),
        cmdl_bytes(&CmdlFixture {
            positions: vec![[0.0; 3]],
            ..Default::default()
        }),
    );
    let (mut manager, _) = manager_with(vec![archive]);
    manager.load_pak(Path::new("a.pak"));

    let resource = manager.load_resource(AssetId::from(0x10u32), None).unwrap();

    assert!(resource.as_renderable().is_some());
    assert_eq!(resource.as_model().unwrap().data().attributes().positions.len(), 1);
}

#[test]
fn should_find_archives_in_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.pak", "A.PAK", "notes.txt"] {
        fs::write(dir.path().join(name), b"").unwrap();
    }
    fs::create_dir(dir.path().join("nested.pak")).unwrap();
    let archives = vec![
        greeting_archive(dir.path().join("A.PAK").to_str().unwrap()),
        MemoryArchive::new(dir.path().join("b.pak")),
    ];
    let (mut manager, opens) = manager_with(archives);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let observed = Rc::clone(&seen);
    manager.on_archive_loaded(move |archive| {
        observed
            .borrow_mut()
            .push(archive.filename().file_name().unwrap().to_string_lossy().into_owned());
    });

    assert_eq!(manager.initialize(dir.path()), 2);
    assert_eq!(opens.get(), 2);
    assert_eq!(*seen.borrow(), vec!["A.PAK", "b.pak"]);
    assert!(manager.load_resource(AssetId::from(GREETING), None).is_some());

    // archives already loaded are not opened again
    assert_eq!(manager.initialize(dir.path()), 0);
    assert_eq!(opens.get(), 2);
}

#[test]
fn should_survive_missing_directories() {
    let (mut manager, opens) = manager_with(vec![]);

    assert_eq!(manager.initialize(Path::new("/definitely/not/here")), 0);
    assert_eq!(opens.get(), 0);
}
