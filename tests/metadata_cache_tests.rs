/// Metadata cache tests
///
/// Descriptor identity, registration reporting and concurrent first access.
/// Run with: cargo test --test metadata_cache_tests
mod common;

use common::*;
use rustcrud::{
    ConventionMapper, CrudError, CrudServices, CrudType, GlobalConfig, MetadataCache,
    PerTypeConfig, ServiceSetup, Value,
};
use std::any::TypeId;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_descriptors_are_built_once_and_shared() {
    let db = database();
    let ctx = db.context();
    let cache = MetadataCache::new();

    assert!(cache.lookup_entity(TypeId::of::<NormalEntity>()).is_none());

    let first = cache.get_or_create_entity::<NormalEntity, _>(&ctx).unwrap();
    let second = cache.get_or_create_entity::<NormalEntity, _>(&ctx).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let looked_up = cache.lookup_entity(TypeId::of::<NormalEntity>()).unwrap();
    assert!(Arc::ptr_eq(&first, &looked_up));
    assert_eq!(cache.stats().entity_builds, 1);
}

#[test]
fn test_entity_for_resolves_linked_entity() {
    let db = database();
    let ctx = db.context();
    let cache = MetadataCache::new();

    let via_dto = cache.entity_for::<NormalEntityDto, _>(&ctx).unwrap();
    let direct = cache.entity_for::<NormalEntity, _>(&ctx).unwrap();
    assert!(Arc::ptr_eq(&via_dto, &direct));
    assert_eq!(via_dto.type_name(), "NormalEntity");
    assert!(cache.lookup_entity(TypeId::of::<NormalEntityDto>()).is_none());
}

#[test]
fn test_transfer_descriptor_merges_config_per_call() {
    let db = database();
    let ctx = db.context();
    let cache = MetadataCache::new();
    let lenient = GlobalConfig::new();
    let strict_global = GlobalConfig::new().dto_access_validate_on_save(true);

    let entity = cache.entity_for::<StrictNormalEntityDto, _>(&ctx).unwrap();
    let strict = cache
        .get_or_create_transfer::<StrictNormalEntityDto>(
            entity.clone(),
            &StrictNormalEntityDto::per_type_config(),
        )
        .unwrap();
    assert!(strict.validate_on_save(&lenient));
    assert!(strict.no_error_on_read_single_null(&lenient));

    let plain = cache
        .get_or_create_transfer::<NormalEntityDto>(entity, &PerTypeConfig::new())
        .unwrap();
    assert!(!plain.validate_on_save(&lenient));
    assert!(plain.validate_on_save(&strict_global));
    assert!(!plain.no_error_on_read_single_null(&strict_global));
    assert!(Arc::ptr_eq(plain.entity(), &cache.lookup_entity(TypeId::of::<NormalEntity>()).unwrap()));
}

#[test]
fn test_restricted_transfer_is_rejected_and_not_cached() {
    let db = database();
    let ctx = db.context();
    let cache = MetadataCache::new();
    let entity = cache.entity_for::<HiddenDto, _>(&ctx).unwrap();

    let err = cache
        .get_or_create_transfer::<HiddenDto>(entity, &PerTypeConfig::new())
        .unwrap_err();
    assert_eq!(err, CrudError::NotPublic("HiddenDto".into()));
    assert!(cache.lookup_transfer(TypeId::of::<HiddenDto>()).is_none());

    let status = cache.register_transfer::<HiddenDto, _>(&ctx);
    assert!(!status.is_valid());
    assert!(status.error_string().contains("must be public"));
    assert!(cache.lookup_transfer(TypeId::of::<HiddenDto>()).is_none());
}

#[test]
fn test_transfer_without_blank_construction_is_rejected() {
    let db = database();
    let ctx = db.context();
    let cache = MetadataCache::new();

    let status = cache.register_transfer::<NoBlankDto, _>(&ctx);
    assert!(!status.is_valid());
    assert!(cache.lookup_transfer(TypeId::of::<NoBlankDto>()).is_none());
}

#[test]
fn test_entity_without_key_is_rejected() {
    let db = database();
    let ctx = db.context();
    let cache = MetadataCache::new();

    let err = cache.get_or_create_entity::<Orphan, _>(&ctx).unwrap_err();
    assert_eq!(err, CrudError::NoPrimaryKey("Orphan".into()));

    let declared = rustcrud::InMemoryDatabase::new().with_key::<Orphan>(&["nickname"]);
    let err = cache
        .get_or_create_entity::<Orphan, _>(&declared.context())
        .unwrap_err();
    assert!(matches!(err, CrudError::UnknownKeyField { .. }));

    let fixed = rustcrud::InMemoryDatabase::new().with_key::<Orphan>(&["name"]);
    let descriptor = cache.get_or_create_entity::<Orphan, _>(&fixed.context()).unwrap();
    assert_eq!(descriptor.key_names(), vec!["name"]);
}

#[test]
fn test_clear_all_forgets_descriptors() {
    let db = database();
    let ctx = db.context();
    let cache = MetadataCache::new();

    let before = cache.get_or_create_entity::<Book, _>(&ctx).unwrap();
    cache.clear_all();
    assert!(cache.lookup_entity(TypeId::of::<Book>()).is_none());
    assert_eq!(cache.stats().entities, 0);

    let after = cache.get_or_create_entity::<Book, _>(&ctx).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(cache.stats().entity_builds, 2);
}

#[test]
fn test_unregistered_transfer_is_a_fault() {
    let db = database();
    let cache = Arc::new(MetadataCache::new());
    let services: CrudServices<_, ConventionMapper> = CrudServices::new(
        db.context(),
        ConventionMapper,
        cache,
        Arc::new(GlobalConfig::new()),
    );

    let err = services
        .read_single::<NormalEntityDto>(&[Value::from(1)])
        .unwrap_err();
    assert_eq!(err, CrudError::NotRegistered("NormalEntityDto".into()));

    // entities never need registration
    assert!(services.read_single::<NormalEntity>(&[Value::from(1)]).is_ok());
}

#[test]
fn test_setup_reports_every_bad_type() {
    let db = database();
    let ctx = db.context();
    let status = ServiceSetup::with_cache(
        &ctx,
        Arc::new(MetadataCache::new()),
        Arc::new(GlobalConfig::new()),
    )
    .register::<NormalEntityDto>()
    .register::<HiddenDto>()
    .register::<NoBlankDto>()
    .register::<Orphan>()
    .finish();

    assert!(!status.is_valid());
    assert_eq!(status.errors().len(), 3);
    assert_eq!(status.message(), "Failed with 3 errors");
}

#[test]
fn test_setup_success_message() {
    let db = database();
    let ctx = db.context();
    let status = ServiceSetup::with_cache(
        &ctx,
        Arc::new(MetadataCache::new()),
        Arc::new(GlobalConfig::new()),
    )
    .register::<Book>()
    .register::<CreateBookDto>()
    .finish();
    assert!(status.is_valid());
    assert_eq!(status.message(), "Registered 2 type(s)");
}

#[test]
fn test_concurrent_first_access_builds_once() {
    let db = database();
    let cache = Arc::new(MetadataCache::new());
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            let db = db.clone();
            thread::spawn(move || {
                let ctx = db.context();
                barrier.wait();
                // half the threads go through the transfer type
                let entity = if i % 2 == 0 {
                    cache.get_or_create_entity::<NormalEntity, _>(&ctx).unwrap()
                } else {
                    cache.entity_for::<NormalEntityDto, _>(&ctx).unwrap()
                };
                let transfer = cache
                    .get_or_create_transfer::<NormalEntityDto>(entity.clone(), &PerTypeConfig::new())
                    .unwrap();
                (entity, transfer)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let (first_entity, first_transfer) = &results[0];
    for (entity, transfer) in &results {
        assert!(Arc::ptr_eq(first_entity, entity));
        assert!(Arc::ptr_eq(first_transfer, transfer));
    }

    let stats = cache.stats();
    assert_eq!(stats.entity_builds, 1);
    assert_eq!(stats.transfer_builds, 1);
}

#[test]
fn test_distinct_types_resolve_concurrently() {
    let db = database();
    let cache = Arc::new(MetadataCache::new());
    let barrier = Arc::new(Barrier::new(3));

    let spawn = |f: fn(&MetadataCache, &rustcrud::InMemoryContext) -> &'static str| {
        let cache = Arc::clone(&cache);
        let barrier = Arc::clone(&barrier);
        let db = db.clone();
        thread::spawn(move || {
            let ctx = db.context();
            barrier.wait();
            f(&cache, &ctx)
        })
    };

    let handles = vec![
        spawn(|c, ctx| c.get_or_create_entity::<NormalEntity, _>(ctx).unwrap().type_name()),
        spawn(|c, ctx| c.get_or_create_entity::<Book, _>(ctx).unwrap().type_name()),
        spawn(|c, ctx| {
            c.get_or_create_entity::<DddCompositeIntString, _>(ctx)
                .unwrap()
                .type_name()
        }),
    ];
    let mut names: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    names.sort();
    assert_eq!(names, vec!["Book", "DddCompositeIntString", "NormalEntity"]);
    assert_eq!(cache.stats().entities, 3);
}

#[test]
fn test_global_cache_is_a_singleton() {
    assert!(Arc::ptr_eq(MetadataCache::global(), MetadataCache::global()));
}
