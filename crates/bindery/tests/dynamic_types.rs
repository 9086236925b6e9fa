mod common;

use bindery::{
    Database, Entity,
    backend::{MemoryBackend, StorageBackend},
    binding::TypeCatalog,
    config::Config,
    system,
    traits::Entity as _,
    types::{ColumnValue, ObjectRef},
};
use common::{Animal, Bird, Customer, Order};
use std::sync::Arc;

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Zoo.Species")]
struct Species {
    #[entity(type_name)]
    label: String,

    is_type: bool,

    #[entity(references = "Zoo.Species", base_type_reference)]
    genus: Option<ObjectRef>,
}

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Zoo.Penguin")]
struct Penguin {
    #[entity(references = "Zoo.Species", type_reference)]
    species: Option<ObjectRef>,
}

fn catalog() -> TypeCatalog {
    let mut catalog = common::catalog();
    catalog.register::<Species>().register::<Penguin>();

    catalog
}

fn runtime_ref(db: &Database, name: &str) -> Option<ObjectRef> {
    db.registry()
        .type_def_by_name(name)
        .and_then(|def| def.runtime_default_type_ref())
}

#[test]
fn each_type_is_materialized_exactly_once() {
    let backend = Arc::new(MemoryBackend::new());
    let names = [Customer::TYPE_NAME, Order::TYPE_NAME, Bird::TYPE_NAME];

    let db = common::open(backend.clone(), catalog());
    let first = db.load_schema(&names).expect("first load should succeed");
    let created = first.discovery.expect("discovery is on by default").created;
    let inserts = backend.stats().snapshot().inserts;

    assert_eq!(
        created,
        vec![
            Customer::TYPE_NAME.to_string(),
            Order::TYPE_NAME.to_string(),
            Animal::TYPE_NAME.to_string(),
            Bird::TYPE_NAME.to_string(),
        ]
    );

    let again = db.load_schema(&names).expect("second load should succeed");
    let report = again.discovery.expect("discovery is on by default");
    assert!(report.created.is_empty());
    assert_eq!(backend.stats().snapshot().inserts, inserts);

    let reopened = common::open(backend.clone(), catalog());
    let third = reopened
        .load_schema(&names)
        .expect("load after reopening should succeed");
    let report = third.discovery.expect("discovery is on by default");

    assert!(report.created.is_empty());
    assert_eq!(report.reused.len(), created.len());
    assert_eq!(backend.stats().snapshot().inserts, inserts);
    for name in names {
        assert_eq!(runtime_ref(&reopened, name), runtime_ref(&db, name));
    }
}

#[test]
fn raw_views_point_at_the_materialized_row() {
    let backend = Arc::new(MemoryBackend::new());
    let db = common::open(backend.clone(), catalog());
    db.load_schema(&[Bird::TYPE_NAME]).expect("load should succeed");

    let raw_view = db
        .registry()
        .type_binding_by_name(system::RAW_VIEW)
        .expect("lookup should succeed")
        .expect("raw view should be registered");
    let column = raw_view
        .property_binding_by_name(system::AUTO_TYPE_INSTANCE)
        .and_then(|p| p.data_index())
        .expect("AutoTypeInstance should be stored");

    let row = backend
        .find_raw_view(Bird::TYPE_NAME)
        .expect("lookup should succeed")
        .expect("Bird should have a raw view");
    let bird_ref = runtime_ref(&db, Bird::TYPE_NAME).expect("Bird should be linked");

    assert_eq!(
        backend.read_column(row, column).expect("read should succeed"),
        ColumnValue::Object(bird_ref)
    );
}

#[test]
fn declared_runtime_types_receive_the_stamp() {
    let backend = Arc::new(MemoryBackend::new());
    let db = common::open(backend.clone(), catalog());
    db.load_schema(&[Species::TYPE_NAME, Penguin::TYPE_NAME])
        .expect("load should succeed");

    let species = db
        .registry()
        .type_binding_by_name(Species::TYPE_NAME)
        .expect("lookup should succeed")
        .expect("Species should be registered");
    let penguin_ref = runtime_ref(&db, Penguin::TYPE_NAME).expect("Penguin should be linked");
    let label = species
        .property_binding_by_name("Label")
        .and_then(|p| p.data_index())
        .expect("Label should be stored");

    assert_eq!(
        backend.row_table_id(penguin_ref).ok(),
        Some(species.table_id())
    );
    assert_eq!(
        backend.read_column(penguin_ref, label).expect("read should succeed"),
        ColumnValue::String(Penguin::TYPE_NAME.to_string())
    );
}

#[test]
fn discovery_can_be_switched_off() {
    let backend = Arc::new(MemoryBackend::new());
    let config = Config::from_toml_str("[dynamic_types]\nenabled = false\n")
        .expect("config should parse");
    let db = Database::open(backend.clone(), catalog(), config).expect("open should succeed");

    let load = db
        .load_schema(&[Order::TYPE_NAME])
        .expect("load should succeed");

    assert!(load.discovery.is_none());
    assert!(runtime_ref(&db, Order::TYPE_NAME).is_none());
    assert_eq!(backend.stats().snapshot().inserts, 0);
}
