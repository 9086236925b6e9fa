mod common;

use bindery::{
    Error,
    backend::MemoryBackend,
    binding::TypeBinding,
    traits::Entity as _,
};
use common::{Animal, Bird, Customer, DELETED, Item, Order, ShopCart, WebCart};
use std::{sync::Arc, thread};

fn loaded(names: &[&str]) -> bindery::Database {
    let db = common::open(Arc::new(MemoryBackend::new()), common::catalog());
    db.load_schema(names).expect("schema should load");

    db
}

#[test]
fn order_resolves_by_exact_and_lower_case_name_only() {
    let db = loaded(&[Customer::TYPE_NAME, Order::TYPE_NAME]);
    let registry = db.registry();

    let exact = registry
        .type_binding_by_name("Order")
        .expect("lookup should succeed")
        .expect("Order should resolve");
    let lower = registry
        .type_binding_by_name("order")
        .expect("lookup should succeed")
        .expect("order should resolve");
    let typo = registry
        .type_binding_by_name("Ordr")
        .expect("a typo should not fail");

    assert!(Arc::ptr_eq(&exact, &lower));
    assert!(typo.is_none());

    let names: Vec<_> = exact.property_bindings().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["Id", "Total", "Customer"]);
    assert!(exact.property_binding_by_name("Total").is_some_and(|p| p.is_nullable()));
}

#[test]
fn object_properties_resolve_their_target_binding() {
    let db = loaded(&[Order::TYPE_NAME, Customer::TYPE_NAME]);
    let registry = db.registry();
    let order = registry
        .type_binding_by_name(Order::TYPE_NAME)
        .expect("lookup should succeed")
        .expect("Order should resolve");

    let customer = order
        .property_binding_by_name("Customer")
        .expect("Customer property should bind");
    let target = customer
        .target_type_binding(registry)
        .expect("target should resolve")
        .expect("object property should have a target");
    let again = customer
        .target_type_binding(registry)
        .expect("cached target should resolve")
        .expect("object property should have a target");

    assert_eq!(target.name(), Customer::TYPE_NAME);
    assert!(Arc::ptr_eq(&target, &again));
}

#[test]
fn reregistered_target_is_resolved_afresh() {
    let db = loaded(&[Customer::TYPE_NAME, Order::TYPE_NAME]);
    let registry = db.registry();
    let order = registry
        .type_binding_by_name(Order::TYPE_NAME)
        .expect("lookup should succeed")
        .expect("Order should resolve");
    let customer = order
        .property_binding_by_name("Customer")
        .expect("Customer property should bind");

    let before = customer
        .target_type_binding(registry)
        .expect("target should resolve")
        .expect("object property should have a target");
    let generation = registry.generation();

    db.load_schema(&[Customer::TYPE_NAME])
        .expect("reloading Customer should succeed");
    let after = customer
        .target_type_binding(registry)
        .expect("target should resolve again")
        .expect("object property should have a target");
    let current = registry
        .type_binding_by_name(Customer::TYPE_NAME)
        .expect("lookup should succeed")
        .expect("Customer should resolve");

    assert!(registry.generation() > generation);
    assert!(!Arc::ptr_eq(&before, &after));
    assert!(Arc::ptr_eq(&after, &current));
}

#[test]
fn unregistered_target_is_a_schema_mismatch() {
    let db = loaded(&[Order::TYPE_NAME]);
    let order = db
        .registry()
        .type_binding_by_name(Order::TYPE_NAME)
        .expect("lookup should succeed")
        .expect("Order should resolve");

    let err = order
        .property_binding_by_name("Customer")
        .expect("Customer property should bind")
        .target_type_binding(db.registry())
        .expect_err("unloaded target should fail");
    assert!(matches!(err, Error::SchemaCodeMismatch { .. }));
}

#[test]
fn colliding_short_names_are_ambiguous() {
    let db = loaded(&[ShopCart::TYPE_NAME, WebCart::TYPE_NAME]);
    let registry = db.registry();

    assert!(
        registry
            .type_binding_by_name("Cart")
            .expect("ambiguous lookup should not fail")
            .is_none()
    );
    assert!(
        registry
            .type_binding_by_name_insensitive("cart")
            .expect("ambiguous lookup should not fail")
            .is_none()
    );

    for name in [ShopCart::TYPE_NAME, WebCart::TYPE_NAME] {
        let exact = registry
            .type_binding_by_name(name)
            .expect("lookup should succeed")
            .expect("full name should resolve");
        let lower = registry
            .type_binding_by_name(&name.to_lowercase())
            .expect("lookup should succeed")
            .expect("lower-case full name should resolve");

        assert_eq!(exact.name(), name);
        assert!(Arc::ptr_eq(&exact, &lower));
    }
}

#[test]
fn concurrent_lookups_share_one_build() {
    let db = loaded(&[Order::TYPE_NAME, Customer::TYPE_NAME]);
    let registry = db.registry();
    let table_id = registry
        .type_def_by_name(Order::TYPE_NAME)
        .and_then(|def| def.table_id())
        .expect("Order should have a table");
    let built_before = registry.metrics().snapshot().bindings_built;

    let bindings: Vec<Arc<TypeBinding>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|i| {
                scope.spawn(move || match i % 3 {
                    0 => registry.type_binding(table_id),
                    1 => registry
                        .type_binding_by_name("Order")
                        .map(|b| b.expect("Order should resolve")),
                    _ => registry
                        .type_binding_by_name_insensitive("ORDER")
                        .map(|b| b.expect("ORDER should resolve")),
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .expect("lookup thread should not panic")
                    .expect("lookup should succeed")
            })
            .collect()
    });

    assert!(bindings.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(registry.metrics().snapshot().bindings_built, built_before + 1);
}

#[test]
fn derived_bindings_know_their_base_tables() {
    let db = loaded(&[Bird::TYPE_NAME]);
    let registry = db.registry();

    let animal = registry
        .type_binding_by_name(Animal::TYPE_NAME)
        .expect("lookup should succeed")
        .expect("base should be loaded with its derived type");
    let bird = registry
        .type_binding_by_name("Bird")
        .expect("lookup should succeed")
        .expect("unique short name should resolve");

    assert!(bird.is_type_or_subtype(animal.table_id()));
    assert!(bird.is_type_or_subtype(bird.table_id()));
    assert!(!animal.is_type_or_subtype(bird.table_id()));
    assert_eq!(
        bird.property_binding_by_name("Legs").and_then(|p| p.data_index()),
        animal.property_binding_by_name("Legs").and_then(|p| p.data_index())
    );
}

#[test]
fn delete_hooks_run_only_where_declared() {
    let db = loaded(&[Bird::TYPE_NAME]);
    let registry = db.registry();
    let animal = registry
        .type_binding_by_name(Animal::TYPE_NAME)
        .expect("lookup should succeed")
        .expect("Animal should resolve");
    let bird = registry
        .type_binding_by_name(Bird::TYPE_NAME)
        .expect("lookup should succeed")
        .expect("Bird should resolve");

    assert!(animal.has_on_delete());
    assert!(!bird.has_on_delete());

    DELETED.with(|deleted| deleted.set(0));
    animal
        .invoke_on_delete(&Animal { legs: 4 })
        .expect("hook should run");
    bird.invoke_on_delete(&Bird::default())
        .expect("absent hook should be a no-op");
    assert_eq!(DELETED.with(std::cell::Cell::get), 4);

    let err = animal
        .invoke_on_delete(&Bird::default())
        .expect_err("foreign instance should be rejected");
    assert!(matches!(err, Error::InstanceTypeMismatch { .. }));
}

#[test]
fn closing_drops_the_registry() {
    let db = loaded(&[Order::TYPE_NAME, Customer::TYPE_NAME]);
    let order = db
        .registry()
        .type_binding_by_name(Order::TYPE_NAME)
        .expect("lookup should succeed")
        .expect("Order should resolve");
    let customer = order
        .property_binding_by_name("Customer")
        .expect("Customer property should bind");
    customer
        .target_type_binding(db.registry())
        .expect("target should resolve");

    db.close();

    assert_eq!(Arc::strong_count(&order), 1);
}

#[test]
fn concurrent_schema_loads_keep_every_registration() {
    let groups: [&[&str]; 4] = [
        &[Customer::TYPE_NAME, Order::TYPE_NAME],
        &[ShopCart::TYPE_NAME],
        &[WebCart::TYPE_NAME, Item::TYPE_NAME],
        &[Bird::TYPE_NAME],
    ];

    for _ in 0..20 {
        let db = common::open(Arc::new(MemoryBackend::new()), common::catalog());

        thread::scope(|scope| {
            for names in groups {
                let db = &db;
                scope.spawn(move || {
                    db.load_schema(names).expect("concurrent load should succeed");
                });
            }
        });

        for name in groups.iter().flat_map(|names| names.iter()).chain([&Animal::TYPE_NAME]) {
            assert!(
                db.registry().type_def_by_name(name).is_some(),
                "{name} should stay registered"
            );
        }
    }
}
