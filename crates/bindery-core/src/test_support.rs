//! Entities and helpers shared by the unit tests.

use crate::{
    binding::{EntityLoader, PropertyAccessor, specialize},
    schema::{TableDef, TableId, TypeDef, TypeLoader},
    traits::{DbEnum, Entity},
    types::{Binary, DateTime, Decimal, ObjectRef},
};
use bindery_derive::Entity;
use chrono::NaiveDate;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Level {
    Novice = 1,
    #[default]
    Advanced = 2,
    Expert = 3,
}

impl DbEnum for Level {
    type Repr = i32;

    fn to_repr(self) -> i32 {
        self as i32
    }
}

///
/// Sample
///
/// One field per accessor family worth exercising.
///

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Test.Sample")]
pub struct Sample {
    pub small: i16,
    pub tiny: u8,
    pub ratio: f32,
    pub label: Option<String>,
    pub flag: bool,
    pub amount: Decimal,
    pub stamp: DateTime,
    pub blob: Binary,

    #[entity(references = "Test.Sample")]
    pub owner: Option<ObjectRef>,

    #[entity(enum_repr)]
    pub level: Level,
}

#[derive(Clone, Debug, Entity)]
#[entity(name = "Test.Shape", is_abstract)]
pub struct Shape {
    pub sides: i32,
    pub label: Option<String>,
}

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Test.Gadget", base = "Test.Shape")]
pub struct Gadget {
    pub sides: i32,
    pub label: Option<String>,
    pub price: i64,
}

///
/// VehicleKind
///
/// User-declared runtime type for vehicles.
///

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Test.VehicleKind")]
pub struct VehicleKind {
    #[entity(type_name)]
    pub title: String,

    pub is_type: bool,

    #[entity(references = "Test.VehicleKind", base_type_reference)]
    pub parent: Option<ObjectRef>,
}

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Test.Vehicle")]
pub struct Vehicle {
    #[entity(references = "Test.VehicleKind", type_reference)]
    pub kind: Option<ObjectRef>,

    pub wheels: u8,
}

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Test.Car", base = "Test.Vehicle")]
pub struct Car {
    #[entity(references = "Test.VehicleKind", type_reference)]
    pub kind: Option<ObjectRef>,

    pub wheels: u8,
    pub doors: u8,
}

/// A later version of `Test.Sample` that declares its own runtime type.
#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Test.Sample")]
pub struct RetypedSample {
    #[entity(references = "Test.VehicleKind", type_reference)]
    pub kind: Option<ObjectRef>,
}

/// Runtime type that only `KindedSample` declares.
#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Test.SampleKind")]
pub struct SampleKind {
    #[entity(type_name)]
    pub title: String,

    pub is_type: bool,
}

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Test.Sample")]
pub struct KindedSample {
    #[entity(references = "Test.SampleKind", type_reference)]
    pub kind: Option<ObjectRef>,
}

pub fn sample() -> Sample {
    Sample {
        small: -12,
        tiny: 7,
        ratio: 0.5,
        label: Some("widget".to_string()),
        flag: true,
        amount: Decimal::new(1999, 2),
        stamp: NaiveDate::from_ymd_opt(2024, 5, 17)
            .and_then(|date| date.and_hms_opt(8, 30, 0))
            .expect("fixed timestamp should be valid"),
        blob: Binary::new(vec![0xca, 0xfe]),
        owner: None,
        level: Level::Advanced,
    }
}

/// Specialized accessor for one `Sample` field.
pub fn accessor_for(field: &str) -> Box<dyn PropertyAccessor> {
    let accessor = Sample::fields()
        .into_iter()
        .find(|f| f.meta.name == field)
        .unwrap_or_else(|| panic!("Sample has no field {field}"));

    specialize(accessor.getter)
}

fn with_table_id(declared: &TypeDef, table_id: TableId) -> Arc<TypeDef> {
    let mut table = declared.table_def().clone();
    table.table_id = Some(table_id);

    Arc::new(declared.rebind(table).expect("declared type should rebind"))
}

/// Declared definition of `E` as if its table had been created as `table_id`.
pub fn declared_with_id<E: Entity>(table_id: TableId) -> Arc<TypeDef> {
    let declared =
        TypeDef::declare(&EntityLoader::<E>::new(), None).expect("entity should declare");

    with_table_id(&declared, table_id)
}

pub fn declared_derived_with_id<E: Entity>(base: &TypeDef, table_id: TableId) -> Arc<TypeDef> {
    let declared = TypeDef::declare(&EntityLoader::<E>::new(), Some(base))
        .expect("derived entity should declare");

    with_table_id(&declared, table_id)
}

/// Property-less definition, enough for name-index tests.
pub fn typed_stub(name: &str, table_id: TableId) -> Arc<TypeDef> {
    let mut table = TableDef::new(name, None, Vec::new());
    table.table_id = Some(table_id);

    Arc::new(
        TypeDef::new(name, None, Vec::new(), table, TypeLoader::new(name))
            .expect("stub type should build"),
    )
}
