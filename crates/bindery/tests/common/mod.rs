#![allow(dead_code)]

use bindery::{
    Database, Entity,
    backend::{
        BackendError, IndexInfo, LayoutHandle, LayoutInfo, MemoryBackend, StorageBackend,
    },
    binding::TypeCatalog,
    config::Config,
    schema::{ColumnDef, TableDef, TableId},
    types::{ColumnValue, Decimal, ObjectRef},
};
use std::sync::{Arc, Mutex, PoisonError};

///
/// Entities
///

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Customer")]
pub struct Customer {
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Order")]
pub struct Order {
    pub id: u64,
    pub total: Option<Decimal>,

    #[entity(references = "Customer")]
    pub customer: Option<ObjectRef>,
}

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Shop.Cart")]
pub struct ShopCart {
    pub items: i32,
}

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Web.Cart")]
pub struct WebCart {
    pub session: Option<String>,
}

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Item")]
pub struct Item {
    pub name: Option<String>,
    pub price: i32,
}

/// Second version of `Item`: adds a nullable discount.
#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Item")]
pub struct ItemWithDiscount {
    pub name: Option<String>,
    pub price: i32,
    pub discount: Option<f32>,
}

/// `Item` with its price column dropped.
#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Item")]
pub struct ItemWithoutPrice {
    pub name: Option<String>,
}

/// `Item` with its price stored as a double.
#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Item")]
pub struct ItemWithDoublePrice {
    pub name: Option<String>,
    pub price: f64,
}

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Zoo.Animal", on_delete)]
pub struct Animal {
    pub legs: u8,
}

impl bindery::traits::OnDelete for Animal {
    fn on_delete(&self) {
        DELETED.with(|deleted| deleted.set(deleted.get() + u32::from(self.legs)));
    }
}

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Zoo.Bird", base = "Zoo.Animal")]
pub struct Bird {
    pub legs: u8,
    pub can_fly: bool,
}

/// Second version of `Zoo.Animal`: adds a nullable tail length.
#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Zoo.Animal")]
pub struct AnimalWithTail {
    pub legs: u8,
    pub tail: Option<i32>,
}

#[derive(Clone, Debug, Default, Entity)]
#[entity(name = "Zoo.Bird", base = "Zoo.Animal")]
pub struct BirdWithTail {
    pub legs: u8,
    pub tail: Option<i32>,
    pub can_fly: bool,
}

thread_local! {
    pub static DELETED: std::cell::Cell<u32> = const { std::cell::Cell::new(0) };
}

///
/// Helpers
///

pub fn catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    catalog
        .register::<Customer>()
        .register::<Order>()
        .register::<ShopCart>()
        .register::<WebCart>()
        .register::<Item>()
        .register::<Animal>()
        .register::<Bird>();

    catalog
}

pub fn open(backend: Arc<dyn StorageBackend>, catalog: TypeCatalog) -> Database {
    Database::open(backend, catalog, Config::default()).expect("database should open")
}

///
/// RecordingBackend
///
/// Memory backend that records every column-addition call.
///

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub inner: MemoryBackend,
    pub added: Mutex<Vec<(String, Vec<ColumnDef>)>>,
}

impl RecordingBackend {
    pub fn additions(&self) -> Vec<(String, Vec<ColumnDef>)> {
        self.added
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StorageBackend for RecordingBackend {
    fn create_table(
        &self,
        table: &TableDef,
        inherited: Option<&TableDef>,
    ) -> Result<TableDef, BackendError> {
        self.inner.create_table(table, inherited)
    }

    fn lookup_table(&self, name: &str) -> Result<Option<TableDef>, BackendError> {
        self.inner.lookup_table(name)
    }

    fn alter_table_add_columns(
        &self,
        table_name: &str,
        columns: &[ColumnDef],
    ) -> Result<LayoutHandle, BackendError> {
        self.added
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((table_name.to_string(), columns.to_vec()));

        self.inner.alter_table_add_columns(table_name, columns)
    }

    fn layout_info(&self, handle: LayoutHandle) -> Result<LayoutInfo, BackendError> {
        self.inner.layout_info(handle)
    }

    fn index_infos(&self, handle: LayoutHandle) -> Result<Vec<IndexInfo>, BackendError> {
        self.inner.index_infos(handle)
    }

    fn insert_row(&self, table_id: TableId) -> Result<ObjectRef, BackendError> {
        self.inner.insert_row(table_id)
    }

    fn row_table_id(&self, object: ObjectRef) -> Result<TableId, BackendError> {
        self.inner.row_table_id(object)
    }

    fn read_column(&self, object: ObjectRef, column: usize) -> Result<ColumnValue, BackendError> {
        self.inner.read_column(object, column)
    }

    fn write_column(
        &self,
        object: ObjectRef,
        column: usize,
        value: ColumnValue,
    ) -> Result<(), BackendError> {
        self.inner.write_column(object, column, value)
    }

    fn find_raw_view(&self, full_name: &str) -> Result<Option<ObjectRef>, BackendError> {
        self.inner.find_raw_view(full_name)
    }
}
