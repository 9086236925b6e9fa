use derive_more::Display;

///
/// ObjectRef
///
/// Identity/address pair of one stored row. The object id is stable for the
/// row's lifetime; the address is the backend's current location hint.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("#{object_id}@{address:#x}")]
pub struct ObjectRef {
    pub object_id: u64,
    pub address: u64,
}

impl ObjectRef {
    #[must_use]
    pub const fn new(object_id: u64, address: u64) -> Self {
        Self { object_id, address }
    }
}
