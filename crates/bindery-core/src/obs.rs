//! Registry and backend counters. Cheap relaxed atomics; read through
//! snapshots for assertions and diagnostics.

use std::sync::atomic::{AtomicU64, Ordering};

///
/// RegistryMetrics
///

#[derive(Debug, Default)]
pub struct RegistryMetrics {
    registrations: AtomicU64,
    type_defs_registered: AtomicU64,
    bindings_built: AtomicU64,
    build_lock_waits_resolved: AtomicU64,
}

impl RegistryMetrics {
    pub(crate) fn record_registration(&self, type_defs: usize) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
        self.type_defs_registered
            .fetch_add(type_defs as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_build(&self) {
        self.bindings_built.fetch_add(1, Ordering::Relaxed);
    }

    /// A caller waited on the build lock and found the binding published.
    pub(crate) fn record_lock_wait_resolved(&self) {
        self.build_lock_waits_resolved
            .fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> RegistryMetricsSnapshot {
        RegistryMetricsSnapshot {
            registrations: self.registrations.load(Ordering::Relaxed),
            type_defs_registered: self.type_defs_registered.load(Ordering::Relaxed),
            bindings_built: self.bindings_built.load(Ordering::Relaxed),
            build_lock_waits_resolved: self.build_lock_waits_resolved.load(Ordering::Relaxed),
        }
    }
}

///
/// RegistryMetricsSnapshot
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RegistryMetricsSnapshot {
    pub registrations: u64,
    pub type_defs_registered: u64,
    pub bindings_built: u64,
    pub build_lock_waits_resolved: u64,
}

///
/// BackendStats
///
/// Call counters kept by the in-memory backend.
///

#[derive(Debug, Default)]
pub struct BackendStats {
    tables_created: AtomicU64,
    alterations: AtomicU64,
    inserts: AtomicU64,
    writes: AtomicU64,
}

impl BackendStats {
    pub(crate) fn record_create(&self) {
        self.tables_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_alteration(&self) {
        self.alterations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> BackendStatsSnapshot {
        BackendStatsSnapshot {
            tables_created: self.tables_created.load(Ordering::Relaxed),
            alterations: self.alterations.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}

///
/// BackendStatsSnapshot
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BackendStatsSnapshot {
    pub tables_created: u64,
    pub alterations: u64,
    pub inserts: u64,
    pub writes: u64,
}
