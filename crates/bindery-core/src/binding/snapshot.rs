use arc_swap::ArcSwap;
use std::sync::Arc;

///
/// Published
///
/// Copy-and-replace cell. Readers take the current `Arc` without locking;
/// writers build a complete replacement and swap it in, so a reader never
/// sees a partially updated value.
///

pub(crate) struct Published<T> {
    current: ArcSwap<T>,
}

impl<T> Published<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            current: ArcSwap::from_pointee(value),
        }
    }

    pub(crate) fn load(&self) -> Arc<T> {
        self.current.load_full()
    }

    pub(crate) fn publish(&self, next: T) {
        self.current.store(Arc::new(next));
    }
}

///
/// TESTS
///
