//! Shared aggregate handles.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A shared, mutable handle to a caller-owned aggregate.
///
/// Event records hold clones of the handle so that applying an event mutates
/// the very aggregate the command ran against. Two handles are the same
/// aggregate when they point at the same allocation; the aggregate's value
/// plays no part in identity.
pub struct AggregateRef<A> {
    inner: Arc<RwLock<A>>,
}

/// Identity of an [`AggregateRef`], usable as a hash key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AggregateIdentity(usize);

impl<A> AggregateRef<A> {
    /// Wraps an aggregate in a new handle with a fresh identity.
    pub fn new(aggregate: A) -> Self {
        Self {
            inner: Arc::new(RwLock::new(aggregate)),
        }
    }

    /// Returns the identity of the aggregate behind this handle.
    pub fn identity(&self) -> AggregateIdentity {
        AggregateIdentity(Arc::as_ptr(&self.inner) as *const () as usize)
    }

    /// Returns true if both handles refer to the same aggregate.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.inner, &other.inner)
    }

    /// Locks the aggregate for reading.
    ///
    /// A poisoned lock is recovered: a panicking event leaves the aggregate
    /// as it was at the time of the panic.
    pub fn read(&self) -> RwLockReadGuard<'_, A> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the aggregate for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, A> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with mutable access to the aggregate.
    pub fn update<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        f(&mut self.write())
    }

    /// Returns a clone of the current aggregate state.
    pub fn snapshot(&self) -> A
    where
        A: Clone,
    {
        self.read().clone()
    }
}

impl<A> Clone for AggregateRef<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> fmt::Debug for AggregateRef<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AggregateRef")
            .field(&Arc::as_ptr(&self.inner))
            .finish()
    }
}

impl<A> From<A> for AggregateRef<A> {
    fn from(aggregate: A) -> Self {
        Self::new(aggregate)
    }
}
