//! Core traits for contract state access.
//!
//! The contract sees its persistent state exclusively through the dyn-safe
//! [`StateAccess`] trait. Two implementations live in this crate: the
//! [`MemoryState`] backend used by tests and embedders, and the
//! copy-on-write [`StateOverlay`] that buffers a single call's writes until
//! the executor decides to commit or discard them.

use querynet_types::error::StateError;
use std::sync::Arc;

mod memory;
mod overlay;

pub use memory::MemoryState;
pub use overlay::{StateChangeSet, StateDeletes, StateInserts, StateOverlay};

/// An atomically reference-counted, owned key slice.
pub type StateKey = Arc<[u8]>;
/// An atomically reference-counted, owned value slice.
pub type StateVal = Arc<[u8]>;
/// An owned key-value pair from the state, using cheap-to-clone Arcs.
pub type StateKVPair = (StateKey, StateVal);
/// A streaming iterator over key-value pairs from the state.
pub type StateScanIter<'a> = Box<dyn Iterator<Item = Result<StateKVPair, StateError>> + Send + 'a>;

/// A dyn-safe trait providing the key-value operations the contract needs.
///
/// Implementations must yield `prefix_scan` results in ascending
/// lexicographic key order; the finalizer's replica-identical payout order
/// depends on it.
pub trait StateAccess: Send + Sync {
    /// Gets a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError>;

    /// Inserts a key-value pair.
    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError>;

    /// Deletes a key-value pair.
    fn delete(&mut self, key: &[u8]) -> Result<(), StateError>;

    /// Atomically applies a batch of inserts/updates and deletes.
    /// This is the primary method for committing transactional changes.
    fn batch_apply(
        &mut self,
        inserts: &[(Vec<u8>, Vec<u8>)],
        deletes: &[Vec<u8>],
    ) -> Result<(), StateError>;

    /// Scans for all key-value pairs starting with the given prefix, in
    /// ascending key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError>;
}

// Blanket implementation to allow `StateAccess` behind a `Box` trait object.
impl<T: StateAccess + ?Sized> StateAccess for Box<T> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        (**self).get(key)
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        (**self).insert(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        (**self).delete(key)
    }

    fn batch_apply(
        &mut self,
        inserts: &[(Vec<u8>, Vec<u8>)],
        deletes: &[Vec<u8>],
    ) -> Result<(), StateError> {
        (**self).batch_apply(inserts, deletes)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
        (**self).prefix_scan(prefix)
    }
}
