//! An in-memory state backend.

use crate::state::{StateAccess, StateScanIter};
use querynet_types::error::StateError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A `BTreeMap`-backed [`StateAccess`] implementation.
///
/// Used as the host store in tests and by embedders that keep contract state
/// in memory. The ordered map makes `prefix_scan` deterministic, which the
/// finalizer requires.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl StateAccess for MemoryState {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.data.get(key).cloned())
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.data.remove(key);
        Ok(())
    }

    fn batch_apply(
        &mut self,
        inserts: &[(Vec<u8>, Vec<u8>)],
        deletes: &[Vec<u8>],
    ) -> Result<(), StateError> {
        for key in deletes {
            self.delete(key)?;
        }
        for (key, value) in inserts {
            self.insert(key, value)?;
        }
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
        let prefix = prefix.to_vec();
        let iter = self
            .data
            .range(prefix.clone()..)
            .take_while(move |(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| Ok((Arc::from(k.as_slice()), Arc::from(v.as_slice()))));
        Ok(Box::new(iter))
    }
}
