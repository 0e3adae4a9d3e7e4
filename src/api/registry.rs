//! BatchRegistry - batch listing and deletion

use crate::error::{Result, StoreErrorKind};
use crate::storage::{BatchInfo, PositionalStore};

/// Lists and deletes stored batches; holds no state of its own
pub struct BatchRegistry<'a> {
    store: &'a PositionalStore,
}

impl<'a> BatchRegistry<'a> {
    pub fn new(store: &'a PositionalStore) -> Self {
        Self { store }
    }

    /// Registered batch ids
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.store.list_batches()?)
    }

    /// Registered batches with status and counts
    pub fn details(&self) -> Result<Vec<BatchInfo>> {
        Ok(self.store.batch_info()?)
    }

    pub fn exists(&self, batch_id: &str) -> Result<bool> {
        Ok(self.store.batch_exists(batch_id)?)
    }

    /// Delete a batch. Returns `false` when it was already absent.
    pub fn delete(&self, batch_id: &str) -> Result<bool> {
        match self.store.delete_batch(batch_id) {
            Ok(_) => Ok(true),
            Err(e) if e.kind == StoreErrorKind::NotFound => {
                log::info!("Batch '{}' already absent", batch_id);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}
