//! Reader/writer locks keyed by record id.
//!
//! The service keeps two tables. A document's lock is held in write mode for
//! the whole read-plan-apply cycle of a mutation, and in read mode by
//! snapshots. A project's lock is held in read mode by every segment writer in
//! the project and in write mode while one of its codes is deleted, so no new
//! assignment of that code can slip in. Project locks are always taken before
//! document locks.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

#[derive(Debug, Default)]
pub(crate) struct LockTable {
  table: Mutex<HashMap<Uuid, Arc<RwLock<()>>>>,
}

impl LockTable {
  fn entry(&self, id: Uuid) -> Arc<RwLock<()>> {
    let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
    table.entry(id).or_default().clone()
  }

  pub(crate) async fn read(&self, id: Uuid) -> OwnedRwLockReadGuard<()> {
    self.entry(id).read_owned().await
  }

  pub(crate) async fn write(&self, id: Uuid) -> OwnedRwLockWriteGuard<()> {
    self.entry(id).write_owned().await
  }

  /// Drop the entry of a deleted record.
  pub(crate) fn forget(&self, id: Uuid) {
    let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
    table.remove(&id);
  }
}
