//! Per-source write scopes.
//!
//! Each source gets a single-permit semaphore. A course merge holds the
//! permit for the whole compare-and-write, so batches for one source are
//! totally ordered while batches for different sources never wait on each
//! other. Acquisition is bounded by a timeout. Scopes nobody holds or waits
//! on are pruned on the next lookup, so the map tracks active sources only.

use std::{collections::HashMap, sync::Arc, time::Duration};

use syllabus_core::source::SourceId;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use crate::{Error, Result};

pub struct SourceLocks {
  timeout: Duration,
  scopes:  Mutex<HashMap<SourceId, Arc<Semaphore>>>,
}

impl SourceLocks {
  pub fn new(timeout: Duration) -> Self {
    Self { timeout, scopes: Mutex::new(HashMap::new()) }
  }

  async fn scope(&self, id: &SourceId) -> Arc<Semaphore> {
    let mut scopes = self.scopes.lock().await;
    // Clones are only taken under this lock, so a count of one means idle.
    scopes.retain(|_, scope| Arc::strong_count(scope) > 1);
    scopes
      .entry(id.clone())
      .or_insert_with(|| Arc::new(Semaphore::new(1)))
      .clone()
  }

  #[cfg(test)]
  async fn len(&self) -> usize { self.scopes.lock().await.len() }

  /// Hold the write scope of `id` until the returned permit is dropped.
  pub async fn acquire(&self, id: &SourceId) -> Result<OwnedSemaphorePermit> {
    let scope = self.scope(id).await;
    match tokio::time::timeout(self.timeout, scope.acquire_owned()).await {
      Ok(Ok(permit)) => Ok(permit),
      // The semaphore is never closed; treat it like a timeout all the same.
      Ok(Err(_)) | Err(_) => {
        tracing::warn!(source_id = %id, waited = ?self.timeout, "write scope contention");
        Err(Error::Contention { source_id: id.clone(), waited: self.timeout })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn same_source_waits_then_times_out() {
    let locks = SourceLocks::new(Duration::from_millis(50));
    let id = SourceId::from("a");

    let held = locks.acquire(&id).await.unwrap();
    let err = locks.acquire(&id).await.unwrap_err();
    assert!(matches!(err, Error::Contention { .. }));

    drop(held);
    assert!(locks.acquire(&id).await.is_ok());
  }

  #[tokio::test]
  async fn different_sources_do_not_contend() {
    let locks = SourceLocks::new(Duration::from_millis(50));
    let _a = locks.acquire(&SourceId::from("a")).await.unwrap();
    let _b = locks.acquire(&SourceId::from("b")).await.unwrap();
  }

  #[tokio::test]
  async fn idle_scopes_are_pruned() {
    let locks = SourceLocks::new(Duration::from_millis(50));

    drop(locks.acquire(&SourceId::from("a")).await.unwrap());
    let held_b = locks.acquire(&SourceId::from("b")).await.unwrap();
    assert_eq!(locks.len().await, 1);

    let _c = locks.acquire(&SourceId::from("c")).await.unwrap();
    assert_eq!(locks.len().await, 2);

    drop(held_b);
    let _d = locks.acquire(&SourceId::from("d")).await.unwrap();
    assert_eq!(locks.len().await, 2);
  }
}
