// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-resource serialization.
//!
//! Refresh and delete of the same binding must never overlap, or a slow refresh could
//! recreate a secret that delete has just removed. [`ResourceLocks`] hands out one
//! async mutex per `namespace/name` and remembers which bindings this process has
//! already seen, so the first reconciliation after a restart can be told apart from
//! later ones.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of per-resource locks and first-sighting markers.
#[derive(Default)]
pub struct ResourceLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    seen: Mutex<HashSet<String>>,
}

impl ResourceLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Released when the guard is dropped.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// `true` the first time `key` is passed in, `false` afterwards until [`forget`](Self::forget).
    pub fn first_sighting(&self, key: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string())
    }

    /// Drop all state for `key` after its resource is gone.
    pub fn forget(&self, key: &str) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Keep the mutex while another task still holds or waits on it
        if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(key);
        }
    }

    /// Drop state for every key `keep` rejects.
    ///
    /// Covers bindings removed without a cleanup pass, for example when the
    /// finalizer was stripped by hand. Mutexes still in use are left in place.
    pub fn retain(&self, keep: impl Fn(&str) -> bool) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|key| keep(key));
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|key, l| keep(key) || Arc::strong_count(l) > 1);
    }

    /// Number of tracked keys across locks and first-sighting markers.
    #[must_use]
    pub fn tracked(&self) -> usize {
        let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        seen.union(&locks.keys().cloned().collect()).count()
    }
}

/// Lock key of a namespaced resource.
#[must_use]
pub fn resource_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}
