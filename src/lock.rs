//! In-process keyed locks on `bucket/key`, one holder at a time
//!
//! `acquire` never waits: a held key is reported to the caller, which renames or skips.

use std::{
    collections::HashSet,
    sync::{LazyLock, Mutex, MutexGuard, PoisonError},
};

static GLOBAL: LazyLock<LockRegistry> = LazyLock::new(LockRegistry::new);

#[derive(Debug, Default)]
pub struct LockRegistry {
    held: Mutex<HashSet<String>>,
}

impl LockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every upload and link of the process
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    fn held(&self) -> MutexGuard<'_, HashSet<String>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `bucket/key` as held, `false` if someone else holds it
    pub fn acquire(&self, bucket: &str, key: &str) -> bool {
        let acquired = self.held().insert(lock_key(bucket, key));
        log::debug!("acquire {bucket}/{key}: {acquired}");
        acquired
    }

    pub fn release(&self, bucket: &str, key: &str) {
        if self.held().remove(&lock_key(bucket, key)) {
            log::debug!("release {bucket}/{key}");
        }
    }

    #[must_use]
    pub fn is_held(&self, bucket: &str, key: &str) -> bool {
        self.held().contains(&lock_key(bucket, key))
    }

    /// Number of keys currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.held().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held().is_empty()
    }

    /// Acquire and hand back a guard that releases the key when dropped
    #[must_use]
    pub fn try_lock(&self, bucket: &str, key: &str) -> Option<KeyGuard<'_>> {
        self.acquire(bucket, key).then(|| KeyGuard {
            registry: self,
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

fn lock_key(bucket: &str, key: &str) -> String {
    format!("{bucket}/{key}")
}

/// Holds `bucket/key` until dropped, dropping an upload future releases it too
#[derive(Debug)]
pub struct KeyGuard<'a> {
    registry: &'a LockRegistry,
    bucket: String,
    key: String,
}

impl KeyGuard<'_> {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.bucket, &self.key);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn test_acquire_release() {
        let registry = LockRegistry::new();
        assert!(registry.acquire("media", "a.png"));
        assert!(!registry.acquire("media", "a.png"));
        // same key in another bucket is a different lock
        assert!(registry.acquire("other", "a.png"));
        registry.release("media", "a.png");
        assert!(registry.acquire("media", "a.png"));
    }

    #[test]
    fn test_release_unheld_is_noop() {
        let registry = LockRegistry::new();
        registry.release("media", "a.png");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let registry = LockRegistry::new();
        {
            let guard = registry.try_lock("media", "a.png").unwrap();
            assert_eq!(guard.key(), "a.png");
            assert!(registry.try_lock("media", "a.png").is_none());
        }
        assert!(!registry.is_held("media", "a.png"));
    }

    #[test]
    fn test_concurrent_acquire_single_winner() {
        for _ in 0..50 {
            let registry = Arc::new(LockRegistry::new());
            let barrier = Arc::new(Barrier::new(8));
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let registry = Arc::clone(&registry);
                    let barrier = Arc::clone(&barrier);
                    std::thread::spawn(move || {
                        barrier.wait();
                        registry.acquire("media", "same.png")
                    })
                })
                .collect();
            let winners = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|won| *won)
                .count();
            assert_eq!(winners, 1);
        }
    }
}
