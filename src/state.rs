use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::Config;
use crate::middleware::rate_limit::RateLimitState;
use crate::services::generator::QuestionGenerator;
use crate::store::Store;

/// Per-key async mutexes, created on demand. Submitting an answer locks the
/// attempt id so concurrent submissions serialize; the reward path locks the
/// student id so game-state read-modify-writes never interleave.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Drop entries nobody holds; called opportunistically to keep the map
    /// from growing with every attempt ever started.
    pub fn sweep(&self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    generator: Arc<QuestionGenerator>,
    rate_limit: Arc<RateLimitState>,
    attempt_locks: Arc<KeyedLocks>,
    reward_locks: Arc<KeyedLocks>,
    config: Arc<Config>,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<Store>,
        generator: Arc<QuestionGenerator>,
        config: &Config,
    ) -> Self {
        let rate_limit = Arc::new(RateLimitState::new(
            config.rate_limit.window_secs,
            config.rate_limit.max_requests,
        ));

        Self {
            store,
            generator,
            rate_limit,
            attempt_locks: Arc::new(KeyedLocks::new()),
            reward_locks: Arc::new(KeyedLocks::new()),
            config: Arc::new(config.clone()),
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn generator(&self) -> &QuestionGenerator {
        &self.generator
    }

    pub fn rate_limit(&self) -> &Arc<RateLimitState> {
        &self.rate_limit
    }

    pub fn attempt_locks(&self) -> &KeyedLocks {
        &self.attempt_locks
    }

    pub fn reward_locks(&self) -> &KeyedLocks {
        &self.reward_locks
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_key_yields_same_lock() {
        let locks = KeyedLocks::new();
        let a = locks.acquire("attempt-1");
        let b = locks.acquire("attempt-1");
        assert!(Arc::ptr_eq(&a, &b));

        let other = locks.acquire("attempt-2");
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[tokio::test]
    async fn sweep_keeps_held_locks() {
        let locks = KeyedLocks::new();
        let held = locks.acquire("held");
        let _guard = held.lock().await;
        locks.acquire("idle");

        locks.sweep();
        assert!(Arc::ptr_eq(&held, &locks.acquire("held")));
    }

    #[tokio::test]
    async fn serializes_concurrent_holders() {
        let locks = Arc::new(KeyedLocks::new());
        let counter = Arc::new(Mutex::new(0u32));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let lock = locks.acquire("shared");
                let _guard = lock.lock().await;
                let value = *counter.lock().unwrap();
                tokio::task::yield_now().await;
                *counter.lock().unwrap() = value + 1;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*counter.lock().unwrap(), 8);
    }
}
