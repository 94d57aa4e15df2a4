//! Breaker registry.
//!
//! # Responsibilities
//! - Hand out exactly one breaker per identity name for the process lifetime
//! - Own the clock all registered breakers read
//! - Register the startup identity table in one step
//!
//! # Design Decisions
//! - Constructed once at startup and passed to every component that needs it;
//!   there is no global accessor
//! - First registration wins: later calls for a known name ignore the
//!   configuration they pass

use std::sync::Arc;

use dashmap::DashMap;

use crate::breaker::circuit::{BreakerConfig, BreakerSnapshot, CircuitBreaker};
use crate::breaker::clock::{Clock, SystemClock};

/// Thread-safe get-or-create map of identity name to breaker.
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    clock: Arc<dyn Clock>,
}

impl BreakerRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            breakers: DashMap::new(),
            clock,
        }
    }

    /// Registry reading the system clock.
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock::new()))
    }

    /// Return the breaker for `config.name`, creating it on first use.
    pub fn get_or_create(&self, config: BreakerConfig) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(&config.name) {
            return existing.clone();
        }
        self.get_or_create_with(&config.name.clone(), move || config)
    }

    /// Like [`BreakerRegistry::get_or_create`], building the configuration only if needed.
    pub fn get_or_create_with<F>(&self, name: &str, make_config: F) -> Arc<CircuitBreaker>
    where
        F: FnOnce() -> BreakerConfig,
    {
        if let Some(existing) = self.breakers.get(name) {
            return existing.clone();
        }

        // The entry holds the shard's write lock, so concurrent first callers
        // serialize here and only one constructs.
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                let mut config = make_config();
                if config.name != name {
                    tracing::warn!(
                        requested = %name,
                        configured = %config.name,
                        "Breaker configuration name differs from registry key; using key"
                    );
                    config.name = name.to_string();
                }
                tracing::info!(name = %name, "Circuit breaker registered");
                Arc::new(CircuitBreaker::new(config, self.clock.clone()))
            })
            .clone()
    }

    /// Register a whole identity table.
    pub fn register_all(&self, configs: impl IntoIterator<Item = BreakerConfig>) {
        for config in configs {
            self.get_or_create(config);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Snapshots of every registered breaker, sorted by name.
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let breakers: Vec<Arc<CircuitBreaker>> =
            self.breakers.iter().map(|r| r.value().clone()).collect();
        let mut snapshots: Vec<BreakerSnapshot> = breakers.iter().map(|b| b.snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }
}

impl std::fmt::Debug for BreakerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakerRegistry")
            .field("breakers", &self.breakers.len())
            .finish()
    }
}
