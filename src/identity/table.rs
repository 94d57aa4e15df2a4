//! Startup table of breaker configurations.

use std::sync::Arc;

use crate::breaker::{BreakerConfig, BreakerRegistry};
use crate::config::GuardConfig;
use crate::identity::{Identity, ListenerKind};
use crate::notify::{CircuitListener, DefaultListener, MultiplexedListener, NotificationSinks};

/// One `(identity, configuration)` row per guarded subsystem.
#[derive(Debug, Clone)]
pub struct IdentityTable {
    entries: Vec<(Identity, BreakerConfig)>,
}

impl IdentityTable {
    /// Build the table from built-in profiles and configured overrides.
    ///
    /// Override keys are expected to be validated already; unknown ones are skipped.
    pub fn build(config: &GuardConfig, sinks: &NotificationSinks) -> Self {
        let entries = Identity::ALL
            .iter()
            .map(|&identity| (identity, Self::breaker_config(identity, config, sinks)))
            .collect();
        Self { entries }
    }

    fn breaker_config(identity: Identity, config: &GuardConfig, sinks: &NotificationSinks) -> BreakerConfig {
        let profile = identity.profile();
        let tuning = config.breakers.get(identity.name()).cloned().unwrap_or_default();

        let base = DefaultListener::new(identity.topic(), identity.display_name(), sinks.clone());
        let listener: Arc<dyn CircuitListener> = match profile.listener {
            ListenerKind::Default => Arc::new(base),
            ListenerKind::PersistAcquired => Arc::new(base.persist_acquired(true)),
            ListenerKind::Multiplexed => Arc::new(MultiplexedListener::new(base)),
        };

        BreakerConfig::new(identity.name(), listener)
            .failure_threshold(tuning.failure_threshold.unwrap_or(profile.failure_threshold))
            .retry_interval_ms(tuning.retry_interval_ms.unwrap_or(profile.retry_interval_ms))
            .non_tripping(profile.non_tripping.iter().copied())
            .damaging(profile.damaging.iter().copied())
    }

    pub fn get(&self, identity: Identity) -> Option<&BreakerConfig> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == identity)
            .map(|(_, config)| config)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Identity, BreakerConfig)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register every identity with the registry.
    pub fn register(&self, registry: &BreakerRegistry) {
        registry.register_all(self.entries.iter().map(|(_, config)| config.clone()));
        tracing::info!(identities = self.entries.len(), "Identity table registered");
    }
}
