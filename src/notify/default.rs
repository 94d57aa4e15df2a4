//! Default notification policy and its per-identity variants.
//!
//! # Policy
//! ```text
//! closed / opened / damaging / damaged   → audit entry + broadcast
//! acquired while damaged                 → broadcast (audit only if persist_acquired)
//! tripping                               → audit entry while still closed, broadcast always
//! non-tripping                           → broadcast
//! ```
//!
//! The tripping rule keeps a sustained outage from writing one audit row per
//! failed call while the live broadcast still shows every failure.

use std::sync::Arc;

use crate::breaker::classify::FailureInfo;
use crate::notify::listener::{CircuitListener, CircuitView};
use crate::notify::sinks::{AuditSink, BroadcastSink, Localizer, Severity, Topic};
use crate::observability::metrics;

/// Shared collaborators every listener renders and writes through.
#[derive(Clone)]
pub struct NotificationSinks {
    pub audit: Arc<dyn AuditSink>,
    pub broadcast: Arc<dyn BroadcastSink>,
    pub localizer: Arc<dyn Localizer>,
    pub locale: String,
}

impl NotificationSinks {
    pub fn new(
        audit: Arc<dyn AuditSink>,
        broadcast: Arc<dyn BroadcastSink>,
        localizer: Arc<dyn Localizer>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            audit,
            broadcast,
            localizer,
            locale: locale.into(),
        }
    }
}

/// The standard listener: persistent audit plus live broadcast.
#[derive(Clone)]
pub struct DefaultListener {
    topic: Topic,
    display_name: String,
    sinks: NotificationSinks,
    persist_acquired: bool,
}

impl DefaultListener {
    pub fn new(topic: Topic, display_name: impl Into<String>, sinks: NotificationSinks) -> Self {
        Self {
            topic,
            display_name: display_name.into(),
            sinks,
            persist_acquired: false,
        }
    }

    /// Also write an audit entry for every acquisition while damaged.
    pub fn persist_acquired(mut self, persist: bool) -> Self {
        self.persist_acquired = persist;
        self
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    fn text(&self, key: &str, extra: &[&str]) -> String {
        let mut args = Vec::with_capacity(extra.len() + 1);
        args.push(self.display_name.as_str());
        args.extend_from_slice(extra);
        self.sinks.localizer.localize(key, &self.sinks.locale, &args)
    }

    fn publish(&self, severity: Severity, text: &str) {
        metrics::record_notification(self.topic.as_str(), severity.as_str());
        self.sinks.broadcast.publish(self.topic, severity, text);
    }

    fn persist(&self, severity: Severity, text: &str) {
        self.sinks.audit.append(severity, text);
    }

    fn persist_and_publish(&self, severity: Severity, text: &str) {
        self.persist(severity, text);
        self.publish(severity, text);
    }
}

impl CircuitListener for DefaultListener {
    fn on_circuit_closed(&self, _breaker: &CircuitView<'_>) {
        let text = self.text("circuit-closed", &[]);
        self.persist_and_publish(Severity::Info, &text);
    }

    fn on_circuit_opened(&self, _breaker: &CircuitView<'_>) {
        let text = self.text("circuit-opened", &[]);
        self.persist_and_publish(Severity::Warning, &text);
    }

    fn on_circuit_damaged(&self, _breaker: &CircuitView<'_>, cause: &FailureInfo) {
        let text = self.text("circuit-damaged", &[cause.message.as_str()]);
        self.persist_and_publish(Severity::Error, &text);
    }

    fn on_circuit_acquired(&self, breaker: &CircuitView<'_>) {
        if !breaker.is_circuit_damaged() {
            return;
        }
        let text = self.text("circuit-acquired-damaged", &[]);
        if self.persist_acquired {
            self.persist(Severity::Error, &text);
        }
        self.publish(Severity::Error, &text);
    }

    fn on_tripping_exception(&self, breaker: &CircuitView<'_>, failure: &FailureInfo) {
        let count = breaker.consecutive_failures().to_string();
        let text = self.text("circuit-tripping", &[count.as_str(), failure.message.as_str()]);
        if breaker.is_circuit_closed() {
            self.persist(Severity::Warning, &text);
        }
        self.publish(Severity::Warning, &text);
    }

    fn on_non_tripping_exception(&self, _breaker: &CircuitView<'_>, failure: &FailureInfo) {
        let text = self.text("circuit-non-tripping", &[failure.message.as_str()]);
        self.publish(Severity::Warning, &text);
    }

    fn on_damaging_exception(&self, _breaker: &CircuitView<'_>, failure: &FailureInfo) {
        let text = self.text("circuit-damaging", &[failure.message.as_str()]);
        self.persist_and_publish(Severity::Error, &text);
    }
}

/// Listener for identities that multiplex many destinations.
///
/// Open and close of the shared identity say nothing about any single
/// destination, so both are dropped; everything else follows the default.
#[derive(Clone)]
pub struct MultiplexedListener {
    inner: DefaultListener,
}

impl MultiplexedListener {
    pub fn new(inner: DefaultListener) -> Self {
        Self { inner }
    }
}

impl CircuitListener for MultiplexedListener {
    fn on_circuit_closed(&self, _breaker: &CircuitView<'_>) {}

    fn on_circuit_opened(&self, _breaker: &CircuitView<'_>) {}

    fn on_circuit_damaged(&self, breaker: &CircuitView<'_>, cause: &FailureInfo) {
        self.inner.on_circuit_damaged(breaker, cause);
    }

    fn on_circuit_acquired(&self, breaker: &CircuitView<'_>) {
        self.inner.on_circuit_acquired(breaker);
    }

    fn on_tripping_exception(&self, breaker: &CircuitView<'_>, failure: &FailureInfo) {
        self.inner.on_tripping_exception(breaker, failure);
    }

    fn on_non_tripping_exception(&self, breaker: &CircuitView<'_>, failure: &FailureInfo) {
        self.inner.on_non_tripping_exception(breaker, failure);
    }

    fn on_damaging_exception(&self, breaker: &CircuitView<'_>, failure: &FailureInfo) {
        self.inner.on_damaging_exception(breaker, failure);
    }
}
