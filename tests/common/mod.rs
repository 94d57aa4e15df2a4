//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use spoolguard::breaker::{BreakerConfig, BreakerRegistry, CircuitBreaker, ManualClock};
use spoolguard::notify::{
    BroadcastSink, CircuitListener, CircuitView, MemoryAudit, NotificationSinks, Severity,
    StaticCatalog, Topic,
};
use spoolguard::{CircuitStatus, ErrorKind, FailureInfo};

/// One recorded listener callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub callback: &'static str,
    pub status: CircuitStatus,
    pub consecutive_failures: u32,
}

/// Listener that records every callback in order.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, callback: &'static str, breaker: &CircuitView<'_>) {
        self.events.lock().push(Event {
            callback,
            status: breaker.status(),
            consecutive_failures: breaker.consecutive_failures(),
        });
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn count(&self, callback: &str) -> usize {
        self.events.lock().iter().filter(|e| e.callback == callback).count()
    }

    pub fn counts(&self) -> HashMap<&'static str, usize> {
        let mut counts = HashMap::new();
        for event in self.events.lock().iter() {
            *counts.entry(event.callback).or_insert(0) += 1;
        }
        counts
    }
}

impl CircuitListener for RecordingListener {
    fn on_circuit_closed(&self, breaker: &CircuitView<'_>) {
        self.record("closed", breaker);
    }

    fn on_circuit_opened(&self, breaker: &CircuitView<'_>) {
        self.record("opened", breaker);
    }

    fn on_circuit_damaged(&self, breaker: &CircuitView<'_>, _cause: &FailureInfo) {
        self.record("damaged", breaker);
    }

    fn on_circuit_acquired(&self, breaker: &CircuitView<'_>) {
        self.record("acquired", breaker);
    }

    fn on_tripping_exception(&self, breaker: &CircuitView<'_>, _failure: &FailureInfo) {
        self.record("tripping", breaker);
    }

    fn on_non_tripping_exception(&self, breaker: &CircuitView<'_>, _failure: &FailureInfo) {
        self.record("non_tripping", breaker);
    }

    fn on_damaging_exception(&self, breaker: &CircuitView<'_>, _failure: &FailureInfo) {
        self.record("damaging", breaker);
    }
}

/// Broadcast sink that keeps every published message.
#[derive(Default)]
pub struct RecordingBroadcast {
    messages: Mutex<Vec<(Topic, Severity, String)>>,
}

impl RecordingBroadcast {
    pub fn messages(&self) -> Vec<(Topic, Severity, String)> {
        self.messages.lock().clone()
    }
}

impl BroadcastSink for RecordingBroadcast {
    fn publish(&self, topic: Topic, severity: Severity, text: &str) {
        self.messages.lock().push((topic, severity, text.to_string()));
    }
}

/// Sinks backed by in-memory recorders.
pub fn recording_sinks() -> (NotificationSinks, Arc<MemoryAudit>, Arc<RecordingBroadcast>) {
    let audit = Arc::new(MemoryAudit::new());
    let broadcast = Arc::new(RecordingBroadcast::default());
    let sinks = NotificationSinks::new(audit.clone(), broadcast.clone(), Arc::new(StaticCatalog), "en");
    (sinks, audit, broadcast)
}

/// A breaker on a manual clock with a recording listener.
///
/// Kind sets follow the local spooler: `RemoteFault` is non-tripping and
/// `Misconfigured` is damaging.
pub fn recorded_breaker(
    threshold: u32,
    retry_ms: u64,
) -> (Arc<CircuitBreaker>, Arc<ManualClock>, Arc<RecordingListener>) {
    let clock = Arc::new(ManualClock::new(0));
    let listener = RecordingListener::new();
    let registry = BreakerRegistry::new(clock.clone());
    let breaker = registry.get_or_create(
        BreakerConfig::new("local-spooler", listener.clone())
            .failure_threshold(threshold)
            .retry_interval_ms(retry_ms)
            .non_tripping([ErrorKind::RemoteFault])
            .damaging([ErrorKind::Misconfigured]),
    );
    (breaker, clock, listener)
}

pub fn timeout() -> FailureInfo {
    FailureInfo::new(ErrorKind::Timeout, "read timed out")
}

pub fn remote_fault() -> FailureInfo {
    FailureInfo::new(ErrorKind::RemoteFault, "printer out of paper")
}

pub fn misconfigured() -> FailureInfo {
    FailureInfo::new(ErrorKind::Misconfigured, "spooler binary missing")
}
