//! Listener capability set invoked by breakers.

use crate::breaker::classify::FailureInfo;
use crate::breaker::state::{CircuitStatus, StateView};

/// Read-only view of a breaker at the moment a notification was raised.
#[derive(Debug, Clone, Copy)]
pub struct CircuitView<'a> {
    name: &'a str,
    state: StateView,
}

impl<'a> CircuitView<'a> {
    pub fn new(name: &'a str, state: StateView) -> Self {
        Self { name, state }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn status(&self) -> CircuitStatus {
        self.state.status
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.state.consecutive_failures
    }

    pub fn is_circuit_closed(&self) -> bool {
        self.state.status == CircuitStatus::Closed
    }

    pub fn is_circuit_damaged(&self) -> bool {
        self.state.status == CircuitStatus::Damaged
    }
}

/// Callbacks raised by a breaker on transitions and classified errors.
///
/// Called after the breaker lock is released, so implementations may take as
/// long as they like without stalling other callers of the same breaker.
pub trait CircuitListener: Send + Sync {
    fn on_circuit_closed(&self, breaker: &CircuitView<'_>);

    fn on_circuit_opened(&self, breaker: &CircuitView<'_>);

    /// Explicit external damage report (not a classified damaging error).
    fn on_circuit_damaged(&self, breaker: &CircuitView<'_>, cause: &FailureInfo);

    /// Acquisition attempted while the circuit is damaged.
    fn on_circuit_acquired(&self, breaker: &CircuitView<'_>);

    fn on_tripping_exception(&self, breaker: &CircuitView<'_>, failure: &FailureInfo);

    fn on_non_tripping_exception(&self, breaker: &CircuitView<'_>, failure: &FailureInfo);

    fn on_damaging_exception(&self, breaker: &CircuitView<'_>, failure: &FailureInfo);
}

/// Listener that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentListener;

impl CircuitListener for SilentListener {
    fn on_circuit_closed(&self, _breaker: &CircuitView<'_>) {}
    fn on_circuit_opened(&self, _breaker: &CircuitView<'_>) {}
    fn on_circuit_damaged(&self, _breaker: &CircuitView<'_>, _cause: &FailureInfo) {}
    fn on_circuit_acquired(&self, _breaker: &CircuitView<'_>) {}
    fn on_tripping_exception(&self, _breaker: &CircuitView<'_>, _failure: &FailureInfo) {}
    fn on_non_tripping_exception(&self, _breaker: &CircuitView<'_>, _failure: &FailureInfo) {}
    fn on_damaging_exception(&self, _breaker: &CircuitView<'_>, _failure: &FailureInfo) {}
}
