//! Breaker state machine.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: subsystem assumed down, calls fail fast
//! - Damaged: subsystem unusable, calls fail fast until an administrative reset
//!
//! # State Transitions
//! ```text
//! Closed  → Open:    consecutive tripping failures >= threshold
//! Open    → Open:    retry window elapsed, single trial granted and failed
//! Open    → Closed:  trial succeeded
//! any     → Damaged: damaging failure, or explicit damage report
//! any     → Closed:  administrative reset
//! ```
//!
//! `BreakerCore` holds no lock and no clock. The caller serializes access and
//! passes the current time in, which keeps every transition deterministic.
//! Each operation appends the notifications it owes to `out`; delivering them
//! is the caller's job.

use serde::Serialize;

use super::classify::{FailureClass, FailureInfo};

/// Circuit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitStatus {
    Closed,
    Open,
    Damaged,
}

impl CircuitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::Damaged => "damaged",
        }
    }

    /// Gauge encoding (0=closed, 1=open, 2=damaged).
    pub fn as_gauge(&self) -> f64 {
        match self {
            Self::Closed => 0.0,
            Self::Open => 1.0,
            Self::Damaged => 2.0,
        }
    }
}

impl std::fmt::Display for CircuitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    Granted,
    Rejected,
}

impl Acquire {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Status and counter as they were when a notification was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateView {
    pub status: CircuitStatus,
    pub consecutive_failures: u32,
}

/// A notification owed to the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Closed(StateView),
    Opened(StateView),
    Damaged(StateView, FailureInfo),
    Acquired(StateView),
    Tripping(StateView, FailureInfo),
    NonTripping(StateView, FailureInfo),
    Damaging(StateView, FailureInfo),
}

/// Mutable per-identity breaker state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerCore {
    status: CircuitStatus,
    consecutive_failures: u32,
    opened_at: Option<u64>,
    trial_in_flight: bool,
    damage_cause: Option<FailureInfo>,
}

impl Default for BreakerCore {
    fn default() -> Self {
        Self {
            status: CircuitStatus::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trial_in_flight: false,
            damage_cause: None,
        }
    }
}

impl BreakerCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> CircuitStatus {
        self.status
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn opened_at(&self) -> Option<u64> {
        self.opened_at
    }

    pub fn trial_in_flight(&self) -> bool {
        self.trial_in_flight
    }

    pub fn damage_cause(&self) -> Option<&FailureInfo> {
        self.damage_cause.as_ref()
    }

    fn view(&self) -> StateView {
        StateView {
            status: self.status,
            consecutive_failures: self.consecutive_failures,
        }
    }

    /// Decide whether a call may proceed. Never blocks.
    pub fn acquire(&mut self, now: u64, retry_interval_ms: u64, out: &mut Vec<Notice>) -> Acquire {
        match self.status {
            CircuitStatus::Closed => Acquire::Granted,
            CircuitStatus::Damaged => {
                out.push(Notice::Acquired(self.view()));
                Acquire::Rejected
            }
            CircuitStatus::Open => {
                let opened_at = self.opened_at.unwrap_or(now);
                if now.saturating_sub(opened_at) < retry_interval_ms {
                    Acquire::Rejected
                } else if self.trial_in_flight {
                    Acquire::Rejected
                } else {
                    self.trial_in_flight = true;
                    Acquire::Granted
                }
            }
        }
    }

    pub fn report_success(&mut self, out: &mut Vec<Notice>) {
        match self.status {
            CircuitStatus::Damaged => {}
            CircuitStatus::Closed => {
                self.consecutive_failures = 0;
            }
            CircuitStatus::Open => {
                self.consecutive_failures = 0;
                self.status = CircuitStatus::Closed;
                self.trial_in_flight = false;
                self.opened_at = None;
                out.push(Notice::Closed(self.view()));
            }
        }
    }

    pub fn report_failure(
        &mut self,
        class: FailureClass,
        failure: FailureInfo,
        now: u64,
        failure_threshold: u32,
        out: &mut Vec<Notice>,
    ) {
        match class {
            FailureClass::Damaging => {
                if self.status != CircuitStatus::Damaged {
                    self.status = CircuitStatus::Damaged;
                    self.trial_in_flight = false;
                    self.damage_cause = Some(failure.clone());
                    out.push(Notice::Damaging(self.view(), failure));
                }
            }
            FailureClass::NonTripping => {
                out.push(Notice::NonTripping(self.view(), failure));
            }
            FailureClass::Tripping => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                // Raised before any transition so the failure that trips the
                // circuit is still seen against a closed circuit.
                out.push(Notice::Tripping(self.view(), failure));

                match self.status {
                    CircuitStatus::Closed if self.consecutive_failures >= failure_threshold => {
                        self.status = CircuitStatus::Open;
                        self.opened_at = Some(now);
                        self.trial_in_flight = false;
                        out.push(Notice::Opened(self.view()));
                    }
                    CircuitStatus::Open => {
                        self.trial_in_flight = false;
                        self.opened_at = Some(now);
                    }
                    _ => {}
                }
            }
        }
    }

    /// Explicit external damage report.
    pub fn mark_damaged(&mut self, cause: FailureInfo, out: &mut Vec<Notice>) {
        if self.status == CircuitStatus::Damaged {
            return;
        }
        self.status = CircuitStatus::Damaged;
        self.trial_in_flight = false;
        self.damage_cause = Some(cause.clone());
        out.push(Notice::Damaged(self.view(), cause));
    }

    /// Release a granted trial that will never report back.
    ///
    /// The retry window restarts at `now`. Outside an open circuit this is a no-op.
    pub fn abandon_trial(&mut self, now: u64) -> bool {
        if self.status != CircuitStatus::Open || !self.trial_in_flight {
            return false;
        }
        self.trial_in_flight = false;
        self.opened_at = Some(now);
        true
    }

    /// Administrative reset back to a fresh closed circuit.
    pub fn reset(&mut self, out: &mut Vec<Notice>) {
        let was = self.status;
        *self = Self::default();
        if was != CircuitStatus::Closed {
            out.push(Notice::Closed(self.view()));
        }
    }
}
