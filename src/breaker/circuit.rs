//! Named circuit breaker.
//!
//! # Responsibilities
//! - Serialize acquire/report calls on one identity behind a single mutex
//! - Classify reported errors against the identity's kind sets
//! - Deliver owed notifications to the identity's listener
//! - Package the protected-call pattern (`call`, `call_async`)
//!
//! # Design Decisions
//! - Notifications are delivered after the lock is released; listeners see a
//!   snapshot of the state as it was when the notification was raised
//! - Delivery order is transition order: notices are queued under the lock and
//!   drained by one caller at a time, which may be a different caller than the
//!   one that raised them
//! - A granted call that never reports (panic, dropped future) releases its
//!   trial slot
//! - The caller's error is never swallowed or transformed: `call` hands it back
//!   inside `CallError::Failed`

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use crate::breaker::classify::{classify, ErrorKind, Failure, FailureClass, FailureInfo};
use crate::breaker::clock::Clock;
use crate::breaker::state::{Acquire, BreakerCore, CircuitStatus, Notice};
use crate::notify::listener::{CircuitListener, CircuitView};
use crate::observability::metrics;

/// Immutable per-identity configuration, fixed at registration.
#[derive(Clone)]
pub struct BreakerConfig {
    /// Unique identity name.
    pub name: String,
    /// Consecutive tripping failures that open a closed circuit.
    pub failure_threshold: u32,
    /// Time an open circuit waits before granting a trial; 0 grants one immediately.
    pub retry_interval_ms: u64,
    pub non_tripping: HashSet<ErrorKind>,
    pub damaging: HashSet<ErrorKind>,
    pub listener: Arc<dyn CircuitListener>,
}

impl BreakerConfig {
    pub fn new(name: impl Into<String>, listener: Arc<dyn CircuitListener>) -> Self {
        Self {
            name: name.into(),
            failure_threshold: 1,
            retry_interval_ms: 0,
            non_tripping: HashSet::new(),
            damaging: HashSet::new(),
            listener,
        }
    }

    /// Set the failure threshold (clamped to at least 1).
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    pub fn retry_interval_ms(mut self, millis: u64) -> Self {
        self.retry_interval_ms = millis;
        self
    }

    pub fn non_tripping(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.non_tripping.extend(kinds);
        self
    }

    pub fn damaging(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.damaging.extend(kinds);
        self
    }
}

impl fmt::Debug for BreakerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakerConfig")
            .field("name", &self.name)
            .field("failure_threshold", &self.failure_threshold)
            .field("retry_interval_ms", &self.retry_interval_ms)
            .field("non_tripping", &self.non_tripping)
            .field("damaging", &self.damaging)
            .finish_non_exhaustive()
    }
}

/// Outcome of a protected call that did not succeed.
#[derive(Debug, Error)]
pub enum CallError<E> {
    /// The breaker refused the call; the operation was not attempted.
    #[error("circuit '{0}' rejected the call")]
    Rejected(String),
    /// The operation ran and failed with the caller's own error.
    #[error("{0}")]
    Failed(E),
}

impl<E> CallError<E> {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// The operation's error, if it ran.
    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Rejected(_) => None,
            Self::Failed(e) => Some(e),
        }
    }
}

/// Point-in-time copy of a breaker for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub status: CircuitStatus,
    pub consecutive_failures: u32,
    pub trial_in_flight: bool,
    pub opened_at_ms: Option<u64>,
    pub damage_cause: Option<FailureInfo>,
    pub failure_threshold: u32,
    pub retry_interval_ms: u64,
}

/// Notices waiting for delivery, in the order they were raised.
#[derive(Default)]
struct Outbox {
    queue: VecDeque<Notice>,
    draining: bool,
}

/// A circuit breaker guarding one named identity.
pub struct CircuitBreaker {
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    core: Mutex<BreakerCore>,
    outbox: Mutex<Outbox>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        tracing::debug!(
            name = %config.name,
            failure_threshold = config.failure_threshold,
            retry_interval_ms = config.retry_interval_ms,
            "Circuit breaker initialized"
        );
        metrics::record_breaker_state(&config.name, CircuitStatus::Closed);

        Self {
            config,
            clock,
            core: Mutex::new(BreakerCore::new()),
            outbox: Mutex::new(Outbox::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Run `op` on the core, queue the notices it raised, then deliver.
    ///
    /// Notices are queued before the core lock is released, so the queue
    /// order is the order in which transitions happened.
    fn transition<R>(&self, op: impl FnOnce(&mut BreakerCore, &mut Vec<Notice>) -> R) -> R {
        let mut notices = Vec::new();
        let result = {
            let mut core = self.core.lock();
            let result = op(&mut *core, &mut notices);
            if !notices.is_empty() {
                self.outbox.lock().queue.extend(notices);
            }
            result
        };
        self.drain();
        result
    }

    /// Deliver queued notices unless another caller is already doing so.
    ///
    /// A listener that calls back into this breaker only queues; the outer
    /// drain picks the new notices up.
    fn drain(&self) {
        {
            let mut outbox = self.outbox.lock();
            if outbox.draining || outbox.queue.is_empty() {
                return;
            }
            outbox.draining = true;
        }

        let _unwind = DrainGuard(&self.outbox);
        loop {
            let next = {
                let mut outbox = self.outbox.lock();
                let next = outbox.queue.pop_front();
                // Cleared under the lock that saw the queue empty.
                if next.is_none() {
                    outbox.draining = false;
                }
                next
            };
            match next {
                Some(notice) => self.deliver(notice),
                None => return,
            }
        }
    }

    /// Ask to attempt the protected operation. Never blocks.
    pub fn acquire(&self) -> Acquire {
        let retry_interval_ms = self.config.retry_interval_ms;
        let result =
            self.transition(|core, out| core.acquire(self.clock.now_millis(), retry_interval_ms, out));

        if !result.is_granted() {
            tracing::debug!(name = %self.config.name, "Circuit breaker rejected call");
            metrics::record_rejection(&self.config.name);
        }
        result
    }

    pub fn report_success(&self) {
        self.transition(|core, out| core.report_success(out));
    }

    /// Report a failed protected operation. The error itself is left to the caller.
    pub fn report_failure<E: Failure + ?Sized>(&self, error: &E) {
        let failure = FailureInfo::from_failure(error);
        let class = classify(failure.kind, &self.config.non_tripping, &self.config.damaging);
        metrics::record_failure(&self.config.name, class.as_str());

        if class == FailureClass::NonTripping {
            tracing::debug!(name = %self.config.name, "Non-tripping failure reported");
        }

        let threshold = self.config.failure_threshold;
        self.transition(|core, out| {
            core.report_failure(class, failure, self.clock.now_millis(), threshold, out)
        });
    }

    /// Explicitly mark the protected subsystem as broken.
    pub fn mark_damaged(&self, cause: FailureInfo) {
        self.transition(|core, out| core.mark_damaged(cause, out));
    }

    /// Administrative reset to a fresh closed circuit.
    pub fn reset(&self) {
        tracing::info!(name = %self.config.name, "Circuit breaker reset");
        self.transition(|core, out| core.reset(out));
    }

    /// A granted call ended without reporting; free the trial slot if it held one.
    fn abandon(&self) {
        let now = self.clock.now_millis();
        if self.core.lock().abandon_trial(now) {
            tracing::warn!(name = %self.config.name, "Trial call abandoned, retry window restarted");
        }
    }

    pub fn status(&self) -> CircuitStatus {
        self.core.lock().status()
    }

    pub fn is_circuit_closed(&self) -> bool {
        self.status() == CircuitStatus::Closed
    }

    pub fn is_circuit_damaged(&self) -> bool {
        self.status() == CircuitStatus::Damaged
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.core.lock().consecutive_failures()
    }

    pub fn damage_cause(&self) -> Option<FailureInfo> {
        self.core.lock().damage_cause().cloned()
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let core = self.core.lock();
        BreakerSnapshot {
            name: self.config.name.clone(),
            status: core.status(),
            consecutive_failures: core.consecutive_failures(),
            trial_in_flight: core.trial_in_flight(),
            opened_at_ms: core.opened_at(),
            damage_cause: core.damage_cause().cloned(),
            failure_threshold: self.config.failure_threshold,
            retry_interval_ms: self.config.retry_interval_ms,
        }
    }

    /// Run `f` under the breaker's protection.
    ///
    /// If `f` panics after a trial was granted, the trial is released.
    pub fn call<T, E, F>(&self, f: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: Failure,
    {
        let Some(permit) = self.permit() else {
            return Err(CallError::Rejected(self.config.name.clone()));
        };
        permit.finish(f())
    }

    /// Async variant of [`CircuitBreaker::call`].
    ///
    /// Dropping the returned future mid-call (a timeout, a `select!` branch
    /// losing) releases a granted trial instead of leaving it outstanding.
    pub async fn call_async<T, E, F, Fut>(&self, f: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Failure,
    {
        let Some(permit) = self.permit() else {
            return Err(CallError::Rejected(self.config.name.clone()));
        };
        let outcome = f().await;
        permit.finish(outcome)
    }

    fn permit(&self) -> Option<CallPermit<'_>> {
        self.acquire().is_granted().then(|| CallPermit {
            breaker: self,
            reported: false,
        })
    }

    fn deliver(&self, notice: Notice) {
        let name = self.config.name.as_str();
        let listener = &self.config.listener;

        match notice {
            Notice::Closed(state) => {
                tracing::info!(name, "Circuit breaker CLOSED");
                metrics::record_transition(name, CircuitStatus::Closed);
                listener.on_circuit_closed(&CircuitView::new(name, state));
            }
            Notice::Opened(state) => {
                tracing::warn!(
                    name,
                    failures = state.consecutive_failures,
                    "Circuit breaker OPENED"
                );
                metrics::record_transition(name, CircuitStatus::Open);
                listener.on_circuit_opened(&CircuitView::new(name, state));
            }
            Notice::Damaged(state, cause) => {
                tracing::warn!(name, cause = %cause, "Circuit breaker DAMAGED by explicit report");
                metrics::record_transition(name, CircuitStatus::Damaged);
                listener.on_circuit_damaged(&CircuitView::new(name, state), &cause);
            }
            Notice::Acquired(state) => {
                listener.on_circuit_acquired(&CircuitView::new(name, state));
            }
            Notice::Tripping(state, failure) => {
                listener.on_tripping_exception(&CircuitView::new(name, state), &failure);
            }
            Notice::NonTripping(state, failure) => {
                listener.on_non_tripping_exception(&CircuitView::new(name, state), &failure);
            }
            Notice::Damaging(state, failure) => {
                tracing::warn!(name, error = %failure, "Circuit breaker DAMAGED");
                metrics::record_transition(name, CircuitStatus::Damaged);
                listener.on_damaging_exception(&CircuitView::new(name, state), &failure);
            }
        }
    }
}

/// Clears the draining flag when a listener panics mid-drain.
struct DrainGuard<'a>(&'a Mutex<Outbox>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().draining = false;
        }
    }
}

/// A granted acquisition that must end in a report.
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    reported: bool,
}

impl CallPermit<'_> {
    fn finish<T, E: Failure>(mut self, outcome: Result<T, E>) -> Result<T, CallError<E>> {
        self.reported = true;
        match outcome {
            Ok(value) => {
                self.breaker.report_success();
                Ok(value)
            }
            Err(e) => {
                self.breaker.report_failure(&e);
                Err(CallError::Failed(e))
            }
        }
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.reported {
            self.breaker.abandon();
        }
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.lock();
        f.debug_struct("CircuitBreaker")
            .field("name", &self.config.name)
            .field("status", &core.status())
            .field("consecutive_failures", &core.consecutive_failures())
            .finish()
    }
}
