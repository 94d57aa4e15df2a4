//! Fault-isolation subsystem.
//!
//! # Data Flow
//! ```text
//! Caller:
//!     registry.rs (get_or_create by identity name)
//!     → circuit.rs acquire()
//!         → Granted: run the external call
//!         → Rejected: abort or fall back
//!     → report_success() / report_failure(err)
//!         → classify.rs (Damaging / NonTripping / Tripping)
//!         → state.rs (transition, owed notifications)
//!         → listener (after the lock is released)
//! ```
//!
//! # Design Decisions
//! - One mutex per breaker; every operation is a single critical section
//! - Nothing blocks or sleeps: acquire is a pure fail-fast decision
//! - Time comes from an injected clock
//! - The guard observes errors, it never retries or rewrites them

pub mod circuit;
pub mod classify;
pub mod clock;
pub mod registry;
pub mod state;

pub use circuit::{BreakerConfig, BreakerSnapshot, CallError, CircuitBreaker};
pub use classify::{classify, ErrorKind, Failure, FailureClass, FailureInfo};
pub use clock::{Clock, ManualClock, SystemClock};
pub use registry::BreakerRegistry;
pub use state::{Acquire, CircuitStatus};
