//! Reachability probes.
//!
//! # Data Flow
//! ```text
//! Periodic timer
//!     → for each target: registry lookup by identity
//!     → acquire (rejected: skip, no connection attempted)
//!     → TCP connect with timeout
//!     → report success / failure to the identity's breaker
//! ```
//!
//! # Design Decisions
//! - Probes are ordinary guarded calls; they get no special treatment
//! - A probe never retries; the next tick is the next attempt

pub mod monitor;

pub use monitor::{ProbeError, ProbeMonitor, ProbeOutcome};
