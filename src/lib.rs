//! Fault-isolation guard for a print-management platform.
//!
//! Every external subsystem the platform depends on (spoolers, cloud print,
//! mail relay, accounting server, school system, the internet at large) sits
//! behind its own circuit breaker. Callers ask before each external call and
//! report the outcome afterwards; a failing subsystem is short-circuited
//! instead of stalling the caller.

pub mod admin;
pub mod breaker;
pub mod config;
pub mod identity;
pub mod lifecycle;
pub mod notify;
pub mod observability;
pub mod probe;

pub use breaker::{
    Acquire, BreakerConfig, BreakerRegistry, CallError, CircuitBreaker, CircuitStatus, ErrorKind,
    Failure, FailureInfo,
};
pub use config::GuardConfig;
pub use identity::{Identity, IdentityTable};
pub use lifecycle::Shutdown;
