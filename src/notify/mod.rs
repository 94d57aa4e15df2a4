//! Notification subsystem.
//!
//! # Data Flow
//! ```text
//! Breaker transition or classified error
//!     → listener.rs (CircuitListener callback with a CircuitView snapshot)
//!     → default.rs (policy: what is persisted, what is broadcast)
//!     → sinks.rs (audit trail, live broadcast, message catalog)
//! ```
//!
//! # Design Decisions
//! - Listeners are concrete types chosen per identity at startup
//! - Persisting is rate-limited by state, broadcasting is not

pub mod default;
pub mod listener;
pub mod sinks;

pub use default::{DefaultListener, MultiplexedListener, NotificationSinks};
pub use listener::{CircuitListener, CircuitView, SilentListener};
pub use sinks::{
    AuditEntry, AuditSink, BroadcastSink, JsonlAuditLog, Localizer, MemoryAudit, Severity,
    StaticCatalog, Topic, TracingBroadcast,
};
