//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → identity table, logging, admin API, probes
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; identities are not runtime-editable
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, BreakerTuning, GuardConfig, LogFormat, NotificationConfig, ObservabilityConfig,
    ProbeConfig, ProbeTarget,
};
pub use validation::ValidationError;
