//! Startup orchestration.
//!
//! # Responsibilities
//! - Build notification sinks from configuration
//! - Build the breaker registry and register the identity table
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The registry is created here once and handed to every consumer

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::breaker::{BreakerRegistry, Clock};
use crate::config::GuardConfig;
use crate::identity::IdentityTable;
use crate::notify::{
    AuditSink, JsonlAuditLog, MemoryAudit, NotificationSinks, StaticCatalog, TracingBroadcast,
};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot open audit log '{path}': {source}")]
    AuditLog {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the daemon's tasks share.
pub struct Services {
    pub registry: Arc<BreakerRegistry>,
    pub table: IdentityTable,
    pub sinks: NotificationSinks,
}

/// Build notification sinks as configured.
pub fn build_sinks(config: &GuardConfig) -> Result<NotificationSinks, StartupError> {
    let audit: Arc<dyn AuditSink> = match &config.notifications.audit_log_path {
        Some(path) => Arc::new(JsonlAuditLog::open(Path::new(path)).map_err(|source| {
            StartupError::AuditLog {
                path: path.clone(),
                source,
            }
        })?),
        None => {
            tracing::warn!("No audit_log_path configured, audit entries are kept in memory only");
            Arc::new(MemoryAudit::new())
        }
    };

    Ok(NotificationSinks::new(
        audit,
        Arc::new(TracingBroadcast),
        Arc::new(StaticCatalog),
        config.notifications.locale.clone(),
    ))
}

/// Build sinks, registry and identity table, and register every identity.
pub fn build_services(config: &GuardConfig, clock: Arc<dyn Clock>) -> Result<Services, StartupError> {
    let sinks = build_sinks(config)?;
    let registry = Arc::new(BreakerRegistry::new(clock));
    let table = IdentityTable::build(config, &sinks);
    table.register(&registry);

    Ok(Services {
        registry,
        table,
        sinks,
    })
}
