//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard daemon.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Audit trail and message settings.
    pub notifications: NotificationConfig,

    /// Per-identity tuning overrides, keyed by identity name.
    pub breakers: BTreeMap<String, BreakerTuning>,

    /// Background reachability probes.
    pub probe: ProbeConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Locale passed to the message catalog.
    pub locale: String,

    /// JSON-lines audit file; audit entries stay in memory when unset.
    pub audit_log_path: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            audit_log_path: None,
        }
    }
}

/// Tuning override for one identity. Unset fields keep the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerTuning {
    /// Consecutive tripping failures before the circuit opens.
    pub failure_threshold: Option<u32>,

    /// Milliseconds an open circuit waits before a trial call.
    pub retry_interval_ms: Option<u64>,
}

/// Probe monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Enable background probes.
    pub enabled: bool,

    /// Probe interval in seconds.
    pub interval_secs: u64,

    /// Connect timeout in seconds.
    pub timeout_secs: u64,

    /// Endpoints to probe.
    pub targets: Vec<ProbeTarget>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 30,
            timeout_secs: 5,
            targets: Vec::new(),
        }
    }
}

/// A single probed endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProbeTarget {
    /// Identity whose breaker guards the probe.
    pub identity: String,

    /// Socket address (e.g., "127.0.0.1:631").
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: GuardConfig = toml::from_str("").unwrap();
        assert!(!config.admin.enabled);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert_eq!(config.notifications.locale, "en");
        assert!(config.breakers.is_empty());
        assert_eq!(config.probe.interval_secs, 30);
    }

    #[test]
    fn test_full_document() {
        let config: GuardConfig = toml::from_str(
            r#"
            [observability]
            log_level = "debug"
            log_format = "json"

            [admin]
            enabled = true
            api_key = "s3cret"

            [notifications]
            audit_log_path = "/var/lib/spoolguard/audit.jsonl"

            [breakers.mail-relay]
            failure_threshold = 4

            [breakers.internet]
            retry_interval_ms = 0

            [probe]
            enabled = true
            interval_secs = 10

            [[probe.targets]]
            identity = "local-spooler"
            address = "127.0.0.1:631"
            "#,
        )
        .unwrap();

        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.admin.api_key, "s3cret");
        assert_eq!(config.breakers["mail-relay"].failure_threshold, Some(4));
        assert_eq!(config.breakers["mail-relay"].retry_interval_ms, None);
        assert_eq!(config.breakers["internet"].retry_interval_ms, Some(0));
        assert_eq!(config.probe.targets.len(), 1);
        assert_eq!(config.probe.timeout_secs, 5);
    }
}
