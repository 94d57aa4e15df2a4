//! Notification collaborators: broadcast, audit and localization.
//!
//! # Responsibilities
//! - Define the sink interfaces the default listener writes to
//! - Provide the implementations wired by the daemon and the tests
//!
//! # Design Decisions
//! - Sinks are fire-and-forget: no result flows back into a breaker
//! - Audit write failures are logged, never propagated

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity attached to audit entries and broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Broadcast channel a notification is published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    Spooler,
    CloudPrint,
    Internet,
    Mail,
    Accounting,
    SchoolSystem,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spooler => "spooler",
            Self::CloudPrint => "cloud-print",
            Self::Internet => "internet",
            Self::Mail => "mail",
            Self::Accounting => "accounting",
            Self::SchoolSystem => "school-system",
        }
    }
}

/// Lightweight live notification channel.
pub trait BroadcastSink: Send + Sync {
    fn publish(&self, topic: Topic, severity: Severity, text: &str);
}

/// Append-only persistent audit trail.
pub trait AuditSink: Send + Sync {
    fn append(&self, severity: Severity, message: &str);
}

/// Renders a message key with positional arguments for a locale.
pub trait Localizer: Send + Sync {
    fn localize(&self, key: &str, locale: &str, args: &[&str]) -> String;
}

/// Publishes broadcasts as structured tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingBroadcast;

impl BroadcastSink for TracingBroadcast {
    fn publish(&self, topic: Topic, severity: Severity, text: &str) {
        match severity {
            Severity::Info => tracing::info!(topic = topic.as_str(), "{}", text),
            Severity::Warning => tracing::warn!(topic = topic.as_str(), "{}", text),
            Severity::Error => tracing::error!(topic = topic.as_str(), "{}", text),
        }
    }
}

/// One persisted audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub severity: Severity,
    pub message: String,
}

impl AuditEntry {
    pub fn new(severity: Severity, message: &str) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            id: Uuid::new_v4(),
            timestamp_ms,
            severity,
            message: message.to_string(),
        }
    }
}

/// Audit trail written as JSON lines to a file.
pub struct JsonlAuditLog {
    file: Mutex<File>,
}

impl JsonlAuditLog {
    /// Open (or create) the log for appending.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing::info!(path = %path.display(), "Audit log opened");
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn write_entry(&self, entry: &AuditEntry) -> io::Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        let mut file = self.file.lock();
        file.write_all(&line)?;
        file.flush()
    }
}

impl AuditSink for JsonlAuditLog {
    fn append(&self, severity: Severity, message: &str) {
        let entry = AuditEntry::new(severity, message);
        if let Err(e) = self.write_entry(&entry) {
            tracing::error!(error = %e, "Failed to write audit entry");
        }
    }
}

/// Audit trail kept in memory.
#[derive(Default)]
pub struct MemoryAudit {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl AuditSink for MemoryAudit {
    fn append(&self, severity: Severity, message: &str) {
        self.entries.lock().push(AuditEntry::new(severity, message));
    }
}

/// English message catalog with `{0}`, `{1}`, ... placeholders.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticCatalog;

impl StaticCatalog {
    fn template(key: &str) -> Option<&'static str> {
        let template = match key {
            "circuit-closed" => "{0}: connection restored",
            "circuit-opened" => "{0}: connection lost, calls are suspended",
            "circuit-damaged" => "{0}: marked as broken: {1}",
            "circuit-acquired-damaged" => "{0}: refused, the connection is broken",
            "circuit-tripping" => "{0}: call failed ({1} consecutive): {2}",
            "circuit-non-tripping" => "{0}: call rejected: {1}",
            "circuit-damaging" => "{0}: broken beyond retry: {1}",
            _ => return None,
        };
        Some(template)
    }
}

impl Localizer for StaticCatalog {
    fn localize(&self, key: &str, _locale: &str, args: &[&str]) -> String {
        match Self::template(key) {
            Some(template) => substitute(template, args),
            None if args.is_empty() => key.to_string(),
            None => format!("{} {}", key, args.join(" ")),
        }
    }
}

/// Replace `{N}` placeholders in one pass; argument text is never rescanned.
///
/// Placeholders without a matching argument are kept verbatim.
fn substitute(template: &str, args: &[&str]) -> String {
    let mut text = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        text.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let arg = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            args.get(index).map(|arg| (*arg, close))
        });
        match arg {
            Some((arg, close)) => {
                text.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                text.push('{');
                rest = after;
            }
        }
    }
    text.push_str(rest);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_substitution() {
        let text = StaticCatalog.localize("circuit-tripping", "en", &["Mail relay", "2", "timed out"]);
        assert_eq!(text, "Mail relay: call failed (2 consecutive): timed out");
    }

    #[test]
    fn test_catalog_does_not_expand_placeholders_inside_arguments() {
        let text = StaticCatalog.localize(
            "circuit-tripping",
            "en",
            &["Mail relay", "1", "server said {0} and {2}"],
        );
        assert_eq!(text, "Mail relay: call failed (1 consecutive): server said {0} and {2}");
    }

    #[test]
    fn test_substitute_keeps_unmatched_placeholders() {
        assert_eq!(substitute("{0} {1} {x} {", &["a"]), "a {1} {x} {");
    }

    #[test]
    fn test_catalog_unknown_key() {
        assert_eq!(StaticCatalog.localize("nope", "de", &[]), "nope");
        assert_eq!(StaticCatalog.localize("nope", "de", &["a", "b"]), "nope a b");
    }

    #[test]
    fn test_memory_audit() {
        let audit = MemoryAudit::new();
        assert!(audit.is_empty());
        audit.append(Severity::Warning, "spooler down");
        let entries = audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Warning);
        assert_eq!(entries[0].message, "spooler down");
    }

    #[test]
    fn test_jsonl_audit_log_appends() {
        let path = std::env::temp_dir().join(format!("spoolguard-audit-{}.jsonl", Uuid::new_v4()));

        let log = JsonlAuditLog::open(&path).unwrap();
        log.append(Severity::Error, "first");
        log.append(Severity::Info, "second");
        drop(log);

        let content = std::fs::read_to_string(&path).unwrap();
        let entries: Vec<AuditEntry> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].severity, Severity::Info);
        assert_ne!(entries[0].id, entries[1].id);

        std::fs::remove_file(&path).unwrap_or_default();
    }
}
