//! Guarded identities.
//!
//! # Responsibilities
//! - Name every external subsystem that sits behind a breaker
//! - Hold each identity's built-in tuning, kind sets and listener type
//! - Build the startup table of breaker configurations
//!
//! # Design Decisions
//! - The set of identities is closed and fixed for the process lifetime
//! - Configuration may retune thresholds and retry windows, nothing else
//! - Listener behavior is a concrete type per identity, picked here

pub mod table;

pub use table::IdentityTable;

use std::fmt;
use std::str::FromStr;

use crate::breaker::ErrorKind;
use crate::notify::Topic;

/// A named external subsystem guarded by its own breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identity {
    /// Print spooler on this host.
    LocalSpooler,
    /// Print spoolers on other hosts, one shared identity for all of them.
    RemoteSpoolers,
    /// Cloud print relay.
    CloudPrint,
    /// Arbitrary outbound internet destinations.
    Internet,
    /// Outgoing mail relay.
    MailRelay,
    /// Third-party print accounting server.
    AccountingServer,
    /// School information system SOAP endpoint.
    SchoolSystem,
}

/// Which listener type an identity uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Default,
    /// Default policy plus an audit entry for each acquisition while damaged.
    PersistAcquired,
    /// Open/close suppressed; the identity multiplexes many destinations.
    Multiplexed,
}

/// Built-in tuning of an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub failure_threshold: u32,
    pub retry_interval_ms: u64,
    pub non_tripping: &'static [ErrorKind],
    pub damaging: &'static [ErrorKind],
    pub listener: ListenerKind,
}

impl Identity {
    pub const ALL: [Identity; 7] = [
        Identity::LocalSpooler,
        Identity::RemoteSpoolers,
        Identity::CloudPrint,
        Identity::Internet,
        Identity::MailRelay,
        Identity::AccountingServer,
        Identity::SchoolSystem,
    ];

    /// Registry key.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LocalSpooler => "local-spooler",
            Self::RemoteSpoolers => "remote-spoolers",
            Self::CloudPrint => "cloud-print",
            Self::Internet => "internet",
            Self::MailRelay => "mail-relay",
            Self::AccountingServer => "accounting-server",
            Self::SchoolSystem => "school-system",
        }
    }

    /// Human-readable name used in notifications.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::LocalSpooler => "Local print spooler",
            Self::RemoteSpoolers => "Remote print spooler",
            Self::CloudPrint => "Cloud print relay",
            Self::Internet => "Internet connection",
            Self::MailRelay => "Mail relay",
            Self::AccountingServer => "Print accounting server",
            Self::SchoolSystem => "School information system",
        }
    }

    pub fn topic(&self) -> Topic {
        match self {
            Self::LocalSpooler | Self::RemoteSpoolers => Topic::Spooler,
            Self::CloudPrint => Topic::CloudPrint,
            Self::Internet => Topic::Internet,
            Self::MailRelay => Topic::Mail,
            Self::AccountingServer => Topic::Accounting,
            Self::SchoolSystem => Topic::SchoolSystem,
        }
    }

    pub fn profile(&self) -> IdentityProfile {
        use ErrorKind::*;

        match self {
            Self::LocalSpooler => IdentityProfile {
                failure_threshold: 3,
                retry_interval_ms: 10_000,
                non_tripping: &[RemoteFault],
                damaging: &[Misconfigured],
                listener: ListenerKind::Default,
            },
            Self::RemoteSpoolers => IdentityProfile {
                failure_threshold: 3,
                retry_interval_ms: 0,
                non_tripping: &[RemoteFault],
                damaging: &[],
                listener: ListenerKind::Default,
            },
            Self::CloudPrint => IdentityProfile {
                failure_threshold: 2,
                retry_interval_ms: 60_000,
                non_tripping: &[Authentication],
                damaging: &[Misconfigured],
                listener: ListenerKind::Default,
            },
            Self::Internet => IdentityProfile {
                failure_threshold: 1,
                retry_interval_ms: 0,
                non_tripping: &[],
                damaging: &[],
                listener: ListenerKind::Multiplexed,
            },
            Self::MailRelay => IdentityProfile {
                failure_threshold: 2,
                retry_interval_ms: 60_000,
                non_tripping: &[Authentication, Protocol],
                damaging: &[Misconfigured],
                listener: ListenerKind::Default,
            },
            Self::AccountingServer => IdentityProfile {
                failure_threshold: 3,
                retry_interval_ms: 30_000,
                non_tripping: &[Authentication],
                damaging: &[Misconfigured],
                listener: ListenerKind::PersistAcquired,
            },
            Self::SchoolSystem => IdentityProfile {
                failure_threshold: 1,
                retry_interval_ms: 120_000,
                non_tripping: &[RemoteFault],
                damaging: &[Misconfigured],
                listener: ListenerKind::Default,
            },
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an identity name that is not in the table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown identity '{0}'")]
pub struct UnknownIdentity(pub String);

impl FromStr for Identity {
    type Err = UnknownIdentity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identity::ALL
            .iter()
            .copied()
            .find(|identity| identity.name() == s)
            .ok_or_else(|| UnknownIdentity(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for identity in Identity::ALL {
            assert_eq!(identity.name().parse::<Identity>(), Ok(identity));
        }
        assert!("spooler".parse::<Identity>().is_err());
    }

    #[test]
    fn test_profiles_are_sane() {
        for identity in Identity::ALL {
            let profile = identity.profile();
            assert!(profile.failure_threshold >= 1, "{identity}");
            for kind in profile.damaging {
                assert!(!profile.non_tripping.contains(kind), "{identity}: {kind}");
            }
        }
    }

    #[test]
    fn test_multiplexed_identities_retry_immediately() {
        for identity in Identity::ALL {
            let profile = identity.profile();
            if profile.listener == ListenerKind::Multiplexed {
                assert_eq!(profile.retry_interval_ms, 0);
            }
        }
    }
}
