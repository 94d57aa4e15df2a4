//! Failure classification.
//!
//! # Responsibilities
//! - Tag every reported error with a small closed set of kinds
//! - Map a kind plus the per-identity kind sets to a failure class
//!
//! # Precedence
//! ```text
//! kind in damaging set, or Damaging marker        → Damaging
//! kind in non-tripping set, or NonTripping marker → NonTripping
//! anything else (including the Tripping marker)   → Tripping
//! ```

use std::collections::HashSet;
use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

/// Error kind tag attached to, or derived from, a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Marker: always counts toward opening the circuit.
    ///
    /// Callers use it to force a trip without the detail of a concrete kind.
    Tripping,
    /// Marker: the call failed but the subsystem is fine.
    NonTripping,
    /// Marker: the subsystem is unusable beyond retry.
    Damaging,
    Timeout,
    ConnectionRefused,
    Unreachable,
    Io,
    Authentication,
    PermissionDenied,
    Protocol,
    /// The remote end answered with an application-level fault.
    RemoteFault,
    Misconfigured,
    Other,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tripping => "tripping",
            Self::NonTripping => "non-tripping",
            Self::Damaging => "damaging",
            Self::Timeout => "timeout",
            Self::ConnectionRefused => "connection-refused",
            Self::Unreachable => "unreachable",
            Self::Io => "io",
            Self::Authentication => "authentication",
            Self::PermissionDenied => "permission-denied",
            Self::Protocol => "protocol",
            Self::RemoteFault => "remote-fault",
            Self::Misconfigured => "misconfigured",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    Damaging,
    NonTripping,
    Tripping,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Damaging => "damaging",
            Self::NonTripping => "non_tripping",
            Self::Tripping => "tripping",
        }
    }
}

/// Classify an error kind against the configured kind sets.
pub fn classify(
    kind: ErrorKind,
    non_tripping: &HashSet<ErrorKind>,
    damaging: &HashSet<ErrorKind>,
) -> FailureClass {
    if kind == ErrorKind::Damaging || damaging.contains(&kind) {
        FailureClass::Damaging
    } else if kind == ErrorKind::NonTripping || non_tripping.contains(&kind) {
        FailureClass::NonTripping
    } else {
        FailureClass::Tripping
    }
}

/// An error that can be reported to a circuit breaker.
pub trait Failure: fmt::Display {
    /// The kind used for classification.
    fn kind(&self) -> ErrorKind;
}

impl Failure for io::Error {
    fn kind(&self) -> ErrorKind {
        match io::Error::kind(self) {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ErrorKind::Timeout,
            io::ErrorKind::ConnectionRefused => ErrorKind::ConnectionRefused,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrNotAvailable => ErrorKind::Unreachable,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => ErrorKind::Protocol,
            io::ErrorKind::InvalidInput | io::ErrorKind::Unsupported => ErrorKind::Misconfigured,
            _ => ErrorKind::Io,
        }
    }
}

/// Owned record of a reported error, as handed to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl FailureInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Capture kind and rendered message of any reportable error.
    pub fn from_failure<E: Failure + ?Sized>(error: &E) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for FailureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl Failure for FailureInfo {
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}
