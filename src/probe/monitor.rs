//! Probe monitor.
//!
//! # Responsibilities
//! - Periodically connect to configured endpoints
//! - Feed outcomes into the identity's breaker

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::time;

use crate::breaker::{BreakerRegistry, CallError, ErrorKind, Failure};
use crate::config::ProbeConfig;
use crate::identity::Identity;

/// Why a probe failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connect timed out after {0} ms")]
    Timeout(u64),

    #[error("connect failed: {0}")]
    Connect(#[from] std::io::Error),
}

impl Failure for ProbeError {
    fn kind(&self) -> ErrorKind {
        match self {
            ProbeError::Timeout(_) => ErrorKind::Timeout,
            ProbeError::Connect(e) => Failure::kind(e),
        }
    }
}

/// Result of probing one target.
#[derive(Debug)]
pub enum ProbeOutcome {
    Reachable,
    Unreachable(ProbeError),
    /// The breaker refused the attempt.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Target {
    identity: Identity,
    addr: SocketAddr,
}

/// Background prober.
pub struct ProbeMonitor {
    registry: Arc<BreakerRegistry>,
    interval: Duration,
    timeout: Duration,
    targets: Vec<Target>,
}

impl ProbeMonitor {
    /// Create a monitor; targets that do not resolve are dropped with a warning.
    pub fn new(registry: Arc<BreakerRegistry>, config: &ProbeConfig) -> Self {
        let targets = config
            .targets
            .iter()
            .filter_map(|t| match (t.identity.parse::<Identity>(), t.address.parse::<SocketAddr>()) {
                (Ok(identity), Ok(addr)) => Some(Target { identity, addr }),
                _ => {
                    tracing::warn!(identity = %t.identity, address = %t.address, "Ignoring invalid probe target");
                    None
                }
            })
            .collect();

        Self {
            registry,
            interval: Duration::from_secs(config.interval_secs.max(1)),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            targets,
        }
    }

    /// Override the connect timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if self.targets.is_empty() {
            tracing::info!("No probe targets configured, probe monitor idle");
            return;
        }

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            targets = self.targets.len(),
            "Probe monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.probe_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Probe monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every target once, in order.
    pub async fn probe_all(&self) -> Vec<(Identity, SocketAddr, ProbeOutcome)> {
        let mut outcomes = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            let outcome = self.probe(target.identity, target.addr).await;
            outcomes.push((target.identity, target.addr, outcome));
        }
        outcomes
    }

    /// Probe a single address through the identity's breaker.
    pub async fn probe(&self, identity: Identity, addr: SocketAddr) -> ProbeOutcome {
        let Some(breaker) = self.registry.get(identity.name()) else {
            tracing::warn!(identity = %identity, "No breaker registered for probe target");
            return ProbeOutcome::Skipped;
        };

        let timeout = self.timeout;
        let result = breaker
            .call_async(|| async move {
                match time::timeout(timeout, TcpStream::connect(addr)).await {
                    Ok(Ok(_stream)) => Ok(()),
                    Ok(Err(e)) => Err(ProbeError::Connect(e)),
                    Err(_) => Err(ProbeError::Timeout(timeout.as_millis() as u64)),
                }
            })
            .await;

        match result {
            Ok(()) => {
                tracing::debug!(identity = %identity, addr = %addr, "Probe succeeded");
                ProbeOutcome::Reachable
            }
            Err(CallError::Rejected(_)) => {
                tracing::debug!(identity = %identity, addr = %addr, "Probe skipped, circuit not closed");
                ProbeOutcome::Skipped
            }
            Err(CallError::Failed(e)) => {
                tracing::warn!(identity = %identity, addr = %addr, error = %e, "Probe failed");
                ProbeOutcome::Unreachable(e)
            }
        }
    }
}
