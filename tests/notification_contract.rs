//! What each identity persists and broadcasts, wired through the startup table.

mod common;

use std::sync::Arc;

use common::{misconfigured, recording_sinks, timeout};
use spoolguard::breaker::{BreakerRegistry, ManualClock};
use spoolguard::notify::{Severity, Topic};
use spoolguard::{ErrorKind, FailureInfo, GuardConfig, Identity, IdentityTable};

fn setup() -> (
    BreakerRegistry,
    Arc<ManualClock>,
    Arc<spoolguard::notify::MemoryAudit>,
    Arc<common::RecordingBroadcast>,
) {
    let (sinks, audit, broadcast) = recording_sinks();
    let clock = Arc::new(ManualClock::new(0));
    let registry = BreakerRegistry::new(clock.clone());
    IdentityTable::build(&GuardConfig::default(), &sinks).register(&registry);
    (registry, clock, audit, broadcast)
}

#[test]
fn test_tripping_persisted_only_while_closed() {
    let (registry, _, audit, broadcast) = setup();
    let mail = registry.get("mail-relay").unwrap();

    // Threshold 2: the second failure opens the circuit, the third lands on it.
    mail.report_failure(&timeout());
    mail.report_failure(&timeout());
    mail.report_failure(&timeout());

    let persisted: Vec<String> = audit.entries().into_iter().map(|e| e.message).collect();
    assert_eq!(
        persisted,
        vec![
            "Mail relay: call failed (1 consecutive): read timed out",
            "Mail relay: call failed (2 consecutive): read timed out",
            "Mail relay: connection lost, calls are suspended",
        ]
    );

    let published = broadcast.messages();
    assert_eq!(published.len(), 4);
    assert!(published.iter().all(|(topic, _, _)| *topic == Topic::Mail));
    assert_eq!(published[3].2, "Mail relay: call failed (3 consecutive): read timed out");
}

#[test]
fn test_non_tripping_broadcast_only() {
    let (registry, _, audit, broadcast) = setup();
    let cloud = registry.get("cloud-print").unwrap();

    cloud.report_failure(&FailureInfo::new(ErrorKind::Authentication, "token expired"));

    assert!(audit.is_empty());
    assert_eq!(
        broadcast.messages(),
        vec![(Topic::CloudPrint, Severity::Warning, "Cloud print relay: call rejected: token expired".to_string())]
    );
}

#[test]
fn test_damaging_persisted_once_and_acquires_broadcast() {
    let (registry, _, audit, broadcast) = setup();
    let spooler = registry.get(Identity::LocalSpooler.name()).unwrap();

    spooler.report_failure(&misconfigured());
    spooler.report_failure(&misconfigured());
    for _ in 0..3 {
        assert!(!spooler.acquire().is_granted());
    }

    let persisted = audit.entries();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].severity, Severity::Error);
    assert_eq!(persisted[0].message, "Local print spooler: broken beyond retry: spooler binary missing");

    let refusals = broadcast
        .messages()
        .into_iter()
        .filter(|(_, _, text)| text == "Local print spooler: refused, the connection is broken")
        .count();
    assert_eq!(refusals, 3);
}

#[test]
fn test_accounting_persists_acquires_while_damaged() {
    let (registry, _, audit, _) = setup();
    let accounting = registry.get("accounting-server").unwrap();

    accounting.report_failure(&FailureInfo::new(ErrorKind::Misconfigured, "unknown server id"));
    accounting.acquire();
    accounting.acquire();

    let refusals = audit
        .entries()
        .into_iter()
        .filter(|e| e.message == "Print accounting server: refused, the connection is broken")
        .count();
    assert_eq!(refusals, 2);
}

#[test]
fn test_internet_suppresses_open_and_close() {
    let (registry, _, audit, broadcast) = setup();
    let internet = registry.get("internet").unwrap();

    // Threshold 1, retry 0: open, trial, close.
    internet.report_failure(&timeout());
    assert!(internet.acquire().is_granted());
    internet.report_success();
    assert!(internet.is_circuit_closed());

    let texts: Vec<String> = broadcast.messages().into_iter().map(|(_, _, t)| t).collect();
    assert_eq!(texts, vec!["Internet connection: call failed (1 consecutive): read timed out"]);
    assert_eq!(audit.len(), 1);
}

#[test]
fn test_trial_close_is_persisted() {
    let (registry, clock, audit, _) = setup();
    let school = registry.get("school-system").unwrap();

    school.report_failure(&timeout());
    clock.advance(120_000);
    assert!(school.acquire().is_granted());
    school.report_success();

    let last = audit.entries().pop().unwrap();
    assert_eq!(last.severity, Severity::Info);
    assert_eq!(last.message, "School information system: connection restored");
}

#[test]
fn test_explicit_damage_report_carries_cause() {
    let (registry, _, audit, broadcast) = setup();
    let cloud = registry.get("cloud-print").unwrap();

    cloud.mark_damaged(FailureInfo::new(ErrorKind::Misconfigured, "printer registration revoked"));

    let expected = "Cloud print relay: marked as broken: printer registration revoked";
    let persisted = audit.entries();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].message, expected);
    assert_eq!(broadcast.messages(), vec![(Topic::CloudPrint, Severity::Error, expected.to_string())]);
}
