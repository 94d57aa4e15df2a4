//! Registry and breaker behavior under contention.

mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Barrier};
use std::thread;

use parking_lot::Mutex;

use common::{recorded_breaker, timeout};
use spoolguard::breaker::{BreakerConfig, BreakerRegistry, CircuitBreaker, ManualClock};
use spoolguard::notify::{CircuitListener, CircuitView, SilentListener};
use spoolguard::{CircuitStatus, FailureInfo};

/// Records transitions; the first tripping callback parks until released.
struct GatedListener {
    order: Mutex<Vec<&'static str>>,
    gated: AtomicBool,
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl GatedListener {
    fn new() -> (Arc<Self>, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let listener = Arc::new(Self {
            order: Mutex::new(Vec::new()),
            gated: AtomicBool::new(true),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        (listener, entered_rx, release_tx)
    }
}

impl CircuitListener for GatedListener {
    fn on_circuit_closed(&self, _breaker: &CircuitView<'_>) {
        self.order.lock().push("closed");
    }

    fn on_circuit_opened(&self, _breaker: &CircuitView<'_>) {
        self.order.lock().push("opened");
    }

    fn on_circuit_damaged(&self, _breaker: &CircuitView<'_>, _cause: &FailureInfo) {
        self.order.lock().push("damaged");
    }

    fn on_circuit_acquired(&self, _breaker: &CircuitView<'_>) {}

    fn on_tripping_exception(&self, _breaker: &CircuitView<'_>, _failure: &FailureInfo) {
        self.order.lock().push("tripping");
        if self.gated.swap(false, Ordering::SeqCst) {
            self.entered.lock().send(()).unwrap();
            self.release.lock().recv().unwrap();
        }
    }

    fn on_non_tripping_exception(&self, _breaker: &CircuitView<'_>, _failure: &FailureInfo) {}

    fn on_damaging_exception(&self, _breaker: &CircuitView<'_>, _failure: &FailureInfo) {}
}

#[test]
fn test_concurrent_get_or_create_single_instance() {
    const THREADS: usize = 100;

    let registry = Arc::new(BreakerRegistry::new(Arc::new(ManualClock::new(0))));
    let constructed = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            let constructed = constructed.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                registry.get_or_create_with("X", || {
                    constructed.fetch_add(1, Ordering::SeqCst);
                    BreakerConfig::new("X", Arc::new(SilentListener)).failure_threshold(3)
                })
            })
        })
        .collect();

    let breakers: Vec<Arc<CircuitBreaker>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(constructed.load(Ordering::SeqCst), 1);
    assert_eq!(registry.len(), 1);
    assert!(breakers.iter().all(|b| Arc::ptr_eq(b, &breakers[0])));
}

#[test]
fn test_concurrent_acquire_grants_one_trial() {
    const THREADS: usize = 32;

    let (cb, clock, _) = recorded_breaker(1, 1_000);
    cb.report_failure(&timeout());
    clock.set(1_000);

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let cb = cb.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                cb.acquire().is_granted()
            })
        })
        .collect();

    let granted = handles.into_iter().map(|h| h.join().unwrap()).filter(|g| *g).count();
    assert_eq!(granted, 1);
}

#[test]
fn test_concurrent_failures_open_once() {
    const THREADS: usize = 16;

    let (cb, _, listener) = recorded_breaker(5, 60_000);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let cb = cb.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                cb.report_failure(&timeout());
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(listener.count("opened"), 1);
    assert_eq!(listener.count("tripping"), THREADS);
    assert_eq!(cb.consecutive_failures(), THREADS as u32);
}

#[test]
fn test_transitions_delivered_in_order_under_contention() {
    let (listener, entered, release) = GatedListener::new();
    let registry = BreakerRegistry::new(Arc::new(ManualClock::new(0)));
    let cb = registry.get_or_create(
        BreakerConfig::new("internet", listener.clone())
            .failure_threshold(1)
            .retry_interval_ms(0),
    );

    let reporter = {
        let cb = cb.clone();
        thread::spawn(move || cb.report_failure(&timeout()))
    };

    // The reporter is parked inside its tripping callback with "opened" still owed.
    entered.recv().unwrap();
    assert_eq!(cb.status(), CircuitStatus::Open);
    assert!(cb.acquire().is_granted());
    cb.report_success();
    assert!(cb.is_circuit_closed());

    release.send(()).unwrap();
    reporter.join().unwrap();

    assert_eq!(*listener.order.lock(), vec!["tripping", "opened", "closed"]);
}
