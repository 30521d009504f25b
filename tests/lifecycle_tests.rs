//! Lifecycle tests: init, idempotence, failures, pre-init safety

mod common;

use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use common::{manual_log, CaptureSink, GatedPlatform, SpawnGate};
use rtos_debug_log::config::{CONSUMER_PRIORITY, IDLE_PRIORITY};
use rtos_debug_log::{DebugLog, InitError, IsrContext, LoggerConfig, Template};

static HELLO: Template = Template::new("hello %u\n");

#[test]
fn test_init_spawns_one_consumer_above_idle() {
    let log = manual_log::<32>();
    let out = CaptureSink::default();

    assert!(!log.is_initialized());
    assert_eq!(log.init(32, 2048, out.clone()), Ok(()));
    assert!(log.is_initialized());

    let platform = log.platform();
    assert_eq!(platform.spawned.load(Ordering::Relaxed), 1);
    assert_eq!(platform.last_priority.load(Ordering::Relaxed), IDLE_PRIORITY + 1);
    assert_eq!(CONSUMER_PRIORITY, IDLE_PRIORITY + 1);
    assert_eq!(platform.last_stack.load(Ordering::Relaxed), 2048);
    assert_eq!(log.capacity(), 32);
}

#[test]
fn test_init_twice_is_noop_success() {
    let log = manual_log::<32>();
    let first = CaptureSink::default();
    let second = CaptureSink::default();

    assert_eq!(log.init(8, 2048, first.clone()), Ok(()));
    assert_eq!(log.init(16, 4096, second.clone()), Ok(()));

    // Exactly one channel/consumer pair, configured by the first call
    assert_eq!(log.platform().spawned.load(Ordering::Relaxed), 1);
    assert_eq!(log.capacity(), 8);

    log.log(&HELLO, 1, 0, 0);
    let mut consumer = log.claim_consumer().expect("first sink installed");
    assert_eq!(consumer.drain(), 1);
    assert_eq!(first.lines(), vec!["[0] hello 1"]);
    assert!(second.text().is_empty());
}

#[test]
fn test_default_config() {
    let config = LoggerConfig::default();
    assert_eq!(config.queue_capacity, 32);
    assert!(!config.report_drops);

    let log = manual_log::<32>();
    assert_eq!(log.init_with(&config, CaptureSink::default()), Ok(()));
    assert_eq!(log.capacity(), 32);
}

fn gated_log() -> (&'static DebugLog<GatedPlatform, CaptureSink, 8>, SpawnGate) {
    let (platform, gate) = GatedPlatform::new();
    (Box::leak(Box::new(DebugLog::new(platform))), gate)
}

#[test]
fn test_init_racing_failed_init_reports_own_outcome() {
    let (log, gate) = gated_log();

    let first = thread::spawn(move || log.init(8, 2048, CaptureSink::default()));
    gate.entered.recv().unwrap();

    // Second caller arrives while the first is still spawning
    let second = thread::spawn(move || log.init(8, 2048, CaptureSink::default()));
    thread::sleep(Duration::from_millis(50));
    assert!(!second.is_finished(), "must wait for the init in progress");

    gate.verdicts.send(false).unwrap();
    assert_eq!(first.join().unwrap(), Err(InitError::SpawnFailed));

    // The waiting caller then tries on its own and gets its own result
    gate.entered.recv().unwrap();
    gate.verdicts.send(false).unwrap();
    assert_eq!(second.join().unwrap(), Err(InitError::SpawnFailed));
    assert!(!log.is_initialized());
    assert_eq!(log.platform().attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_init_racing_successful_init_returns_once_ready() {
    let (log, gate) = gated_log();
    let out = CaptureSink::default();
    let first_sink = out.clone();

    let first = thread::spawn(move || log.init(8, 2048, first_sink));
    gate.entered.recv().unwrap();

    let second = thread::spawn(move || {
        let result = log.init(8, 2048, CaptureSink::default());
        log.log(&HELLO, 2, 0, 0);
        result
    });
    thread::sleep(Duration::from_millis(50));
    assert!(!second.is_finished(), "must wait for the init in progress");

    gate.verdicts.send(true).unwrap();
    assert_eq!(first.join().unwrap(), Ok(()));
    assert_eq!(second.join().unwrap(), Ok(()));
    assert_eq!(log.platform().attempts.load(Ordering::SeqCst), 1);

    // A log right after the second init returned is accepted
    assert_eq!(log.pending(), 1);
    log.claim_consumer().unwrap().drain();
    assert_eq!(out.lines(), vec!["[0] hello 2"]);
}

#[test]
fn test_init_rejects_invalid_capacity() {
    let log = manual_log::<4>();

    assert_eq!(
        log.init(0, 2048, CaptureSink::default()),
        Err(InitError::InvalidCapacity { requested: 0, max: 4 })
    );
    assert_eq!(
        log.init(5, 2048, CaptureSink::default()),
        Err(InitError::InvalidCapacity { requested: 5, max: 4 })
    );
    assert!(!log.is_initialized());
    assert_eq!(log.platform().spawned.load(Ordering::Relaxed), 0);

    // A valid retry still works
    assert_eq!(log.init(4, 2048, CaptureSink::default()), Ok(()));
    assert!(log.is_initialized());
}

#[test]
fn test_init_reports_spawn_failure_and_allows_retry() {
    let log = manual_log::<8>();
    log.platform().fail_spawn.store(true, Ordering::Relaxed);

    assert_eq!(log.init(8, 2048, CaptureSink::default()), Err(InitError::SpawnFailed));
    assert!(!log.is_initialized());
    assert!(log.claim_consumer().is_none(), "sink must not linger after failure");

    log.log(&HELLO, 1, 0, 0);
    assert_eq!(log.pending(), 0);

    log.platform().fail_spawn.store(false, Ordering::Relaxed);
    assert_eq!(log.init(8, 2048, CaptureSink::default()), Ok(()));
    assert_eq!(log.platform().spawned.load(Ordering::Relaxed), 1);
}

#[test]
fn test_producers_before_init_are_ignored() {
    let log = manual_log::<8>();

    log.log(&HELLO, 1, 2, 3);
    // SAFETY: test stands in for an interrupt handler
    let cx = unsafe { IsrContext::new() };
    assert!(!log.log_from_interrupt(&cx, &HELLO, 4, 5, 6));

    assert_eq!(log.pending(), 0);
    assert_eq!(log.dropped(), 0);
    assert!(log.claim_consumer().is_none());

    // Nothing queued earlier shows up after init
    let out = CaptureSink::default();
    log.init(8, 2048, out.clone()).unwrap();
    let mut consumer = log.claim_consumer().unwrap();
    assert_eq!(consumer.drain(), 0);
    assert!(out.text().is_empty());
}

#[test]
fn test_consumer_claimed_once() {
    let log = manual_log::<8>();
    log.init(8, 2048, CaptureSink::default()).unwrap();

    let first = log.claim_consumer();
    assert!(first.is_some());
    assert!(log.claim_consumer().is_none());
}

#[test]
fn test_init_error_messages() {
    assert_eq!(InitError::SpawnFailed.message(), "consumer task spawn failed");
    assert_eq!(
        InitError::InvalidCapacity { requested: 0, max: 32 }.to_string(),
        "invalid queue capacity: 0 (allowed 1..=32)"
    );
}
