//! Shared fixtures: a hand-driven platform and a capturing sink.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rtos_debug_log::{DebugLog, IsrContext, Platform, Sink, SpawnError, TaskBody, TaskSpec, Ticks};

/// Platform whose "spawned" consumer never runs: tests drive the
/// consumer themselves through `claim_consumer`.
pub struct ManualPlatform {
    pub tick: AtomicU32,
    pub spawned: AtomicUsize,
    pub last_priority: AtomicU32,
    pub last_stack: AtomicUsize,
    pub fail_spawn: AtomicBool,
    pub wakes: AtomicUsize,
    pub isr_wakes: AtomicUsize,
    /// Reported by `in_interrupt`.
    pub in_isr: AtomicBool,
}

impl ManualPlatform {
    pub const fn new() -> Self {
        Self {
            tick: AtomicU32::new(0),
            spawned: AtomicUsize::new(0),
            last_priority: AtomicU32::new(u32::MAX),
            last_stack: AtomicUsize::new(0),
            fail_spawn: AtomicBool::new(false),
            wakes: AtomicUsize::new(0),
            isr_wakes: AtomicUsize::new(0),
            in_isr: AtomicBool::new(false),
        }
    }

    pub fn set_ticks(&self, ticks: Ticks) {
        self.tick.store(ticks, Ordering::Relaxed);
    }
}

impl Platform for ManualPlatform {
    fn ticks(&self) -> Ticks {
        self.tick.load(Ordering::Relaxed)
    }

    fn ticks_from_isr(&self, _cx: &IsrContext) -> Ticks {
        self.tick.load(Ordering::Relaxed)
    }

    fn in_interrupt(&self) -> bool {
        self.in_isr.load(Ordering::Relaxed)
    }

    fn wait_for_wake(&self) {
        std::thread::yield_now();
    }

    fn wake(&self) {
        self.wakes.fetch_add(1, Ordering::Relaxed);
    }

    fn wake_from_isr(&self, _cx: &IsrContext) {
        self.isr_wakes.fetch_add(1, Ordering::Relaxed);
    }

    fn spawn<T: TaskBody>(&self, spec: &TaskSpec, _body: &'static T) -> Result<(), SpawnError> {
        if self.fail_spawn.load(Ordering::Relaxed) {
            return Err(SpawnError);
        }
        self.spawned.fetch_add(1, Ordering::Relaxed);
        self.last_priority.store(spec.priority, Ordering::Relaxed);
        self.last_stack.store(spec.stack_size, Ordering::Relaxed);
        Ok(())
    }
}

/// Platform whose `spawn` blocks until the test releases it.
///
/// Each spawn attempt announces itself on `entered` and then waits for a
/// verdict: `true` succeeds, `false` fails.
pub struct GatedPlatform {
    entered: Mutex<Sender<()>>,
    verdicts: Mutex<Receiver<bool>>,
    pub attempts: AtomicUsize,
}

/// Test-side handles of a [`GatedPlatform`].
pub struct SpawnGate {
    pub entered: Receiver<()>,
    pub verdicts: Sender<bool>,
}

impl GatedPlatform {
    pub fn new() -> (Self, SpawnGate) {
        let (entered_tx, entered_rx) = channel();
        let (verdict_tx, verdict_rx) = channel();
        let platform = Self {
            entered: Mutex::new(entered_tx),
            verdicts: Mutex::new(verdict_rx),
            attempts: AtomicUsize::new(0),
        };
        let gate = SpawnGate {
            entered: entered_rx,
            verdicts: verdict_tx,
        };
        (platform, gate)
    }
}

impl Platform for GatedPlatform {
    fn ticks(&self) -> Ticks {
        0
    }

    fn ticks_from_isr(&self, _cx: &IsrContext) -> Ticks {
        0
    }

    fn wait_for_wake(&self) {
        std::thread::yield_now();
    }

    fn wake(&self) {}

    fn wake_from_isr(&self, _cx: &IsrContext) {}

    fn yield_now(&self) {
        std::thread::sleep(Duration::from_millis(1));
    }

    fn spawn<T: TaskBody>(&self, _spec: &TaskSpec, _body: &'static T) -> Result<(), SpawnError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let _ = self.entered.lock().unwrap().send(());
        match self.verdicts.lock().unwrap().recv() {
            Ok(true) => Ok(()),
            _ => Err(SpawnError),
        }
    }
}

/// Sink that records everything written, shareable with the test body.
#[derive(Clone, Default)]
pub struct CaptureSink {
    bytes: Arc<Mutex<Vec<u8>>>,
    writes: Arc<AtomicUsize>,
}

impl CaptureSink {
    pub fn text(&self) -> String {
        String::from_utf8(self.bytes.lock().unwrap().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_owned).collect()
    }

    /// Number of `write_line` calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Poll until `count` lines arrived or `timeout` elapsed.
    pub fn wait_for_lines(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.writes() >= count {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        self.writes() >= count
    }
}

impl Sink for CaptureSink {
    fn write_line(&mut self, line: &[u8]) {
        self.bytes.lock().unwrap().extend_from_slice(line);
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}

/// Fresh logger with `'static` lifetime, one per test.
pub fn manual_log<const N: usize>() -> &'static DebugLog<ManualPlatform, CaptureSink, N> {
    Box::leak(Box::new(DebugLog::new(ManualPlatform::new())))
}
