//! Host platform on std threads.
//!
//! Ticks run at 1 kHz from the first use of the platform, like a FreeRTOS
//! port with `configTICK_RATE_HZ = 1000`. The consumer parks on a
//! `Condvar`-guarded latch.

use std::io::Write;
use std::sync::{Condvar, Mutex, OnceLock, PoisonError};
use std::thread;
use std::time::Instant;

use super::{Platform, Sink, TaskBody, TaskSpec};
use crate::context::IsrContext;
use crate::envelope::Ticks;
use crate::error::SpawnError;

/// Smallest stack handed to a host thread; renderer frames are larger
/// off-target.
const HOST_MIN_STACK: usize = 64 * 1024;

pub struct StdPlatform {
    epoch: OnceLock<Instant>,
    wake_pending: Mutex<bool>,
    wakeup: Condvar,
}

impl StdPlatform {
    pub const fn new() -> Self {
        Self {
            epoch: OnceLock::new(),
            wake_pending: Mutex::new(false),
            wakeup: Condvar::new(),
        }
    }

    fn signal(&self) {
        let mut pending = self.wake_pending.lock().unwrap_or_else(PoisonError::into_inner);
        *pending = true;
        self.wakeup.notify_one();
    }
}

impl Default for StdPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for StdPlatform {
    fn ticks(&self) -> Ticks {
        let epoch = self.epoch.get_or_init(Instant::now);
        epoch.elapsed().as_millis() as Ticks
    }

    fn ticks_from_isr(&self, _cx: &IsrContext) -> Ticks {
        self.ticks()
    }

    fn wait_for_wake(&self) {
        let mut pending = self.wake_pending.lock().unwrap_or_else(PoisonError::into_inner);
        while !*pending {
            pending = self.wakeup.wait(pending).unwrap_or_else(PoisonError::into_inner);
        }
        *pending = false;
    }

    fn wake(&self) {
        self.signal();
    }

    fn wake_from_isr(&self, _cx: &IsrContext) {
        self.signal();
    }

    fn yield_now(&self) {
        thread::yield_now();
    }

    fn spawn<T: TaskBody>(&self, spec: &TaskSpec, body: &'static T) -> Result<(), SpawnError> {
        // Start the tick epoch no later than the consumer
        self.epoch.get_or_init(Instant::now);

        let name = spec.name.to_str().unwrap_or("debug").to_owned();
        log::trace!("host threads ignore priority {} for {}", spec.priority, name);

        thread::Builder::new()
            .name(name)
            .stack_size(spec.stack_size.max(HOST_MIN_STACK))
            .spawn(move || body.run())
            .map(|_| ())
            .map_err(|_| SpawnError)
    }
}

/// Writes lines to the process stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write_line(&mut self, line: &[u8]) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(line);
        let _ = out.flush();
    }
}
