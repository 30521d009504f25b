//! Platform seam: scheduler services and the output device.
//!
//! The logger needs four things from the host RTOS: a tick counter, a way
//! to park and wake the consumer task, a way to spawn that task, and a
//! character sink. Implementations:
//!
//! - [`EspPlatform`] (ESP-IDF / FreeRTOS, `target_os = "espidf"`)
//! - [`StdPlatform`] (host threads, feature `std`)

use core::ffi::CStr;

use crate::context::IsrContext;
use crate::envelope::Ticks;
use crate::error::SpawnError;

#[cfg(target_os = "espidf")]
pub mod esp;
#[cfg(feature = "std")]
pub mod host;

#[cfg(target_os = "espidf")]
pub use esp::{open_uart_sink, EspPlatform, UartSinkConfig};
#[cfg(feature = "std")]
pub use host::{StdPlatform, StdoutSink};

/// Parameters for spawning the consumer task.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    pub name: &'static CStr,
    /// Stack budget in bytes.
    pub stack_size: usize,
    pub priority: u32,
}

/// Entry point of a spawned task.
pub trait TaskBody: Sync + 'static {
    fn run(&'static self);
}

/// Scheduler services used by the logger.
pub trait Platform: Sync {
    /// Current tick count, task context.
    fn ticks(&self) -> Ticks;

    /// Current tick count, interrupt context.
    fn ticks_from_isr(&self, cx: &IsrContext) -> Ticks;

    /// True while the CPU is servicing an interrupt.
    fn in_interrupt(&self) -> bool {
        false
    }

    /// Park the consumer until [`wake`](Self::wake) is called.
    ///
    /// Wake-ups are latched: one issued before the call makes it return
    /// immediately.
    fn wait_for_wake(&self);

    /// Wake the parked consumer, task context.
    fn wake(&self);

    /// Wake the parked consumer, interrupt context. Must not block or
    /// switch context itself.
    fn wake_from_isr(&self, cx: &IsrContext);

    /// Give up the CPU briefly while another context finishes `init`.
    fn yield_now(&self) {
        core::hint::spin_loop();
    }

    /// Spawn `body` as a task.
    fn spawn<T: TaskBody>(&self, spec: &TaskSpec, body: &'static T) -> Result<(), SpawnError>;
}

/// Character output device. Owned by exactly one consumer.
pub trait Sink: Send {
    /// Write one complete line synchronously. Errors are swallowed: the
    /// consumer has nowhere to report them.
    fn write_line(&mut self, line: &[u8]);
}
