//! Configuration constants and logger setup parameters.

use core::ffi::CStr;

/// Default number of envelopes the channel holds.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Default consumer stack budget in bytes (ESP-IDF task stacks are in bytes).
pub const DEFAULT_CONSUMER_STACK: usize = 3072;

/// FreeRTOS idle task priority (`tskIDLE_PRIORITY`).
pub const IDLE_PRIORITY: u32 = 0;

/// Consumer runs just above idle: never preempts real-time work, but
/// drains whenever the CPU would otherwise idle.
pub const CONSUMER_PRIORITY: u32 = IDLE_PRIORITY + 1;

/// Consumer task name.
pub const CONSUMER_TASK_NAME: &CStr = c"debug";

/// Size of the consumer's render buffer, newline included.
pub const RENDER_BUFFER_LEN: usize = 256;

/// Logger setup parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Usable channel slots, `1..=N` of the logger's static storage.
    pub queue_capacity: usize,
    /// Consumer task stack budget in bytes.
    pub consumer_stack: usize,
    /// Emit a `dropped <n> messages` line after overload.
    pub report_drops: bool,
}

impl LoggerConfig {
    pub const fn new(queue_capacity: usize, consumer_stack: usize) -> Self {
        Self {
            queue_capacity,
            consumer_stack,
            report_drops: false,
        }
    }

    pub const fn with_drop_reports(mut self, enabled: bool) -> Self {
        self.report_drops = enabled;
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY, DEFAULT_CONSUMER_STACK)
    }
}
