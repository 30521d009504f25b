//! # RtosDebugLog
//!
//! Deferred-formatting debug log for preemptive RTOS targets.
//!
//! ## Architecture
//!
//! Every log call flows through one [`BoundedChannel`]:
//! - Producers (tasks and interrupt handlers) capture a template reference,
//!   three numbers and a tick count, then enqueue without blocking
//! - One [`Consumer`] task at idle + 1 priority renders
//!   `[<ticks>] <message>\n` and is the only writer to the output device
//! - A full channel drops the newest message; nothing ever stalls a caller
//!
//! ## Example
//!
//! ```no_run
//! use rtos_debug_log::{dlog, DebugLog, StdPlatform, StdoutSink};
//!
//! static LOG: DebugLog<StdPlatform, StdoutSink> = DebugLog::new(StdPlatform::new());
//!
//! LOG.init(32, 4096, StdoutSink).expect("debug log init");
//! dlog!(LOG, "sensor %u reads %d\n", 3, -12i32);
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod channel;
pub mod config;
pub mod consumer;
pub mod context;
pub mod envelope;
pub mod error;
pub mod logger;
pub mod platform;
pub mod render;
pub mod template;

pub use channel::{BoundedChannel, SendOutcome};
pub use config::LoggerConfig;
pub use consumer::Consumer;
pub use context::IsrContext;
pub use envelope::{Envelope, Ticks};
pub use error::{InitError, SpawnError, TemplateError};
pub use logger::DebugLog;
pub use platform::{Platform, Sink, TaskBody, TaskSpec};
pub use template::Template;

#[cfg(feature = "std")]
pub use platform::{StdPlatform, StdoutSink};
#[cfg(target_os = "espidf")]
pub use platform::{open_uart_sink, EspPlatform, UartSinkConfig};

/// Version string (set by build.rs, includes git hash)
pub const VERSION: &str = env!("VERSION_STRING");
