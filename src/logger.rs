//! Logger context: lifecycle and producer entry points.
//!
//! # Architecture
//!
//! ```text
//! Task / ISR               DebugLog                  Consumer task
//! ──────────               ────────                  ─────────────
//!
//! dlog!() ─────▶ capture ticks + fields ─▶ channel ─▶ render ─▶ Sink
//! O(1)           no formatting here        drop-on-full  idle + 1 priority
//! non-blocking
//! ```
//!
//! # Rules
//!
//! - Producers never block, never allocate, never fail visibly.
//! - Interrupt handlers use [`DebugLog::log_from_interrupt`] only; it
//!   requires an [`IsrContext`].
//! - Formatting happens in the consumer task, never in the caller.
//!
//! # Usage
//!
//! ```ignore
//! static LOG: DebugLog<EspPlatform, UartTxDriver<'static>> = DebugLog::new(EspPlatform::new());
//!
//! LOG.init(32, 3072, uart)?;
//! dlog!(LOG, "button %u pressed\n", pin);
//! ```

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use critical_section::Mutex;

use crate::channel::{BoundedChannel, SendOutcome};
use crate::config::{
    LoggerConfig, CONSUMER_PRIORITY, CONSUMER_TASK_NAME, DEFAULT_QUEUE_CAPACITY,
};
use crate::consumer::Consumer;
use crate::context::IsrContext;
use crate::envelope::Envelope;
use crate::error::InitError;
use crate::platform::{Platform, Sink, TaskBody, TaskSpec};
use crate::template::Template;

const UNINIT: u8 = 0;
const STARTING: u8 = 1;
const READY: u8 = 2;

/// Deferred-formatting debug log.
///
/// One instance owns one channel and, after [`init`](Self::init), one
/// consumer task. It is meant to live in a `static`.
pub struct DebugLog<P, S, const N: usize = DEFAULT_QUEUE_CAPACITY> {
    platform: P,
    channel: BoundedChannel<N>,
    state: AtomicU8,
    report_drops: AtomicBool,
    /// Sink waiting to be moved into the consumer.
    sink: Mutex<RefCell<Option<S>>>,
}

impl<P, S, const N: usize> DebugLog<P, S, N> {
    /// Create an uninitialized logger. Producer calls are ignored until
    /// [`init`](Self::init) succeeds.
    pub const fn new(platform: P) -> Self {
        Self {
            platform,
            channel: BoundedChannel::new(),
            state: AtomicU8::new(UNINIT),
            report_drops: AtomicBool::new(false),
            sink: Mutex::new(RefCell::new(None)),
        }
    }
}

impl<P: Platform, S: Sink, const N: usize> DebugLog<P, S, N> {
    /// Bring the logger up: size the channel, hand `sink` to a new
    /// consumer task running at idle + 1.
    ///
    /// Idempotent: once initialized this returns `Ok(())` and drops `sink`
    /// unused. A call racing an init in progress waits for it; if that
    /// init fails, this call attempts its own.
    pub fn init(
        &'static self,
        queue_capacity: usize,
        consumer_stack: usize,
        sink: S,
    ) -> Result<(), InitError>
    where
        P: 'static,
        S: 'static,
    {
        self.init_with(&LoggerConfig::new(queue_capacity, consumer_stack), sink)
    }

    /// [`init`](Self::init) with the full configuration.
    pub fn init_with(&'static self, config: &LoggerConfig, sink: S) -> Result<(), InitError>
    where
        P: 'static,
        S: 'static,
    {
        loop {
            match self
                .state
                .compare_exchange(UNINIT, STARTING, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => break,
                Err(READY) => {
                    log::debug!("debug log already initialized");
                    return Ok(());
                }
                // Another context is mid-init: wait for its outcome, retry if it failed
                Err(_) => self.platform.yield_now(),
            }
        }

        if !self.channel.set_capacity(config.queue_capacity) {
            self.state.store(UNINIT, Ordering::Release);
            let e = InitError::InvalidCapacity {
                requested: config.queue_capacity,
                max: N,
            };
            log::error!("debug log init failed: {}", e);
            return Err(e);
        }
        self.report_drops.store(config.report_drops, Ordering::Relaxed);

        critical_section::with(|cs| {
            self.sink.borrow_ref_mut(cs).replace(sink);
        });

        let spec = TaskSpec {
            name: CONSUMER_TASK_NAME,
            stack_size: config.consumer_stack,
            priority: CONSUMER_PRIORITY,
        };
        if self.platform.spawn(&spec, self).is_err() {
            critical_section::with(|cs| self.sink.borrow_ref_mut(cs).take());
            self.state.store(UNINIT, Ordering::Release);
            log::error!("debug log init failed: {}", InitError::SpawnFailed);
            return Err(InitError::SpawnFailed);
        }

        self.state.store(READY, Ordering::Release);
        log::info!(
            "debug log ready: capacity={}, stack={}B, priority={}",
            config.queue_capacity,
            config.consumer_stack,
            CONSUMER_PRIORITY
        );
        Ok(())
    }

    /// Check if producer calls are accepted.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.state.load(Ordering::Acquire) == READY
    }

    /// Log from task context.
    ///
    /// Captures the tick count and the three fields, then enqueues without
    /// blocking. Silently dropped when uninitialized, when the channel is
    /// full, or when called from an interrupt handler.
    #[inline]
    pub fn log(&self, template: &'static Template, d1: u32, d2: u32, d3: u32) {
        if !self.is_initialized() || self.platform.in_interrupt() {
            return;
        }

        let envelope = Envelope::new(template, [d1, d2, d3], self.platform.ticks());
        if self.channel.try_send(envelope).wakes_consumer() {
            self.platform.wake();
        }
    }

    /// Log from interrupt context.
    ///
    /// Same contract as [`log`](Self::log). Returns `true` when the
    /// consumer was parked and has been notified: the handler should
    /// request a context switch on exit. A dropped message returns `false`.
    #[inline]
    pub fn log_from_interrupt(
        &self,
        cx: &IsrContext,
        template: &'static Template,
        d1: u32,
        d2: u32,
        d3: u32,
    ) -> bool {
        if !self.is_initialized() {
            return false;
        }

        let envelope = Envelope::new(template, [d1, d2, d3], self.platform.ticks_from_isr(cx));
        match self.channel.try_send(envelope) {
            SendOutcome::Queued { consumer_was_waiting: true } => {
                self.platform.wake_from_isr(cx);
                true
            }
            _ => false,
        }
    }

    /// Take the one consumer for this logger.
    ///
    /// The spawned task calls this; it returns `None` if the sink has
    /// already been claimed or `init` has not run.
    pub fn claim_consumer(&self) -> Option<Consumer<'_, P, S, N>> {
        let sink = critical_section::with(|cs| self.sink.borrow_ref_mut(cs).take())?;
        Some(Consumer::new(self, sink))
    }

    /// Total messages dropped on a full channel.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.channel.dropped()
    }

    /// Envelopes waiting to be rendered.
    #[inline]
    pub fn pending(&self) -> usize {
        self.channel.pending()
    }

    /// Usable channel capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.channel.capacity()
    }

    #[inline]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    #[inline]
    pub(crate) fn channel(&self) -> &BoundedChannel<N> {
        &self.channel
    }

    #[inline]
    pub(crate) fn reports_drops(&self) -> bool {
        self.report_drops.load(Ordering::Relaxed)
    }
}

impl<P, S, const N: usize> TaskBody for DebugLog<P, S, N>
where
    P: Platform + 'static,
    S: Sink + 'static,
{
    fn run(&'static self) {
        match self.claim_consumer() {
            Some(consumer) => consumer.run(),
            None => log::warn!("debug consumer started without a sink"),
        }
    }
}

/// Log from task context with a compile-time checked template.
///
/// Defines the template in a `static`, checks that the number of
/// arguments equals the number of placeholders, zero-fills the rest.
///
/// # Example
///
/// ```ignore
/// dlog!(LOG, "x=%u y=%u\n", x, y);
/// ```
#[macro_export]
macro_rules! dlog {
    (@emit $log:expr, $fmt:literal, $n:literal, [$a:expr, $b:expr, $c:expr]) => {{
        const TEMPLATE: $crate::Template = $crate::Template::new($fmt);
        const _: () = assert!(
            TEMPLATE.placeholders() == $n,
            "argument count does not match template placeholders"
        );
        static DESCRIPTOR: $crate::Template = TEMPLATE;
        $log.log(&DESCRIPTOR, $a, $b, $c)
    }};
    ($log:expr, $fmt:literal $(,)?) => {
        $crate::dlog!(@emit $log, $fmt, 0, [0, 0, 0])
    };
    ($log:expr, $fmt:literal, $a:expr $(,)?) => {
        $crate::dlog!(@emit $log, $fmt, 1, [($a) as u32, 0, 0])
    };
    ($log:expr, $fmt:literal, $a:expr, $b:expr $(,)?) => {
        $crate::dlog!(@emit $log, $fmt, 2, [($a) as u32, ($b) as u32, 0])
    };
    ($log:expr, $fmt:literal, $a:expr, $b:expr, $c:expr $(,)?) => {
        $crate::dlog!(@emit $log, $fmt, 3, [($a) as u32, ($b) as u32, ($c) as u32])
    };
}

/// Log from interrupt context; evaluates to the reschedule hint.
///
/// # Example
///
/// ```ignore
/// let yield_needed = dlog_from_isr!(LOG, &cx, "irq %u\n", source);
/// ```
#[macro_export]
macro_rules! dlog_from_isr {
    (@emit $log:expr, $cx:expr, $fmt:literal, $n:literal, [$a:expr, $b:expr, $c:expr]) => {{
        const TEMPLATE: $crate::Template = $crate::Template::new($fmt);
        const _: () = assert!(
            TEMPLATE.placeholders() == $n,
            "argument count does not match template placeholders"
        );
        static DESCRIPTOR: $crate::Template = TEMPLATE;
        $log.log_from_interrupt($cx, &DESCRIPTOR, $a, $b, $c)
    }};
    ($log:expr, $cx:expr, $fmt:literal $(,)?) => {
        $crate::dlog_from_isr!(@emit $log, $cx, $fmt, 0, [0, 0, 0])
    };
    ($log:expr, $cx:expr, $fmt:literal, $a:expr $(,)?) => {
        $crate::dlog_from_isr!(@emit $log, $cx, $fmt, 1, [($a) as u32, 0, 0])
    };
    ($log:expr, $cx:expr, $fmt:literal, $a:expr, $b:expr $(,)?) => {
        $crate::dlog_from_isr!(@emit $log, $cx, $fmt, 2, [($a) as u32, ($b) as u32, 0])
    };
    ($log:expr, $cx:expr, $fmt:literal, $a:expr, $b:expr, $c:expr $(,)?) => {
        $crate::dlog_from_isr!(@emit $log, $cx, $fmt, 3, [($a) as u32, ($b) as u32, ($c) as u32])
    };
}
