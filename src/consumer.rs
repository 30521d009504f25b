//! The renderer task: sole owner of the output device.
//!
//! # Contract
//!
//! "I wait, I render, I write. Nobody else touches the sink."
//!
//! Exactly one [`Consumer`] exists per [`DebugLog`]: it is created by
//! moving the sink out of the logger, which can happen once. Lines are
//! therefore written by one execution context only and never interleave,
//! however many producers race on the channel.
//!
//! # Example
//!
//! ```ignore
//! // Normally the spawned task does this; tests drive it by hand.
//! let mut consumer = LOG.claim_consumer().unwrap();
//! loop {
//!     consumer.step(); // wait → render → emit
//! }
//! ```

use crate::config::RENDER_BUFFER_LEN;
use crate::envelope::Envelope;
use crate::logger::DebugLog;
use crate::platform::{Platform, Sink};
use crate::render::render_line;
use crate::template::Template;

/// Emitted after overload when drop reports are enabled.
static DROP_NOTICE: Template = Template::new("dropped %u messages\n");

/// Consumer/renderer for one logger.
pub struct Consumer<'a, P: Platform, S: Sink, const N: usize> {
    log: &'a DebugLog<P, S, N>,
    sink: S,
    line: [u8; RENDER_BUFFER_LEN],
    /// Drop counter value already reported.
    reported_drops: u32,
}

impl<'a, P: Platform, S: Sink, const N: usize> Consumer<'a, P, S, N> {
    pub(crate) fn new(log: &'a DebugLog<P, S, N>, sink: S) -> Self {
        Self {
            log,
            sink,
            line: [0; RENDER_BUFFER_LEN],
            reported_drops: 0,
        }
    }

    /// Render and write one envelope if one is pending.
    ///
    /// On an empty channel the consumer is registered as waiting (the next
    /// accepted send will wake it) and `false` is returned.
    pub fn try_step(&mut self) -> bool {
        match self.log.channel().receive_or_park() {
            Some(envelope) => {
                self.write_envelope(&envelope);
                true
            }
            None => false,
        }
    }

    /// Wait for one envelope, render it and write it.
    pub fn step(&mut self) {
        let log = self.log;
        let envelope = log.channel().receive(|| log.platform().wait_for_wake());
        self.write_envelope(&envelope);
    }

    /// Write everything currently pending without blocking.
    ///
    /// Returns the number of envelopes rendered.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while self.try_step() {
            count += 1;
        }
        count
    }

    /// Task loop. Never returns.
    pub fn run(mut self) -> ! {
        loop {
            self.step();
        }
    }

    fn write_envelope(&mut self, envelope: &Envelope) {
        self.emit(envelope);
        self.report_drops();
    }

    fn emit(&mut self, envelope: &Envelope) {
        let len = render_line(envelope, &mut self.line);
        self.sink.write_line(&self.line[..len]);
    }

    fn report_drops(&mut self) {
        if !self.log.reports_drops() {
            return;
        }
        let total = self.log.dropped();
        let missed = total.wrapping_sub(self.reported_drops);
        if missed == 0 {
            return;
        }
        self.reported_drops = total;

        let notice = Envelope::new(&DROP_NOTICE, [missed, 0, 0], self.log.platform().ticks());
        self.emit(&notice);
    }
}
