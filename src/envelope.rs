//! Deferred log record.

use crate::template::{Template, FIELD_COUNT};

/// Scheduler tick count (FreeRTOS `TickType_t`).
pub type Ticks = u32;

/// One captured log call: what to print, with which values, and when.
///
/// Plain `Copy` value. It is copied into and out of the channel and owns
/// nothing; the template lives for the whole program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    /// Template to interpolate at render time.
    pub template: &'static Template,
    /// Raw field values, in placeholder order. Unused fields are 0.
    pub fields: [u32; FIELD_COUNT],
    /// Tick count captured at enqueue time.
    pub timestamp: Ticks,
}

impl Envelope {
    /// Filler for unused channel slots.
    pub const EMPTY: Envelope = Envelope {
        template: &Template::EMPTY,
        fields: [0; FIELD_COUNT],
        timestamp: 0,
    };

    #[inline]
    pub const fn new(template: &'static Template, fields: [u32; FIELD_COUNT], timestamp: Ticks) -> Self {
        Self {
            template,
            fields,
            timestamp,
        }
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::EMPTY
    }
}
