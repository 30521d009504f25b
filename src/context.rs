//! Execution-context capability for interrupt handlers.
//!
//! [`DebugLog::log_from_interrupt`](crate::DebugLog::log_from_interrupt)
//! takes an [`IsrContext`]. Holding one proves the caller runs in an
//! interrupt handler, so only interrupt-safe primitives (FromISR tick
//! read, FromISR notify) are used on that path.

use core::marker::PhantomData;

/// Proof of running inside an interrupt handler.
///
/// Not `Send`/`Sync`: the token cannot leave the handler that created it.
pub struct IsrContext {
    _not_send: PhantomData<*const ()>,
}

impl IsrContext {
    /// Create a token without checking.
    ///
    /// # Safety
    ///
    /// Caller must be executing in interrupt context for the whole
    /// lifetime of the token.
    #[inline]
    pub unsafe fn new() -> Self {
        Self {
            _not_send: PhantomData,
        }
    }

    /// Create a token if the CPU is currently servicing an interrupt.
    #[cfg(target_os = "espidf")]
    #[inline]
    pub fn current() -> Option<Self> {
        if esp_idf_svc::hal::interrupt::active() {
            // SAFETY: checked above
            Some(unsafe { Self::new() })
        } else {
            None
        }
    }
}
