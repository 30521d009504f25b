//! ESP-IDF platform: FreeRTOS services and UART output.
//!
//! The consumer parks on its FreeRTOS task notification, producers give
//! the notification (FromISR variant in interrupt context). Log lines go
//! out on a TX-only UART, by default UART1 on GPIO6.
//!
//! # Hardware Setup
//!
//! ```text
//! ESP32-S3 GPIO6 (TX) ──────▶ USB-UART RX
//!                              └─▶ PC Serial Monitor
//! ```
//!
//! **WARNING**: GPIO6 conflicts with Octal PSRAM. Only use on Quad flash boards!

use core::ffi::c_void;
use core::num::NonZeroU32;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use esp_idf_svc::hal::delay;
use esp_idf_svc::hal::gpio;
use esp_idf_svc::hal::interrupt;
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::task;
use esp_idf_svc::hal::uart::{self, UartTxDriver};
use esp_idf_svc::sys;

use super::{Platform, Sink, TaskBody, TaskSpec};
use crate::context::IsrContext;
use crate::envelope::Ticks;
use crate::error::SpawnError;

/// FreeRTOS `pdPASS`.
const PD_PASS: i32 = 1;

/// FreeRTOS scheduler services.
pub struct EspPlatform {
    consumer: AtomicPtr<sys::tskTaskControlBlock>,
}

impl EspPlatform {
    pub const fn new() -> Self {
        Self {
            consumer: AtomicPtr::new(ptr::null_mut()),
        }
    }

    fn consumer_handle(&self) -> Option<sys::TaskHandle_t> {
        let handle = self.consumer.load(Ordering::Acquire);
        (!handle.is_null()).then_some(handle)
    }
}

impl Default for EspPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for EspPlatform {
    #[inline]
    fn ticks(&self) -> Ticks {
        // SAFETY: plain read of the scheduler tick counter
        unsafe { sys::xTaskGetTickCount() }
    }

    #[inline]
    fn ticks_from_isr(&self, _cx: &IsrContext) -> Ticks {
        // SAFETY: interrupt context proven by `_cx`
        unsafe { sys::xTaskGetTickCountFromISR() }
    }

    #[inline]
    fn in_interrupt(&self) -> bool {
        interrupt::active()
    }

    fn wait_for_wake(&self) {
        let _ = task::wait_notification(delay::BLOCK);
    }

    fn wake(&self) {
        if let Some(handle) = self.consumer_handle() {
            // SAFETY: handle belongs to the consumer task, which never exits
            unsafe {
                task::notify(handle, NonZeroU32::MIN);
            }
        }
    }

    fn wake_from_isr(&self, _cx: &IsrContext) {
        // task::notify picks the FromISR variant when an interrupt is active
        // and leaves the yield decision to the caller.
        self.wake();
    }

    fn yield_now(&self) {
        // A plain taskYIELD would never let a lower-priority initializer run
        // SAFETY: called from task context only
        unsafe { sys::vTaskDelay(1) };
    }

    fn spawn<T: TaskBody>(&self, spec: &TaskSpec, body: &'static T) -> Result<(), SpawnError> {
        extern "C" fn trampoline<T: TaskBody>(arg: *mut c_void) {
            // SAFETY: `arg` is the `&'static T` passed to xTaskCreatePinnedToCore
            let body = unsafe { &*(arg as *const T) };
            body.run();
            // SAFETY: deleting the calling task
            unsafe { sys::vTaskDelete(ptr::null_mut()) };
        }

        let mut handle: sys::TaskHandle_t = ptr::null_mut();
        // SAFETY: name and body live for the whole program
        let created = unsafe {
            sys::xTaskCreatePinnedToCore(
                Some(trampoline::<T>),
                spec.name.as_ptr(),
                spec.stack_size as u32,
                body as *const T as *mut c_void,
                spec.priority,
                &mut handle,
                sys::tskNO_AFFINITY as i32,
            )
        };

        if created != PD_PASS || handle.is_null() {
            return Err(SpawnError);
        }
        self.consumer.store(handle, Ordering::Release);
        Ok(())
    }
}

/// UART configuration for log output.
pub struct UartSinkConfig {
    pub baud_rate: u32,
    pub tx_pin: u8,
}

impl Default for UartSinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            tx_pin: 6,  // GPIO6 - UART TX (Quad flash, GPIO6 free for UART)
        }
    }
}

/// Open a TX-only UART for the consumer.
///
/// `config.tx_pin` documents the wiring; the pin itself is the `tx_pin`
/// peripheral passed in.
pub fn open_uart_sink<'d>(
    uart: impl Peripheral<P = impl uart::Uart> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    config: &UartSinkConfig,
) -> Result<UartTxDriver<'d>, sys::EspError> {
    log::info!("debug log UART: TX GPIO{} @ {} baud", config.tx_pin, config.baud_rate);

    let uart_config = uart::config::Config::default()
        .baudrate(esp_idf_svc::hal::units::Hertz(config.baud_rate));

    UartTxDriver::new(
        uart,
        tx_pin,
        Option::<gpio::AnyIOPin>::None,  // CTS
        Option::<gpio::AnyIOPin>::None,  // RTS
        &uart_config,
    )
}

impl Sink for UartTxDriver<'static> {
    fn write_line(&mut self, line: &[u8]) {
        let mut rest = line;
        while !rest.is_empty() {
            match self.write(rest) {
                Ok(0) | Err(_) => break,
                Ok(n) => rest = &rest[n..],
            }
        }
    }
}
