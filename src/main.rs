//! RtosDebugLog demo
//!
//! Starts the logger, then lets a few producers log concurrently:
//! - host: worker threads plus a simulated interrupt source, output on stdout
//! - ESP32: a heartbeat task loop, output on UART1 (GPIO6)

#[cfg(target_os = "espidf")]
mod target {
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::uart::UartTxDriver;
    use esp_idf_svc::log::EspLogger;
    use esp_idf_svc::sys;

    use rtos_debug_log::{dlog, open_uart_sink, DebugLog, EspPlatform, LoggerConfig, UartSinkConfig, VERSION};

    static LOG: DebugLog<EspPlatform, UartTxDriver<'static>> = DebugLog::new(EspPlatform::new());

    pub fn main() {
        // Initialize ESP-IDF
        sys::link_patches();
        EspLogger::initialize_default();
        log::info!("{}", VERSION);

        let peripherals = match Peripherals::take() {
            Ok(p) => p,
            Err(e) => {
                log::error!("peripherals unavailable: {:?}", e);
                return;
            }
        };

        let uart = match open_uart_sink(
            peripherals.uart1,
            peripherals.pins.gpio6,
            &UartSinkConfig::default(),
        ) {
            Ok(uart) => uart,
            Err(e) => {
                log::error!("UART open failed: {:?}", e);
                return;
            }
        };

        if let Err(e) = LOG.init_with(&LoggerConfig::default().with_drop_reports(true), uart) {
            log::error!("{}", e);
            return;
        }

        let mut beat = 0u32;
        loop {
            dlog!(LOG, "heartbeat %u, dropped %u\n", beat, LOG.dropped());
            beat = beat.wrapping_add(1);
            unsafe {
                sys::vTaskDelay(1000);
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
mod host {
    use std::thread;
    use std::time::Duration;

    use rtos_debug_log::{
        dlog, dlog_from_isr, DebugLog, IsrContext, LoggerConfig, StdPlatform, StdoutSink, VERSION,
    };

    static LOG: DebugLog<StdPlatform, StdoutSink> = DebugLog::new(StdPlatform::new());

    const WORKERS: u32 = 3;
    const MESSAGES: u32 = 5;

    pub fn main() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        log::info!("{}", VERSION);

        if let Err(e) = LOG.init_with(&LoggerConfig::default().with_drop_reports(true), StdoutSink) {
            log::error!("{}", e);
            return;
        }

        let workers: Vec<_> = (0..WORKERS)
            .map(|worker| {
                thread::spawn(move || {
                    for seq in 0..MESSAGES {
                        dlog!(LOG, "worker %u step %u of %u\n", worker, seq, MESSAGES);
                        thread::sleep(Duration::from_millis(3));
                    }
                })
            })
            .collect();

        let irq = thread::spawn(|| {
            for line in 0..MESSAGES {
                // SAFETY: this thread stands in for an interrupt handler
                let cx = unsafe { IsrContext::new() };
                let _ = dlog_from_isr!(LOG, &cx, "irq line %u level %x\n", line, 0xA5u32);
                thread::sleep(Duration::from_millis(5));
            }
        });

        for worker in workers {
            let _ = worker.join();
        }
        let _ = irq.join();

        // Let the idle-priority consumer catch up before exiting
        while LOG.pending() != 0 {
            thread::sleep(Duration::from_millis(1));
        }
        thread::sleep(Duration::from_millis(20));
        log::info!("done, dropped {}", LOG.dropped());
    }
}

fn main() {
    #[cfg(target_os = "espidf")]
    target::main();
    #[cfg(not(target_os = "espidf"))]
    host::main();
}
