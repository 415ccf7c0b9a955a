use core::fmt::Write;
use core::sync::atomic::{AtomicUsize, Ordering};

use log::{Level, LevelFilter, Metadata, Record};
use pi::uart::Uart;
use spin::Mutex;

/// Shares the UART with the loader's byte channel. Both run on the one
/// core, never at the same time.
static CONSOLE: Mutex<Option<Uart>> = Mutex::new(None);

static IO_BASE: AtomicUsize = AtomicUsize::new(0);

struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Some(uart) = CONSOLE.lock().as_mut() {
                writeln!(uart, "[{}:{}] {}", record.level(), record.target(), record.args()).ok();

                if record.metadata().level() <= Level::Error {
                    uart.flush();
                }
            }
        }
    }

    fn flush(&self) {
        if let Some(uart) = CONSOLE.lock().as_ref() {
            uart.flush();
        }
    }
}

static LOGGER: SimpleLogger = SimpleLogger;

/// Peripheral base of the console, once the logger is registered.
pub fn io_base() -> Option<usize> {
    match IO_BASE.load(Ordering::Relaxed) {
        0 => None,
        base => Some(base),
    }
}

pub fn register_global_logger(io_base: usize) {
    *CONSOLE.lock() = Some(unsafe { Uart::new(io_base) });
    IO_BASE.store(io_base, Ordering::Relaxed);

    unsafe { log::set_logger_racy(&LOGGER) }.map(|()| log::set_max_level(LevelFilter::Trace)).ok();
}
