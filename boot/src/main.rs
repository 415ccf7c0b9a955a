#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), no_main)]

#[cfg(not(test))]
mod init;
mod logger;

use log::error;
use pi::atags::Atags;
use pi::board::Board;
use pi::gpio::{Function, Gpio};
use pi::uart::Uart;
use raspboot::{BootArgs, DirectJump, LoadRegions, Loader, LoaderConfig};

/// Lights the activity LED so a board stuck waiting for the host is
/// distinguishable from one that never got here.
fn activity_led_on(board: &Board) {
    let mut gpio = unsafe { Gpio::new(board.io_base()) };
    gpio.set_function(board.led_gpio(), Function::Output);
    if board.led_active_low() {
        gpio.clear(board.led_gpio());
    } else {
        gpio.set(board.led_gpio());
    }
}

/// Entered from `_start` with the registers the firmware passed. Returns only
/// if the loaded kernel does.
#[no_mangle]
pub extern "C" fn kmain(r0: u32, r1: u32, atags: *const u32) {
    let atags = unsafe { Atags::from_raw(atags) };
    let board = Board::identify(atags.cmdline().unwrap_or(""));
    logger::register_global_logger(board.io_base());
    activity_led_on(&board);

    let config = LoaderConfig::default();
    let args = BootArgs::new(r0, r1, atags);
    let uart = unsafe { Uart::new(board.io_base()) };

    // the layout is checked by `Loader::new` before any region is written
    let regions = unsafe { LoadRegions::from_layout(&config.layout) };
    match unsafe { Loader::new(config, &board, args, uart, DirectJump, regions) } {
        Ok(loader) => {
            loader.run();
        }
        Err(e) => error!("refusing to load: {}", e),
    }
}
