use core::fmt;

use volatile::{ReadOnly, Volatile};

use crate::common::UART0_OFFSET;
use crate::const_assert_size;
use crate::gpio::{Function, Gpio, Pull};

/// `UARTCLK` as configured by the firmware.
const UART_CLOCK_HZ: u32 = 3_000_000;

/// The serial line speed the host side expects.
pub const BAUD_RATE: u32 = 115_200;

/// Bit fields of the `FR` register.
#[repr(u32)]
enum FlagStatus {
    Busy = 1 << 3,
    RxEmpty = 1 << 4,
    TxFull = 1 << 5,
}

#[repr(C)]
#[allow(non_snake_case, dead_code)]
struct Registers {
    DR: Volatile<u32>,
    RSRECR: Volatile<u32>,
    __r0: [u32; 4],
    FR: ReadOnly<u32>,
    __r1: u32,
    ILPR: Volatile<u32>,
    IBRD: Volatile<u32>,
    FBRD: Volatile<u32>,
    LCRH: Volatile<u32>,
    CR: Volatile<u32>,
    IFLS: Volatile<u32>,
    IMSC: Volatile<u32>,
    RIS: ReadOnly<u32>,
    MIS: ReadOnly<u32>,
    ICR: Volatile<u32>,
}

const_assert_size!(Registers, 0x48);

/// Integer and fractional baud divisors for `baud` at `clock` Hz, rounded
/// to the nearest 1/64th.
pub const fn baud_divisors(clock: u32, baud: u32) -> (u32, u32) {
    // divisor * 64 is clock * 4 / baud; work at twice that and halve to round
    let scaled = ((clock as u64 * 8 / baud as u64) + 1) / 2;
    ((scaled >> 6) as u32, (scaled & 0x3f) as u32)
}

/// The PL011 `UART0` of the Raspberry Pi, the loader's only link to the host.
pub struct Uart {
    registers: &'static mut Registers,
    io_base: usize,
}

impl Uart {
    /// Returns a handle to the UART of the board whose peripherals live at
    /// `io_base`. The hardware is left as the firmware configured it; call
    /// `initialize()` to set it up for the boot protocol.
    ///
    /// # Safety
    ///
    /// `io_base` must be the peripheral base of the running board.
    pub unsafe fn new(io_base: usize) -> Uart {
        Uart {
            registers: &mut *((io_base + UART0_OFFSET) as *mut Registers),
            io_base,
        }
    }

    /// Disables the UART, routes GPIO 14/15 to it with pulls disabled,
    /// clears pending interrupts, programs 115200 baud 8N1 with FIFOs and
    /// enables transmitter and receiver.
    pub fn initialize(&mut self) {
        self.registers.CR.write(0);

        let mut gpio = unsafe { Gpio::new(self.io_base) };
        gpio.set_pull((1 << 14) | (1 << 15), Pull::Off);
        gpio.set_function(14, Function::Alt0);
        gpio.set_function(15, Function::Alt0);

        self.registers.ICR.write(0x7FF);

        let (integer, fraction) = baud_divisors(UART_CLOCK_HZ, BAUD_RATE);
        self.registers.IBRD.write(integer);
        self.registers.FBRD.write(fraction);

        // FIFO enable, 8 bit words
        self.registers.LCRH.write((1 << 4) | (1 << 5) | (1 << 6));
        // no interrupt sources, this loader polls
        self.registers.IMSC.write(0);
        // UART enable, TX enable, RX enable
        self.registers.CR.write((1 << 0) | (1 << 8) | (1 << 9));
    }

    pub fn can_send(&self) -> bool {
        self.registers.FR.read() & (FlagStatus::TxFull as u32) == 0
    }

    /// Returns `true` if there is at least one byte ready to be read. If this
    /// method returns `true`, a subsequent call to `read_byte` is guaranteed to
    /// return immediately. This method does not block.
    pub fn has_byte(&self) -> bool {
        self.registers.FR.read() & (FlagStatus::RxEmpty as u32) == 0
    }

    /// Write the byte `byte`. This method blocks until there is space available
    /// in the output FIFO.
    pub fn write_byte(&mut self, byte: u8) {
        while !self.can_send() {}
        self.registers.DR.write(byte as u32);
    }

    /// Reads a byte. Blocks indefinitely until a byte is ready to be read.
    pub fn read_byte(&mut self) -> u8 {
        while !self.has_byte() {}
        (self.registers.DR.read() & 0xFF) as u8
    }

    /// Blocks until the transmitter has shifted out everything queued.
    pub fn flush(&self) {
        while self.registers.FR.read() & (FlagStatus::Busy as u32) != 0 {}
    }
}

impl fmt::Write for Uart {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.as_bytes().iter() {
            if *byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(*byte);
        }
        Ok(())
    }
}
