use volatile::{ReadOnly, Volatile};

use crate::common::{spin_cycles, GPIO_OFFSET};
use crate::const_assert_size;

/// An alternative GPIO function.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Function {
    Input = 0b000,
    Output = 0b001,
    Alt0 = 0b100,
}

/// Pull-up/down control values for `GPPUD`.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pull {
    Off = 0b00,
}

#[repr(C)]
#[allow(non_snake_case, dead_code)]
struct Registers {
    FSEL: [Volatile<u32>; 6],
    __r0: u32,
    SET: [Volatile<u32>; 2],
    __r1: u32,
    CLR: [Volatile<u32>; 2],
    __r2: u32,
    LEV: [ReadOnly<u32>; 2],
    __r3: u32,
    EDS: [Volatile<u32>; 2],
    __r4: u32,
    REN: [Volatile<u32>; 2],
    __r5: u32,
    FEN: [Volatile<u32>; 2],
    __r6: u32,
    HEN: [Volatile<u32>; 2],
    __r7: u32,
    LEN: [Volatile<u32>; 2],
    __r8: u32,
    AREN: [Volatile<u32>; 2],
    __r9: u32,
    AFEN: [Volatile<u32>; 2],
    __r10: u32,
    PUD: Volatile<u32>,
    PUDCLK: [Volatile<u32>; 2],
}

const_assert_size!(Registers, 0xA0);

/// The GPIO block of one board.
pub struct Gpio {
    registers: &'static mut Registers,
}

impl Gpio {
    /// # Safety
    ///
    /// `io_base` must be the peripheral base of the running board, and the
    /// caller must not create overlapping handles that are used concurrently.
    pub unsafe fn new(io_base: usize) -> Gpio {
        Gpio { registers: &mut *((io_base + GPIO_OFFSET) as *mut Registers) }
    }

    /// Selects `function` for `pin` (0..=53).
    pub fn set_function(&mut self, pin: u8, function: Function) {
        let reg = (pin / 10) as usize;
        let shift = (pin % 10) as u32 * 3;
        let value = self.registers.FSEL[reg].read();
        let value = (value & !(0b111 << shift)) | ((function as u32) << shift);
        self.registers.FSEL[reg].write(value);
    }

    /// Applies `pull` to every pin set in `pins`, which covers pins 0..=31.
    ///
    /// Follows the documented sequence: set the control, wait 150 cycles,
    /// clock it into the pins, wait again, remove the clock.
    pub fn set_pull(&mut self, pins: u32, pull: Pull) {
        self.registers.PUD.write(pull as u32);
        spin_cycles(150);
        self.registers.PUDCLK[0].write(pins);
        spin_cycles(150);
        self.registers.PUD.write(Pull::Off as u32);
        self.registers.PUDCLK[0].write(0);
    }

    pub fn set(&mut self, pin: u8) {
        self.registers.SET[(pin / 32) as usize].write(1 << (pin % 32));
    }

    pub fn clear(&mut self, pin: u8) {
        self.registers.CLR[(pin / 32) as usize].write(1 << (pin % 32));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A zeroed stand-in for the peripheral window, and the `io_base` that
    /// maps the GPIO block onto it.
    fn fake_block() -> (Vec<u32>, usize) {
        let mut words = vec![0u32; 0xA0 / 4];
        let io_base = (words.as_mut_ptr() as usize).wrapping_sub(GPIO_OFFSET);
        (words, io_base)
    }

    #[test]
    fn function_select_touches_only_its_pin() {
        let (words, io_base) = fake_block();
        let mut gpio = unsafe { Gpio::new(io_base) };

        gpio.set_function(14, Function::Alt0);
        gpio.set_function(15, Function::Alt0);
        gpio.set_function(47, Function::Output);
        gpio.set_function(14, Function::Input);

        assert_eq!(words[1], 0b100 << 15);
        assert_eq!(words[4], 0b001 << 21);
    }

    #[test]
    fn set_and_clear_pick_the_bank() {
        let (words, io_base) = fake_block();
        let mut gpio = unsafe { Gpio::new(io_base) };

        gpio.set(47);
        gpio.clear(16);

        assert_eq!(words[0x1C / 4 + 1], 1 << 15);
        assert_eq!(words[0x28 / 4], 1 << 16);
    }

    #[test]
    fn pull_sequence_leaves_control_cleared() {
        let (words, io_base) = fake_block();
        let mut gpio = unsafe { Gpio::new(io_base) };

        gpio.set_pull(1 << 14, Pull::Off);

        assert_eq!(words[0x94 / 4], 0);
        assert_eq!(words[0x98 / 4], 0);
    }
}
