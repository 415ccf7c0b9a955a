/// Offset of the `GPIO` registers from the peripheral base.
pub const GPIO_OFFSET: usize = 0x20_0000;

/// Offset of the PL011 `UART0` registers from the peripheral base.
pub const UART0_OFFSET: usize = 0x20_1000;

/// Burns roughly `cycles` iterations without touching memory.
///
/// Used where the peripheral documentation asks for a delay measured in
/// cycles, and as the crude delay before halting.
#[inline(never)]
pub fn spin_cycles(cycles: u32) {
    for _ in 0..cycles {
        core::hint::spin_loop();
    }
}

/// Generates a compile time size check for a register block.
#[macro_export]
macro_rules! const_assert_size {
    ($expr:ty, $size:expr) => {
        const _: () = assert!(core::mem::size_of::<$expr>() == $size);
    };
}
