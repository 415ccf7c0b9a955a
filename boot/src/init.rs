use core::arch::{asm, global_asm};
use core::fmt::Write;
use core::panic::PanicInfo;

use pi::uart::Uart;

use crate::logger;

// The firmware loads us at 0x8000 and enters here with r0-r2 holding the
// boot arguments. That is also where the kernel must go, so the first job is
// moving out of the way. Until `kmain` is reached nothing may touch r0-r2 and
// everything must be position independent.
global_asm!(
    r#"
.section .text.boot
.globl _start
_start:
    @ stack grows down from the loader
    ldr sp, =__loader_start

    @ copy [0x8000, 0x8000 + image size) to the link address
    mov r3, #0x8000
    ldr r4, =__loader_start
    ldr r5, =_data_end
1:
    ldmia r3!, {{r6-r9}}
    stmia r4!, {{r6-r9}}
    cmp r4, r5
    blo 1b

    ldr r3, =__bss_start
    ldr r4, =__bss_end
    mov r5, #0
2:
    cmp r3, r4
    strlo r5, [r3], #4
    blo 2b

    @ absolute address: continues in the relocated copy
    ldr r3, =kmain
    blx r3

3:
    wfe
    b 3b

.ltorg
"#
);

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    if let Some(io_base) = logger::io_base() {
        let mut uart = unsafe { Uart::new(io_base) };
        writeln!(uart, "\n---------- PANIC ----------\n{}", info).ok();
        uart.flush();
    }

    loop {
        unsafe { asm!("wfe") };
    }
}
