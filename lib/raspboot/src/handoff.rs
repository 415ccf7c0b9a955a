//! Transfer of control to the loaded image.

use core::mem;
use core::sync::atomic::{fence, Ordering};

use pi::atags::Atags;

/// Calling convention of a kernel entry point: `r0`, `r1` and the ATAG
/// pointer in `r2`, exactly as the firmware passed them to us.
pub type KernelEntry = extern "C" fn(r0: u32, r1: u32, atags: *const u32);

/// The three values the loader itself was entered with.
#[derive(Copy, Clone, Debug)]
pub struct BootArgs<'a> {
    pub r0: u32,
    pub r1: u32,
    pub atags: Atags<'a>,
}

impl<'a> BootArgs<'a> {
    pub fn new(r0: u32, r1: u32, atags: Atags<'a>) -> BootArgs<'a> {
        BootArgs { r0, r1, atags }
    }
}

/// Enters a loaded image.
pub trait Handoff {
    /// Calls the code at `entry` with `args`. Returns only if the image does.
    ///
    /// # Safety
    ///
    /// `entry` must be the address of a complete image that follows the
    /// `KernelEntry` calling convention.
    unsafe fn enter(&mut self, entry: usize, args: &BootArgs<'_>);
}

impl<H: Handoff + ?Sized> Handoff for &mut H {
    unsafe fn enter(&mut self, entry: usize, args: &BootArgs<'_>) {
        (**self).enter(entry, args)
    }
}

/// Jumps to the image with a plain function call.
#[derive(Copy, Clone, Debug, Default)]
pub struct DirectJump;

impl Handoff for DirectJump {
    unsafe fn enter(&mut self, entry: usize, args: &BootArgs<'_>) {
        // the image was written with ordinary stores; they must land first
        fence(Ordering::SeqCst);
        let kernel: KernelEntry = mem::transmute(entry);
        kernel(args.r0, args.r1, args.atags.as_ptr());
    }
}
