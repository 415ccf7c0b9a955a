use core::alloc::Layout;
use core::fmt;
use core::mem;

use crate::util::align_up;

/// Errors returned by [`BumpArena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    #[error("arena exhausted: requested {requested} bytes (align {align}), {remaining} left")]
    Exhausted {
        requested: usize,
        align: usize,
        remaining: usize,
    },
}

/// A "bump" arena: allocates memory by bumping a cursor through a fixed
/// region; never frees.
///
/// Values placed in the arena are never dropped. Every allocation is bounds
/// checked against the region, so exhaustion is an error rather than a write
/// past the end of the region.
pub struct BumpArena<'a> {
    free: &'a mut [u8],
    capacity: usize,
}

impl<'a> BumpArena<'a> {
    /// Creates an arena that hands out memory from `region`.
    pub fn new(region: &'a mut [u8]) -> Self {
        let capacity = region.len();
        BumpArena { free: region, capacity }
    }

    /// Bytes handed out so far, including alignment padding.
    pub fn used(&self) -> usize {
        self.capacity - self.free.len()
    }

    pub fn remaining(&self) -> usize {
        self.free.len()
    }

    /// Carves a block matching `layout` out of the arena. The block is zeroed.
    pub fn alloc_layout(&mut self, layout: Layout) -> Result<&'a mut [u8], ArenaError> {
        let start = self.free.as_ptr() as usize;
        let pad = align_up(start, layout.align()) - start;

        let needed = match pad.checked_add(layout.size()) {
            Some(needed) if needed <= self.free.len() => needed,
            _ => {
                return Err(ArenaError::Exhausted {
                    requested: layout.size(),
                    align: layout.align(),
                    remaining: self.free.len(),
                });
            }
        };

        let free = mem::take(&mut self.free);
        let (taken, rest) = free.split_at_mut(needed);
        self.free = rest;

        let block = &mut taken[pad..];
        for byte in block.iter_mut() {
            *byte = 0;
        }
        Ok(block)
    }

    /// Moves `value` into the arena and returns a reference to it that lives
    /// as long as the backing region.
    pub fn alloc<T>(&mut self, value: T) -> Result<&'a mut T, ArenaError> {
        let block = self.alloc_layout(Layout::new::<T>())?;
        let ptr = block.as_mut_ptr() as *mut T;
        unsafe {
            // `block` is exclusively ours, sized and aligned for `T`.
            ptr.write(value);
            Ok(&mut *ptr)
        }
    }

    /// Like [`BumpArena::alloc`], but only builds the value once space for it
    /// has been reserved.
    pub fn alloc_with<T, F: FnOnce() -> T>(&mut self, f: F) -> Result<&'a mut T, ArenaError> {
        let block = self.alloc_layout(Layout::new::<T>())?;
        let ptr = block.as_mut_ptr() as *mut T;
        unsafe {
            ptr.write(f());
            Ok(&mut *ptr)
        }
    }
}

impl fmt::Debug for BumpArena<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BumpArena")
            .field("base", &(self.free.as_ptr() as usize - self.used()))
            .field("capacity", &self.capacity)
            .field("used", &self.used())
            .finish()
    }
}
