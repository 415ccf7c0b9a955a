/// Every ATAG starts with this header. `size` counts 32-bit words and
/// includes the header itself.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct Header {
    pub size: u32,
    pub tag: u32,
}

impl Header {
    pub const NONE: u32 = 0x0000_0000;
    pub const CORE: u32 = 0x5441_0001;
    pub const MEM: u32 = 0x5441_0002;
    pub const SERIAL: u32 = 0x5441_0006;
    pub const REVISION: u32 = 0x5441_0007;
    pub const CMDLINE: u32 = 0x5441_0009;

    /// Size of the header in words.
    pub const WORDS: usize = 2;
}

/// A `CORE` ATAG.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Core {
    pub flags: u32,
    pub page_size: u32,
    pub root_dev: u32,
}

/// A `MEM` ATAG.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Mem {
    pub size: u32,
    pub start: u32,
}

/// A `SERIAL` ATAG.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Serial {
    pub low: u32,
    pub high: u32,
}

/// Flattened device tree magic (`0xd00dfeed`) as seen by a little-endian
/// word read. The firmware may hand over a device tree instead of ATAGs.
pub const FDT_MAGIC_LE: u32 = 0xedfe_0dd0;
