use core::str;

use crate::atags::raw;

pub use crate::atags::raw::{Core, Mem, Serial};

/// An ATAG.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Atag<'a> {
    Core(raw::Core),
    Mem(raw::Mem),
    Serial(raw::Serial),
    Revision(u32),
    Cmd(&'a str),
    Unknown(u32),
}

impl<'a> Atag<'a> {
    /// Returns `Some` if this is a `Core` ATAG. Otherwise returns `None`.
    pub fn core(self) -> Option<Core> {
        match self {
            Atag::Core(core) => Some(core),
            _ => None,
        }
    }

    /// Returns `Some` if this is a `Mem` ATAG. Otherwise returns `None`.
    pub fn mem(self) -> Option<Mem> {
        match self {
            Atag::Mem(mem) => Some(mem),
            _ => None,
        }
    }

    /// Returns `Some` with the command line string if this is a `Cmd` ATAG.
    /// Otherwise returns `None`.
    pub fn cmd(self) -> Option<&'a str> {
        match self {
            Atag::Cmd(cmd) => Some(cmd),
            _ => None,
        }
    }

    /// Decodes one tag from its header and the payload words following it.
    pub(crate) fn parse(tag: u32, payload: &'a [u32]) -> Atag<'a> {
        match tag {
            raw::Header::CORE if payload.len() >= 3 => Atag::Core(raw::Core {
                flags: payload[0],
                page_size: payload[1],
                root_dev: payload[2],
            }),
            raw::Header::MEM if payload.len() >= 2 => {
                Atag::Mem(raw::Mem { size: payload[0], start: payload[1] })
            }
            raw::Header::SERIAL if payload.len() >= 2 => {
                Atag::Serial(raw::Serial { low: payload[0], high: payload[1] })
            }
            raw::Header::REVISION if !payload.is_empty() => Atag::Revision(payload[0]),
            raw::Header::CMDLINE => Atag::Cmd(cmdline_str(payload)),
            id => Atag::Unknown(id),
        }
    }
}

/// The command line is a NUL terminated string padded out to whole words.
/// Anything that is not valid UTF-8 truncates it.
fn cmdline_str(payload: &[u32]) -> &str {
    let bytes = unsafe {
        core::slice::from_raw_parts(payload.as_ptr() as *const u8, payload.len() * 4)
    };

    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    match str::from_utf8(&bytes[..len]) {
        Ok(s) => s,
        Err(e) => str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
    }
}
