#![cfg_attr(not(test), no_std)]

//! Serial chainloading for the Raspberry Pi.
//!
//! The loader asks a host for a zlib compressed kernel over a byte channel,
//! stages it, inflates it to the kernel load address and jumps to it. See
//! [`loader::Loader`] for the state machine and [`protocol`] for the bytes
//! on the wire.

pub mod channel;
pub mod decoder;
pub mod handoff;
pub mod layout;
pub mod loader;
pub mod protocol;

pub use channel::ByteChannel;
pub use decoder::{DecodeError, ImageDecoder};
pub use handoff::{BootArgs, DirectJump, Handoff};
pub use layout::{LayoutError, LoadRegions, MemoryLayout};
pub use loader::{BootReport, Loader, LoaderConfig};
