#![cfg_attr(not(test), no_std)]

mod bump;
pub mod util;

pub use bump::*;
