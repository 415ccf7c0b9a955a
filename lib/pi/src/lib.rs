#![cfg_attr(not(test), no_std)]

pub mod atags;
pub mod board;
pub mod common;
pub mod gpio;
pub mod uart;
