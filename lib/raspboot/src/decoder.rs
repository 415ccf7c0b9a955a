//! Binding to the zlib inflater.
//!
//! The inflater runs without a heap: its state lives in the scratch arena and
//! it writes straight into the caller's output region, which it never
//! overruns.

use log::debug;
use mini_alloc::{ArenaError, BumpArena};
use miniz_oxide::inflate::core::inflate_flags::{
    TINFL_FLAG_COMPUTE_ADLER32, TINFL_FLAG_PARSE_ZLIB_HEADER,
    TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF,
};
use miniz_oxide::inflate::core::{decompress as inflate, DecompressorOxide};
use miniz_oxide::inflate::TINFLStatus;

const INFLATE_FLAGS: u32 = TINFL_FLAG_PARSE_ZLIB_HEADER
    | TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF
    | TINFL_FLAG_COMPUTE_ADLER32;

/// Why an image could not be decoded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed zlib stream")]
    FormatError,
    #[error("image does not fit in {capacity:#x} bytes")]
    OutputTooLarge { capacity: usize },
    #[error("adler-32 of the inflated data does not match the stream")]
    ChecksumMismatch,
    #[error("stream ended before the final block")]
    TruncatedInput,
    #[error("inflater rejected its parameters")]
    InvalidParameter,
    #[error("no scratch memory for the inflater: {0}")]
    ScratchExhausted(#[from] ArenaError),
}

/// Inflates zlib streams into a bounded buffer.
pub struct ImageDecoder<'a> {
    inflater: &'a mut DecompressorOxide,
}

impl<'a> ImageDecoder<'a> {
    /// Places the inflater's state in `arena`.
    pub fn new(arena: &mut BumpArena<'a>) -> Result<ImageDecoder<'a>, DecodeError> {
        let inflater = arena.alloc_with(DecompressorOxide::new)?;
        Ok(ImageDecoder { inflater })
    }

    /// Inflates the zlib stream in `input` into `output` and returns the
    /// number of bytes written. Never writes past `output.len()`; an image
    /// that would is reported as `OutputTooLarge`.
    pub fn decompress(&mut self, output: &mut [u8], input: &[u8]) -> Result<usize, DecodeError> {
        self.inflater.init();
        let (status, consumed, written) = inflate(self.inflater, input, output, 0, INFLATE_FLAGS);

        match status {
            TINFLStatus::Done => {
                if consumed < input.len() {
                    debug!("ignoring {} bytes after the zlib stream", input.len() - consumed);
                }
                Ok(written)
            }
            TINFLStatus::HasMoreOutput => {
                Err(DecodeError::OutputTooLarge { capacity: output.len() })
            }
            TINFLStatus::NeedsMoreInput | TINFLStatus::FailedCannotMakeProgress => {
                Err(DecodeError::TruncatedInput)
            }
            TINFLStatus::Adler32Mismatch => Err(DecodeError::ChecksumMismatch),
            TINFLStatus::BadParam => Err(DecodeError::InvalidParameter),
            TINFLStatus::Failed => Err(DecodeError::FormatError),
        }
    }
}

/// CRC-32 (ISO-HDLC, as used by zip and PNG) of `buf`.
pub fn checksum(buf: &[u8]) -> u32 {
    crc32fast::hash(buf)
}
