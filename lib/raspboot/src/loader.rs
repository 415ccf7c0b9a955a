//! The loader state machine.
//!
//! ```text
//! Announce -> NegotiateSize -> ReceivePayload -> Decompress -> Verify -> Handoff -> FailSafe
//!                 ^      |
//!                 +------+  declared size too large ("SE")
//! ```
//!
//! Only an oversized declaration is retried. Decode failures are logged and
//! the image is entered anyway; an image that returns halts the loader.

use log::{debug, error, info, warn};
use mini_alloc::BumpArena;
use pi::board::Board;
use pi::common::spin_cycles;

use crate::channel::ByteChannel;
use crate::decoder::{checksum, DecodeError, ImageDecoder};
use crate::handoff::{BootArgs, Handoff};
use crate::layout::{LayoutError, LoadRegions, MemoryLayout};
use crate::protocol::{self, Reply, SIZE_LEN};

pub const BANNER: &str = concat!("raspboot ", env!("CARGO_PKG_VERSION"), ": waiting for a kernel");
pub const HALT_BANNER: &str = "*** system halting ***";

const RULE: &str = "######################################################################";

#[derive(Copy, Clone, Debug)]
pub struct LoaderConfig {
    pub layout: MemoryLayout,
    /// Iterations to spin before halting when the image returns.
    pub halt_spin_iterations: u32,
    pub banner: &'static str,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            layout: MemoryLayout::RASPBERRY_PI,
            halt_spin_iterations: 10_000_000,
            banner: BANNER,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum State {
    Announce,
    NegotiateSize,
    ReceivePayload(usize),
    Decompress(usize),
    Verify(Result<usize, DecodeError>),
    Handoff,
    FailSafe,
}

/// What happened during `Loader::run`. The loader returns at all only when
/// the image it entered returned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootReport {
    pub announcements: usize,
    /// How many size declarations were answered with "SE".
    pub rejections: usize,
    pub last_rejected: Option<u32>,
    pub accepted_size: Option<u32>,
    pub decoded: Option<Result<usize, DecodeError>>,
    pub checksum: Option<u32>,
    pub handoff_attempted: bool,
    pub halted: bool,
}

/// Receives one image over `channel` and enters it through `handoff`.
pub struct Loader<'a, C, H> {
    config: LoaderConfig,
    board: &'a Board,
    args: BootArgs<'a>,
    channel: C,
    handoff: H,
    image: &'a mut [u8],
    staging: &'a mut [u8],
    arena: BumpArena<'a>,
}

impl<'a, C: ByteChannel, H: Handoff> Loader<'a, C, H> {
    /// Checks `config.layout` and `regions` and builds a loader.
    ///
    /// # Safety
    ///
    /// The loader asks `handoff` to enter the image at
    /// `config.layout.load_address`. If `handoff` really transfers control
    /// there, `regions.image` must be the memory at that address.
    pub unsafe fn new(
        config: LoaderConfig,
        board: &'a Board,
        args: BootArgs<'a>,
        channel: C,
        handoff: H,
        regions: LoadRegions<'a>,
    ) -> Result<Loader<'a, C, H>, LayoutError> {
        config.layout.validate()?;
        regions.check(&config.layout)?;

        Ok(Loader {
            config,
            board,
            args,
            channel,
            handoff,
            image: regions.image,
            staging: regions.staging,
            arena: BumpArena::new(regions.scratch),
        })
    }

    /// Runs the loader. Returns only if the entered image returns.
    pub fn run(mut self) -> BootReport {
        let mut report = BootReport::default();
        let mut state = State::Announce;

        self.channel.init();
        loop {
            state = match state {
                State::Announce => {
                    report.announcements += 1;
                    self.announce();
                    State::NegotiateSize
                }
                State::NegotiateSize => match self.negotiate() {
                    Negotiation::Accepted(size) => {
                        report.accepted_size = Some(size);
                        State::ReceivePayload(size as usize)
                    }
                    Negotiation::Rejected(size) => {
                        report.rejections += 1;
                        report.last_rejected = Some(size);
                        State::NegotiateSize
                    }
                },
                State::ReceivePayload(size) => {
                    self.receive(size);
                    State::Decompress(size)
                }
                State::Decompress(size) => {
                    let decoded = self.decompress(size);
                    report.decoded = Some(decoded);
                    State::Verify(decoded)
                }
                State::Verify(decoded) => {
                    report.checksum = Some(self.verify(decoded));
                    State::Handoff
                }
                State::Handoff => {
                    report.handoff_attempted = true;
                    self.enter_image();
                    State::FailSafe
                }
                State::FailSafe => {
                    spin_cycles(self.config.halt_spin_iterations);
                    error!("{}", HALT_BANNER);
                    report.halted = true;
                    return report;
                }
            }
        }
    }

    fn announce(&self) {
        let args = &self.args;

        info!("{}", self.config.banner);
        info!("{}", RULE);
        info!("R0 = {:#010x}, R1 = {:#010x}, ATAGs @ {:p}", args.r0, args.r1, args.atags.as_ptr());
        if args.atags.is_device_tree() {
            warn!("r2 points at a device tree, not an ATAG list");
        }
        for atag in &args.atags {
            info!("  {:x?}", atag);
        }
        info!("Detected '{}'", self.board);
        info!("{}", RULE);
    }

    /// Asks the host for an image and answers its size declaration. Nothing
    /// may be logged until the reply is on the wire.
    fn negotiate(&mut self) -> Negotiation {
        self.channel.put_bytes(&protocol::REQUEST);

        let mut size = [0u8; SIZE_LEN];
        self.channel.get_bytes(&mut size);
        let size = protocol::decode_size(size);

        if self.config.layout.accepts(size) {
            self.channel.put_bytes(Reply::Accepted.as_bytes());
            Negotiation::Accepted(size)
        } else {
            self.channel.put_bytes(Reply::Rejected.as_bytes());
            let limit = self.config.layout.max_compressed_size();
            warn!("rejected {} byte image, at most {} bytes fit", size, limit);
            Negotiation::Rejected(size)
        }
    }

    fn receive(&mut self, size: usize) {
        for byte in self.staging[..size].iter_mut() {
            *byte = self.channel.get_byte();
        }
    }

    fn decompress(&mut self, size: usize) -> Result<usize, DecodeError> {
        info!("decompressing...");

        let output = &mut self.image[..self.config.layout.max_image_size];
        let input = &self.staging[..size];
        let decoded = match ImageDecoder::new(&mut self.arena) {
            Ok(mut decoder) => decoder.decompress(output, input),
            Err(e) => Err(e),
        };

        match decoded {
            Ok(len) => info!("decompressed OK: {} bytes from {}", len, size),
            Err(ref e) => error!("decompression failed: {}", e),
        }
        debug!("scratch: {:?}", self.arena);
        decoded
    }

    /// Checksums the inflated image, or the whole load window when inflating
    /// failed.
    fn verify(&self, decoded: Result<usize, DecodeError>) -> u32 {
        let len = decoded.unwrap_or(self.config.layout.max_image_size);
        let crc = checksum(&self.image[..len]);
        info!("CRC: {:#010x}", crc);
        crc
    }

    fn enter_image(&mut self) {
        info!("booting...");
        log::logger().flush();

        // `new`'s contract ties the load address to `self.image`.
        unsafe { self.handoff.enter(self.config.layout.load_address, &self.args) };
    }
}

enum Negotiation {
    Accepted(u32),
    Rejected(u32),
}
