//! Physical memory used by the loader.
//!
//! ```text
//! 0x0000_8000  load window      MAX_IMAGE_SIZE     kernel is inflated here and entered
//! 0x0020_8000  staging          MAX_IMAGE_SIZE     compressed payload as received
//! 0x0040_8000  scratch          SCRATCH_SIZE       bump arena for the inflater
//!      ...     stack, grows down from the loader
//! 0x0200_0000  loader           relocated here by the entry stub
//! ```

use core::slice;

/// Where the kernel is inflated to and entered.
pub const LOAD_ADDRESS: usize = 0x8000;

/// Upper bound on the inflated kernel.
pub const MAX_IMAGE_SIZE: usize = 0x20_0000;

/// Where the compressed payload is received.
pub const COMPRESSED_STAGING_ADDRESS: usize = LOAD_ADDRESS + MAX_IMAGE_SIZE;

/// Backing memory for the inflater's state.
pub const SCRATCH_ADDRESS: usize = COMPRESSED_STAGING_ADDRESS + MAX_IMAGE_SIZE;
pub const SCRATCH_SIZE: usize = 0x10_0000;

/// Where the loader runs from once it has moved itself out of the way.
pub const LOADER_ADDRESS: usize = 0x200_0000;

const STAGING_END: usize = COMPRESSED_STAGING_ADDRESS + (COMPRESSED_STAGING_ADDRESS - LOAD_ADDRESS);

const _: () = assert!(LOAD_ADDRESS + MAX_IMAGE_SIZE <= COMPRESSED_STAGING_ADDRESS);
const _: () = assert!(STAGING_END <= SCRATCH_ADDRESS);
const _: () = assert!(SCRATCH_ADDRESS + SCRATCH_SIZE <= LOADER_ADDRESS);

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("staging region at {staging:#x} overlaps the load window ending at {load_end:#x}")]
    StagingOverlapsLoad { staging: u64, load_end: u64 },
    #[error("scratch region at {scratch:#x} overlaps staging ending at {staging_end:#x}")]
    ScratchOverlapsStaging { scratch: u64, staging_end: u64 },
    #[error("scratch region ends at {scratch_end:#x}, past the loader at {loader:#x}")]
    ScratchOverlapsLoader { scratch_end: u64, loader: u64 },
    #[error("{region} region is {actual:#x} bytes, the layout needs {required:#x}")]
    RegionTooSmall { region: &'static str, actual: usize, required: usize },
}

/// Addresses and sizes of the regions the loader writes to. The regions are
/// ordered: load window, staging, scratch, loader.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MemoryLayout {
    pub load_address: usize,
    pub max_image_size: usize,
    pub staging_address: usize,
    pub scratch_address: usize,
    pub scratch_size: usize,
    pub loader_address: usize,
}

impl MemoryLayout {
    pub const RASPBERRY_PI: MemoryLayout = MemoryLayout {
        load_address: LOAD_ADDRESS,
        max_image_size: MAX_IMAGE_SIZE,
        staging_address: COMPRESSED_STAGING_ADDRESS,
        scratch_address: SCRATCH_ADDRESS,
        scratch_size: SCRATCH_SIZE,
        loader_address: LOADER_ADDRESS,
    };

    /// Largest compressed size the loader will accept.
    pub fn max_compressed_size(&self) -> usize {
        self.staging_address.saturating_sub(self.load_address)
    }

    /// Whether a declared compressed size may be received:
    /// `load_address + declared <= staging_address`.
    pub fn accepts(&self, declared: u32) -> bool {
        match (self.load_address as u64).checked_add(declared as u64) {
            Some(end) => end <= self.staging_address as u64,
            None => false,
        }
    }

    /// Checks that no two regions overlap.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let load_end = (self.load_address as u64).saturating_add(self.max_image_size as u64);
        let staging = self.staging_address as u64;
        if staging < load_end {
            return Err(LayoutError::StagingOverlapsLoad { staging, load_end });
        }

        let staging_end = staging.saturating_add(self.max_compressed_size() as u64);
        let scratch = self.scratch_address as u64;
        if scratch < staging_end {
            return Err(LayoutError::ScratchOverlapsStaging { scratch, staging_end });
        }

        let scratch_end = scratch.saturating_add(self.scratch_size as u64);
        let loader = self.loader_address as u64;
        if scratch_end > loader {
            return Err(LayoutError::ScratchOverlapsLoader { scratch_end, loader });
        }

        Ok(())
    }
}

impl Default for MemoryLayout {
    fn default() -> Self {
        MemoryLayout::RASPBERRY_PI
    }
}

/// The memory behind a `MemoryLayout`.
pub struct LoadRegions<'a> {
    /// The load window the kernel is inflated into.
    pub image: &'a mut [u8],
    pub staging: &'a mut [u8],
    pub scratch: &'a mut [u8],
}

impl LoadRegions<'static> {
    /// Materializes the regions of `layout` from physical memory.
    ///
    /// # Safety
    ///
    /// Every region of `layout` must be RAM that nothing else uses, including
    /// the loader's own image and stack. Call `layout.validate()` first.
    pub unsafe fn from_layout(layout: &MemoryLayout) -> LoadRegions<'static> {
        let region = |addr: usize, len: usize| slice::from_raw_parts_mut(addr as *mut u8, len);
        LoadRegions {
            image: region(layout.load_address, layout.max_image_size),
            staging: region(layout.staging_address, layout.max_compressed_size()),
            scratch: region(layout.scratch_address, layout.scratch_size),
        }
    }
}

impl LoadRegions<'_> {
    /// Checks the regions are large enough for `layout`.
    pub fn check(&self, layout: &MemoryLayout) -> Result<(), LayoutError> {
        let required = [
            ("load", self.image.len(), layout.max_image_size),
            ("staging", self.staging.len(), layout.max_compressed_size()),
        ];

        for &(region, actual, required) in required.iter() {
            if actual < required {
                return Err(LayoutError::RegionTooSmall { region, actual, required });
            }
        }
        Ok(())
    }
}
