use std::io;

use compression::prelude::*;
use raspboot::layout::MemoryLayout;

/// Wraps `kernel` in a zlib stream for the loader.
pub fn compress(kernel: &[u8]) -> io::Result<Vec<u8>> {
    kernel
        .iter()
        .cloned()
        .encode(&mut ZlibEncoder::new(), Action::Finish)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("failed to compress: {:?}", e))
        })
}

/// Reasons the loader on `layout` would refuse or truncate an upload.
pub fn size_warnings(layout: &MemoryLayout, kernel_len: usize, image_len: usize) -> Vec<String> {
    let mut warnings = Vec::new();
    if image_len > layout.max_compressed_size() {
        warnings.push(format!(
            "compressed image is {} bytes, the loader accepts at most {}",
            image_len,
            layout.max_compressed_size()
        ));
    }
    if kernel_len > layout.max_image_size {
        warnings.push(format!(
            "kernel is {} bytes, only {} fit at {:#x}",
            kernel_len, layout.max_image_size, layout.load_address
        ));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use mini_alloc::BumpArena;
    use raspboot::ImageDecoder;

    #[test]
    fn loader_inflates_what_we_send() {
        let nops = b"\x00\x00\xa0\xe1".iter().cycle().take(8192).cloned();
        let kernel: Vec<u8> = nops.chain(0..=255u8).collect();
        let image = compress(&kernel).unwrap();
        assert!(image.len() < kernel.len());

        let mut scratch = vec![0u8; 64 * 1024];
        let mut arena = BumpArena::new(&mut scratch);
        let mut decoder = ImageDecoder::new(&mut arena).unwrap();
        let mut output = vec![0u8; 16 * 1024];

        assert_eq!(decoder.decompress(&mut output, &image), Ok(kernel.len()));
        assert_eq!(&output[..kernel.len()], &kernel[..]);
    }

    #[test]
    fn warns_about_oversized_uploads() {
        let layout = MemoryLayout::RASPBERRY_PI;
        assert!(size_warnings(&layout, 0x1000, 0x800).is_empty());
        assert_eq!(size_warnings(&layout, 0x20_0001, 0x1000).len(), 1);
        assert_eq!(size_warnings(&layout, 0x40_0000, 0x20_0001).len(), 2);
    }
}
