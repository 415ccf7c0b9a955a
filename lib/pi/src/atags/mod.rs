mod atag;
mod raw;

pub use self::atag::*;
pub use self::raw::{Header, FDT_MAGIC_LE};

/// How many words `Atags::from_raw` is willing to walk. The firmware places
/// the list at `0x100` and it never comes close to this.
pub const MAX_ATAG_WORDS: usize = 0x1000;

/// The boot-argument descriptor handed over by the firmware in `r2`.
///
/// This is a read-only view: the pointer it was built from is kept so it can
/// be passed on untouched.
#[derive(Copy, Clone, Debug)]
pub struct Atags<'a> {
    base: *const u32,
    words: &'a [u32],
    device_tree: bool,
}

impl<'a> Atags<'a> {
    /// Builds a view over the ATAG list starting at `base`.
    ///
    /// A null pointer, or a pointer to a flattened device tree, yields an
    /// empty list.
    ///
    /// # Safety
    ///
    /// When non-null, `base` must be word aligned and the `MAX_ATAG_WORDS`
    /// words following it must be readable memory that nothing writes to for
    /// `'a`.
    pub unsafe fn from_raw(base: *const u32) -> Atags<'a> {
        if base.is_null() {
            return Atags { base, words: &[], device_tree: false };
        }

        let words = core::slice::from_raw_parts(base, MAX_ATAG_WORDS);
        Atags::with_base(base, words)
    }

    /// Builds a view over an in-memory copy of an ATAG list.
    pub fn from_words(words: &'a [u32]) -> Atags<'a> {
        Atags::with_base(words.as_ptr(), words)
    }

    fn with_base(base: *const u32, words: &'a [u32]) -> Atags<'a> {
        if words.first() == Some(&FDT_MAGIC_LE) {
            Atags { base, words: &[], device_tree: true }
        } else {
            Atags { base, words, device_tree: false }
        }
    }

    /// The address the list was read from, unchanged.
    pub fn as_ptr(&self) -> *const u32 {
        self.base
    }

    /// True when the firmware passed a device tree instead of ATAGs.
    pub fn is_device_tree(&self) -> bool {
        self.device_tree
    }

    pub fn iter(&self) -> Iter<'a> {
        Iter { rest: self.words }
    }

    /// The first command line tag, if any.
    pub fn cmdline(&self) -> Option<&'a str> {
        self.iter().find_map(Atag::cmd)
    }
}

impl<'a> IntoIterator for &Atags<'a> {
    type Item = Atag<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Walks the list until `ATAG_NONE` or the first malformed header.
pub struct Iter<'a> {
    rest: &'a [u32],
}

impl<'a> Iterator for Iter<'a> {
    type Item = Atag<'a>;

    fn next(&mut self) -> Option<Atag<'a>> {
        if self.rest.len() < Header::WORDS {
            return None;
        }

        let size = self.rest[0] as usize;
        let tag = self.rest[1];
        if tag == Header::NONE || size < Header::WORDS || size > self.rest.len() {
            self.rest = &[];
            return None;
        }

        let (this, rest) = self.rest.split_at(size);
        self.rest = rest;
        Some(Atag::parse(tag, &this[Header::WORDS..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Packs `s` into NUL terminated, word padded form.
    fn cmdline_words(s: &str) -> Vec<u32> {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        while bytes.len() % 4 != 0 {
            bytes.push(0);
        }
        bytes.chunks(4).map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
    }

    fn firmware_list(cmdline: &str) -> Vec<u32> {
        let mut words = vec![5, Header::CORE, 0, 4096, 0];
        words.extend_from_slice(&[4, Header::MEM, 0x1c00_0000, 0]);
        let cmd = cmdline_words(cmdline);
        words.push(cmd.len() as u32 + 2);
        words.push(Header::CMDLINE);
        words.extend(cmd);
        words.extend_from_slice(&[3, Header::REVISION, 0xa21041]);
        words.extend_from_slice(&[0, Header::NONE]);
        words
    }

    #[test]
    fn walks_firmware_list() {
        let words = firmware_list("console=ttyAMA0,115200");
        let atags = Atags::from_words(&words);

        let tags: Vec<_> = atags.iter().collect();
        assert_eq!(tags.len(), 4);
        assert_eq!(tags[0].core(), Some(Core { flags: 0, page_size: 4096, root_dev: 0 }));
        assert_eq!(tags[1].mem(), Some(Mem { size: 0x1c00_0000, start: 0 }));
        assert_eq!(tags[2].cmd(), Some("console=ttyAMA0,115200"));
        assert_eq!(tags[3], Atag::Revision(0xa21041));
        assert_eq!(atags.cmdline(), Some("console=ttyAMA0,115200"));
        assert_eq!(atags.as_ptr(), words.as_ptr());
    }

    #[test]
    fn cmdline_filling_whole_words() {
        // 8 bytes: terminator spills into its own word
        let words = firmware_list("abcdefgh");
        assert_eq!(Atags::from_words(&words).cmdline(), Some("abcdefgh"));
    }

    #[test]
    fn unknown_tags_are_skipped_over() {
        let mut words = vec![4, 0x4d00_0000, 1, 2];
        words.extend(firmware_list("root=/dev/mmcblk0p2"));
        let atags = Atags::from_words(&words);

        let mut iter = atags.iter();
        assert_eq!(iter.next(), Some(Atag::Unknown(0x4d00_0000)));
        assert_eq!(atags.cmdline(), Some("root=/dev/mmcblk0p2"));
    }

    #[test]
    fn malformed_headers_stop_iteration() {
        // size smaller than a header
        let words = [1, Header::CORE, 0, 0];
        assert_eq!(Atags::from_words(&words).iter().count(), 0);

        // size running past the end of the list
        let words = [9, Header::MEM, 0, 0];
        assert_eq!(Atags::from_words(&words).iter().count(), 0);

        // no terminator, list just ends
        let words = [4, Header::MEM, 16, 0];
        assert_eq!(Atags::from_words(&words).iter().count(), 1);
    }

    #[test]
    fn device_tree_is_not_parsed() {
        let words = [FDT_MAGIC_LE, 0x0000_1000, 0, 0];
        let atags = Atags::from_words(&words);
        assert!(atags.is_device_tree());
        assert_eq!(atags.iter().count(), 0);
        assert_eq!(atags.cmdline(), None);
    }

    #[test]
    fn null_pointer_is_empty() {
        let atags = unsafe { Atags::from_raw(core::ptr::null()) };
        assert_eq!(atags.iter().count(), 0);
        assert!(atags.as_ptr().is_null());
    }

    #[test]
    fn invalid_utf8_truncates_cmdline() {
        let mut words = vec![4, Header::CMDLINE];
        words.push(u32::from_le_bytes([b'o', b'k', 0xff, b'x']));
        words.push(0);
        words.extend_from_slice(&[0, Header::NONE]);
        assert_eq!(Atags::from_words(&words).cmdline(), Some("ok"));
    }
}
