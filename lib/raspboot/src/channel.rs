use pi::uart::Uart;

/// A blocking, duplex byte transport to the host.
///
/// There is no timeout and no partial I/O: `get_byte` waits for a byte and
/// `put_bytes` returns once every byte has been queued.
pub trait ByteChannel {
    /// Configures the transport. Called once, before any other method.
    fn init(&mut self);

    fn get_byte(&mut self) -> u8;

    fn put_bytes(&mut self, buf: &[u8]);

    /// Fills `buf` from the channel.
    fn get_bytes(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte = self.get_byte();
        }
    }
}

impl<C: ByteChannel + ?Sized> ByteChannel for &mut C {
    fn init(&mut self) {
        (**self).init()
    }

    fn get_byte(&mut self) -> u8 {
        (**self).get_byte()
    }

    fn put_bytes(&mut self, buf: &[u8]) {
        (**self).put_bytes(buf)
    }

    fn get_bytes(&mut self, buf: &mut [u8]) {
        (**self).get_bytes(buf)
    }
}

impl ByteChannel for Uart {
    fn init(&mut self) {
        self.initialize();
    }

    fn get_byte(&mut self) -> u8 {
        self.read_byte()
    }

    fn put_bytes(&mut self, buf: &[u8]) {
        for &byte in buf {
            self.write_byte(byte);
        }
    }
}
