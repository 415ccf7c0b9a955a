//! Host side of the raspboot transfer.

use std::io::{self, Read, Write};

use raspboot::protocol::{encode_size, Reply, REQUEST};

fn is_transient(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::Interrupted
}

/// Copies console output from `port` to `echo` until the loader sends its
/// break sequence. The break itself is not echoed.
pub fn wait_for_request<P: Read, E: Write>(port: &mut P, echo: &mut E) -> io::Result<()> {
    let mut seen = 0;
    let mut byte = [0u8; 1];

    while seen < REQUEST.len() {
        match port.read(&mut byte) {
            Ok(0) => return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "serial port closed")),
            Ok(_) => {}
            Err(ref e) if is_transient(e) => continue,
            Err(e) => return Err(e),
        }

        if byte[0] == REQUEST[seen] {
            seen += 1;
        } else {
            echo.write_all(&REQUEST[..seen])?;
            echo.write_all(&byte)?;
            seen = 0;
        }
    }

    echo.flush()
}

/// Declares an image of `size` bytes and reads the loader's answer.
pub fn negotiate<P: Read + Write>(port: &mut P, size: u32) -> io::Result<Reply> {
    port.write_all(&encode_size(size))?;
    port.flush()?;

    let mut reply = [0u8; 2];
    port.read_exact(&mut reply)?;
    Reply::from_bytes(reply).ok_or_else(|| {
        let msg = format!("unexpected reply from loader: {:02x?}", reply);
        io::Error::new(io::ErrorKind::InvalidData, msg)
    })
}

/// Sends `image` once the loader asks for it, renegotiating up to `attempts`
/// times if the loader rejects the size. `progress` is called with the
/// number of bytes sent so far.
pub fn send_image<P, E, F>(
    port: &mut P,
    echo: &mut E,
    image: &[u8],
    attempts: usize,
    mut progress: F,
) -> io::Result<()>
where
    P: Read + Write,
    E: Write,
    F: FnMut(usize),
{
    if image.len() > u32::max_value() as usize {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "image larger than 4GiB"));
    }
    let size = image.len() as u32;

    for attempt in 1..=attempts {
        wait_for_request(port, echo)?;

        match negotiate(port, size)? {
            Reply::Accepted => {
                let mut sent = 0;
                for chunk in image.chunks(4096) {
                    port.write_all(chunk)?;
                    sent += chunk.len();
                    progress(sent);
                }
                return port.flush();
            }
            Reply::Rejected => {
                println!("loader rejected {} bytes ({}/{})", size, attempt, attempts)
            }
        }
    }

    let msg = format!("loader rejected a {} byte image", size);
    Err(io::Error::new(io::ErrorKind::InvalidData, msg))
}

/// Echoes everything the board prints until the port closes.
pub fn monitor<P: Read, E: Write>(port: &mut P, echo: &mut E) -> io::Result<()> {
    let mut buf = [0u8; 256];
    loop {
        match port.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => {
                echo.write_all(&buf[..n])?;
                echo.flush()?;
            }
            Err(ref e) if is_transient(e) => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Plays back what a loader would print, interleaved with timeouts.
    struct MockPort {
        input: VecDeque<io::Result<u8>>,
        written: Vec<u8>,
    }

    impl MockPort {
        fn new(script: &[&[u8]]) -> MockPort {
            let input = script.iter().flat_map(|part| part.iter().map(|&b| Ok(b))).collect();
            MockPort { input, written: Vec::new() }
        }

        fn timeout(mut self) -> MockPort {
            self.input.push_back(Err(io::Error::new(io::ErrorKind::TimedOut, "timed out")));
            self
        }

        fn then(mut self, bytes: &[u8]) -> MockPort {
            self.input.extend(bytes.iter().map(|&b| Ok(b)));
            self
        }
    }

    impl Read for MockPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.input.pop_front() {
                None => Ok(0),
                Some(Ok(byte)) => {
                    buf[0] = byte;
                    Ok(1)
                }
                Some(Err(e)) => Err(e),
            }
        }
    }

    impl Write for MockPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn console_text_is_echoed_until_the_break() {
        let mut port = MockPort::new(&[b"[INFO:raspboot] hello\r\n", &REQUEST, b"OK"]);
        let mut echo = Vec::new();

        wait_for_request(&mut port, &mut echo).unwrap();
        assert_eq!(echo, b"[INFO:raspboot] hello\r\n");
        assert_eq!(port.input.len(), 2);
    }

    #[test]
    fn partial_break_is_console_text() {
        let mut port = MockPort::new(&[b"\x03\x03x", &REQUEST]);
        let mut echo = Vec::new();

        wait_for_request(&mut port, &mut echo).unwrap();
        assert_eq!(echo, b"\x03\x03x");
    }

    #[test]
    fn timeouts_while_waiting_are_retried() {
        let mut port = MockPort::new(&[b"boot"]).timeout().then(&REQUEST);
        let mut echo = Vec::new();

        wait_for_request(&mut port, &mut echo).unwrap();
        assert_eq!(echo, b"boot");
    }

    #[test]
    fn closed_port_is_an_error() {
        let mut port = MockPort::new(&[b"\x03"]);
        let err = wait_for_request(&mut port, &mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn accepted_image_is_streamed() {
        let image: Vec<u8> = (0..10_000u32).map(|i| i as u8).collect();
        let mut port = MockPort::new(&[b"banner\r\n", &REQUEST, b"OK"]);
        let mut echo = Vec::new();
        let mut reported = Vec::new();

        send_image(&mut port, &mut echo, &image, 3, |sent| reported.push(sent)).unwrap();

        let mut expected = encode_size(10_000).to_vec();
        expected.extend_from_slice(&image);
        assert_eq!(port.written, expected);
        assert_eq!(reported, vec![4096, 8192, 10_000]);
        assert_eq!(echo, b"banner\r\n");
    }

    #[test]
    fn rejected_size_is_renegotiated() {
        let image = [0xa5u8; 32];
        let console = b"[WARN:raspboot::loader] rejected\r\n";
        let mut port = MockPort::new(&[&REQUEST, b"SE", console, &REQUEST, b"OK"]);
        let mut echo = Vec::new();

        send_image(&mut port, &mut echo, &image, 2, |_| {}).unwrap();

        let mut expected = encode_size(32).to_vec();
        expected.extend_from_slice(&encode_size(32));
        expected.extend_from_slice(&image);
        assert_eq!(port.written, expected);
        assert_eq!(echo, b"[WARN:raspboot::loader] rejected\r\n");
    }

    #[test]
    fn gives_up_after_attempts() {
        let mut port = MockPort::new(&[&REQUEST, b"SE", &REQUEST, b"SE"]);
        let err = send_image(&mut port, &mut Vec::new(), &[1, 2, 3], 2, |_| {}).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(port.written.len(), 8);
    }

    #[test]
    fn garbled_reply_is_invalid_data() {
        let mut port = MockPort::new(&[b"NO"]);
        let err = negotiate(&mut port, 16).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(port.written, vec![16, 0, 0, 0]);
    }

    #[test]
    fn monitor_echoes_until_closed() {
        let mut port = MockPort::new(&[b"kernel says hi"]).timeout().then(b"\r\n");
        let mut echo = Vec::new();

        monitor(&mut port, &mut echo).unwrap();
        assert_eq!(echo, b"kernel says hi\r\n");
    }
}
