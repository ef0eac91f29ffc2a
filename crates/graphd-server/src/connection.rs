//! Per-connection socket plumbing.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::warn;

/// Requests are short; anything past this is dropped.
pub const MAX_REQUEST_BYTES: u64 = 64 * 1024;

/// Applies the read timeout to a freshly accepted stream, so a client that
/// never half-closes cannot hold a worker or a shutdown forever.
pub fn accepted(stream: UnixStream, read_timeout: Duration) -> UnixStream {
    if let Err(err) = stream.set_read_timeout(Some(read_timeout)) {
        warn!("failed to set read timeout: {}", err);
    }
    stream
}

/// Reads the request until the peer half-closes its write side.
pub fn read_request<R: Read>(reader: R) -> io::Result<String> {
    let mut buf = Vec::new();
    reader.take(MAX_REQUEST_BYTES).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn send<W: Write>(writer: &mut W, text: &str) -> io::Result<()> {
    writer.write_all(text.as_bytes())?;
    writer.flush()
}

/// Connection-scoped send lock. Each `send` lands on the wire as one
/// contiguous block, whichever thread issues it.
#[derive(Debug)]
pub struct SharedWriter<W> {
    inner: Mutex<W>,
}

impl<W: Write> SharedWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }

    pub fn send(&self, text: &str) -> io::Result<()> {
        send(&mut *self.inner.lock(), text)
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::thread;

    #[test]
    fn read_request_is_capped() {
        let big = vec![b'x'; MAX_REQUEST_BYTES as usize + 100];
        let text = read_request(Cursor::new(big)).unwrap();
        assert_eq!(text.len(), MAX_REQUEST_BYTES as usize);
    }

    #[test]
    fn silent_peer_times_out() {
        let (server, _client) = UnixStream::pair().unwrap();
        let server = accepted(server, Duration::from_millis(50));
        let err = read_request(&server).unwrap_err();
        assert!(
            matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut),
            "{:?}",
            err
        );
    }

    #[test]
    fn read_request_is_lossy() {
        let text = read_request(Cursor::new(b"-a MST \xff".to_vec())).unwrap();
        assert!(text.starts_with("-a MST "));
    }

    #[test]
    fn concurrent_sends_never_interleave() {
        let writer = SharedWriter::new(Vec::new());
        let blocks: Vec<String> = (0..4)
            .map(|i| format!("[{}]\n{}\n", i, i.to_string().repeat(2_000)))
            .collect();

        thread::scope(|scope| {
            for block in &blocks {
                let writer = &writer;
                scope.spawn(move || {
                    for _ in 0..10 {
                        writer.send(block).unwrap();
                    }
                });
            }
        });

        let out = String::from_utf8(writer.into_inner()).unwrap();
        let mut rest = out.as_str();
        let mut count = 0;
        while !rest.is_empty() {
            let block = blocks
                .iter()
                .find(|b| rest.starts_with(b.as_str()))
                .expect("output is a sequence of whole blocks");
            rest = &rest[block.len()..];
            count += 1;
        }
        assert_eq!(count, 40);
    }
}
