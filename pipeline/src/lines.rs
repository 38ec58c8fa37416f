//! Line splitting for checker output streams.
//!
//! Checker output is not guaranteed to be UTF-8 (file names, tracebacks),
//! so lines are decoded lossily instead of failing the stream.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Reads `\n`-terminated lines, stripping a trailing `\r`.
///
/// [`next_line`](Self::next_line) is cancel safe: bytes read by a cancelled
/// call stay buffered and are returned by the next one, so the reader can be
/// polled from `tokio::select!`.
pub struct LineReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
        }
    }

    /// Next line, or `Ok(None)` on EOF.
    ///
    /// A final line without a terminator is still returned.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Ok(Some(line))
    }
}
