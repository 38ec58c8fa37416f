//! JSON-RPC framing codec for the editor connection.
//!
//! LSP uses `Content-Length: N\r\n\r\n{json}` framing over stdin/stdout.
//! [`MessageReader`] decodes frames sent by the client and
//! [`MessageWriter`] encodes the server's responses and notifications.

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Maximum frame size (4 MiB) to prevent unbounded memory allocation.
/// Full-sync documents travel in a single frame, so this also caps
/// document size.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("i/o error on the client connection")]
    Io(#[from] std::io::Error),
    #[error("unexpected EOF while reading headers")]
    TruncatedHeaders,
    #[error("missing Content-Length header")]
    MissingContentLength,
    #[error("invalid Content-Length value: {0:?}")]
    InvalidContentLength(String),
    #[error("Content-Length {0} exceeds maximum {max}", max = MAX_FRAME_BYTES)]
    FrameTooLarge(usize),
    #[error("malformed JSON-RPC message")]
    Json(#[from] serde_json::Error),
}

impl CodecError {
    /// Whether the stream can still be read after this error.
    ///
    /// A bad JSON body was fully consumed, so the next frame starts cleanly.
    /// Everything else leaves the stream at an unknown offset.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Json(_))
    }
}

/// Reads JSON-RPC messages from an async reader.
pub struct MessageReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next message.
    ///
    /// Returns `Ok(None)` on EOF between messages (client went away).
    pub async fn read_message(&mut self) -> Result<Option<serde_json::Value>, CodecError> {
        let Some(content_length) = self.read_headers().await? else {
            return Ok(None);
        };

        if content_length > MAX_FRAME_BYTES {
            return Err(CodecError::FrameTooLarge(content_length));
        }

        let mut body = vec![0u8; content_length];
        self.reader.read_exact(&mut body).await?;

        Ok(Some(serde_json::from_slice(&body)?))
    }

    /// Parse headers until the empty line separator.
    async fn read_headers(&mut self) -> Result<Option<usize>, CodecError> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();
        let mut saw_any_header_bytes = false;

        loop {
            line.clear();
            let bytes_read = self.reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                // EOF is clean only before the first header byte of a frame.
                if !saw_any_header_bytes {
                    return Ok(None);
                }
                return Err(CodecError::TruncatedHeaders);
            }
            saw_any_header_bytes = true;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            // Header names are case-insensitive; Content-Type is ignored.
            if let Some((key, value)) = trimmed.split_once(':')
                && key.trim().eq_ignore_ascii_case("Content-Length")
            {
                let value = value.trim();
                let len = value
                    .parse()
                    .map_err(|_| CodecError::InvalidContentLength(value.to_string()))?;
                content_length = Some(len);
            }
        }

        content_length
            .map(Some)
            .ok_or(CodecError::MissingContentLength)
    }
}

/// Writes JSON-RPC messages to an async writer.
pub struct MessageWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Serialize `msg` and write it with its `Content-Length` header.
    pub async fn write_message<T: Serialize + ?Sized>(&mut self, msg: &T) -> Result<(), CodecError> {
        let body = serde_json::to_vec(msg)?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(&body).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
