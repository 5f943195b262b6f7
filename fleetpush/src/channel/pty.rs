//! PTY channel abstraction for interactive sessions.

use std::time::Duration;

use bytes::Bytes;
use log::trace;
use regex::bytes::Regex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::ChannelError;

/// Byte stream carrying an interactive shell (an SSH channel in production,
/// scripted I/O in tests).
pub trait SessionStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> SessionStream for T {}

/// Configuration for PTY channel behavior.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Default timeout for pattern reads.
    pub timeout: Duration,

    /// Search depth for pattern matching.
    pub search_depth: usize,

    /// Appended to every line sent.
    pub return_char: String,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            search_depth: 1000,
            return_char: "\n".to_string(),
        }
    }
}

/// Result of a read operation.
#[derive(Debug)]
pub struct ReadResult {
    /// The data that was read, ANSI-stripped.
    pub data: Bytes,

    /// Whether the pattern was matched. `false` means the remote side closed
    /// the channel first.
    pub pattern_matched: bool,
}

impl ReadResult {
    /// Get the data as a string (lossy UTF-8).
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

/// High-level PTY channel for interactive device sessions.
///
/// Wraps a session stream and provides line sends and pattern-terminated
/// reads with deadline handling.
pub struct PtyChannel {
    config: PtyConfig,
    buffer: PatternBuffer,
    stream: Box<dyn SessionStream>,
    eof: bool,
}

impl PtyChannel {
    pub fn new(stream: impl SessionStream + 'static, config: PtyConfig) -> Self {
        Self {
            buffer: PatternBuffer::new(config.search_depth),
            config,
            stream: Box::new(stream),
            eof: false,
        }
    }

    /// Write `input` followed by the return character.
    pub async fn send(&mut self, input: &str) -> Result<(), ChannelError> {
        if self.eof {
            return Err(ChannelError::Closed);
        }
        let mut line = String::with_capacity(input.len() + self.config.return_char.len());
        line.push_str(input);
        line.push_str(&self.config.return_char);

        self.stream.write_all(line.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read until `pattern` matches the tail of the buffered output or the
    /// remote side closes the stream.
    ///
    /// Returns everything buffered up to that point and clears the buffer.
    pub async fn read_until(
        &mut self,
        pattern: &Regex,
        timeout: Duration,
    ) -> Result<ReadResult, ChannelError> {
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; 4096];

        loop {
            if self.buffer.tail_contains(pattern) {
                return Ok(ReadResult {
                    data: self.buffer.take(),
                    pattern_matched: true,
                });
            }
            if self.eof {
                return Ok(ReadResult {
                    data: self.buffer.take(),
                    pattern_matched: false,
                });
            }

            let n = tokio::time::timeout_at(deadline, self.stream.read(&mut chunk))
                .await
                .map_err(|_| ChannelError::PatternTimeout(timeout))??;

            if n == 0 {
                trace!("channel reached EOF");
                self.eof = true;
            } else {
                trace!("read {} bytes: {:?}", n, String::from_utf8_lossy(&chunk[..n]));
                self.buffer.extend(&chunk[..n]);
            }
        }
    }

    /// Read until the pattern using the default timeout.
    pub async fn read_until_default(&mut self, pattern: &Regex) -> Result<ReadResult, ChannelError> {
        let timeout = self.config.timeout;
        self.read_until(pattern, timeout).await
    }

    /// Shut down the write half.
    pub async fn shutdown(&mut self) -> Result<(), ChannelError> {
        if !self.eof {
            self.stream.shutdown().await?;
        }
        Ok(())
    }

    /// Whether the remote side closed the stream.
    pub fn is_closed(&self) -> bool {
        self.eof
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    pub fn buffer(&self) -> &PatternBuffer {
        &self.buffer
    }
}
