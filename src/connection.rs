// ABOUTME: Line-oriented modem connection over any async byte channel
// ABOUTME: Writes framed AT command lines and waits for the "OK" acknowledgment with bounded timeouts

use crate::client::error::{ModemError, ModemResult};
use bytes::{Buf, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::time;
use tracing::{debug, trace};

/// Acknowledgment token looked for in modem output
const ACK_TOKEN: &[u8] = b"OK";

/// Size of a single read from the channel
const READ_CHUNK: usize = 255;

/// Modem connection
///
/// Wraps the exclusively-owned channel to the modem. The modem is a
/// half-duplex peer: a command is written, then `await_ok` consumes output
/// until it acknowledges. Only one command is ever outstanding.
///
/// ```text
/// host                      modem
///  | -- AT\r\n ------------>  |
///  | <------------ \r\nOK\r\n |
///  | -- AT+CMGS=16\r\n ---->  |
///  | <-------------------- >  |
///  | -- <pdu>\x1a\r\n ----->  |
///  | <-- +CMGS: 1\r\n\r\nOK   |
/// ```
#[derive(Debug)]
pub struct Connection<T> {
    // Writes go through a `BufWriter` and are flushed once per line so a
    // line is handed to the device in one piece.
    stream: BufWriter<T>,

    // Bytes read during the current acknowledgment wait. Cleared at the
    // start of every wait.
    buffer: BytesMut,

    // Bound on a single read; an elapsed read is an empty poll.
    read_timeout: Duration,
}

impl<T> Connection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a new `Connection` backed by `channel`.
    pub fn new(channel: T, read_timeout: Duration) -> Connection<T> {
        Connection {
            stream: BufWriter::new(channel),
            buffer: BytesMut::with_capacity(1024),
            read_timeout,
        }
    }

    /// Write `frame` and flush it to the channel.
    ///
    /// `write_all` retries partial writes until the whole frame is accepted.
    pub async fn write_frame(&mut self, frame: &[u8]) -> ModemResult<()> {
        debug!(frame = %String::from_utf8_lossy(frame).escape_debug(), "-> modem");
        self.stream.write_all(frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Wait until the modem output contains "OK", or `window` elapses.
    ///
    /// The read loop runs as a future owned by this call. When the window
    /// elapses the future is dropped, so no read is left pending on the
    /// channel after the method returns. A read error ends the wait with
    /// `ModemError::Channel`; an elapsed window with `ModemError::Timeout`.
    pub async fn await_ok(&mut self, window: Duration) -> ModemResult<()> {
        self.buffer.clear();

        match time::timeout(window, self.read_until_ok()).await {
            Ok(result) => result,
            Err(_) => {
                debug!(
                    window = ?window,
                    received = %String::from_utf8_lossy(&self.buffer).escape_debug(),
                    "No acknowledgment within window"
                );
                Err(ModemError::Timeout(window))
            }
        }
    }

    async fn read_until_ok(&mut self) -> ModemResult<()> {
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let n = match time::timeout(self.read_timeout, self.stream.read(&mut chunk)).await {
                Ok(read) => read?,
                // Nothing arrived within the per-read bound
                Err(_) => continue,
            };

            if n == 0 {
                // End of stream reads as an empty poll. Back off so a closed
                // channel does not spin until the window elapses.
                time::sleep(self.read_timeout).await;
                continue;
            }

            trace!(chunk = %String::from_utf8_lossy(&chunk[..n]).escape_debug(), "<- modem");
            self.buffer.extend_from_slice(&chunk[..n]);

            if contains_ack(&self.buffer) {
                debug!("<- OK");
                self.buffer.advance(self.buffer.len());
                return Ok(());
            }
        }
    }

    /// Flush pending output, then shut the channel down.
    ///
    /// Both steps are attempted; the first error is returned.
    pub async fn close(&mut self) -> ModemResult<()> {
        let flushed = self.stream.flush().await;
        let shutdown = self.stream.shutdown().await;
        flushed?;
        shutdown?;
        Ok(())
    }
}

/// ASCII case-insensitive search for the acknowledgment token anywhere in `data`.
pub fn contains_ack(data: &[u8]) -> bool {
    data.windows(ACK_TOKEN.len())
        .any(|window| window.eq_ignore_ascii_case(ACK_TOKEN))
}
