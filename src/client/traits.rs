// ABOUTME: Core modem client traits using native async functions
// ABOUTME: Separates opening the byte channel from the SMS submission operation that uses it

use crate::client::error::SendResult;
use crate::client::types::SmsMessage;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// Source of the byte channel to the modem
///
/// Implemented by [`SerialProfile`](crate::serial::SerialProfile) for real
/// ports. Any duplex async byte stream can stand in for the modem, which is
/// how the session is exercised without hardware.
pub trait ChannelOpener {
    /// The opened duplex channel
    type Channel: AsyncRead + AsyncWrite + Unpin;

    /// Open the channel
    ///
    /// Called once per send operation. An error here aborts the operation
    /// before anything is written.
    async fn open(&self) -> io::Result<Self::Channel>;

    /// Bound on a single read from the opened channel
    fn read_timeout(&self) -> Duration;
}

/// SMS submission through a modem
pub trait SmsTransmitter {
    /// Send one SMS message
    ///
    /// Opens the channel, initializes the modem, submits every PDU segment
    /// and releases the channel again, whatever the outcome.
    async fn send_sms(&mut self, message: &SmsMessage) -> SendResult<()>;
}
