// ABOUTME: Modem client module providing the SMS send operation over an AT command channel
// ABOUTME: Exports the session controller, its traits, configuration types and error types

//! Modem Client Module
//!
//! Sends a single SMS through a GSM modem in PDU mode.
//!
//! * **Native async traits** - `ChannelOpener` and `SmsTransmitter` use async fn in traits
//! * **Any channel** - the session runs over any duplex async byte stream
//! * **Phase-tagged errors** - failures report where the operation stopped
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use atsms::client::{ModemSession, SmsMessage, SmsTransmitter};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = ModemSession::serial("/dev/ttyUSB0");
//! session.send_sms(&SmsMessage::new("+15551234567", "Hello!")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! * `ChannelOpener` - opens the byte channel (`SerialProfile` for real ports)
//! * `SmsTransmitter` - the send operation
//! * `ModemSession` - default implementation of `SmsTransmitter`

pub mod error;
pub mod session;
pub mod traits;
pub mod types;

pub use error::{ModemError, ModemResult, Phase, SendError, SendResult};
pub use session::ModemSession;
pub use traits::{ChannelOpener, SmsTransmitter};
pub use types::{SessionConfig, SmsMessage};

/// Send `text` to `to` through the modem on `port_name`.
///
/// Uses the fixed serial profile and default session timing.
pub async fn send_sms(
    to: impl Into<String>,
    text: impl Into<String>,
    port_name: impl Into<String>,
) -> SendResult<()> {
    let message = SmsMessage::new(to, text);
    ModemSession::serial(port_name).send_sms(&message).await
}
