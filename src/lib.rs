//! Send SMS messages through a GSM modem in PDU mode.
//!
//! The crate talks AT commands over a serial line: it checks the modem with
//! `AT`, selects PDU mode with `AT+CMGF=0` and submits each GSM 03.40
//! SMS-SUBMIT segment with `AT+CMGS`, waiting for `OK` after every step.
//!
//! ```rust,no_run
//! use atsms::client::{ModemSession, SessionConfig, SmsMessage, SmsTransmitter};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = ModemSession::serial("/dev/ttyUSB0")
//!         .with_config(SessionConfig::default().with_ack_timeout(Duration::from_secs(10)));
//!
//!     session
//!         .send_sms(&SmsMessage::new("+15551234567", "Hello from the modem"))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod command;
pub mod connection;
pub mod pdu;
pub mod serial;

#[cfg(test)]
mod tests;

pub use command::CommandUnit;
pub use pdu::{Encoder, PduError};
pub use serial::SerialProfile;

// Re-export the main client API for easy access
pub use client::{
    ChannelOpener, ModemError, ModemSession, Phase, SendError, SendResult, SessionConfig,
    SmsMessage, SmsTransmitter, send_sms,
};
