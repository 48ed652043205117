// ABOUTME: Modem session controller sequencing the AT handshake and PDU submissions for one SMS
// ABOUTME: Owns the channel for the whole operation and always flushes and closes it before returning

use crate::client::error::{ModemResult, Phase, SendError, SendResult};
use crate::client::traits::{ChannelOpener, SmsTransmitter};
use crate::client::types::{SessionConfig, SmsMessage};
use crate::command::CommandUnit;
use crate::connection::Connection;
use crate::pdu::Encoder;
use crate::serial::SerialProfile;
use tokio::time;
use tracing::{debug, info, warn};

/// Modem session controller
///
/// Each call to [`send_sms`](SmsTransmitter::send_sms) opens the channel,
/// runs the fixed sequence below and releases the channel again:
///
/// ```text
/// AT              -> OK
/// AT+CMGF=0       -> OK
/// AT+CMGS=<n>     -> (prompt)      \
/// <pdu>\x1a       -> OK            / once per segment
/// ```
///
/// No step is retried. The first failure abandons the operation and is
/// reported with the phase it happened in.
#[derive(Debug)]
pub struct ModemSession<O> {
    opener: O,
    config: SessionConfig,
    encoder: Encoder,
}

impl ModemSession<SerialProfile> {
    /// Session on the serial port `port_name` with the fixed line profile
    pub fn serial(port_name: impl Into<String>) -> Self {
        Self::new(SerialProfile::new(port_name))
    }
}

impl<O: ChannelOpener> ModemSession<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            config: SessionConfig::default(),
            encoder: Encoder::default(),
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    async fn run(
        &self,
        connection: &mut Connection<O::Channel>,
        message: &SmsMessage,
    ) -> SendResult<()> {
        self.transact(connection, &CommandUnit::attention())
            .await
            .map_err(SendError::at(Phase::Initialization))?;

        self.transact(connection, &CommandUnit::select_pdu_mode())
            .await
            .map_err(SendError::at(Phase::ModeSelect))?;

        let units = self
            .encoder
            .encode(&message.to, &message.text)
            .map_err(|e| SendError::at(Phase::Encoding)(e.into()))?;

        info!(to = %message.to, segments = units.len(), "Submitting SMS");

        for (index, unit) in units.iter().enumerate() {
            self.transact(connection, unit)
                .await
                .map_err(SendError::at(Phase::Submission { index }))?;
            debug!(index, "Segment accepted");
        }

        Ok(())
    }

    /// Write one command unit and wait for its acknowledgment.
    async fn transact(
        &self,
        connection: &mut Connection<O::Channel>,
        unit: &CommandUnit,
    ) -> ModemResult<()> {
        connection.write_frame(&unit.header_frame()).await?;

        if let Some(body) = unit.body_frame() {
            time::sleep(self.config.prompt_delay).await;
            connection.write_frame(&body).await?;
        }

        connection.await_ok(self.config.ack_timeout).await
    }
}

impl<O: ChannelOpener> SmsTransmitter for ModemSession<O> {
    async fn send_sms(&mut self, message: &SmsMessage) -> SendResult<()> {
        message.validate()?;

        let channel = self
            .opener
            .open()
            .await
            .map_err(|e| SendError::at(Phase::Open)(e.into()))?;
        let mut connection = Connection::new(channel, self.opener.read_timeout());

        let outcome = self.run(&mut connection, message).await;

        // Release on every path; a release failure does not change the outcome
        if let Err(e) = connection.close().await {
            warn!("Failed to release modem channel: {e}");
        }

        match &outcome {
            Ok(()) => info!(to = %message.to, "SMS sent"),
            Err(e) => debug!("SMS send abandoned: {e}"),
        }
        outcome
    }
}
