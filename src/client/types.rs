// ABOUTME: Supporting types for modem sessions: the SMS message and session timing configuration
// ABOUTME: Provides sensible defaults and with_* builders in place of process-wide settings

use crate::client::error::SendError;
use std::time::Duration;

/// SMS message to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    /// Destination telephone number, optionally with a leading `+`
    pub to: String,
    /// Message text content
    pub text: String,
}

impl SmsMessage {
    pub fn new(to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            text: text.into(),
        }
    }

    /// Check that both the destination and the text are present
    pub fn validate(&self) -> Result<(), SendError> {
        if self.to.trim().is_empty() {
            return Err(SendError::Usage("telephone number is required".to_string()));
        }
        if self.text.is_empty() {
            return Err(SendError::Usage("sms text is required".to_string()));
        }
        Ok(())
    }
}

/// Timing of a modem session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long to wait for "OK" after each command (default: 5 seconds)
    pub ack_timeout: Duration,

    /// Pause between the `AT+CMGS` header and the PDU body (default: 500 ms)
    ///
    /// Gives the modem time to present its `>` input prompt. Sending the body
    /// too early risks it being read as a new command.
    pub prompt_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(5),
            prompt_delay: Duration::from_millis(500),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }

    pub fn with_prompt_delay(mut self, prompt_delay: Duration) -> Self {
        self.prompt_delay = prompt_delay;
        self
    }
}
