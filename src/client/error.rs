// ABOUTME: Modem client error types covering channel I/O, acknowledgment timeouts and PDU encoding
// ABOUTME: SendError reports the phase of the send operation that failed together with its cause

use crate::pdu::PduError;
use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single channel operation or protocol wait
#[derive(Debug, Error)]
pub enum ModemError {
    /// I/O error while opening, writing, reading or closing the channel
    #[error("Channel error: {0}")]
    Channel(#[from] io::Error),

    /// No "OK" seen within the acknowledgment window
    #[error("No acknowledgment within {0:?}")]
    Timeout(Duration),

    /// The encoder could not build the submission PDUs
    #[error("PDU encoding failed: {0}")]
    Encoding(#[from] PduError),
}

/// Result type alias for channel and protocol operations
pub type ModemResult<T> = Result<T, ModemError>;

/// Stage of a send operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Opening the serial channel
    Open,
    /// `AT` handshake
    Initialization,
    /// `AT+CMGF=0`
    ModeSelect,
    /// Building the submission units
    Encoding,
    /// Submitting the unit at `index` (zero-based)
    Submission { index: usize },
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Open => f.write_str("open"),
            Phase::Initialization => f.write_str("initialization"),
            Phase::ModeSelect => f.write_str("mode select"),
            Phase::Encoding => f.write_str("encoding"),
            Phase::Submission { index } => write!(f, "submission of unit {index}"),
        }
    }
}

/// Outcome of a failed send operation
#[derive(Debug, Error)]
pub enum SendError {
    /// Required input missing; nothing was sent and no channel was opened
    #[error("Usage error: {0}")]
    Usage(String),

    /// The operation was abandoned at `phase`
    #[error("SMS send failed during {phase}: {source}")]
    Aborted {
        phase: Phase,
        #[source]
        source: ModemError,
    },
}

impl SendError {
    pub(crate) fn at(phase: Phase) -> impl FnOnce(ModemError) -> SendError {
        move |source| SendError::Aborted { phase, source }
    }

    /// The phase that failed, if the operation got past input validation
    pub fn phase(&self) -> Option<Phase> {
        match self {
            SendError::Usage(_) => None,
            SendError::Aborted { phase, .. } => Some(*phase),
        }
    }

    /// Returns true if the failure was an acknowledgment timeout
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            SendError::Aborted {
                source: ModemError::Timeout(_),
                ..
            }
        )
    }
}

/// Result type alias for send operations
pub type SendResult<T> = Result<T, SendError>;
