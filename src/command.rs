// ABOUTME: AT command units and their byte framing on the serial line
// ABOUTME: Covers single-line commands and the two-line AT+CMGS header / PDU body submission pair

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// Line terminator for every AT command line
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// SUB (Ctrl-Z) byte that ends PDU body input
pub const SUB: u8 = 0x1A;

/// Attention command, used as the initial handshake
pub const ATTENTION: &str = "AT";

/// Select PDU mode for SMS submission (`1` would be text mode)
pub const SELECT_PDU_MODE: &str = "AT+CMGF=0";

/// One AT transaction.
///
/// Units are consumed strictly in order. A submission pair is written as the
/// header line, a pause for the modem's input prompt, then the body line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandUnit {
    /// Single command line such as `AT` or `AT+CMGF=0`
    Line(String),
    /// `AT+CMGS=<length>` header followed by the PDU hex body
    Submit {
        /// TPDU length in octets, excluding the SMSC field
        length: usize,
        /// Full PDU as uppercase hex, SMSC field included
        pdu: String,
    },
}

impl CommandUnit {
    pub fn attention() -> Self {
        CommandUnit::Line(ATTENTION.to_string())
    }

    pub fn select_pdu_mode() -> Self {
        CommandUnit::Line(SELECT_PDU_MODE.to_string())
    }

    pub fn submit(length: usize, pdu: impl Into<String>) -> Self {
        CommandUnit::Submit {
            length,
            pdu: pdu.into(),
        }
    }

    /// The first (or only) line of the unit, without terminator
    pub fn header(&self) -> String {
        match self {
            CommandUnit::Line(line) => line.clone(),
            CommandUnit::Submit { length, .. } => format!("AT+CMGS={length}"),
        }
    }

    /// The PDU body line, present only for submission pairs
    pub fn body(&self) -> Option<&str> {
        match self {
            CommandUnit::Line(_) => None,
            CommandUnit::Submit { pdu, .. } => Some(pdu),
        }
    }

    /// Bytes of the header line as written to the channel
    pub fn header_frame(&self) -> Bytes {
        encode_line(&self.header())
    }

    /// Bytes of the body line as written to the channel
    pub fn body_frame(&self) -> Option<Bytes> {
        self.body().map(encode_body)
    }
}

impl fmt::Display for CommandUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandUnit::Line(line) => f.write_str(line),
            CommandUnit::Submit { pdu, .. } => write!(f, "{}\r\n{pdu}", self.header()),
        }
    }
}

/// Frame a command line: text followed by CR+LF.
pub fn encode_line(line: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(line.len() + LINE_TERMINATOR.len());
    buf.put_slice(line.as_bytes());
    buf.put_slice(LINE_TERMINATOR);
    buf.freeze()
}

/// Frame a PDU body line: hex text, SUB, then CR+LF.
pub fn encode_body(pdu: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(pdu.len() + 1 + LINE_TERMINATOR.len());
    buf.put_slice(pdu.as_bytes());
    buf.put_u8(SUB);
    buf.put_slice(LINE_TERMINATOR);
    buf.freeze()
}
