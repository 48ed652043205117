// ABOUTME: GSM 03.40 SMS-SUBMIT PDU encoder producing ordered AT+CMGS command units
// ABOUTME: Chooses GSM 7-bit or UCS-2 coding and splits long text into concatenated segments

//! PDU Encoder
//!
//! Turns a destination address and message text into the command units a
//! modem in PDU mode (`AT+CMGF=0`) expects:
//!
//! ```text
//! AT+CMGS=<tpdu octets>\r\n
//! <SMSC><first octet><MR><DA><PID><DCS><VP><UDL><UD>
//! ```
//!
//! The SMSC field is always `00` so the modem uses the service centre stored
//! on the SIM. Text that does not fit one SMS is split into segments that
//! carry an 8-bit concatenation user data header.
//!
//! ```rust
//! use atsms::pdu::Encoder;
//!
//! let units = Encoder::new().encode("+15551234567", "Hi").unwrap();
//! assert_eq!(units.len(), 1);
//! assert_eq!(units[0].header(), "AT+CMGS=16");
//! assert_eq!(units[0].body(), Some("0011000B915155214365F70000AA02C834"));
//! ```

pub mod address;
pub mod gsm7;

pub use address::{PduAddress, TypeOfAddress};

use crate::command::CommandUnit;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::sync::atomic::{AtomicU8, Ordering};
use thiserror::Error;

/// SMS-SUBMIT, relative validity period present
const FIRST_OCTET_SUBMIT: u8 = 0x11;
/// TP-UDHI bit, set when the user data starts with a header
const FIRST_OCTET_UDHI: u8 = 0x40;
/// Relative validity period of 4 days
const VALIDITY_PERIOD: u8 = 0xAA;
/// Concatenation header: UDHL, IEI (8-bit reference), IEDL, then ref/total/seq
const CONCAT_HEADER_LEN: usize = 6;
const MAX_SEGMENTS: usize = 255;
/// Message reference and protocol identifier are both sent as zero
const ZERO_OCTET: u8 = 0x00;

static NEXT_REFERENCE: AtomicU8 = AtomicU8::new(0);

/// Errors raised while building PDUs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PduError {
    #[error("Message text is empty")]
    EmptyMessage,

    #[error("Invalid destination address: {0:?}")]
    InvalidAddress(String),

    #[error("Message needs {0} segments (max 255)")]
    TooManySegments(usize),
}

/// TP-DCS values supported by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum DataCodingScheme {
    /// GSM 03.38 default alphabet, 7-bit packed
    Gsm7 = 0x00,
    /// UCS-2, big endian
    Ucs2 = 0x08,
}

impl DataCodingScheme {
    /// Pick the narrowest coding able to carry `text`
    pub fn for_text(text: &str) -> Self {
        if gsm7::is_encodable(text) {
            DataCodingScheme::Gsm7
        } else {
            DataCodingScheme::Ucs2
        }
    }

    /// Capacity of a single, unsegmented message in coding units
    /// (septets for GSM 7-bit, UTF-16 code units for UCS-2)
    pub fn single_capacity(&self) -> usize {
        match self {
            DataCodingScheme::Gsm7 => 160,
            DataCodingScheme::Ucs2 => 70,
        }
    }

    /// Capacity of one segment of a concatenated message
    pub fn segment_capacity(&self) -> usize {
        match self {
            DataCodingScheme::Gsm7 => 153,
            DataCodingScheme::Ucs2 => 67,
        }
    }

    fn units_of(&self, c: char) -> usize {
        match self {
            DataCodingScheme::Gsm7 => gsm7::lookup(c).map_or(0, |s| s.width()),
            DataCodingScheme::Ucs2 => c.len_utf16(),
        }
    }
}

/// Encoder for SMS-SUBMIT command units.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    reference: Option<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed concatenation reference instead of the rolling counter
    pub fn with_reference(mut self, reference: u8) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Encode `text` for delivery to `address`.
    ///
    /// Returns one unit per segment, in sending order.
    pub fn encode(&self, address: &str, text: &str) -> Result<Vec<CommandUnit>, PduError> {
        if text.is_empty() {
            return Err(PduError::EmptyMessage);
        }
        let address = PduAddress::parse(address)?;
        let dcs = DataCodingScheme::for_text(text);

        let total_units: usize = text.chars().map(|c| dcs.units_of(c)).sum();
        if total_units <= dcs.single_capacity() {
            return Ok(vec![build_unit(&address, dcs, text, None)]);
        }

        let segments = split(text, dcs);
        if segments.len() > MAX_SEGMENTS {
            return Err(PduError::TooManySegments(segments.len()));
        }

        let reference = self
            .reference
            .unwrap_or_else(|| NEXT_REFERENCE.fetch_add(1, Ordering::Relaxed));
        let total = segments.len() as u8;

        Ok(segments
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                let header = [0x05, 0x00, 0x03, reference, total, (i + 1) as u8];
                build_unit(&address, dcs, segment, Some(header))
            })
            .collect())
    }
}

/// Split text into segments that each fit `segment_capacity`, never breaking
/// an escape sequence or a surrogate pair.
fn split(text: &str, dcs: DataCodingScheme) -> Vec<&str> {
    let capacity = dcs.segment_capacity();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut used = 0;

    for (idx, c) in text.char_indices() {
        let units = dcs.units_of(c);
        if used + units > capacity {
            segments.push(&text[start..idx]);
            start = idx;
            used = 0;
        }
        used += units;
    }
    segments.push(&text[start..]);
    segments
}

fn build_unit(
    address: &PduAddress,
    dcs: DataCodingScheme,
    text: &str,
    header: Option<[u8; CONCAT_HEADER_LEN]>,
) -> CommandUnit {
    let (user_data_len, user_data) = user_data(dcs, text, header.as_ref());

    let mut first_octet = FIRST_OCTET_SUBMIT;
    if header.is_some() {
        first_octet |= FIRST_OCTET_UDHI;
    }

    let mut pdu = String::with_capacity(32 + user_data.len() * 2);
    // SMSC field: use the service centre stored on the SIM
    push_hex(&mut pdu, ZERO_OCTET);
    push_hex(&mut pdu, first_octet);
    push_hex(&mut pdu, ZERO_OCTET);
    address.write_hex(&mut pdu);
    push_hex(&mut pdu, ZERO_OCTET);
    push_hex(&mut pdu, dcs.into());
    push_hex(&mut pdu, VALIDITY_PERIOD);
    // At most 160 septets or 140 octets
    push_hex(&mut pdu, user_data_len as u8);
    for &byte in &user_data {
        push_hex(&mut pdu, byte);
    }

    // The SMSC field is one octet ("00") and is not counted by AT+CMGS
    let length = pdu.len() / 2 - 1;
    CommandUnit::submit(length, pdu)
}

/// Append `byte` as two uppercase hex digits.
pub(crate) fn push_hex(out: &mut String, byte: u8) {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    out.push(char::from(DIGITS[usize::from(byte >> 4)]));
    out.push(char::from(DIGITS[usize::from(byte & 0x0F)]));
}

/// Returns the TP-UDL value and the user data octets.
fn user_data(
    dcs: DataCodingScheme,
    text: &str,
    header: Option<&[u8; CONCAT_HEADER_LEN]>,
) -> (usize, Vec<u8>) {
    let mut data = Vec::new();
    if let Some(header) = header {
        data.extend_from_slice(header);
    }

    match dcs {
        DataCodingScheme::Gsm7 => {
            let septets = gsm7::to_septets(text).unwrap_or_default();
            let header_bits = data.len() * 8;
            let header_septets = header_bits.div_ceil(7);
            let fill_bits = (header_septets * 7 - header_bits) as u32;
            data.extend(gsm7::pack(&septets, fill_bits));
            (header_septets + septets.len(), data)
        }
        DataCodingScheme::Ucs2 => {
            for unit in text.encode_utf16() {
                data.extend_from_slice(&unit.to_be_bytes());
            }
            (data.len(), data)
        }
    }
}
