// ABOUTME: Destination address encoding for SMS-SUBMIT PDUs using swapped semi-octets
// ABOUTME: Validates telephone numbers and selects the international or unknown type of address

use crate::pdu::{PduError, push_hex};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Longest destination number the address field carries
const MAX_DIGITS: usize = 20;

/// Type-of-address octet, ISDN/telephone numbering plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum TypeOfAddress {
    /// Number without a type prefix
    Unknown = 0x81,
    /// Number written with a leading `+`
    International = 0x91,
}

/// A validated destination telephone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PduAddress {
    pub type_of_address: TypeOfAddress,
    digits: String,
}

impl PduAddress {
    /// Parse a telephone number made of digits with an optional leading `+`.
    pub fn parse(number: &str) -> Result<Self, PduError> {
        let number = number.trim();
        let (type_of_address, digits) = match number.strip_prefix('+') {
            Some(rest) => (TypeOfAddress::International, rest),
            None => (TypeOfAddress::Unknown, number),
        };

        if digits.is_empty()
            || digits.len() > MAX_DIGITS
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(PduError::InvalidAddress(number.to_string()));
        }

        Ok(Self {
            type_of_address,
            digits: digits.to_string(),
        })
    }

    /// Append the address field (digit count, type, semi-octets) as hex.
    pub fn write_hex(&self, out: &mut String) {
        // At most MAX_DIGITS digits, so the count fits one octet
        push_hex(out, self.digits.len() as u8);
        push_hex(out, u8::from(self.type_of_address));
        for pair in self.digits.as_bytes().chunks(2) {
            let low = pair[0] as char;
            let high = pair.get(1).map_or('F', |&b| b as char);
            out.push(high);
            out.push(low);
        }
    }
}
