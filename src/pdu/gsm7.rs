// ABOUTME: GSM 03.38 default alphabet lookup and septet packing for 7-bit SMS user data
// ABOUTME: Maps text to septets (including the escape extension table) and packs them into octets

/// Escape septet that introduces a character from the extension table.
pub const ESCAPE: u8 = 0x1B;

/// GSM 03.38 default alphabet, indexed by septet value.
///
/// Position 0x1B is the escape code and never matches a character.
const DEFAULT_ALPHABET: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', //
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1b}', 'Æ', 'æ', 'ß', 'É', //
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', //
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à', //
];

/// Extension table entries reachable through [`ESCAPE`].
const EXTENSION_TABLE: [(char, u8); 10] = [
    ('\u{0c}', 0x0A),
    ('^', 0x14),
    ('{', 0x28),
    ('}', 0x29),
    ('\\', 0x2F),
    ('[', 0x3C),
    ('~', 0x3D),
    (']', 0x3E),
    ('|', 0x40),
    ('€', 0x65),
];

/// Septet encoding of a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Septets {
    /// Character from the default alphabet
    Single(u8),
    /// Character from the extension table, sent as `ESCAPE` followed by the code
    Escaped(u8),
}

impl Septets {
    /// Number of septets this character occupies on the wire
    pub fn width(&self) -> usize {
        match self {
            Septets::Single(_) => 1,
            Septets::Escaped(_) => 2,
        }
    }

    fn push_to(self, out: &mut Vec<u8>) {
        match self {
            Septets::Single(code) => out.push(code),
            Septets::Escaped(code) => {
                out.push(ESCAPE);
                out.push(code);
            }
        }
    }
}

/// Look up the septet encoding of `c`, if it exists in the GSM alphabet.
pub fn lookup(c: char) -> Option<Septets> {
    if c == '\u{1b}' {
        return None;
    }
    if let Some(pos) = DEFAULT_ALPHABET.iter().position(|&a| a == c) {
        return Some(Septets::Single(pos as u8));
    }
    EXTENSION_TABLE
        .iter()
        .find(|(ext, _)| *ext == c)
        .map(|&(_, code)| Septets::Escaped(code))
}

/// Returns true if every character of `text` can be sent with the 7-bit alphabet.
pub fn is_encodable(text: &str) -> bool {
    text.chars().all(|c| lookup(c).is_some())
}

/// Encode `text` into septets, or `None` if a character is outside the alphabet.
pub fn to_septets(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        lookup(c)?.push_to(&mut out);
    }
    Some(out)
}

/// Pack septets into octets, least significant bit first.
///
/// `fill_bits` zero bits are emitted before the first septet so that text
/// following a user data header starts on a septet boundary.
pub fn pack(septets: &[u8], fill_bits: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity((septets.len() * 7 + fill_bits as usize).div_ceil(8));
    let mut acc: u32 = 0;
    let mut bits = fill_bits;

    for &septet in septets {
        acc |= u32::from(septet & 0x7F) << bits;
        bits += 7;
        while bits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            bits -= 8;
        }
    }

    if bits > 0 {
        out.push(acc as u8);
    }

    out
}
