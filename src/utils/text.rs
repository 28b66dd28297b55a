// src/utils/text.rs

//! Text normalization for upstream payloads.

use std::sync::LazyLock;

use regex::Regex;

/// ASCII control characters other than tab and newline.
static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0B-\x1F\x7F]").expect("static control-char pattern")
});

/// Decode bytes as UTF-8, falling back to ISO-8859-9 (Latin-5, Turkish).
pub fn decode_feed_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            log::debug!("Payload is not valid UTF-8, decoding as ISO-8859-9");
            bytes.iter().map(|&b| latin5_char(b)).collect()
        }
    }
}

/// Map one ISO-8859-9 byte to its character.
///
/// Latin-5 equals Latin-1 except for six Turkish letters.
fn latin5_char(byte: u8) -> char {
    match byte {
        0xD0 => 'Ğ',
        0xDD => 'İ',
        0xDE => 'Ş',
        0xF0 => 'ğ',
        0xFD => 'ı',
        0xFE => 'ş',
        b => char::from(b),
    }
}

/// Remove control characters, keeping line structure.
///
/// `\r\n` line endings collapse to `\n`.
pub fn strip_control_chars(text: &str) -> String {
    CONTROL_CHARS.replace_all(text, "").into_owned()
}
