//! Digest/length format validation shared by upload, blob index, and
//! version assembly.

/// A SHA-256 digest is 64 lowercase hex characters.
pub fn is_valid_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(is_lower_hex_byte)
}

/// A SHA-1 digest (optional checksum field on artifact entries) is 40
/// lowercase hex characters.
pub fn is_valid_sha1_hex(s: &str) -> bool {
    s.len() == 40 && s.bytes().all(is_lower_hex_byte)
}

fn is_lower_hex_byte(b: u8) -> bool {
    b.is_ascii_digit() || (b'a'..=b'f').contains(&b)
}

pub fn encode_digest(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
