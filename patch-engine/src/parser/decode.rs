//! Text decoding with a fixed fallback chain.
//!
//! Providers hand us file contents as bytes that are *usually* UTF-8. When they
//! are not, we try `iso-8859-1, latin-1, ascii, utf-16` in that order. The same
//! chain is used by the hunk validity check to detect lines that only differ by
//! a mis-decoded encoding.

use tracing::debug;

/// Fallback encodings, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackEncoding {
    Iso8859_1,
    Latin1,
    Ascii,
    Utf16,
}

pub const FALLBACK_ENCODINGS: [FallbackEncoding; 4] = [
    FallbackEncoding::Iso8859_1,
    FallbackEncoding::Latin1,
    FallbackEncoding::Ascii,
    FallbackEncoding::Utf16,
];

impl FallbackEncoding {
    pub fn label(self) -> &'static str {
        match self {
            FallbackEncoding::Iso8859_1 => "iso-8859-1",
            FallbackEncoding::Latin1 => "latin-1",
            FallbackEncoding::Ascii => "ascii",
            FallbackEncoding::Utf16 => "utf-16",
        }
    }

    /// Decode raw bytes. `None` if the bytes are not valid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            FallbackEncoding::Iso8859_1 | FallbackEncoding::Latin1 => {
                Some(bytes.iter().map(|&b| b as char).collect())
            }
            FallbackEncoding::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().map(|&b| b as char).collect()),
            FallbackEncoding::Utf16 => decode_utf16(bytes),
        }
    }

    /// Encode text. `None` if a character is not representable.
    pub fn encode(self, text: &str) -> Option<Vec<u8>> {
        match self {
            FallbackEncoding::Iso8859_1 | FallbackEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect(),
            FallbackEncoding::Ascii => text.is_ascii().then(|| text.as_bytes().to_vec()),
            FallbackEncoding::Utf16 => {
                // BOM + little-endian, the layout a generic "utf-16" encoder emits.
                let mut out = vec![0xFF, 0xFE];
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
                Some(out)
            }
        }
    }
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let (big_endian, body) = match bytes {
        [0xFE, 0xFF, rest @ ..] => (true, rest),
        [0xFF, 0xFE, rest @ ..] => (false, rest),
        _ => (false, bytes),
    };
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16(&units).ok()
}

/// Decode provider bytes: UTF-8 first, then the fallback chain.
/// Returns an empty string if nothing decodes.
pub fn decode_bytes(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    for enc in FALLBACK_ENCODINGS {
        if let Some(s) = enc.decode(bytes) {
            debug!("decode: fell back to {}", enc.label());
            return s;
        }
    }
    String::new()
}

/// Encode `text` with `enc`, then read the bytes back as UTF-8.
///
/// Recovers the intended text of a UTF-8 file that was decoded with a
/// single-byte encoding somewhere upstream.
pub fn reencode_as_utf8(text: &str, enc: FallbackEncoding) -> Option<String> {
    let bytes = enc.encode(text)?;
    String::from_utf8(bytes).ok()
}
