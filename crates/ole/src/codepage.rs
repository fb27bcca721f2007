//! Codepage decoding for VBA project strings.
//!
//! Record strings in the `dir` stream and module source text are stored in
//! the project's MBCS codepage (PROJECTCODEPAGE record); the `*Unicode`
//! record variants are UTF-16LE.

use encoding_rs::Encoding;

/// Codepage assumed when a project carries no PROJECTCODEPAGE record.
pub const DEFAULT_CODEPAGE: u16 = 1252;

/// Map a Windows codepage number to its encoding, defaulting to
/// Windows-1252 for anything unrecognized.
pub fn encoding_for_codepage(codepage: u16) -> &'static Encoding {
    match codepage {
        874 => encoding_rs::WINDOWS_874,
        932 => encoding_rs::SHIFT_JIS,
        936 => encoding_rs::GBK,
        949 => encoding_rs::EUC_KR,
        950 => encoding_rs::BIG5,
        1250 => encoding_rs::WINDOWS_1250,
        1251 => encoding_rs::WINDOWS_1251,
        1252 => encoding_rs::WINDOWS_1252,
        1253 => encoding_rs::WINDOWS_1253,
        1254 => encoding_rs::WINDOWS_1254,
        1255 => encoding_rs::WINDOWS_1255,
        1256 => encoding_rs::WINDOWS_1256,
        1257 => encoding_rs::WINDOWS_1257,
        1258 => encoding_rs::WINDOWS_1258,
        65001 => encoding_rs::UTF_8,
        _ => encoding_rs::WINDOWS_1252,
    }
}

/// Decode MBCS bytes using the project codepage. Malformed sequences are
/// replaced, not rejected.
pub fn decode_mbcs(bytes: &[u8], codepage: u16) -> String {
    let (text, _, _) = encoding_for_codepage(codepage).decode(bytes);
    text.into_owned()
}

/// Decode UTF-16LE bytes, tolerating a dangling odd byte.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_decodes_under_any_codepage() {
        assert_eq!(decode_mbcs(b"Module1", 1252), "Module1");
        assert_eq!(decode_mbcs(b"Module1", 932), "Module1");
    }

    #[test]
    fn test_windows_1252_accents() {
        assert_eq!(decode_mbcs(b"caf\xE9", 1252), "caf\u{e9}");
    }

    #[test]
    fn test_windows_1251_cyrillic() {
        let bytes = [0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2];
        assert_eq!(decode_mbcs(&bytes, 1251), "Привет");
    }

    #[test]
    fn test_utf8_codepage() {
        assert_eq!(decode_mbcs("Módulo".as_bytes(), 65001), "Módulo");
    }

    #[test]
    fn test_unknown_codepage_falls_back_to_1252() {
        assert_eq!(decode_mbcs(b"caf\xE9", 42), "caf\u{e9}");
    }

    #[test]
    fn test_utf16le_roundtrip() {
        let text = "Лист1";
        let bytes: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        assert_eq!(decode_utf16le(&bytes), text);
    }

    #[test]
    fn test_utf16le_odd_trailing_byte_is_dropped() {
        let bytes = [b'A', 0x00, 0xFF];
        assert_eq!(decode_utf16le(&bytes), "A");
    }
}
