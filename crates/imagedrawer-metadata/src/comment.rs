//! EXIF UserComment text decoding and JSON flattening

use crate::error::{MetadataError, Result};
use crate::types::MetadataMap;

/// Character-code header for UCS-2/UTF-16 comments.
const UNICODE_HEADER: &[u8; 8] = b"UNICODE\0";

/// Character-code header for ASCII comments.
const ASCII_HEADER: &[u8; 8] = b"ASCII\0\0\0";

/// Marker text left behind when the header itself was encoded as UTF-16.
const UNICODE_MARKER: &str = "UNICODE";

/// Decode a UserComment payload into text.
///
/// Payloads with a `UNICODE\0` header are decoded as UTF-16 (little-endian
/// unless the byte pattern says otherwise), payloads with an `ASCII` header as
/// UTF-8, and anything else as UTF-16LE. Null characters and the first
/// `UNICODE` marker are removed from the result.
pub fn decode_user_comment(payload: &[u8]) -> Result<String> {
    let decoded = if let Some(body) = payload.strip_prefix(UNICODE_HEADER) {
        decode_utf16(body, looks_big_endian(body))?
    } else if let Some(body) = payload.strip_prefix(ASCII_HEADER) {
        std::str::from_utf8(body)
            .map_err(|e| MetadataError::text(e.to_string()))?
            .to_string()
    } else {
        decode_utf16(payload, false)?
    };

    let cleaned: String = decoded.chars().filter(|c| *c != '\0').collect();
    Ok(cleaned.replacen(UNICODE_MARKER, "", 1))
}

/// Parse decoded comment text as a JSON object of generation parameters.
pub fn parse_json_metadata(text: &str) -> Result<MetadataMap> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    match value {
        serde_json::Value::Object(object) => Ok(MetadataMap::from_json_object(&object)),
        serde_json::Value::Array(_) => Err(MetadataError::NotAnObject("array")),
        serde_json::Value::String(_) => Err(MetadataError::NotAnObject("string")),
        serde_json::Value::Number(_) => Err(MetadataError::NotAnObject("number")),
        serde_json::Value::Bool(_) => Err(MetadataError::NotAnObject("bool")),
        serde_json::Value::Null => Err(MetadataError::NotAnObject("null")),
    }
}

fn decode_utf16(bytes: &[u8], big_endian: bool) -> Result<String> {
    // A single trailing pad byte is tolerated
    let bytes = match bytes.split_last() {
        Some((&0, rest)) if bytes.len() % 2 == 1 => rest,
        _ => bytes,
    };

    if bytes.len() % 2 != 0 {
        return Err(MetadataError::text(format!(
            "odd UTF-16 payload length {}",
            bytes.len()
        )));
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();

    String::from_utf16(&units).map_err(|e| MetadataError::text(e.to_string()))
}

/// Mostly-ASCII UTF-16 text has its zero bytes on odd offsets when
/// little-endian and on even offsets when big-endian.
fn looks_big_endian(body: &[u8]) -> bool {
    let sample = &body[..body.len().min(64)];
    let (even_zeros, odd_zeros) =
        sample
            .iter()
            .enumerate()
            .fold((0usize, 0usize), |(even, odd), (i, b)| match (*b, i % 2) {
                (0, 0) => (even + 1, odd),
                (0, _) => (even, odd + 1),
                _ => (even, odd),
            });
    even_zeros > odd_zeros
}
