//! WEBP (RIFF) container walking and EXIF UserComment lookup

use crate::comment;
use crate::error::{MetadataError, Result};
use crate::types::MetadataMap;

/// Chunk holding the EXIF block inside a WEBP file.
pub const EXIF_CHUNK: [u8; 4] = *b"EXIF";

/// Prefix some writers put in front of the TIFF header.
const EXIF_PREFIX: &[u8; 6] = b"Exif\0\0";

/// Find the payload of the first chunk with the given four-character code.
///
/// Returns `Ok(None)` when the container is well formed but has no such
/// chunk. A missing RIFF/WEBP header or a chunk running past the end of the
/// data is an error.
pub fn find_chunk<'a>(data: &'a [u8], fourcc: &[u8; 4]) -> Result<Option<&'a [u8]>> {
    if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WEBP" {
        return Err(MetadataError::riff("missing RIFF/WEBP header"));
    }

    let mut offset = 12;
    while offset + 8 <= data.len() {
        let code = &data[offset..offset + 4];
        let size = u32::from_le_bytes([
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ]) as usize;

        let start = offset + 8;
        let end = start
            .checked_add(size)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| {
                MetadataError::riff(format!(
                    "chunk '{}' at offset {} overruns the file",
                    String::from_utf8_lossy(code),
                    offset
                ))
            })?;

        if code == fourcc {
            return Ok(Some(&data[start..end]));
        }

        // Chunks are padded to an even size
        offset = end + (size & 1);
    }

    Ok(None)
}

/// Extract the JSON metadata stored in the EXIF `UserComment` tag.
///
/// Returns `Ok(None)` when the file has no EXIF chunk or the EXIF block has
/// no `UserComment`.
pub fn read_user_comment(data: &[u8]) -> Result<Option<MetadataMap>> {
    let Some(exif_chunk) = find_chunk(data, &EXIF_CHUNK)? else {
        return Ok(None);
    };

    let tiff = exif_chunk.strip_prefix(EXIF_PREFIX).unwrap_or(exif_chunk);
    let exif = exif::Reader::new().read_raw(tiff.to_vec())?;

    // Some writers put UserComment straight into IFD0
    let field = exif
        .fields()
        .find(|f| f.tag == exif::Tag::UserComment)
        .or_else(|| {
            exif.fields()
                .find(|f| f.tag.number() == exif::Tag::UserComment.number())
        });
    let Some(field) = field else {
        tracing::trace!("EXIF block has no UserComment");
        return Ok(None);
    };

    let payload: &[u8] = match &field.value {
        exif::Value::Undefined(bytes, _) => bytes,
        exif::Value::Byte(bytes) => bytes,
        exif::Value::Ascii(strings) => strings.first().map(Vec::as_slice).unwrap_or(&[]),
        other => {
            return Err(MetadataError::text(format!(
                "unexpected UserComment value type {:?}",
                other
            )))
        }
    };

    let text = comment::decode_user_comment(payload)?;
    comment::parse_json_metadata(&text).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn riff(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let mut body = b"WEBP".to_vec();
        for (code, payload) in chunks {
            body.extend_from_slice(*code);
            body.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            body.extend_from_slice(payload);
            if payload.len() % 2 == 1 {
                body.push(0);
            }
        }
        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn finds_chunk_after_odd_sized_chunk() {
        let data = riff(&[(b"VP8 ", &b"abc"[..]), (b"EXIF", &b"tiff"[..])]);
        assert_eq!(find_chunk(&data, b"EXIF").unwrap(), Some(&b"tiff"[..]));
    }

    #[test]
    fn missing_chunk_is_none() {
        let data = riff(&[(b"VP8 ", &b"abcd"[..])]);
        assert_eq!(find_chunk(&data, b"EXIF").unwrap(), None);
        assert!(read_user_comment(&data).unwrap().is_none());
    }

    #[test]
    fn overrunning_chunk_is_an_error() {
        let mut data = riff(&[(b"EXIF", &b"tiff"[..])]);
        data.truncate(data.len() - 2);
        assert!(matches!(
            find_chunk(&data, b"EXIF"),
            Err(MetadataError::Riff(_))
        ));
    }

    #[test]
    fn non_riff_data_is_an_error() {
        assert!(matches!(
            find_chunk(b"\x89PNG\r\n\x1a\n", b"EXIF"),
            Err(MetadataError::Riff(_))
        ));
    }

    #[test]
    fn garbage_exif_is_an_error() {
        let data = riff(&[(b"EXIF", &b"not a tiff header"[..])]);
        assert!(matches!(
            read_user_comment(&data),
            Err(MetadataError::Exif(_))
        ));
    }
}
