//! PNG text chunk reading

use crate::error::Result;
use crate::types::MetadataMap;

/// Read every textual chunk (`tEXt`, `zTXt`, `iTXt`) in the file.
///
/// Text chunks may sit on either side of the image data, so the image is
/// decoded and the stream read through to `IEND`. Keywords map to their text. Compressed and international chunks are
/// inflated; a chunk that fails to inflate fails the whole read, as does a
/// bad signature, a CRC mismatch or a stream that ends early.
pub fn read_text_chunks(data: &[u8]) -> Result<MetadataMap> {
    let decoder = png::Decoder::new(data);
    let mut reader = decoder.read_info()?;

    let mut frame = vec![0; reader.output_buffer_size()];
    reader.next_frame(&mut frame)?;
    reader.finish()?;
    let info = reader.info();

    let mut map = MetadataMap::new();

    for chunk in &info.uncompressed_latin1_text {
        map.insert(chunk.keyword.as_str(), chunk.text.as_str());
    }

    for chunk in &info.compressed_latin1_text {
        let text = chunk.get_text()?;
        map.insert(chunk.keyword.as_str(), text);
    }

    for chunk in &info.utf8_text {
        let text = chunk.get_text()?;
        map.insert(chunk.keyword.as_str(), text);
    }

    tracing::trace!(chunks = map.len(), "read PNG text chunks");

    Ok(map)
}
