//! # imagedrawer-metadata
//!
//! Extraction of embedded generation metadata from drawer media.
//!
//! Image generators store their parameters inside the files they write. This
//! crate reads them back into an ordered [`MetadataMap`]:
//!
//! - PNG: `tEXt`, `zTXt` and `iTXt` chunks (keyword → text), via `png`
//! - WEBP: the EXIF `UserComment` tag holding UTF-16 JSON, via `kamadak-exif`
//! - anything else: no extraction
//!
//! Decode failures never escape [`extract`]; they are logged and reported as
//! "no metadata", so a broken file only affects its own drawer item.
//!
//! ## Example
//!
//! ```no_run
//! use imagedrawer_metadata::{extract, MediaFormat};
//!
//! let blob = std::fs::read("ComfyUI_00001_.png").unwrap();
//! if let Some(metadata) = extract(&blob, MediaFormat::Png) {
//!     for (key, value) in metadata.iter() {
//!         println!("{key}: {value}");
//!     }
//! }
//! ```

pub mod comment;
pub mod error;
pub mod format;
pub mod types;

pub use error::{MetadataError, Result};
pub use format::MediaFormat;
pub use types::{MetadataMap, NEGATIVE_PROMPT_KEY, POSITIVE_PROMPT_KEY};

use std::path::Path;

/// Extract embedded metadata, reporting decode failures to the caller.
///
/// Returns `Ok(None)` for [`MediaFormat::Other`] and for files that carry no
/// metadata at all.
pub fn try_extract(blob: &[u8], format: MediaFormat) -> Result<Option<MetadataMap>> {
    let map = match format {
        MediaFormat::Png => Some(format::png::read_text_chunks(blob)?),
        MediaFormat::Webp => format::webp::read_user_comment(blob)?,
        MediaFormat::Other => return Ok(None),
    };

    Ok(map.filter(|m| !m.is_empty()))
}

/// Extract embedded metadata from a fetched media blob.
///
/// This is the main entry point. Any decode failure is logged and yields
/// `None`, the same as a file without metadata.
pub fn extract(blob: &[u8], format: MediaFormat) -> Option<MetadataMap> {
    match try_extract(blob, format) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(
                format = %format,
                size = blob.len(),
                error = %e,
                "failed to decode embedded metadata"
            );
            None
        }
    }
}

/// Read a local file and extract its metadata.
///
/// The format is taken from the extension, falling back to magic bytes. Only
/// IO errors are returned; decode failures behave as in [`extract`].
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Option<MetadataMap>> {
    let path = path.as_ref();
    let blob = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let format = MediaFormat::detect(&name, &blob);
    tracing::debug!(path = %path.display(), format = %format, "extracting metadata from file");

    Ok(extract(&blob, format))
}
