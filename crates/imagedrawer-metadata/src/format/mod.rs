//! Media format detection and per-format metadata readers

pub mod png;
pub mod webp;

use std::path::Path;

/// Encodings the extractor distinguishes between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaFormat {
    /// Portable Network Graphics (.png)
    Png,
    /// WebP in a RIFF container (.webp)
    Webp,
    /// Anything else; no extraction is attempted
    Other,
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaFormat::Png => write!(f, "PNG"),
            MediaFormat::Webp => write!(f, "WEBP"),
            MediaFormat::Other => write!(f, "other"),
        }
    }
}

impl MediaFormat {
    /// Derive the format from a file name's extension (case-insensitive)
    pub fn from_filename(name: &str) -> Self {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| match ext.to_ascii_lowercase().as_str() {
                "png" => MediaFormat::Png,
                "webp" => MediaFormat::Webp,
                _ => MediaFormat::Other,
            })
            .unwrap_or(MediaFormat::Other)
    }

    /// Detect the format from magic bytes
    pub fn sniff(data: &[u8]) -> Self {
        // PNG signature
        if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return MediaFormat::Png;
        }

        // RIFF header with WEBP form type at offset 8
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return MediaFormat::Webp;
        }

        MediaFormat::Other
    }

    /// Use the file name when it is conclusive, otherwise fall back to sniffing
    pub fn detect(name: &str, data: &[u8]) -> Self {
        match Self::from_filename(name) {
            MediaFormat::Other => Self::sniff(data),
            known => known,
        }
    }
}
