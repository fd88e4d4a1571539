//! Drawer item descriptors built from the backend file listing.

use std::fmt;

use chrono::Utc;
use imagedrawer_metadata::MediaFormat;
use serde::{Deserialize, Serialize};

/// Backend endpoint serving raw media bytes.
pub const VIEW_IMAGE_PATH: &str = "/jnodes_view_image";

/// Asset category a drawer item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    #[default]
    Output,
    Input,
    Temp,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Output => "output",
            AssetType::Input => "input",
            AssetType::Temp => "temp",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "output" => Ok(AssetType::Output),
            "input" => Ok(AssetType::Input),
            "temp" => Ok(AssetType::Temp),
            other => Err(format!("unknown asset type: {other}")),
        }
    }
}

/// Known pixel size of an item, used to size its placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// One entry of the backend file listing.
#[derive(Debug, Clone, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    #[serde(rename = "type", default)]
    pub asset_type: AssetType,
    #[serde(default)]
    pub subfolder: String,
    #[serde(default)]
    pub file: Option<FileDetails>,
}

/// Per-file details the backend includes when it has read the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileDetails {
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub metadata_read: bool,
    /// Sent as `[height, width]`.
    #[serde(default)]
    pub dimensions: Option<[u32; 2]>,
    #[serde(default)]
    pub file_age: Option<i64>,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub format: Option<String>,
}

/// Immutable description of a single drawer item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    pub filename: String,
    pub asset_type: AssetType,
    pub subfolder: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub is_video: bool,
    /// Seconds since the Unix epoch.
    pub file_age: i64,
    /// Bytes, or -1 when unknown.
    pub file_size: i64,
    /// MIME type for video sources.
    pub video_format: Option<String>,
}

impl MediaDescriptor {
    /// A descriptor with nothing known beyond its name and category.
    pub fn new(filename: impl Into<String>, asset_type: AssetType) -> Self {
        Self {
            filename: filename.into(),
            asset_type,
            subfolder: None,
            dimensions: None,
            is_video: false,
            file_age: Utc::now().timestamp(),
            file_size: -1,
            video_format: None,
        }
    }

    pub fn with_subfolder(mut self, subfolder: impl Into<String>) -> Self {
        let subfolder = subfolder.into();
        self.subfolder = (!subfolder.is_empty()).then_some(subfolder);
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some(Dimensions { width, height });
        self
    }

    /// Build a descriptor from a listing entry.
    ///
    /// Dimensions only count as known when the backend says it read the
    /// file's metadata. `video_extensions` are matched case-insensitively
    /// and without the leading dot.
    pub fn from_file_info(info: FileInfo, video_extensions: &[String]) -> Self {
        let details = info.file.unwrap_or_default();

        let dimensions = details
            .dimensions
            .filter(|_| details.metadata_read)
            .map(|[height, width]| Dimensions { width, height });

        let is_video = details.is_video || has_extension(&info.filename, video_extensions);

        Self {
            is_video,
            dimensions,
            subfolder: (!info.subfolder.is_empty()).then_some(info.subfolder),
            asset_type: info.asset_type,
            file_age: details.file_age.unwrap_or_else(|| Utc::now().timestamp()),
            file_size: details.file_size.unwrap_or(-1),
            video_format: details.format,
            filename: info.filename,
        }
    }

    /// Format hint for metadata extraction.
    pub fn media_format(&self) -> MediaFormat {
        MediaFormat::from_filename(&self.filename)
    }

    /// Backend path serving this item's bytes, optionally with a cache buster.
    ///
    /// Query components are escaped like `encodeURIComponent`, so `!'()*`
    /// stay literal.
    pub fn view_path(&self, cache_buster: Option<i64>) -> String {
        let mut path = format!(
            "{}?filename={}&type={}&subfolder={}",
            VIEW_IMAGE_PATH,
            encode_component(&self.filename),
            self.asset_type,
            encode_component(self.subfolder.as_deref().unwrap_or_default()),
        );
        if let Some(t) = cache_buster {
            path.push_str(&format!("&t={t}"));
        }
        path
    }
}

/// Percent-encode a query component, leaving the marks `encodeURIComponent`
/// keeps unescaped.
fn encode_component(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

fn has_extension(filename: &str, extensions: &[String]) -> bool {
    let Some((_, ext)) = filename.rsplit_once('.') else {
        return false;
    };
    extensions
        .iter()
        .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(ext))
}
