use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub drawer: DrawerSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL of the node editor server hosting the drawer endpoints
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for JSON endpoints (deletion, model lists). Media fetches are
    /// not timed out.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8188".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DrawerSettings {
    /// Comma-separated metadata keys for the allow/deny list
    #[serde(default)]
    pub key_list: String,

    /// Treat `key_list` as an allow-list instead of a deny-list
    #[serde(default)]
    pub key_list_allow: bool,

    /// Extensions (without dot) that are always shown as video
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,

    #[serde(default)]
    pub video: VideoOptions,
}

fn default_video_extensions() -> Vec<String> {
    vec!["mp4".to_string(), "webm".to_string()]
}

impl Default for DrawerSettings {
    fn default() -> Self {
        Self {
            key_list: String::new(),
            key_list_allow: false,
            video_extensions: default_video_extensions(),
            video: VideoOptions::default(),
        }
    }
}

/// Playback defaults applied to video drawer items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct VideoOptions {
    #[serde(default)]
    pub autoplay: bool,

    #[serde(default, rename = "loop")]
    pub loop_playback: bool,

    #[serde(default = "default_controls")]
    pub controls: bool,

    #[serde(default)]
    pub muted: bool,
}

fn default_controls() -> bool {
    true
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            autoplay: false,
            loop_playback: false,
            controls: default_controls(),
            muted: false,
        }
    }
}

impl VideoOptions {
    /// Browsers only allow autoplay for muted media, so autoplay implies muted.
    pub fn effective_muted(&self) -> bool {
        self.muted || self.autoplay
    }
}
