//! HTTP client for the drawer endpoints of the node editor backend.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::config::BackendConfig;
use crate::descriptor::{AssetType, MediaDescriptor};
use crate::error::{DrawerError, Result};
use crate::familiar::ModelList;

const DELETE_ITEMS_PATH: &str = "/jnodes_delete_items";
const MODEL_ITEMS_PATH: &str = "/jnodes_model_items";

/// Anything that can produce the raw bytes of a drawer item.
#[async_trait::async_trait]
pub trait MediaSource: Send + Sync {
    async fn fetch_media(&self, descriptor: &MediaDescriptor) -> Result<Bytes>;
}

/// Model families served by the model list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Loras,
    Embeddings,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Loras => "loras",
            ModelKind::Embeddings => "embeddings",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    items: Vec<DeleteItem<'a>>,
}

#[derive(Serialize)]
struct DeleteItem<'a> {
    filename: &'a str,
    #[serde(rename = "type")]
    asset_type: AssetType,
    subfolder: &'a str,
}

#[derive(Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    success: bool,
}

/// Client for media bytes, deletion and model lists.
///
/// Model lists are cached per kind until a forced refresh.
pub struct DrawerClient {
    media: Client,
    api: Client,
    base_url: String,
    model_cache: Mutex<HashMap<ModelKind, Arc<ModelList>>>,
}

impl DrawerClient {
    pub fn new(config: &BackendConfig) -> Self {
        // Media can be large; only JSON calls get the configured timeout.
        let api = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            media: Client::new(),
            api,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check_status(response: Response, path: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(DrawerError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            })
        }
    }

    /// Ask the backend to delete `items`. Returns the backend's verdict.
    pub async fn delete_items(&self, items: &[MediaDescriptor]) -> Result<bool> {
        let request = DeleteRequest {
            items: items
                .iter()
                .map(|d| DeleteItem {
                    filename: &d.filename,
                    asset_type: d.asset_type,
                    subfolder: d.subfolder.as_deref().unwrap_or_default(),
                })
                .collect(),
        };

        let response = self
            .api
            .post(self.url(DELETE_ITEMS_PATH))
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response, DELETE_ITEMS_PATH)?;
        let body: DeleteResponse = response.json().await?;

        tracing::info!(count = items.len(), success = body.success, "Delete request finished");
        Ok(body.success)
    }

    /// Model list for `kind`, from cache unless `force_refresh` is set.
    pub async fn model_items(&self, kind: ModelKind, force_refresh: bool) -> Result<Arc<ModelList>> {
        if !force_refresh {
            if let Some(cached) = self.model_cache.lock().get(&kind) {
                return Ok(Arc::clone(cached));
            }
        }

        let path = format!("{}?type={}", MODEL_ITEMS_PATH, kind);
        tracing::debug!(%kind, "Fetching model list");
        let response = self.api.get(self.url(&path)).send().await?;
        let response = Self::check_status(response, &path)?;
        let list: Arc<ModelList> = Arc::new(response.json().await?);

        self.model_cache.lock().insert(kind, Arc::clone(&list));
        Ok(list)
    }

    /// Forget every cached model list.
    pub fn clear_model_cache(&self) {
        self.model_cache.lock().clear();
    }
}

#[async_trait::async_trait]
impl MediaSource for DrawerClient {
    async fn fetch_media(&self, descriptor: &MediaDescriptor) -> Result<Bytes> {
        let path = descriptor.view_path(Some(Utc::now().timestamp_millis()));
        tracing::debug!(filename = %descriptor.filename, "Fetching media");

        let response = self.media.get(self.url(&path)).send().await?;
        let response = Self::check_status(response, &path)?;
        Ok(response.bytes().await?)
    }
}
