//! Model card summaries built from "familiar" records.
//!
//! A familiar is the bundle of preview images and info JSON documents the
//! backend keeps next to a model file. The info documents are merged in
//! order (later keys win) and user-set fields take precedence over the ones
//! scraped from the model host.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::client::ModelKind;
use crate::descriptor::VIEW_IMAGE_PATH;

/// Model list as served by the backend: model name to its familiar record.
pub type ModelList = BTreeMap<String, Familiars>;

const MODEL_PAGE_URL: &str = "https://civitai.com/models/";

/// Everything the backend knows about one model file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Familiars {
    #[serde(default)]
    pub familiar_images: Vec<String>,
    /// Raw JSON documents, merged in order.
    #[serde(default)]
    pub familiar_infos: Vec<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub file_age: Option<i64>,
}

/// Display data for one model card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardSummary {
    pub kind: ModelKind,
    /// Model name as listed by the backend.
    pub name: String,
    pub display_name: String,
    /// Comma-terminated, or empty.
    pub trained_words: String,
    pub tags: Vec<String>,
    pub model_id: Option<String>,
    pub last_viewed_image_index: usize,
    pub image_count: usize,
    /// Merged info documents.
    pub info: Map<String, Value>,
}

impl CardSummary {
    /// Build a card summary. Returns `None` for an empty name.
    pub fn new(kind: ModelKind, name: &str, familiars: &Familiars) -> Option<Self> {
        if name.is_empty() {
            return None;
        }

        let info = merge_infos(&familiars.familiar_infos);

        let display_name = preferred_name(&info)
            .filter(|preferred| preferred.trim() != name.trim())
            .map(|preferred| format!("{preferred} ({name})"))
            .unwrap_or_else(|| name.to_string());

        let tags = info
            .get("userTags")
            .filter(|v| truthy(v))
            .or_else(|| info.get("tags"))
            .and_then(Value::as_array)
            .map(|tags| tags.iter().map(|t| js_text(t).trim().to_string()).collect())
            .unwrap_or_default();

        let trained_words = info
            .get("userTrainedWords")
            .filter(|v| truthy(v))
            .or_else(|| info.get("trainedWords").filter(|v| truthy(v)))
            .map(|words| normalize_trained_words(&js_text(words)))
            .unwrap_or_default();

        let model_id = ["modelId", "id"]
            .iter()
            .filter_map(|key| info.get(*key))
            .find(|v| truthy(v))
            .map(js_text);

        let last_viewed_image_index = info
            .get("lastViewedImageIndex")
            .and_then(Value::as_u64)
            .map_or(0, |i| i as usize);

        Some(Self {
            kind,
            name: name.to_string(),
            display_name,
            trained_words,
            tags,
            model_id,
            last_viewed_image_index,
            image_count: familiars.familiar_images.len(),
            info,
        })
    }

    /// `"<display name>, <trained words>, <tags>"`.
    pub fn search_terms(&self) -> String {
        format!(
            "{}, {}, {}",
            self.display_name,
            self.trained_words,
            self.tags.join(", ")
        )
    }

    /// Page on the model host, when the info carries an id.
    pub fn model_page_url(&self) -> Option<String> {
        self.model_id
            .as_ref()
            .map(|id| format!("{MODEL_PAGE_URL}{id}"))
    }

    /// Prompt text that loads this model.
    pub fn copy_model_text(&self) -> String {
        match self.kind {
            ModelKind::Loras => format!("<lora:{}:1:1>", self.name),
            ModelKind::Embeddings => format!("(embedding:{}:1)", self.name),
        }
    }

    /// LoRA prompt text followed by its trained words, if it has any.
    pub fn copy_all_text(&self) -> Option<String> {
        (self.kind == ModelKind::Loras && !self.trained_words.is_empty())
            .then(|| format!("{} {}", self.copy_model_text(), self.trained_words))
    }

    /// Index of the neighbouring preview image, wrapping at both ends.
    pub fn step_image(&self, index: usize, forward: bool) -> usize {
        if self.image_count == 0 {
            return 0;
        }
        if forward {
            (index + 1) % self.image_count
        } else if index == 0 {
            self.image_count - 1
        } else {
            index - 1
        }
    }
}

/// View path of the preview image at `index`, if there is one.
pub fn familiar_image_path(familiars: &Familiars, kind: ModelKind, index: usize) -> Option<String> {
    let image = familiars.familiar_images.get(index)?;
    Some(format!(
        "{}?filename={}&type={}",
        VIEW_IMAGE_PATH,
        urlencoding::encode(image),
        kind
    ))
}

/// Merge info documents. Unparseable documents are logged and skipped.
pub fn merge_infos(infos: &[String]) -> Map<String, Value> {
    let mut merged = Map::new();
    for raw in infos {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(object)) => merged.extend(object),
            Ok(_) => {}
            Err(e) => tracing::warn!("Error parsing familiar info JSON: {}", e),
        }
    }
    merged
}

fn preferred_name(info: &Map<String, Value>) -> Option<String> {
    if let Some(friendly) = info.get("friendlyName").filter(|v| truthy(v)) {
        return Some(js_text(friendly));
    }
    info.get("model")
        .and_then(|model| model.get("name"))
        .filter(|v| truthy(v))
        .map(js_text)
}

/// Trim, terminate with a comma and undo the first escaped paren and quote.
fn normalize_trained_words(words: &str) -> String {
    let mut words = words.trim().to_string();
    if !words.ends_with(',') {
        words.push(',');
    }
    words
        .replacen("\\(", "(", 1)
        .replacen("\\)", ")", 1)
        .replacen("\\\"", "\"", 1)
}

/// Plain-text rendering of a JSON value; arrays join with commas.
fn js_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(js_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
