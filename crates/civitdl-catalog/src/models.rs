//! Internal API response types for the catalog.
//!
//! These types are internal to `civitdl-catalog` and are not exposed to
//! consumers. External consumers use the DTOs defined in `civitdl-core`.
//! Only the fields the download pipeline consumes are declared; everything
//! else in the response is ignored.

use serde::Deserialize;

/// `GET /models/{id}` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiModel {
    /// Model id.
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Model type ("Checkpoint", "LORA", "TextualInversion", ...).
    #[serde(rename = "type", default)]
    pub model_type: String,
    /// Published versions, newest first.
    #[serde(default)]
    pub model_versions: Vec<ApiModelVersion>,
}

/// One entry of `modelVersions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiModelVersion {
    /// Version id.
    pub id: u64,
    /// Version display name.
    #[serde(default)]
    pub name: String,
    /// Base-model tag.
    #[serde(default)]
    pub base_model: String,
    /// Primary artifact URL.
    #[serde(default)]
    pub download_url: String,
    /// Attached files.
    #[serde(default)]
    pub files: Vec<ApiFile>,
}

/// One entry of `files`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiFile {
    /// File name.
    pub name: String,
    /// Size in KiB.
    #[serde(rename = "sizeKB", default)]
    pub size_kb: Option<f64>,
}
