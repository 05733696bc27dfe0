//! Port trait implementation for `CatalogClient`.
//!
//! This module implements the core-owned `CatalogPort` trait for
//! `CatalogClient`, handling the conversion between internal API types and
//! core DTOs.

use async_trait::async_trait;
use civitdl_core::{CatalogEntry, CatalogPort, Category, FetchError, FileRef, VersionRecord};

use crate::client::CatalogClient;
use crate::error::CatalogError;
use crate::http::HttpBackend;
use crate::models::{ApiFile, ApiModel, ApiModelVersion};

// ============================================================================
// Error Mapping
// ============================================================================

/// Convert internal `CatalogError` to core `FetchError`.
pub(crate) fn map_error(err: CatalogError) -> FetchError {
    match err {
        CatalogError::ApiRequestFailed { status, url } => {
            let catalog_id = extract_catalog_id_from_url(&url);
            FetchError::from_status(status, &catalog_id, &url)
        }
        CatalogError::Network(e) if e.is_decode() => FetchError::decode(e.to_string()),
        CatalogError::Network(e) => FetchError::network(e.to_string()),
        CatalogError::InvalidBaseUrl { url } => {
            FetchError::network(format!("invalid catalog base URL: {url}"))
        }
        CatalogError::InvalidUrl(e) => FetchError::network(format!("invalid catalog URL: {e}")),
        CatalogError::JsonParse(e) => FetchError::decode(e.to_string()),
    }
}

/// Extract the model id from a `.../models/{id}` URL.
fn extract_catalog_id_from_url(url: &str) -> String {
    url.rsplit_once("/models/")
        .map(|(_, rest)| rest.split(['/', '?']).next().unwrap_or(rest))
        .unwrap_or(url)
        .to_string()
}

// ============================================================================
// Type Conversions
// ============================================================================

fn to_file_ref(file: ApiFile) -> FileRef {
    FileRef {
        name: file.name,
        size_kb: file.size_kb,
    }
}

fn to_version_record(version: ApiModelVersion) -> VersionRecord {
    VersionRecord {
        id: version.id,
        name: version.name,
        base_model: version.base_model,
        download_url: version.download_url,
        files: version.files.into_iter().map(to_file_ref).collect(),
    }
}

fn to_catalog_entry(model: ApiModel) -> CatalogEntry {
    CatalogEntry {
        id: model.id,
        name: model.name,
        category: Category::classify(&model.model_type),
        versions: model
            .model_versions
            .into_iter()
            .map(to_version_record)
            .collect(),
    }
}

// ============================================================================
// Port Implementation
// ============================================================================

#[async_trait]
impl<B: HttpBackend + 'static> CatalogPort for CatalogClient<B> {
    async fn fetch(
        &self,
        catalog_id: &str,
        credential: Option<&str>,
    ) -> Result<CatalogEntry, FetchError> {
        let model = self
            .get_model(catalog_id, credential)
            .await
            .map_err(map_error)?;
        let entry = to_catalog_entry(model);
        tracing::debug!(
            catalog_id,
            name = %entry.name,
            category = %entry.category,
            versions = entry.versions.len(),
            "Fetched catalog entry"
        );
        Ok(entry)
    }
}
