//! Catalog client for fetching model metadata.

use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::http::{HttpBackend, ReqwestBackend};
use crate::models::ApiModel;

// ============================================================================
// Type Aliases
// ============================================================================

/// Default catalog client using the reqwest HTTP backend.
pub type DefaultCatalogClient = CatalogClient<ReqwestBackend>;

// ============================================================================
// Client
// ============================================================================

/// Client for the catalog API.
///
/// This client is generic over an HTTP backend, allowing for easy testing.
/// Use `DefaultCatalogClient` for production code.
pub struct CatalogClient<B: HttpBackend> {
    pub(crate) backend: B,
    pub(crate) base_url: Url,
}

impl DefaultCatalogClient {
    /// Create a new client with the given configuration.
    pub fn new(config: &CatalogClientConfig) -> Result<Self, civitdl_core::FetchError> {
        Self::build(config).map_err(crate::port::map_error)
    }

    fn build(config: &CatalogClientConfig) -> CatalogResult<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        let backend = ReqwestBackend::new(config)?;
        Ok(Self { backend, base_url })
    }
}

impl<B: HttpBackend> CatalogClient<B> {
    /// Create a new client with a custom backend.
    ///
    /// Use this for testing with a fake backend.
    #[cfg(test)]
    pub(crate) fn with_backend(base_url: &str, backend: B) -> Self {
        Self {
            backend,
            base_url: parse_base_url(base_url).unwrap(),
        }
    }

    /// URL of a model's metadata: `{base}/models/{catalog_id}`.
    pub(crate) fn model_url(&self, catalog_id: &str) -> CatalogResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidBaseUrl {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .push("models")
            .push(catalog_id);
        Ok(url)
    }

    /// Fetch the raw model record.
    pub(crate) async fn get_model(
        &self,
        catalog_id: &str,
        credential: Option<&str>,
    ) -> CatalogResult<ApiModel> {
        let url = self.model_url(catalog_id)?;
        tracing::debug!(%url, authenticated = credential.is_some(), "Fetching catalog entry");
        self.backend.get_json(&url, credential).await
    }
}

fn parse_base_url(raw: &str) -> CatalogResult<Url> {
    let url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(CatalogError::InvalidBaseUrl {
            url: raw.to_string(),
        });
    }
    Ok(url)
}
