//! HTTP backend abstraction for the catalog API.
//!
//! This module provides a trait-based HTTP backend that allows for
//! dependency injection and easy testing. The production implementation
//! uses reqwest.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::{CatalogError, CatalogResult};

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// Trait for HTTP backends that can fetch JSON from URLs.
///
/// This is an implementation detail - external code should use the
/// `CatalogPort` trait.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Fetch JSON from a URL and deserialize it.
    ///
    /// A non-success status is reported as `ApiRequestFailed` without
    /// looking at the body.
    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        url: &Url,
        credential: Option<&str>,
    ) -> CatalogResult<T>;
}

// ============================================================================
// Reqwest Backend
// ============================================================================

/// Production HTTP backend using reqwest.
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    /// Create a new reqwest backend with the given configuration.
    pub fn new(config: &CatalogClientConfig) -> CatalogResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// Build a request with optional authentication.
    fn build_request(&self, url: &Url, credential: Option<&str>) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(token) = credential {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        request
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        url: &Url,
        credential: Option<&str>,
    ) -> CatalogResult<T> {
        let response = self.build_request(url, credential).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::ApiRequestFailed {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // Read the body first so transport and decode failures stay distinct
        let body = response.bytes().await?;
        let data = serde_json::from_slice(&body)?;
        Ok(data)
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================
