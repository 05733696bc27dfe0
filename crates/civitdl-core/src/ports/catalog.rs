//! Catalog client port trait.

use async_trait::async_trait;

use crate::catalog::CatalogEntry;
use crate::errors::FetchError;

/// Port trait for looking models up in the remote catalog.
///
/// The implementation lives in `civitdl-catalog`.
///
/// # Design
///
/// - Returns core-owned `CatalogEntry`, not API wire types
/// - The credential is passed on every call rather than held by the client,
///   so one client can serve callers with different credentials
/// - No retries; retry policy belongs to the caller
#[async_trait]
pub trait CatalogPort: Send + Sync {
    /// Fetch the catalog entry for a model.
    ///
    /// # Arguments
    ///
    /// * `catalog_id` - Model id (digits)
    /// * `credential` - Optional bearer token
    async fn fetch(
        &self,
        catalog_id: &str,
        credential: Option<&str>,
    ) -> Result<CatalogEntry, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    // Verify the trait is object-safe
    fn _assert_object_safe(_: Arc<dyn CatalogPort>) {}
}
