//! Version selection.

use crate::catalog::{CatalogEntry, FileRef, VersionRecord};
use crate::errors::SelectionError;

/// The version picked out of a catalog entry, with its canonical file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedVersion<'a> {
    /// The matched version.
    pub version: &'a VersionRecord,
    /// The first file of the version.
    pub file: &'a FileRef,
}

/// Find the version with the requested id and its first file.
///
/// Versions are scanned in response order and the first id match wins. The
/// first file is always the canonical artifact, even when a version carries
/// several.
pub fn select_version<'a>(
    entry: &'a CatalogEntry,
    version_id: &str,
) -> Result<SelectedVersion<'a>, SelectionError> {
    let wanted: u64 = version_id
        .trim()
        .parse()
        .map_err(|_| SelectionError::InvalidVersionID {
            version_id: version_id.to_string(),
        })?;

    let version = entry
        .versions
        .iter()
        .find(|v| v.id == wanted)
        .ok_or(SelectionError::VersionNotFound {
            catalog_id: entry.id,
            version_id: wanted,
        })?;

    let file = version
        .files
        .first()
        .ok_or(SelectionError::NoFilesAvailable {
            catalog_id: entry.id,
            version_id: wanted,
        })?;

    if version.files.len() > 1 {
        tracing::debug!(
            catalog_id = entry.id,
            version_id = wanted,
            files = version.files.len(),
            selected = %file.name,
            "Version has several files, using the first"
        );
    }

    Ok(SelectedVersion { version, file })
}
