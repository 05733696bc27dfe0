//! Destination placement.
//!
//! Maps a model's category and base-model tag to a directory below the
//! download root and creates the chain on demand. Creation is idempotent and
//! safe when several workers target the same category directory at once.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::catalog::Category;
use crate::errors::PlacementError;

/// Placement options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementConfig {
    /// Nest files in a directory named after their base-model tag.
    pub nest_by_base_model: bool,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            nest_by_base_model: true,
        }
    }
}

/// A computed destination for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationPath {
    /// Download root.
    pub base_dir: PathBuf,
    /// Category subdirectory name.
    pub category_dir: &'static str,
    /// Base-model subdirectory, when nesting applies.
    pub base_model_dir: Option<String>,
    /// Artifact file name.
    pub file_name: String,
}

impl DestinationPath {
    /// Directory the artifact is written into.
    pub fn dir(&self) -> PathBuf {
        let mut dir = self.base_dir.join(self.category_dir);
        if let Some(ref nested) = self.base_model_dir {
            dir.push(nested);
        }
        dir
    }

    /// Full path of the artifact.
    pub fn path(&self) -> PathBuf {
        self.dir().join(&self.file_name)
    }
}

/// Resolves and prepares destinations.
#[derive(Debug, Clone, Default)]
pub struct PlacementResolver {
    config: PlacementConfig,
}

impl PlacementResolver {
    /// Create a resolver with the given options.
    pub const fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    /// Compute the destination without touching the filesystem.
    pub fn plan(
        &self,
        base_dir: &Path,
        category: &Category,
        base_model_tag: &str,
        file_name: &str,
    ) -> Result<DestinationPath, PlacementError> {
        let file_name = validate_component("file name", file_name)?;

        let tag = base_model_tag.trim();
        let base_model_dir = if self.config.nest_by_base_model && !tag.is_empty() {
            Some(validate_component("base model", tag)?.to_string())
        } else {
            None
        };

        Ok(DestinationPath {
            base_dir: base_dir.to_path_buf(),
            category_dir: category.dir_name(),
            base_model_dir,
            file_name: file_name.to_string(),
        })
    }

    /// Compute the destination and create every missing directory on it.
    ///
    /// Existing directories are left alone. The destination file itself is
    /// never inspected.
    pub fn resolve(
        &self,
        base_dir: &Path,
        category: &Category,
        base_model_tag: &str,
        file_name: &str,
    ) -> Result<DestinationPath, PlacementError> {
        let destination = self.plan(base_dir, category, base_model_tag, file_name)?;
        ensure_dir_chain(&destination.dir())?;
        Ok(destination)
    }
}

/// Create a directory and its parents. An existing directory is success.
pub fn ensure_dir_chain(dir: &Path) -> Result<(), PlacementError> {
    // create_dir_all treats a concurrently created directory as success
    fs::create_dir_all(dir).map_err(|e| PlacementError::create_failed(dir, &e))?;
    if !dir.is_dir() {
        return Err(PlacementError::CreateFailed {
            path: dir.to_path_buf(),
            reason: "exists but is not a directory".to_string(),
        });
    }
    tracing::trace!(dir = %dir.display(), "Destination directory ready");
    Ok(())
}

/// Accept only a single normal path component.
fn validate_component<'a>(what: &str, value: &'a str) -> Result<&'a str, PlacementError> {
    let invalid = || PlacementError::InvalidComponent {
        what: what.to_string(),
        value: value.to_string(),
    };

    if value.contains(['/', '\\']) {
        return Err(invalid());
    }
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(value),
        _ => Err(invalid()),
    }
}
