//! Catalog domain types.
//!
//! These are the core-owned views of a catalog response. The catalog client
//! decodes its own wire types and converts them into these.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Category
// ============================================================================

/// Classification of a model, used to pick a storage subdirectory.
///
/// The catalog's type string is open-ended; anything that is not one of the
/// known kinds lands in [`Category::Other`] with the raw value kept for logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Full model checkpoint.
    Checkpoint,
    /// Low-rank adaptation.
    Lora,
    /// Textual inversion embedding.
    TextualInversion,
    /// Any other catalog type.
    Other(String),
}

impl Category {
    /// Classify a catalog type string. Total: never fails.
    pub fn classify(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("checkpoint") {
            Self::Checkpoint
        } else if raw.eq_ignore_ascii_case("lora") {
            Self::Lora
        } else if raw.eq_ignore_ascii_case("textualinversion") {
            Self::TextualInversion
        } else {
            Self::Other(raw.to_string())
        }
    }

    /// Subdirectory name for this category.
    #[must_use]
    pub const fn dir_name(&self) -> &'static str {
        match self {
            Self::Checkpoint => "checkpoints",
            Self::Lora => "lora",
            Self::TextualInversion => "embeddings",
            Self::Other(_) => "others",
        }
    }

    /// The catalog's spelling of this category.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Checkpoint => "Checkpoint",
            Self::Lora => "LORA",
            Self::TextualInversion => "TextualInversion",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Self::classify(&raw)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Catalog entry
// ============================================================================

/// A model as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Catalog id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Classification.
    pub category: Category,
    /// Versions in response order.
    pub versions: Vec<VersionRecord>,
}

/// One published version of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Version id.
    pub id: u64,
    /// Version display name.
    pub name: String,
    /// Base-model tag (e.g. "SD 1.5", "SDXL 1.0").
    pub base_model: String,
    /// Where the primary artifact is downloaded from.
    pub download_url: String,
    /// Files attached to the version. May be empty.
    pub files: Vec<FileRef>,
}

/// A file attached to a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    /// File name as published.
    pub name: String,
    /// Size in KiB as reported by the catalog. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_kb: Option<f64>,
}

impl FileRef {
    /// Create a file reference without size information.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_kb: None,
        }
    }
}
