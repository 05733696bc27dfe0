//! Compound identifiers (`<catalog-id>@<version-id>`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

/// Separator between the catalog id and the version id.
pub const SEPARATOR: char = '@';

/// A parsed `<catalog-id>@<version-id>` pair.
///
/// Both halves are non-empty strings of ASCII digits. Whether the ids exist
/// is only known once the catalog has been asked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompoundIdentifier {
    catalog_id: String,
    version_id: String,
}

impl CompoundIdentifier {
    /// Parse a raw identifier.
    ///
    /// Surrounding whitespace is ignored. Fails when the separator is missing
    /// or repeated, or when either half is empty or not all digits.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let trimmed = raw.trim();
        let mut parts = trimmed.split(SEPARATOR);

        let (Some(catalog_id), Some(version_id), None) = (parts.next(), parts.next(), parts.next())
        else {
            let reason = if trimmed.contains(SEPARATOR) {
                "separator '@' appears more than once"
            } else {
                "missing separator '@'"
            };
            return Err(ParseError::malformed(raw, reason));
        };

        validate_segment(raw, "catalog id", catalog_id)?;
        validate_segment(raw, "version id", version_id)?;

        Ok(Self {
            catalog_id: catalog_id.to_string(),
            version_id: version_id.to_string(),
        })
    }

    /// The catalog (model) id.
    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    /// The version id.
    pub fn version_id(&self) -> &str {
        &self.version_id
    }
}

fn validate_segment(raw: &str, what: &str, segment: &str) -> Result<(), ParseError> {
    if segment.is_empty() {
        return Err(ParseError::malformed(raw, format!("{what} is empty")));
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::malformed(
            raw,
            format!("{what} '{segment}' is not numeric"),
        ));
    }
    Ok(())
}

impl FromStr for CompoundIdentifier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CompoundIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.catalog_id, self.version_id)
    }
}
