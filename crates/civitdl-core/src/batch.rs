//! Batch input lines.
//!
//! A batch file holds one entry per line. An entry is either a bare compound
//! identifier (`123@456`) or a colon-delimited record exported by model
//! managers, where field 2 is the base-model tag and field 5 contains the
//! identifier somewhere inside it:
//!
//! ```text
//! civitai:lora:SDXL 1.0:some-name:extra:urn:air:sdxl:lora:civitai:123@456
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::ParseError;
use crate::identifier::CompoundIdentifier;

/// Field holding the base-model tag in a colon record.
const BASE_MODEL_FIELD: usize = 2;
/// Field holding the `<id>@<id>` pair in a colon record.
const IDENTIFIER_FIELD: usize = 5;

static IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)@(\d+)").expect("identifier pattern is valid"));

/// One parsed batch entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchLine {
    /// The identifier to download.
    pub identifier: CompoundIdentifier,
    /// Base-model tag taken from the line, overriding the catalog's.
    pub base_model_override: Option<String>,
}

impl BatchLine {
    /// Parse a single batch line.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let trimmed = line.trim();
        if !trimmed.contains(':') {
            return Ok(Self {
                identifier: CompoundIdentifier::parse(trimmed)?,
                base_model_override: None,
            });
        }

        let fields: Vec<&str> = trimmed.split(':').collect();
        let Some(id_field) = fields.get(IDENTIFIER_FIELD) else {
            return Err(ParseError::malformed(
                line,
                format!(
                    "record has {} fields, identifier expected in field {IDENTIFIER_FIELD}",
                    fields.len()
                ),
            ));
        };

        let Some(caps) = IDENTIFIER_PATTERN.captures(id_field) else {
            return Err(ParseError::malformed(
                line,
                format!("field {IDENTIFIER_FIELD} '{id_field}' holds no <id>@<id> pair"),
            ));
        };
        let identifier = CompoundIdentifier::parse(&format!("{}@{}", &caps[1], &caps[2]))?;

        let base_model_override = fields
            .get(BASE_MODEL_FIELD)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from);

        Ok(Self {
            identifier,
            base_model_override,
        })
    }
}

/// Whether a raw line carries an entry (not blank, not a `#` comment).
pub fn is_entry(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

/// Collect the entry lines of a reader, dropping blanks and comments.
pub fn collect_batch_lines<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if is_entry(&line) {
            lines.push(line.trim().to_string());
        }
    }
    Ok(lines)
}

/// Read the entry lines of a batch file.
pub fn read_batch_lines(path: &Path) -> io::Result<Vec<String>> {
    let file = File::open(path)?;
    let lines = collect_batch_lines(BufReader::new(file))?;
    tracing::debug!(path = %path.display(), entries = lines.len(), "Read batch file");
    Ok(lines)
}
