//! Label map (`.pbtxt`) parsing.
//!
//! The TensorFlow Object Detection API stores class names and ids as a text
//! protobuf:
//!
//! ```text
//! item {
//!   name: "cat"
//!   id: 1
//! }
//! ```
//!
//! Rather than a full text-proto parser, the file is scanned line by line:
//! a `name:` line sets the pending name, and the next `id:` line binds it.
//! Lines that cannot be used are skipped and logged, never fatal.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::ConvertError;

/// Why a label map line was not used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkippedLine {
    /// `id:` value was not an integer.
    InvalidId { line: usize, raw: String },
    /// `id:` value was zero or negative.
    NonPositiveId { line: usize, id: i64 },
    /// `id:` line appeared with no preceding `name:` line.
    OrphanId { line: usize },
    /// `name:` value was empty after removing quotes.
    EmptyName { line: usize },
}

/// Ordered name to id table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: BTreeMap<String, i64>,
}

impl LabelMap {
    /// Parse label map text.
    ///
    /// Returns the (possibly empty) map together with every line that was
    /// skipped. Emptiness is checked by [`read_label_map`], since only the
    /// caller knows which file the text came from.
    pub fn parse(text: &str) -> (Self, Vec<SkippedLine>) {
        let mut entries = BTreeMap::new();
        let mut skipped = Vec::new();
        let mut pending: Option<String> = None;

        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let Some((key, value)) = raw_line.trim().split_once(':') else {
                continue;
            };

            match key.trim() {
                "name" => {
                    let name = strip_quotes(value);
                    if name.is_empty() {
                        skipped.push(SkippedLine::EmptyName { line: line_no });
                        pending = None;
                        continue;
                    }
                    pending = Some(name.to_string());
                }
                "id" => {
                    let Some(name) = pending.as_ref() else {
                        skipped.push(SkippedLine::OrphanId { line: line_no });
                        continue;
                    };
                    let raw = value.trim();
                    match raw.parse::<i64>() {
                        Ok(id) if id > 0 => {
                            if let Some(previous) = entries.insert(name.clone(), id) {
                                warn!(label = %name, previous, id, "duplicate label name in label map; last id wins");
                            }
                            pending = None;
                        }
                        Ok(id) => skipped.push(SkippedLine::NonPositiveId { line: line_no, id }),
                        Err(_) => skipped.push(SkippedLine::InvalidId {
                            line: line_no,
                            raw: raw.to_string(),
                        }),
                    }
                }
                _ => {}
            }
        }

        (Self { entries }, skipped)
    }

    /// Resolve a label name to its id.
    pub fn lookup(&self, name: &str) -> Option<i64> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, id)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

impl FromIterator<(String, i64)> for LabelMap {
    fn from_iter<T: IntoIterator<Item = (String, i64)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Read and parse a label map file, failing if no labels were found.
pub fn read_label_map(path: &Path) -> Result<LabelMap, ConvertError> {
    let text = fs::read_to_string(path).map_err(ConvertError::Io)?;
    let (map, skipped) = LabelMap::parse(&text);

    for skip in &skipped {
        match skip {
            SkippedLine::InvalidId { line, raw } => {
                warn!(path = %path.display(), line, value = %raw, "skipping label map id that is not an integer")
            }
            SkippedLine::NonPositiveId { line, id } => {
                warn!(path = %path.display(), line, id, "skipping label map id that is not positive")
            }
            SkippedLine::OrphanId { line } => {
                debug!(path = %path.display(), line, "skipping label map id without a preceding name")
            }
            SkippedLine::EmptyName { line } => {
                warn!(path = %path.display(), line, "skipping empty label name")
            }
        }
    }

    if map.is_empty() {
        return Err(ConvertError::LabelMapEmpty {
            path: path.to_path_buf(),
        });
    }

    info!(path = %path.display(), labels = map.len(), "loaded label map");
    Ok(map)
}

fn strip_quotes(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
}
