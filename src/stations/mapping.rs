//! Station code and old-name mappings.

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, Trim};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Maps a raw station identifier to its published name.
///
/// Stored on disk as a semicolon-separated file with a `name` column and one
/// key column (`code` for station codes, `alt_name` for retired names):
/// ```text
/// code;name
/// PUR01;Whitefield (Kadugodi)
/// ```
#[derive(Debug, Default, Clone)]
pub struct StationMapping {
    entries: HashMap<String, String>,
}

impl StationMapping {
    pub const CODE_COLUMN: &'static str = "code";
    pub const ALT_NAME_COLUMN: &'static str = "alt_name";

    /// Loads the mapping at `path`, keyed by `key_column`.
    pub fn load(path: impl AsRef<Path>, key_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .trim(Trim::All)
            .from_path(path)
            .with_context(|| format!("opening station mapping {}", path.display()))?;

        let headers = reader.headers()?.clone();
        let Some(key_idx) = headers.iter().position(|h| h == key_column) else {
            bail!("{} has no {:?} column", path.display(), key_column);
        };
        let Some(name_idx) = headers.iter().position(|h| h == "name") else {
            bail!("{} has no \"name\" column", path.display());
        };

        let mut entries = HashMap::new();
        for result in reader.records() {
            let record = result?;
            let (Some(key), Some(name)) = (record.get(key_idx), record.get(name_idx)) else {
                continue;
            };
            if key.is_empty() || name.is_empty() {
                continue;
            }
            entries.insert(key.to_string(), name.to_string());
        }

        Ok(Self { entries })
    }

    /// Like [`StationMapping::load`], but a missing or unreadable file only
    /// logs a warning and yields an empty mapping.
    pub fn load_or_empty(path: impl AsRef<Path>, key_column: &str) -> Self {
        let path = path.as_ref();
        match Self::load(path, key_column) {
            Ok(mapping) => {
                info!(path = %path.display(), mappings = mapping.len(), "Loaded station mapping");
                mapping
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not load station mapping, using identifiers as-is");
                Self::default()
            }
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the mapped name for `key`, or `key` itself when unmapped.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.entries.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
