//! Player identity resolution
//!
//! Maps free-text "First Last" names to MLBAM ids via the Chadwick Bureau
//! people register, cached to a local CSV.

use crate::{LineupError, PlayerId, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const REGISTER_URL: &str =
    "https://raw.githubusercontent.com/chadwickbureau/register/master/data/people.csv";

/// External capability mapping (first name, last name) to zero or more
/// candidate identities. Provider order is preserved; callers take the
/// first candidate on ambiguity.
pub trait PlayerLookup {
    fn lookup(&self, first: &str, last: &str) -> Result<Vec<PlayerId>>;
}

/// Split a free-text name into (first, surname). The first whitespace
/// token is the first name and the remainder is the surname, so
/// multi-word surnames ("Hyun Jin Ryu") resolve correctly.
pub fn split_name(name: &str) -> Option<(String, String)> {
    let mut parts = name.trim().splitn(2, ' ');
    let first = parts.next()?.to_string();
    let last = parts.next()?.trim().to_string();
    if first.is_empty() || last.is_empty() {
        return None;
    }
    Some((first, last))
}

#[derive(Debug, Deserialize)]
struct RegisterRow {
    #[serde(default)]
    key_mlbam: Option<i64>,
    #[serde(default)]
    name_first: Option<String>,
    #[serde(default)]
    name_last: Option<String>,
}

/// Name lookup backed by the cached Chadwick people register
pub struct ChadwickLookup {
    /// (lowercase first, lowercase last) -> candidate ids in file order
    by_name: HashMap<(String, String), Vec<PlayerId>>,
}

impl ChadwickLookup {
    /// Lookup with no entries; every resolution yields NotFound
    pub fn empty() -> Self {
        ChadwickLookup {
            by_name: HashMap::new(),
        }
    }

    /// Load the register from a cached CSV
    pub fn from_cache(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Err(LineupError::NoData(path.to_string()));
        }

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let mut by_name: HashMap<(String, String), Vec<PlayerId>> = HashMap::new();
        let mut count = 0usize;

        for row in reader.deserialize::<RegisterRow>() {
            let Ok(row) = row else { continue };
            let (Some(id), Some(first), Some(last)) = (row.key_mlbam, row.name_first, row.name_last)
            else {
                continue;
            };
            by_name
                .entry((first.to_lowercase(), last.to_lowercase()))
                .or_default()
                .push(PlayerId(id));
            count += 1;
        }

        log::info!("Loaded {} register entries from {}", count, path);
        Ok(ChadwickLookup { by_name })
    }

    /// Load from cache, fetching the register first if absent
    pub fn load_or_fetch(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            log::info!("Fetching player register...");
            let client = reqwest::blocking::Client::builder()
                .user_agent("lineup-optimizer/0.1")
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to create HTTP client");
            let body = client.get(REGISTER_URL).send()?.error_for_status()?.text()?;

            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &body)?;
            log::info!("Register saved to {}", path);
        }

        Self::from_cache(path)
    }
}

impl PlayerLookup for ChadwickLookup {
    fn lookup(&self, first: &str, last: &str) -> Result<Vec<PlayerId>> {
        let key = (first.to_lowercase(), last.to_lowercase());
        let candidates = self.by_name.get(&key).cloned().unwrap_or_default();
        if candidates.len() > 1 {
            log::debug!(
                "Ambiguous name {} {}: {} candidates, using first",
                first,
                last,
                candidates.len()
            );
        }
        Ok(candidates)
    }
}
