//! Statcast pitch-by-pitch data provider
//!
//! Fetches the Baseball Savant search CSV for a date range and memoizes it
//! to a local file. Once cached, the snapshot is treated as immutable.

use crate::{Handedness, LineupError, PitchEvent, PlayerId, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

const SEARCH_URL: &str = "https://baseballsavant.mlb.com/statcast_search/csv";

/// Client for the Statcast search endpoint with local-file memoization
pub struct StatcastClient {
    client: reqwest::blocking::Client,
    /// If true, never touch the network; the cache must exist
    offline_only: bool,
}

impl Default for StatcastClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StatcastClient {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent("lineup-optimizer/0.1")
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        StatcastClient {
            client,
            offline_only: false,
        }
    }

    /// Set offline-only mode (no network requests, cache must exist)
    pub fn offline_only(mut self, offline: bool) -> Self {
        self.offline_only = offline;
        self
    }

    /// Return the cached snapshot if present, otherwise fetch the given
    /// date range and save it to `cache_path` before loading.
    pub fn fetch(&self, cache_path: &str, start_date: &str, end_date: &str) -> Result<Vec<PitchEvent>> {
        if Path::new(cache_path).exists() {
            log::info!("Loading data from {}", cache_path);
            return load_snapshot(cache_path);
        }

        if self.offline_only {
            return Err(LineupError::NoData(cache_path.to_string()));
        }

        let (start, end) = parse_date_range(start_date, end_date)?;
        log::info!("Fetching Statcast data from {} to {}...", start, end);
        let url = format!(
            "{}?all=true&type=details&game_date_gt={}&game_date_lt={}",
            SEARCH_URL, start, end
        );
        let body = self.client.get(&url).send()?.error_for_status()?.text()?;

        if let Some(parent) = Path::new(cache_path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(cache_path, &body)?;
        log::info!("Data saved to {}", cache_path);

        load_snapshot(cache_path)
    }
}

fn parse_date_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate)> {
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| LineupError::Parse(format!("Bad date {}: {}", s, e)))
    };
    let start = parse(start)?;
    let end = parse(end)?;
    if end < start {
        return Err(LineupError::Parse(format!(
            "End date {} precedes start date {}",
            end, start
        )));
    }
    Ok((start, end))
}

/// Raw Statcast row. The real export carries ~90 columns; serde picks out
/// the ones the pipeline needs and ignores the rest.
#[derive(Debug, Deserialize)]
struct RawPitch {
    pitcher: i64,
    batter: i64,
    #[serde(default)]
    events: Option<String>,
    #[serde(default)]
    release_speed: Option<f32>,
    #[serde(default)]
    release_spin_rate: Option<f32>,
    #[serde(default)]
    p_throws: Option<String>,
    #[serde(default)]
    stand: Option<String>,
}

impl From<RawPitch> for PitchEvent {
    fn from(raw: RawPitch) -> Self {
        PitchEvent {
            pitcher: PlayerId(raw.pitcher),
            batter: PlayerId(raw.batter),
            events: raw.events.filter(|e| !e.is_empty()),
            release_speed: raw.release_speed,
            release_spin_rate: raw.release_spin_rate,
            p_throws: raw
                .p_throws
                .as_deref()
                .map(Handedness::from_code)
                .unwrap_or_default(),
            stand: raw
                .stand
                .as_deref()
                .map(Handedness::from_code)
                .unwrap_or_default(),
        }
    }
}

/// Load a cached snapshot. Rows that fail to deserialize are skipped with
/// a warning rather than aborting the load.
pub fn load_snapshot(path: &str) -> Result<Vec<PitchEvent>> {
    if !Path::new(path).exists() {
        return Err(LineupError::NoData(path.to_string()));
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut events = Vec::new();
    let mut skipped = 0usize;

    for row in reader.deserialize::<RawPitch>() {
        match row {
            Ok(raw) => events.push(PitchEvent::from(raw)),
            Err(e) => {
                skipped += 1;
                log::debug!("Skipping malformed row: {}", e);
            }
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {} malformed rows in {}", skipped, path);
    }
    log::info!("Loaded {} pitch events from {}", events.len(), path);

    Ok(events)
}
