//! Per-player profile derivation and lookup
//!
//! The profile store owns the aggregates derived from one snapshot of the
//! pitch-event history. Lookups never fail: unresolvable players degrade
//! to documented fallback profiles, logged at warn level.

use crate::data::lookup::{split_name, PlayerLookup};
use crate::{BatterProfile, FallbackConfig, Handedness, PitchEvent, PitcherProfile, PlayerId, Result};
use std::collections::HashMap;

/// Compute batting aggregates for every batter in the history.
///
/// Hits are single/double/triple/home-run; at-bats are hits plus the
/// qualifying outs (field out, strikeout, force out, double play,
/// fielder's choice). Walks and sacrifices are excluded by design. A
/// batter with zero at-bats gets avg = slg = iso = 0.0 rather than a
/// division error.
pub fn compute_batter_aggregates(history: &[PitchEvent]) -> HashMap<PlayerId, BatterProfile> {
    struct Tally {
        stand: Handedness,
        at_bats: u32,
        hits: u32,
        total_bases: u32,
    }

    let mut tallies: HashMap<PlayerId, Tally> = HashMap::new();

    for event in history {
        let tally = tallies.entry(event.batter).or_insert(Tally {
            stand: event.stand,
            at_bats: 0,
            hits: 0,
            total_bases: 0,
        });

        let Some(outcome) = event.outcome() else {
            continue;
        };
        tally.at_bats += 1;
        if outcome.is_hit() {
            tally.hits += 1;
            tally.total_bases += outcome.total_bases();
        }
    }

    tallies
        .into_iter()
        .map(|(id, t)| {
            let (avg, slg) = if t.at_bats == 0 {
                (0.0, 0.0)
            } else {
                (
                    t.hits as f32 / t.at_bats as f32,
                    t.total_bases as f32 / t.at_bats as f32,
                )
            };
            let profile = BatterProfile {
                stand: t.stand,
                at_bats: t.at_bats,
                hits: t.hits,
                total_bases: t.total_bases,
                avg,
                slg,
                iso: slg - avg,
            };
            (id, profile)
        })
        .collect()
}

/// Mean velocity and spin over the whole dataset, right-handed assumed.
/// Used as the pitcher fallback so an unknown pitcher still scores.
fn league_average_pitcher(history: &[PitchEvent]) -> PitcherProfile {
    let speeds: Vec<f32> = history.iter().filter_map(|e| e.release_speed).collect();
    let spins: Vec<f32> = history.iter().filter_map(|e| e.release_spin_rate).collect();

    let mean = |vals: &[f32]| {
        if vals.is_empty() {
            0.0
        } else {
            vals.iter().sum::<f32>() / vals.len() as f32
        }
    };

    PitcherProfile {
        release_speed: mean(&speeds),
        release_spin_rate: mean(&spins),
        throws: Handedness::Right,
    }
}

/// Derived aggregates for one snapshot of the pitch-event history
pub struct ProfileStore {
    history: Vec<PitchEvent>,
    aggregates: HashMap<PlayerId, BatterProfile>,
    league_pitcher: PitcherProfile,
    lookup: Box<dyn PlayerLookup>,
    fallback: FallbackConfig,
}

impl ProfileStore {
    /// Build a store over a history snapshot. Batter aggregates and the
    /// league-average pitcher are computed once here and cached for the
    /// lifetime of the store.
    pub fn new(
        history: Vec<PitchEvent>,
        lookup: Box<dyn PlayerLookup>,
        fallback: FallbackConfig,
    ) -> Self {
        let aggregates = compute_batter_aggregates(&history);
        let league_pitcher = league_average_pitcher(&history);
        ProfileStore {
            history,
            aggregates,
            league_pitcher,
            lookup,
            fallback,
        }
    }

    /// Map a free-text name to a player id. Lookup errors, empty results
    /// and single-token names all absorb to None; ambiguity takes the
    /// first provider candidate.
    pub fn resolve_identity(&self, name: &str) -> Option<PlayerId> {
        let (first, last) = split_name(name)?;
        match self.lookup.lookup(&first, &last) {
            Ok(candidates) => candidates.first().copied(),
            Err(e) => {
                log::warn!("Lookup failed for {}: {}", name, e);
                None
            }
        }
    }

    /// Pitching profile for a named pitcher. Falls back to the
    /// league-average profile when the name does not resolve or has no
    /// rows in the history. Never fails.
    pub fn pitcher_profile(&self, name: &str) -> PitcherProfile {
        if let Some(id) = self.resolve_identity(name) {
            let rows: Vec<&PitchEvent> =
                self.history.iter().filter(|e| e.pitcher == id).collect();
            if !rows.is_empty() {
                let speeds: Vec<f32> = rows.iter().filter_map(|e| e.release_speed).collect();
                let spins: Vec<f32> = rows.iter().filter_map(|e| e.release_spin_rate).collect();
                let mean = |vals: &[f32], default: f32| {
                    if vals.is_empty() {
                        default
                    } else {
                        vals.iter().sum::<f32>() / vals.len() as f32
                    }
                };
                return PitcherProfile {
                    release_speed: mean(&speeds, self.league_pitcher.release_speed),
                    release_spin_rate: mean(&spins, self.league_pitcher.release_spin_rate),
                    // First observed record, not the mode
                    throws: rows[0].p_throws,
                };
            }
        }

        log::warn!("Pitcher {} not found in cache. Using league average.", name);
        self.league_pitcher.clone()
    }

    /// Batting profile for a named batter. Falls back to the injected
    /// static default when the name does not resolve or has no rows in
    /// the history. Never fails.
    pub fn batter_profile(&self, name: &str) -> BatterProfile {
        if let Some(id) = self.resolve_identity(name) {
            if let Some(profile) = self.aggregates.get(&id) {
                return profile.clone();
            }
        }

        log::warn!("Batter {} not found in cache. Assuming league average.", name);
        BatterProfile {
            stand: Handedness::Right,
            at_bats: 0,
            hits: 0,
            total_bases: 0,
            avg: self.fallback.batter_avg,
            slg: self.fallback.batter_slg,
            iso: self.fallback.batter_iso,
        }
    }

    /// Cached aggregates for every batter in the history
    pub fn batter_aggregates(&self) -> &HashMap<PlayerId, BatterProfile> {
        &self.aggregates
    }

    /// The history snapshot this store was built from
    pub fn history(&self) -> &[PitchEvent] {
        &self.history
    }

    /// Persist the derived per-batter aggregates. Re-derivable from the
    /// snapshot at any time, not a source of truth.
    pub fn write_batter_stats(&self, path: &str) -> Result<()> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["batter", "at_bats", "hits", "total_bases", "avg", "slg", "iso"])?;

        let mut ids: Vec<&PlayerId> = self.aggregates.keys().collect();
        ids.sort_by_key(|id| id.0);

        for id in ids {
            let p = &self.aggregates[id];
            writer.write_record([
                id.0.to_string(),
                p.at_bats.to_string(),
                p.hits.to_string(),
                p.total_bases.to_string(),
                format!("{:.3}", p.avg),
                format!("{:.3}", p.slg),
                format!("{:.3}", p.iso),
            ])?;
        }
        writer.flush()?;
        log::debug!("Wrote batter aggregates to {}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn pitch(pitcher: i64, batter: i64, event: Option<&str>) -> PitchEvent {
        PitchEvent {
            pitcher: PlayerId(pitcher),
            batter: PlayerId(batter),
            events: event.map(|e| e.to_string()),
            release_speed: Some(95.0),
            release_spin_rate: Some(2400.0),
            p_throws: Handedness::Right,
            stand: Handedness::Left,
        }
    }

    /// Lookup over a fixed name table
    struct TableLookup(Map<(String, String), Vec<PlayerId>>);

    impl TableLookup {
        fn with(entries: &[(&str, &str, i64)]) -> Self {
            let mut map = Map::new();
            for (first, last, id) in entries {
                map.entry((first.to_lowercase(), last.to_lowercase()))
                    .or_insert_with(Vec::new)
                    .push(PlayerId(*id));
            }
            TableLookup(map)
        }
    }

    impl PlayerLookup for TableLookup {
        fn lookup(&self, first: &str, last: &str) -> Result<Vec<PlayerId>> {
            Ok(self
                .0
                .get(&(first.to_lowercase(), last.to_lowercase()))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn fallback() -> FallbackConfig {
        FallbackConfig {
            batter_avg: 0.240,
            batter_slg: 0.400,
            batter_iso: 0.160,
        }
    }

    #[test]
    fn test_aggregates_known_history() {
        // 1 single + 1 strikeout + 1 non-event pitch: 1 hit in 2 at-bats
        let history = vec![
            pitch(1, 10, Some("single")),
            pitch(1, 10, Some("strikeout")),
            pitch(1, 10, None),
        ];
        let aggregates = compute_batter_aggregates(&history);
        let profile = &aggregates[&PlayerId(10)];

        assert_eq!(profile.at_bats, 2);
        assert_eq!(profile.hits, 1);
        assert_eq!(profile.total_bases, 1);
        assert_eq!(profile.avg, 0.5);
        assert_eq!(profile.slg, 0.5);
        assert_eq!(profile.iso, 0.0);
    }

    #[test]
    fn test_aggregates_zero_at_bats() {
        // Only walks: the batter appears but all rates are exactly zero
        let history = vec![pitch(1, 10, Some("walk")), pitch(1, 10, None)];
        let aggregates = compute_batter_aggregates(&history);
        let profile = &aggregates[&PlayerId(10)];

        assert_eq!(profile.at_bats, 0);
        assert_eq!(profile.avg, 0.0);
        assert_eq!(profile.slg, 0.0);
        assert_eq!(profile.iso, 0.0);
    }

    #[test]
    fn test_iso_is_slg_minus_avg() {
        let history = vec![
            pitch(1, 10, Some("home_run")),
            pitch(1, 10, Some("double")),
            pitch(1, 10, Some("field_out")),
            pitch(1, 10, Some("field_out")),
            pitch(1, 11, Some("single")),
            pitch(1, 11, Some("strikeout")),
        ];
        let aggregates = compute_batter_aggregates(&history);

        for profile in aggregates.values() {
            assert!(profile.at_bats > 0);
            assert!((profile.iso - (profile.slg - profile.avg)).abs() < 1e-6);
            assert!(profile.avg <= profile.slg);
        }
    }

    #[test]
    fn test_total_bases_weighting() {
        let history = vec![
            pitch(1, 10, Some("single")),
            pitch(1, 10, Some("double")),
            pitch(1, 10, Some("triple")),
            pitch(1, 10, Some("home_run")),
        ];
        let aggregates = compute_batter_aggregates(&history);
        let profile = &aggregates[&PlayerId(10)];

        assert_eq!(profile.total_bases, 10);
        assert_eq!(profile.avg, 1.0);
        assert_eq!(profile.slg, 2.5);
    }

    #[test]
    fn test_batter_profile_fallback_is_static_default() {
        let store = ProfileStore::new(vec![], Box::new(TableLookup::with(&[])), fallback());
        let profile = store.batter_profile("Nobody Known");

        assert_eq!(profile.stand, Handedness::Right);
        assert_eq!(profile.avg, 0.240);
        assert_eq!(profile.slg, 0.400);
        assert_eq!(profile.iso, 0.160);
    }

    #[test]
    fn test_pitcher_profile_fallback_is_league_average() {
        let mut history = vec![pitch(1, 10, Some("single"))];
        history[0].release_speed = Some(90.0);
        history[0].release_spin_rate = Some(2000.0);
        let mut second = pitch(2, 11, Some("field_out"));
        second.release_speed = Some(100.0);
        second.release_spin_rate = Some(3000.0);
        history.push(second);

        let store = ProfileStore::new(history, Box::new(TableLookup::with(&[])), fallback());
        let profile = store.pitcher_profile("Nobody Known");

        assert_eq!(profile.release_speed, 95.0);
        assert_eq!(profile.release_spin_rate, 2500.0);
        assert_eq!(profile.throws, Handedness::Right);
    }

    #[test]
    fn test_resolved_pitcher_uses_own_rows() {
        let mut a = pitch(100, 10, None);
        a.release_speed = Some(98.0);
        a.release_spin_rate = Some(2500.0);
        a.p_throws = Handedness::Left;
        let mut b = pitch(200, 10, None);
        b.release_speed = Some(88.0);
        b.release_spin_rate = Some(2100.0);

        let lookup = TableLookup::with(&[("Gerrit", "Cole", 100)]);
        let store = ProfileStore::new(vec![a, b], Box::new(lookup), fallback());
        let profile = store.pitcher_profile("Gerrit Cole");

        assert_eq!(profile.release_speed, 98.0);
        assert_eq!(profile.release_spin_rate, 2500.0);
        assert_eq!(profile.throws, Handedness::Left);
    }

    #[test]
    fn test_profile_lookup_idempotent() {
        let lookup = TableLookup::with(&[("Aaron", "Judge", 10), ("Gerrit", "Cole", 1)]);
        let history = vec![
            pitch(1, 10, Some("single")),
            pitch(1, 10, Some("strikeout")),
        ];
        let store = ProfileStore::new(history, Box::new(lookup), fallback());

        let first = store.batter_profile("Aaron Judge");
        let second = store.batter_profile("Aaron Judge");
        assert_eq!(first, second);

        let p1 = store.pitcher_profile("Gerrit Cole");
        let p2 = store.pitcher_profile("Gerrit Cole");
        assert_eq!(p1, p2);
    }

    #[test]
    fn test_resolved_batter_without_rows_falls_back() {
        // Name resolves but the id never appears in the history
        let lookup = TableLookup::with(&[("Juan", "Soto", 999)]);
        let store = ProfileStore::new(
            vec![pitch(1, 10, Some("single"))],
            Box::new(lookup),
            fallback(),
        );
        let profile = store.batter_profile("Juan Soto");

        assert_eq!(profile.avg, 0.240);
        assert_eq!(profile.slg, 0.400);
    }

    #[test]
    fn test_ambiguous_name_takes_first_candidate() {
        let lookup = TableLookup::with(&[("Aaron", "Judge", 10), ("Aaron", "Judge", 20)]);
        let store = ProfileStore::new(vec![], Box::new(lookup), fallback());
        assert_eq!(store.resolve_identity("Aaron Judge"), Some(PlayerId(10)));
    }

    #[test]
    fn test_write_batter_stats() {
        let history = vec![
            pitch(1, 10, Some("single")),
            pitch(1, 10, Some("strikeout")),
        ];
        let store = ProfileStore::new(history, Box::new(TableLookup::with(&[])), fallback());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batter_stats.csv");
        store.write_batter_stats(path.to_str().unwrap()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("batter,at_bats,hits,total_bases,avg,slg,iso"));
        assert!(content.contains("10,2,1,1,0.500,0.500,0.000"));
    }
}
