//! Training dataset assembly
//!
//! Converts pitch-event history into (feature vector, label) pairs for the
//! hit-probability model.

use crate::features::MatchupFeatures;
use crate::{BatterProfile, PitchEvent, PlayerId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;

/// Supervised dataset: one sample per usable pitch event
#[derive(Debug, Clone, Default)]
pub struct HitDataset {
    pub features: Vec<MatchupFeatures>,
    /// 1.0 for a hit, 0.0 otherwise
    pub labels: Vec<f32>,
}

impl HitDataset {
    /// Build samples from the history. A row is usable when velocity and
    /// spin are present and its batter has computed aggregates; the label
    /// is whether the row's event was a hit (rows with no event are
    /// non-hits).
    pub fn from_history(
        history: &[PitchEvent],
        aggregates: &HashMap<PlayerId, BatterProfile>,
    ) -> Self {
        let mut features = Vec::new();
        let mut labels = Vec::new();

        for event in history {
            let (Some(speed), Some(spin)) = (event.release_speed, event.release_spin_rate) else {
                continue;
            };
            let Some(batter) = aggregates.get(&event.batter) else {
                continue;
            };

            features.push(MatchupFeatures {
                release_speed: speed,
                release_spin_rate: spin,
                p_throws: event.p_throws.as_feature(),
                stand: event.stand.as_feature(),
                avg: batter.avg,
                slg: batter.slg,
                iso: batter.iso,
            });

            let is_hit = event.outcome().map(|o| o.is_hit()).unwrap_or(false);
            labels.push(if is_hit { 1.0 } else { 0.0 });
        }

        HitDataset { features, labels }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Fraction of positive labels, for logging class balance
    pub fn hit_rate(&self) -> f32 {
        if self.labels.is_empty() {
            0.0
        } else {
            self.labels.iter().sum::<f32>() / self.labels.len() as f32
        }
    }

    /// Shuffle with a seeded RNG and split off `test_fraction` of the
    /// samples for evaluation.
    pub fn split(&self, test_fraction: f64, seed: u64) -> (HitDataset, HitDataset) {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let test_size = ((self.len() as f64) * test_fraction).round() as usize;
        let (test_idx, train_idx) = indices.split_at(test_size.min(self.len()));

        let pick = |idx: &[usize]| HitDataset {
            features: idx.iter().map(|&i| self.features[i].clone()).collect(),
            labels: idx.iter().map(|&i| self.labels[i]).collect(),
        };

        (pick(train_idx), pick(test_idx))
    }
}
