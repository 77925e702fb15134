//! Matchup feature vector
//!
//! One (pitcher, batter) pair is encoded as a fixed-order 7-dim vector.
//! The field order is a binding contract with the trained model: changing
//! it requires retraining.

use crate::{BatterProfile, PitcherProfile};

/// Features for one pitcher/batter matchup
#[derive(Debug, Clone, PartialEq)]
pub struct MatchupFeatures {
    /// Mean pitch velocity (mph)
    pub release_speed: f32,
    /// Mean spin rate (rpm)
    pub release_spin_rate: f32,
    /// Pitcher handedness: R=0, L=1
    pub p_throws: f32,
    /// Batter handedness: R=0, L=1
    pub stand: f32,
    pub avg: f32,
    pub slg: f32,
    pub iso: f32,
}

impl MatchupFeatures {
    /// Dimension of the feature vector
    pub const DIM: usize = 7;

    /// Assemble the vector from two resolved profiles. Pure; any fallback
    /// handling happens upstream in the profile store.
    pub fn from_profiles(pitcher: &PitcherProfile, batter: &BatterProfile) -> Self {
        MatchupFeatures {
            release_speed: pitcher.release_speed,
            release_spin_rate: pitcher.release_spin_rate,
            p_throws: pitcher.throws.as_feature(),
            stand: batter.stand.as_feature(),
            avg: batter.avg,
            slg: batter.slg,
            iso: batter.iso,
        }
    }

    /// Flatten in training order
    pub fn to_vec(&self) -> Vec<f32> {
        vec![
            self.release_speed,
            self.release_spin_rate,
            self.p_throws,
            self.stand,
            self.avg,
            self.slg,
            self.iso,
        ]
    }
}
