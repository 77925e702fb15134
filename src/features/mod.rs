//! Feature construction
//!
//! Derives per-player profiles from the pitch-event history and assembles
//! the fixed-order matchup feature vector the model consumes.

pub mod matchup;
pub mod profiles;

pub use matchup::MatchupFeatures;
pub use profiles::{compute_batter_aggregates, ProfileStore};
