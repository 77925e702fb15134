//! Lineup optimization
//!
//! Load trained artifacts and rank batters by predicted hit probability.

pub mod optimizer;

pub use optimizer::LineupOptimizer;
