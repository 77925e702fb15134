//! Data acquisition and dataset construction
//!
//! Statcast snapshot loading, player identity resolution, and training
//! dataset assembly.

pub mod dataset;
pub mod lookup;
pub mod statcast;

pub use dataset::HitDataset;
pub use lookup::{ChadwickLookup, PlayerLookup};
pub use statcast::StatcastClient;
