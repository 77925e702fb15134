//! Hit-probability model
//!
//! A feed-forward binary classifier plus the standardization statistics it
//! was trained with. The two artifacts are persisted separately but only
//! ever loaded together.

pub mod mlp;
pub mod scaler;

pub use mlp::{HitNet, HitNetConfig};
pub use scaler::FeatureScaler;
