//! Lineup optimizer
//!
//! Builds one feature vector per listed batter against the given pitcher,
//! scores them with the trained model, and returns the lineup ranked by
//! hit probability. Every listed batter yields a prediction: profile
//! lookup degrades to fallbacks instead of excluding anyone.

use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use std::cmp::Ordering;
use std::path::Path;

use crate::features::{MatchupFeatures, ProfileStore};
use crate::model::{FeatureScaler, HitNet, HitNetConfig};
use crate::training::trainer::features_to_tensor;
use crate::{Config, LineupError, MatchupPrediction, Result};

/// Scores and ranks batting lineups against a pitcher
pub struct LineupOptimizer<B: Backend> {
    model: HitNet<B>,
    scaler: FeatureScaler,
    store: ProfileStore,
    device: B::Device,
}

impl<B: Backend> LineupOptimizer<B>
where
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
{
    pub fn new(
        model: HitNet<B>,
        scaler: FeatureScaler,
        store: ProfileStore,
        device: B::Device,
    ) -> Self {
        LineupOptimizer {
            model,
            scaler,
            store,
            device,
        }
    }

    /// Load trained artifacts. Model weights and scaler statistics must
    /// both be present; loading only one is an error.
    pub fn load(config: &Config, store: ProfileStore, device: B::Device) -> Result<Self> {
        let model_file = format!("{}.mpk", config.data.model_path);
        if !Path::new(&model_file).exists() || !Path::new(&config.data.scaler_path).exists() {
            return Err(LineupError::MissingArtifacts);
        }

        let net_config = HitNetConfig {
            input_dim: MatchupFeatures::DIM,
            hidden_dims: config.training.hidden_dims.clone(),
            dropout: config.training.dropout,
        };
        let model = HitNet::load(&device, &config.data.model_path, net_config)?;
        let scaler = FeatureScaler::load(&config.data.scaler_path)?;

        Ok(Self::new(model, scaler, store, device))
    }

    /// Rank the given batters by predicted hit probability against the
    /// pitcher, best first. Ties keep input order.
    pub fn optimize(
        &self,
        pitcher_name: &str,
        batter_names: &[String],
    ) -> Result<Vec<MatchupPrediction>> {
        // Pitcher profile resolves once, with league-average fallback
        let pitcher = self.store.pitcher_profile(pitcher_name);
        log::debug!(
            "Pitcher {}: {:.1} mph, {:.0} rpm, throws {}",
            pitcher_name,
            pitcher.release_speed,
            pitcher.release_spin_rate,
            pitcher.throws
        );

        let features: Vec<MatchupFeatures> = batter_names
            .iter()
            .map(|name| {
                let batter = self.store.batter_profile(name);
                MatchupFeatures::from_profiles(&pitcher, &batter)
            })
            .collect();

        if features.is_empty() {
            return Err(LineupError::NoValidBatters);
        }

        let tensor = features_to_tensor::<B>(&features, &self.device);
        let probs = sigmoid(self.model.forward(self.scaler.normalize(tensor)));
        let probs_data = probs.into_data();
        let probs_slice: &[f32] = probs_data
            .as_slice()
            .map_err(|e| LineupError::Parse(format!("Bad prediction tensor: {:?}", e)))?;

        Ok(rank_by_probability(batter_names, probs_slice))
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }
}

/// Zip names with probabilities and sort descending. The sort is stable,
/// so equal probabilities preserve input order.
pub fn rank_by_probability(names: &[String], probs: &[f32]) -> Vec<MatchupPrediction> {
    let mut ranked: Vec<MatchupPrediction> = names
        .iter()
        .zip(probs.iter())
        .map(|(name, p)| MatchupPrediction {
            batter: name.clone(),
            hit_probability: *p,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.hit_probability
            .partial_cmp(&a.hit_probability)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

/// Format a ranked lineup for display
pub fn format_lineup(predictions: &[MatchupPrediction]) -> String {
    let mut out = String::from("Optimal Lineup:\n");
    for (i, p) in predictions.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} (Hit Prob: {:.3})\n",
            i + 1,
            p.batter,
            p.hit_probability
        ));
    }
    out
}
