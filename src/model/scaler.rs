//! Feature standardization (z-score)
//!
//! Statistics are fit on training data only and persisted alongside the
//! model weights. Predict-time must apply the exact same standardization
//! or predictions are silently invalid.

use crate::features::MatchupFeatures;
use crate::{LineupError, Result};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Per-feature mean and standard deviation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl FeatureScaler {
    /// Fit on training features. Standard deviations are floored at 1e-3
    /// so constant columns do not blow up the division.
    pub fn fit(features: &[MatchupFeatures]) -> Self {
        let dim = MatchupFeatures::DIM;
        let mut sum = vec![0.0f32; dim];
        let mut sum_sq = vec![0.0f32; dim];

        for f in features {
            let vals = f.to_vec();
            for j in 0..dim {
                sum[j] += vals[j];
                sum_sq[j] += vals[j] * vals[j];
            }
        }

        let n = features.len().max(1) as f32;
        let mean: Vec<f32> = sum.iter().map(|s| s / n).collect();
        let std: Vec<f32> = sum_sq
            .iter()
            .zip(mean.iter())
            .map(|(sq, m)| ((sq / n - m * m).max(0.0).sqrt()).max(1e-3))
            .collect();

        FeatureScaler { mean, std }
    }

    /// Standardize a [batch, DIM] tensor: (x - mean) / std
    pub fn normalize<B: Backend>(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = features.device();
        let mean_tensor =
            Tensor::<B, 1>::from_floats(self.mean.as_slice(), &device).unsqueeze_dim(0);
        let std_tensor =
            Tensor::<B, 1>::from_floats(self.std.as_slice(), &device).unsqueeze_dim(0);

        (features - mean_tensor) / std_tensor
    }

    /// Standardize one flattened feature vector (used in tests and
    /// anywhere a tensor is overkill)
    pub fn transform(&self, vals: &[f32]) -> Vec<f32> {
        vals.iter()
            .zip(self.mean.iter().zip(self.std.iter()))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    /// Persist as JSON next to the model weights
    pub fn save(&self, path: &str) -> Result<()> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| LineupError::Parse(format!("Failed to serialize scaler: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| LineupError::Parse(format!("Failed to parse scaler: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn feature(speed: f32, avg: f32) -> MatchupFeatures {
        MatchupFeatures {
            release_speed: speed,
            release_spin_rate: 2400.0,
            p_throws: 0.0,
            stand: 0.0,
            avg,
            slg: avg,
            iso: 0.0,
        }
    }

    #[test]
    fn test_fit_mean_and_std() {
        let scaler = FeatureScaler::fit(&[feature(90.0, 0.2), feature(100.0, 0.4)]);

        assert_eq!(scaler.mean[0], 95.0);
        assert!((scaler.std[0] - 5.0).abs() < 1e-4);
        // Constant column floors at 1e-3 instead of zero
        assert_eq!(scaler.std[1], 1e-3);
    }

    #[test]
    fn test_transform_standardizes() {
        let scaler = FeatureScaler::fit(&[feature(90.0, 0.2), feature(100.0, 0.4)]);
        let out = scaler.transform(&feature(90.0, 0.2).to_vec());

        assert!((out[0] + 1.0).abs() < 1e-4);
        let out_hi = scaler.transform(&feature(100.0, 0.4).to_vec());
        assert!((out_hi[0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_tensor_normalize_matches_transform() {
        let device = Default::default();
        let scaler = FeatureScaler::fit(&[feature(90.0, 0.2), feature(100.0, 0.4)]);

        let raw = feature(92.0, 0.3).to_vec();
        let tensor = Tensor::<TestBackend, 1>::from_floats(raw.as_slice(), &device)
            .reshape([1, MatchupFeatures::DIM]);
        let normalized = scaler.normalize(tensor).into_data();
        let from_tensor: &[f32] = normalized.as_slice().unwrap();
        let from_vec = scaler.transform(&raw);

        for (a, b) in from_tensor.iter().zip(from_vec.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let scaler = FeatureScaler::fit(&[feature(90.0, 0.2), feature(100.0, 0.4)]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.json");
        scaler.save(path.to_str().unwrap()).unwrap();

        let loaded = FeatureScaler::load(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.mean, scaler.mean);
        assert_eq!(loaded.std, scaler.std);
    }
}
