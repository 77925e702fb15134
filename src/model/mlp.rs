//! Feed-forward hit classifier
//!
//! Architecture: Input(7) → 128 → ReLU → Dropout
//!                        → 64  → ReLU → Dropout
//!                        → 32  → ReLU → Dropout
//!                        → 1 logit (apply sigmoid for P(hit))

use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, Recorder};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::features::MatchupFeatures;

/// Configuration for the hit classifier
#[derive(Debug, Clone)]
pub struct HitNetConfig {
    /// Input dimension (matchup features)
    pub input_dim: usize,
    /// Hidden layer widths
    pub hidden_dims: Vec<usize>,
    /// Dropout rate
    pub dropout: f64,
}

impl Default for HitNetConfig {
    fn default() -> Self {
        HitNetConfig {
            input_dim: MatchupFeatures::DIM,
            hidden_dims: vec![128, 64, 32],
            dropout: 0.2,
        }
    }
}

/// A single hidden layer block: Linear → ReLU → Dropout
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
    dropout: Dropout,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn new(device: &B::Device, in_dim: usize, out_dim: usize, dropout: f64) -> Self {
        HiddenBlock {
            linear: LinearConfig::new(in_dim, out_dim).init(device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear.forward(x);
        let x = relu(x);
        self.dropout.forward(x)
    }
}

/// Binary hit-probability classifier
#[derive(Module, Debug)]
pub struct HitNet<B: Backend> {
    blocks: Vec<HiddenBlock<B>>,
    out_head: Linear<B>,
}

impl<B: Backend> HitNet<B> {
    /// Create a new model with randomly initialized weights
    pub fn new(device: &B::Device, config: HitNetConfig) -> Self {
        let mut blocks = Vec::with_capacity(config.hidden_dims.len());
        let mut in_dim = config.input_dim;
        for &out_dim in &config.hidden_dims {
            blocks.push(HiddenBlock::new(device, in_dim, out_dim, config.dropout));
            in_dim = out_dim;
        }

        HitNet {
            blocks,
            out_head: LinearConfig::new(in_dim, 1).init(device),
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `features` - Standardized matchup features [batch, input_dim]
    ///
    /// # Returns
    /// Hit logits [batch, 1] - apply sigmoid for probabilities
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = features;
        for block in &self.blocks {
            x = block.forward(x);
        }
        self.out_head.forward(x)
    }

    /// Save model weights to file (burn appends .mpk)
    pub fn save(&self, path: &str) -> crate::Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.clone().into_record(), path.into())
            .map_err(|e| crate::LineupError::Io(std::io::Error::other(e.to_string())))
    }

    /// Load model weights from file
    pub fn load(device: &B::Device, path: &str, config: HitNetConfig) -> crate::Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(path.into(), device)
            .map_err(|e| crate::LineupError::Io(std::io::Error::other(e.to_string())))?;

        let model = Self::new(device, config);
        Ok(model.load_record(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_shapes() {
        let device = Default::default();
        let config = HitNetConfig::default();
        let model = HitNet::<TestBackend>::new(&device, config);

        let features = Tensor::random(
            [9, MatchupFeatures::DIM],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        let logits = model.forward(features);
        assert_eq!(logits.dims(), [9, 1]);
    }

    #[test]
    fn test_single_hidden_layer() {
        let device = Default::default();
        let config = HitNetConfig {
            input_dim: MatchupFeatures::DIM,
            hidden_dims: vec![16],
            dropout: 0.1,
        };
        let model = HitNet::<TestBackend>::new(&device, config);

        let features = Tensor::random(
            [2, MatchupFeatures::DIM],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        let logits = model.forward(features);
        assert_eq!(logits.dims(), [2, 1]);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        use burn::tensor::activation::sigmoid;

        let device = Default::default();
        let config = HitNetConfig {
            input_dim: MatchupFeatures::DIM,
            hidden_dims: vec![8],
            dropout: 0.0,
        };
        let model = HitNet::<TestBackend>::new(&device, config.clone());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hitnet");
        model.save(path.to_str().unwrap()).unwrap();

        let loaded =
            HitNet::<TestBackend>::load(&device, path.to_str().unwrap(), config).unwrap();

        let features = Tensor::<TestBackend, 2>::from_floats(
            [[95.0, 2400.0, 0.0, 1.0, 0.3, 0.5, 0.2]],
            &device,
        );
        let before = sigmoid(model.forward(features.clone())).into_data();
        let after = sigmoid(loaded.forward(features)).into_data();

        let a: &[f32] = before.as_slice().unwrap();
        let b: &[f32] = after.as_slice().unwrap();
        assert!((a[0] - b[0]).abs() < 1e-6);
    }
}
