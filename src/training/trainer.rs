//! Training loop for the hit classifier
//!
//! Full-batch gradient descent with binary cross-entropy. The feature
//! scaler is fit on the training split here so the two artifacts leave
//! training together.

use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};

use crate::data::dataset::HitDataset;
use crate::features::MatchupFeatures;
use crate::model::{FeatureScaler, HitNet};
use crate::training::metrics::{Metrics, TrainingHistory};
use crate::Result;

/// Trainer for the hit classifier
pub struct HitTrainer<B: AutodiffBackend> {
    model: HitNet<B>,
    optimizer:
        burn::optim::adaptor::OptimizerAdaptor<burn::optim::Sgd<B::InnerBackend>, HitNet<B>, B>,
    learning_rate: f64,
    device: B::Device,
}

impl<B: AutodiffBackend> HitTrainer<B> {
    /// Create a new trainer. SGD without momentum, matching the simple
    /// gradient descent the dataset size calls for.
    pub fn new(model: HitNet<B>, learning_rate: f64, device: B::Device) -> Self {
        let optimizer = SgdConfig::new().init();
        HitTrainer {
            model,
            optimizer,
            learning_rate,
            device,
        }
    }

    /// Train and return the best model (by test loss), the scaler it was
    /// trained with, and the per-epoch history.
    pub fn train(
        mut self,
        train_dataset: &HitDataset,
        test_dataset: &HitDataset,
        epochs: usize,
        early_stopping_patience: usize,
    ) -> Result<(HitNet<B>, FeatureScaler, TrainingHistory)> {
        let scaler = FeatureScaler::fit(&train_dataset.features);
        log::info!(
            "Feature scaler: mean={:?}, std={:?}",
            scaler.mean,
            scaler.std
        );
        log::info!(
            "Training on {} samples ({} held out), hit rate {:.3}",
            train_dataset.len(),
            test_dataset.len(),
            train_dataset.hit_rate()
        );

        // Full batch: tensors built once, reused every epoch
        let x_train = scaler.normalize(features_to_tensor::<B>(&train_dataset.features, &self.device));
        let y_train = labels_to_tensor::<B>(&train_dataset.labels, &self.device);
        let x_test = scaler.normalize(features_to_tensor::<B>(&test_dataset.features, &self.device));
        let y_test = labels_to_tensor::<B>(&test_dataset.labels, &self.device);

        let mut history = TrainingHistory::new();
        let mut best_model = self.model.clone();

        for epoch in 0..epochs {
            // Forward pass
            let logits = self.model.forward(x_train.clone());
            let probs = sigmoid(logits);

            let loss = binary_cross_entropy(probs.clone(), y_train.clone());
            let loss_val: f32 = loss.clone().into_scalar().elem();
            let train_correct = count_correct(&probs, &y_train);

            // Backward pass
            let grads = loss.backward();
            let grads_params = GradientsParams::from_grads(grads, &self.model);
            self.model = self
                .optimizer
                .step(self.learning_rate, self.model, grads_params);

            // Held-out evaluation
            let test_probs = sigmoid(self.model.forward(x_test.clone()));
            let test_loss: f32 = binary_cross_entropy(test_probs.clone(), y_test.clone())
                .into_scalar()
                .elem();
            let test_correct = count_correct(&test_probs, &y_test);

            let train_metrics = Metrics::new(loss_val, train_correct, train_dataset.len());
            let test_metrics = Metrics::new(test_loss, test_correct, test_dataset.len());

            if history.record_epoch(epoch, &train_metrics, &test_metrics) {
                best_model = self.model.clone();
            }

            if epoch % 10 == 0 || epoch == epochs - 1 {
                log::info!(
                    "Epoch {}/{}: Train: {} | Test: {}",
                    epoch + 1,
                    epochs,
                    train_metrics,
                    test_metrics
                );
            }

            if history.should_early_stop(early_stopping_patience) {
                log::info!(
                    "Early stopping at epoch {} (best was epoch {})",
                    epoch + 1,
                    history.best_epoch + 1
                );
                break;
            }
        }

        Ok((best_model, scaler, history))
    }
}

/// Stack matchup features into a [n, DIM] tensor
pub fn features_to_tensor<B: burn::tensor::backend::Backend>(
    features: &[MatchupFeatures],
    device: &B::Device,
) -> Tensor<B, 2> {
    let data: Vec<f32> = features.iter().flat_map(|f| f.to_vec()).collect();
    Tensor::<B, 1>::from_floats(data.as_slice(), device)
        .reshape([features.len(), MatchupFeatures::DIM])
}

fn labels_to_tensor<B: burn::tensor::backend::Backend>(
    labels: &[f32],
    device: &B::Device,
) -> Tensor<B, 2> {
    Tensor::<B, 1>::from_floats(labels, device).reshape([labels.len(), 1])
}

/// Binary cross-entropy over probabilities, clamped for stability
fn binary_cross_entropy<B: burn::tensor::backend::Backend>(
    probs: Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let eps = 1e-7;
    let probs_clamped = probs.clamp(eps, 1.0 - eps);
    let loss = targets.clone().neg() * probs_clamped.clone().log()
        - (targets.neg() + 1.0) * (probs_clamped.neg() + 1.0).log();
    loss.mean()
}

fn count_correct<B: burn::tensor::backend::Backend>(
    probs: &Tensor<B, 2>,
    targets: &Tensor<B, 2>,
) -> usize {
    let probs_data = probs.clone().into_data();
    let targets_data = targets.clone().into_data();
    let probs_slice: &[f32] = probs_data.as_slice().unwrap();
    let targets_slice: &[f32] = targets_data.as_slice().unwrap();

    probs_slice
        .iter()
        .zip(targets_slice.iter())
        .filter(|(p, t)| (**p >= 0.5) == (**t >= 0.5))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HitNetConfig;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray<f32>>;

    fn sample(speed: f32, avg: f32) -> MatchupFeatures {
        MatchupFeatures {
            release_speed: speed,
            release_spin_rate: 2400.0,
            p_throws: 0.0,
            stand: 0.0,
            avg,
            slg: avg + 0.15,
            iso: 0.15,
        }
    }

    fn separable_dataset(n: usize) -> HitDataset {
        // Low velocity + high average -> hit; the opposite -> out
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n {
            let jitter = (i % 5) as f32 * 0.01;
            features.push(sample(88.0 + jitter, 0.330));
            labels.push(1.0);
            features.push(sample(99.0 + jitter, 0.180));
            labels.push(0.0);
        }
        HitDataset { features, labels }
    }

    #[test]
    fn test_training_reduces_loss() {
        let device = Default::default();
        let config = HitNetConfig {
            input_dim: MatchupFeatures::DIM,
            hidden_dims: vec![16],
            dropout: 0.0,
        };
        let model = HitNet::<TestBackend>::new(&device, config);
        let trainer = HitTrainer::new(model, 0.1, device);

        let train = separable_dataset(20);
        let test = separable_dataset(4);
        let (_, _, history) = trainer.train(&train, &test, 60, 0).unwrap();

        let first = history.train_losses[0];
        let last = *history.train_losses.last().unwrap();
        assert!(
            last < first,
            "loss should decrease: first={}, last={}",
            first,
            last
        );
    }

    #[test]
    fn test_scaler_fit_on_train_split_only() {
        let device: <TestBackend as burn::tensor::backend::Backend>::Device = Default::default();
        let config = HitNetConfig {
            input_dim: MatchupFeatures::DIM,
            hidden_dims: vec![8],
            dropout: 0.0,
        };
        let model = HitNet::<TestBackend>::new(&device, config);
        let trainer = HitTrainer::new(model, 0.1, device);

        let train = separable_dataset(10);
        let test = HitDataset {
            // Out-of-range test sample must not influence the scaler
            features: vec![sample(150.0, 0.9)],
            labels: vec![1.0],
        };
        let (_, scaler, _) = trainer.train(&train, &test, 2, 0).unwrap();

        let expected = FeatureScaler::fit(&train.features);
        assert_eq!(scaler.mean, expected.mean);
        assert_eq!(scaler.std, expected.std);
    }

    #[test]
    fn test_bce_on_perfect_predictions_is_small() {
        let device: <TestBackend as burn::tensor::backend::Backend>::Device = Default::default();
        let probs = Tensor::<TestBackend, 2>::from_floats([[0.999], [0.001]], &device);
        let targets = Tensor::<TestBackend, 2>::from_floats([[1.0], [0.0]], &device);
        let loss: f32 = binary_cross_entropy(probs, targets).into_scalar().elem();
        assert!(loss < 0.01);
    }
}
