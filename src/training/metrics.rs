//! Training metrics and history

use std::fmt;

/// Metrics for one pass over a dataset
#[derive(Debug, Clone, Copy, Default)]
pub struct Metrics {
    pub loss: f64,
    pub correct: usize,
    pub total: usize,
}

impl Metrics {
    pub fn new(loss: f32, correct: usize, total: usize) -> Self {
        Metrics {
            loss: loss as f64,
            correct,
            total,
        }
    }

    /// Hit/no-hit classification accuracy
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loss={:.4}, acc={:.1}%",
            self.loss,
            self.accuracy() * 100.0
        )
    }
}

/// Per-epoch history with best-epoch tracking for early stopping
#[derive(Debug, Clone)]
pub struct TrainingHistory {
    pub train_losses: Vec<f64>,
    pub test_losses: Vec<f64>,
    pub train_accuracies: Vec<f64>,
    pub test_accuracies: Vec<f64>,
    pub best_epoch: usize,
    pub best_test_loss: f64,
}

impl Default for TrainingHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingHistory {
    pub fn new() -> Self {
        TrainingHistory {
            train_losses: Vec::new(),
            test_losses: Vec::new(),
            train_accuracies: Vec::new(),
            test_accuracies: Vec::new(),
            best_epoch: 0,
            best_test_loss: f64::INFINITY,
        }
    }

    /// Record an epoch; returns true when the test loss improved
    pub fn record_epoch(&mut self, epoch: usize, train: &Metrics, test: &Metrics) -> bool {
        self.train_losses.push(train.loss);
        self.test_losses.push(test.loss);
        self.train_accuracies.push(train.accuracy());
        self.test_accuracies.push(test.accuracy());

        if test.loss < self.best_test_loss {
            self.best_test_loss = test.loss;
            self.best_epoch = epoch;
            true
        } else {
            false
        }
    }

    /// Whether `patience` epochs have passed without improvement.
    /// A patience of zero disables early stopping.
    pub fn should_early_stop(&self, patience: usize) -> bool {
        if patience == 0 || self.test_losses.len() < patience {
            return false;
        }
        let current_epoch = self.test_losses.len() - 1;
        current_epoch - self.best_epoch >= patience
    }
}
