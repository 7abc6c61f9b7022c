use super::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Losses are averaged over the batch (rows), summed over columns.
#[typetag::serde]
pub trait Loss {
    fn calculate(&self, y_pred: &Tensor, y_true: &Tensor) -> f32;
    fn gradient(&self, y_pred: &Tensor, y_true: &Tensor) -> Tensor;
    fn clone_box(&self) -> Box<dyn Loss>;
}


// mean squared error

#[derive(Serialize, Deserialize, Clone)]
pub struct MeanSquaredError;

#[typetag::serde]
impl Loss for MeanSquaredError {
    fn calculate(&self, y_pred: &Tensor, y_true: &Tensor) -> f32 {
        let batch = y_pred.rows().max(1) as f32;
        let squared = y_pred.map2(y_true, |p, t| (p - t) * (p - t));
        squared.data().iter().sum::<f32>() / batch
    }

    fn gradient(&self, y_pred: &Tensor, y_true: &Tensor) -> Tensor {
        let batch = y_pred.rows().max(1) as f32;
        y_pred.map2(y_true, |p, t| 2.0 * (p - t) / batch)
    }

    fn clone_box(&self) -> Box<dyn Loss> {
        Box::new(self.clone())
    }
}


// huber (smooth l1)

#[derive(Serialize, Deserialize, Clone)]
pub struct Huber {
    delta: f32,
}

impl Huber {
    pub fn new(delta: f32) -> Self {
        assert!(delta > 0.0, "huber delta must be positive");
        Self { delta }
    }
}

#[typetag::serde]
impl Loss for Huber {
    fn calculate(&self, y_pred: &Tensor, y_true: &Tensor) -> f32 {
        let batch = y_pred.rows().max(1) as f32;
        let delta = self.delta;
        let per_entry = y_pred.map2(y_true, |p, t| {
            let err = (p - t).abs();
            if err <= delta {
                0.5 * err * err
            } else {
                delta * (err - 0.5 * delta)
            }
        });
        per_entry.data().iter().sum::<f32>() / batch
    }

    fn gradient(&self, y_pred: &Tensor, y_true: &Tensor) -> Tensor {
        let batch = y_pred.rows().max(1) as f32;
        let delta = self.delta;
        y_pred.map2(y_true, |p, t| (p - t).clamp(-delta, delta) / batch)
    }

    fn clone_box(&self) -> Box<dyn Loss> {
        Box::new(self.clone())
    }
}
