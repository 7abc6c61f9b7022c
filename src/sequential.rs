pub mod tensor;
pub mod layer;
pub mod loss;
pub mod optimizer;

use tensor::Tensor;
use layer::{Layer, Dense};
use loss::Loss;
use optimizer::Optimizer;

use crate::error::{Error, Result};

use serde::{Serialize, Deserialize};

/// Feed-forward stack trained with a pluggable loss and optimizer.
#[derive(Serialize, Deserialize)]
pub struct Sequential {
    pub layers: Vec<Box<dyn Layer>>,
    pub loss: Box<dyn Loss>,
    pub optimizer: Box<dyn Optimizer>
}

impl Sequential {
    pub fn new(layers: Vec<Box<dyn Layer>>, loss: Box<dyn Loss>, optimizer: Box<dyn Optimizer>) -> Self {
        Self {
            layers,
            loss,
            optimizer
        }
    }

    pub fn predict(&mut self, input: &Tensor) -> Tensor {
        let mut output = input.clone();
        for layer in &mut self.layers {
            output = layer.forward(&output);
        }
        output
    }

    /// One gradient step towards `y_batch`. Returns the loss measured before the step.
    pub fn train_on_batch(&mut self, x_batch: &Tensor, y_batch: &Tensor) -> f32 {
        let y_pred = self.predict(x_batch);
        let loss = self.loss.calculate(&y_pred, y_batch);

        let mut d_output = self.loss.gradient(&y_pred, y_batch);
        for layer in self.layers.iter_mut().rev() {
            d_output = layer.backward(&d_output);
        }
        self.optimizer.step(&mut self.layers);

        loss
    }

    pub fn copy_weights_from(&mut self, other: &Self) {
        for (self_layer, other_layer) in self.layers.iter_mut().zip(other.layers.iter()) {
            if let (Some(self_dense), Some(other_dense)) = (self_layer.as_any_mut().downcast_mut::<Dense>(), other_layer.as_any().downcast_ref::<Dense>()) {
                self_dense.weights = other_dense.weights.clone();
                self_dense.biases = other_dense.biases.clone();
            }
        }
    }

    fn dense_layers(&self) -> impl Iterator<Item = &Dense> {
        self.layers.iter().filter_map(|layer| layer.as_any().downcast_ref::<Dense>())
    }

    pub fn input_size(&self) -> Option<usize> {
        self.dense_layers().next().map(Dense::input_size)
    }

    pub fn output_size(&self) -> Option<usize> {
        self.dense_layers().last().map(Dense::output_size)
    }

    /// Checks that decoded dense layers have one-row biases and chain
    /// together, output width to next input width.
    pub fn check_shapes(&self) -> Result<()> {
        let mut width: Option<usize> = None;
        for (index, dense) in self.dense_layers().enumerate() {
            if dense.biases.rows() != 1 || dense.biases.cols() != dense.output_size() {
                return Err(Error::MalformedModel(format!(
                    "layer {} has {}x{} biases for {} outputs",
                    index,
                    dense.biases.rows(),
                    dense.biases.cols(),
                    dense.output_size()
                )));
            }
            if let Some(previous) = width.filter(|&w| w != dense.input_size()) {
                return Err(Error::MalformedModel(format!(
                    "layer {} takes {} inputs but the layer before it produces {}",
                    index,
                    dense.input_size(),
                    previous
                )));
            }
            width = Some(dense.output_size());
        }
        Ok(())
    }

    /// True when every dense layer holds exactly the same weights and biases.
    pub fn same_weights(&self, other: &Self) -> bool {
        let ours: Vec<&Dense> = self.dense_layers().collect();
        let theirs: Vec<&Dense> = other.dense_layers().collect();
        ours.len() == theirs.len()
            && ours.iter().zip(&theirs).all(|(a, b)| a.weights == b.weights && a.biases == b.biases)
    }
}

impl Clone for Sequential {
    fn clone(&self) -> Self {
        Self {
            layers: self.layers.iter().map(|layer| layer.clone_box()).collect(),
            loss: self.loss.clone_box(),
            optimizer: self.optimizer.clone_box()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequential::layer::ReLU;
    use crate::sequential::loss::MeanSquaredError;
    use crate::sequential::optimizer::SGD;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn single_dense(weights: Vec<f32>, bias: f32) -> Sequential {
        let dense = Dense::from_parts(Tensor::from_vec(weights, 2, 1), Tensor::from_vec(vec![bias], 1, 1));
        Sequential::new(vec![Box::new(dense)], Box::new(MeanSquaredError), Box::new(SGD::new(0.1)))
    }

    #[test]
    fn test_train_on_batch_reduces_loss() {
        let mut model = single_dense(vec![0.5, -0.5], 0.1);
        let x = Tensor::from_vec(vec![1.0, 2.0], 1, 2);
        let y = Tensor::from_vec(vec![1.0], 1, 1);

        let first = model.train_on_batch(&x, &y);
        let second = model.train_on_batch(&x, &y);
        assert!(second < first, "loss went from {} to {}", first, second);
    }

    #[test]
    fn test_copy_weights_from_is_exact() {
        let mut rng = StdRng::seed_from_u64(5);
        let build = |rng: &mut StdRng| {
            let layers: Vec<Box<dyn Layer>> = vec![
                Box::new(Dense::new(3, 4, rng)),
                Box::new(ReLU::new()),
                Box::new(Dense::new(4, 2, rng)),
            ];
            Sequential::new(layers, Box::new(MeanSquaredError), Box::new(SGD::new(0.1)))
        };
        let source = build(&mut rng);
        let mut dest = build(&mut rng);
        assert!(!dest.same_weights(&source));

        dest.copy_weights_from(&source);
        assert!(dest.same_weights(&source));
        assert_eq!(dest.input_size(), Some(3));
        assert_eq!(dest.output_size(), Some(2));
    }

    #[test]
    fn test_check_shapes() {
        let mut rng = StdRng::seed_from_u64(1);
        let chained: Vec<Box<dyn Layer>> = vec![
            Box::new(Dense::new(9, 16, &mut rng)),
            Box::new(ReLU::new()),
            Box::new(Dense::new(16, 4, &mut rng)),
        ];
        let model = Sequential::new(chained, Box::new(MeanSquaredError), Box::new(SGD::new(0.1)));
        assert!(model.check_shapes().is_ok());

        let broken: Vec<Box<dyn Layer>> = vec![
            Box::new(Dense::new(9, 16, &mut rng)),
            Box::new(ReLU::new()),
            Box::new(Dense::new(8, 4, &mut rng)),
        ];
        let model = Sequential::new(broken, Box::new(MeanSquaredError), Box::new(SGD::new(0.1)));
        assert!(matches!(model.check_shapes(), Err(Error::MalformedModel(_))));

        let mut dense = Dense::new(9, 4, &mut rng);
        dense.biases = Tensor::zeros(2, 4);
        let model = Sequential::new(vec![Box::new(dense)], Box::new(MeanSquaredError), Box::new(SGD::new(0.1)));
        assert!(matches!(model.check_shapes(), Err(Error::MalformedModel(_))));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut model = single_dense(vec![0.5, -0.5], 0.1);
        let snapshot = model.clone();
        model.train_on_batch(&Tensor::from_vec(vec![1.0, 2.0], 1, 2), &Tensor::from_vec(vec![3.0], 1, 1));
        assert!(!model.same_weights(&snapshot));
    }
}
