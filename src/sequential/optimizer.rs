use super::layer::{Dense, Layer};
use super::tensor::Tensor;
use serde::{Deserialize, Serialize};

#[typetag::serde]
pub trait Optimizer {
    fn step(&mut self, layers: &mut [Box<dyn Layer>]);
    fn clone_box(&self) -> Box<dyn Optimizer>;
}

fn dense_layers(layers: &mut [Box<dyn Layer>]) -> impl Iterator<Item = &mut Dense> {
    layers.iter_mut().filter_map(|layer| layer.as_any_mut().downcast_mut::<Dense>())
}


// SGD

#[derive(Serialize, Deserialize, Clone)]
pub struct SGD {
    learning_rate: f32,
}

impl SGD {
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }
}

#[typetag::serde]
impl Optimizer for SGD {
    fn step(&mut self, layers: &mut [Box<dyn Layer>]) {
        let lr = self.learning_rate;
        for dense in dense_layers(layers) {
            if let (Some(d_weights), Some(d_biases)) = (dense.d_weights.take(), dense.d_biases.take()) {
                dense.weights = dense.weights.map2(&d_weights, |w, dw| w - lr * dw);
                dense.biases = dense.biases.map2(&d_biases, |b, db| b - lr * db);
            }
        }
    }

    fn clone_box(&self) -> Box<dyn Optimizer> {
        Box::new(self.clone())
    }
}


// Adam

#[derive(Serialize, Deserialize, Clone)]
struct Moments {
    m_weights: Tensor,
    v_weights: Tensor,
    m_biases: Tensor,
    v_biases: Tensor,
}

impl Moments {
    fn for_layer(dense: &Dense) -> Self {
        let (rows, cols) = (dense.weights.rows(), dense.weights.cols());
        Self {
            m_weights: Tensor::zeros(rows, cols),
            v_weights: Tensor::zeros(rows, cols),
            m_biases: Tensor::zeros(1, cols),
            v_biases: Tensor::zeros(1, cols),
        }
    }
}

/// Adam with bias correction. Moment estimates are kept per dense layer, in
/// layer order, and are created on the first step.
#[derive(Serialize, Deserialize, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: i32,
    moments: Vec<Moments>,
}

impl Adam {
    pub fn new(learning_rate: f32) -> Self {
        Self::with_betas(learning_rate, 0.9, 0.999, 1e-8)
    }

    pub fn with_betas(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            t: 0,
            moments: Vec::new(),
        }
    }

    fn update(&self, param: &Tensor, grad: &Tensor, m: &mut Tensor, v: &mut Tensor) -> Tensor {
        let (b1, b2) = (self.beta1, self.beta2);
        *m = m.map2(grad, |m, g| b1 * m + (1.0 - b1) * g);
        *v = v.map2(grad, |v, g| b2 * v + (1.0 - b2) * g * g);

        let m_hat = m.map(|m| m / (1.0 - b1.powi(self.t)));
        let v_hat = v.map(|v| v / (1.0 - b2.powi(self.t)));
        let (lr, eps) = (self.learning_rate, self.epsilon);
        let step = m_hat.map2(&v_hat, |m, v| lr * m / (v.sqrt() + eps));
        param.map2(&step, |p, s| p - s)
    }
}

#[typetag::serde]
impl Optimizer for Adam {
    fn step(&mut self, layers: &mut [Box<dyn Layer>]) {
        self.t += 1;
        for (index, dense) in dense_layers(layers).enumerate() {
            let (Some(d_weights), Some(d_biases)) = (dense.d_weights.take(), dense.d_biases.take()) else {
                continue;
            };
            if self.moments.len() <= index {
                self.moments.push(Moments::for_layer(dense));
            }

            let mut moments = self.moments[index].clone();
            dense.weights = self.update(&dense.weights, &d_weights, &mut moments.m_weights, &mut moments.v_weights);
            dense.biases = self.update(&dense.biases, &d_biases, &mut moments.m_biases, &mut moments.v_biases);
            self.moments[index] = moments;
        }
    }

    fn clone_box(&self) -> Box<dyn Optimizer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_approx_eq(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-5, "{} vs {}", x, y);
        }
    }

    fn layer_with_gradients() -> Vec<Box<dyn Layer>> {
        let mut dense = Dense::from_parts(
            Tensor::from_vec(vec![10.0, 20.0, 30.0, 40.0], 2, 2),
            Tensor::from_vec(vec![5.0, 6.0], 1, 2),
        );
        dense.d_weights = Some(Tensor::from_vec(vec![2.0, 3.0, 4.0, 5.0], 2, 2));
        dense.d_biases = Some(Tensor::from_vec(vec![0.5, 1.5], 1, 2));
        vec![Box::new(dense)]
    }

    fn dense(layers: &[Box<dyn Layer>]) -> &Dense {
        layers[0].as_any().downcast_ref::<Dense>().unwrap()
    }

    #[test]
    fn test_sgd_optimizer_step() {
        let mut layers = layer_with_gradients();
        SGD::new(0.1).step(&mut layers);

        // w - 0.1 * dw
        assert_vec_approx_eq(dense(&layers).weights.data(), &[9.8, 19.7, 29.6, 39.5]);
        assert_vec_approx_eq(dense(&layers).biases.data(), &[4.95, 5.85]);
        // gradients are consumed by the step
        assert!(dense(&layers).d_weights.is_none());
    }

    #[test]
    fn test_adam_first_step_moves_by_learning_rate() {
        let mut layers = layer_with_gradients();
        let mut adam = Adam::new(0.1);
        adam.step(&mut layers);

        // the bias-corrected first step is lr * sign(g)
        assert_vec_approx_eq(dense(&layers).weights.data(), &[9.9, 19.9, 29.9, 39.9]);
        assert_vec_approx_eq(dense(&layers).biases.data(), &[4.9, 5.9]);
        assert_eq!(adam.t, 1);
        assert_eq!(adam.moments.len(), 1);
    }

    #[test]
    fn test_step_without_gradients_is_noop() {
        let mut layers: Vec<Box<dyn Layer>> = vec![Box::new(Dense::from_parts(
            Tensor::from_vec(vec![1.0], 1, 1),
            Tensor::from_vec(vec![0.0], 1, 1),
        ))];
        Adam::new(0.1).step(&mut layers);
        assert_eq!(dense(&layers).weights.data(), &[1.0]);
    }
}
