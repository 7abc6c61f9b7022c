use super::tensor::Tensor;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::any::Any;

#[typetag::serde]
pub trait Layer {
    fn forward(&mut self, input: &Tensor) -> Tensor;
    fn backward(&mut self, d_output: &Tensor) -> Tensor;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn as_any(&self) -> &dyn Any;
    fn clone_box(&self) -> Box<dyn Layer>;
}


// dense layer

#[derive(Serialize, Deserialize, Clone)]
pub struct Dense {
    pub weights: Tensor, // input_size x output_size
    pub biases: Tensor,  // 1 x output_size
    #[serde(skip)]
    cached_input: Option<Tensor>,
    #[serde(skip)]
    pub d_weights: Option<Tensor>,
    #[serde(skip)]
    pub d_biases: Option<Tensor>,
}

impl Dense {
    /// He-initialised weights drawn from `rng`, zero biases.
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        let std = (2.0 / input_size.max(1) as f32).sqrt();
        Self::from_parts(
            Tensor::random_normal(input_size, output_size, std, rng),
            Tensor::zeros(1, output_size),
        )
    }

    pub fn from_parts(weights: Tensor, biases: Tensor) -> Self {
        assert_eq!(biases.rows(), 1, "biases must be a single row");
        assert_eq!(biases.cols(), weights.cols(), "one bias per output unit");
        Self {
            weights,
            biases,
            cached_input: None,
            d_weights: None,
            d_biases: None,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.cols()
    }
}

#[typetag::serde]
impl Layer for Dense {
    fn forward(&mut self, input: &Tensor) -> Tensor {
        assert_eq!(
            input.cols(),
            self.input_size(),
            "dense layer expects {} input features, got {}",
            self.input_size(),
            input.cols()
        );
        self.cached_input = Some(input.clone());
        input.matmul(&self.weights).add_row(&self.biases)
    }

    fn backward(&mut self, d_output: &Tensor) -> Tensor {
        let cached_input = self.cached_input.as_ref().expect("complete forward pass first.");

        // dL/dW = input.T @ dL/dY
        self.d_weights = Some(cached_input.transpose().matmul(d_output));
        // dL/db = column sums of dL/dY
        self.d_biases = Some(d_output.sum_rows());
        // dL/dX = dL/dY @ W.T
        d_output.matmul(&self.weights.transpose())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }
}


// relu layer

#[derive(Serialize, Deserialize, Clone, Default)]
pub struct ReLU {
    #[serde(skip)]
    cached_input: Option<Tensor>,
}

impl ReLU {
    pub fn new() -> Self {
        Self::default()
    }
}

#[typetag::serde]
impl Layer for ReLU {
    fn forward(&mut self, input: &Tensor) -> Tensor {
        self.cached_input = Some(input.clone());
        input.map(|x| x.max(0.0))
    }

    fn backward(&mut self, d_output: &Tensor) -> Tensor {
        let cached_input = self.cached_input.as_ref().expect("complete forward pass first.");
        cached_input.map2(d_output, |input_val, grad| if input_val > 0.0 { grad } else { 0.0 })
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }
}
