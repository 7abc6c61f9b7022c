use rand::Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Row-major 2D matrix of `f32`. Rows are samples, columns are features.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTensor")]
pub struct Tensor {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

// decoded form, checked before it becomes a `Tensor`
#[derive(Deserialize)]
struct RawTensor {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl TryFrom<RawTensor> for Tensor {
    type Error = String;

    fn try_from(raw: RawTensor) -> Result<Self, Self::Error> {
        match raw.rows.checked_mul(raw.cols) {
            Some(len) if len == raw.data.len() => Ok(Self {
                rows: raw.rows,
                cols: raw.cols,
                data: raw.data,
            }),
            _ => Err(format!(
                "{} values cannot fill a {}x{} tensor",
                raw.data.len(),
                raw.rows,
                raw.cols
            )),
        }
    }
}

impl Tensor {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Samples every entry from `N(0, std)`.
    pub fn random_normal<R: Rng + ?Sized>(rows: usize, cols: usize, std: f32, rng: &mut R) -> Self {
        let normal = Normal::new(0.0, std).unwrap_or_else(|_| panic!("invalid standard deviation {}", std));
        let data = (0..rows * cols).map(|_| normal.sample(rng)).collect();
        Self { rows, cols, data }
    }

    pub fn from_vec(data: Vec<f32>, rows: usize, cols: usize) -> Self {
        assert_eq!(data.len(), rows * cols, "data length does not match a {}x{} tensor", rows, cols);
        Self { rows, cols, data }
    }

    // stacks equally sized rows into one tensor
    pub fn from_rows<'a, I>(rows: I, cols: usize) -> Self
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let mut data = Vec::new();
        let mut count = 0;
        for row in rows {
            assert_eq!(row.len(), cols, "row {} has {} columns, expected {}", count, row.len(), cols);
            data.extend_from_slice(row);
            count += 1;
        }
        Self { rows: count, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn row(&self, index: usize) -> &[f32] {
        assert!(index < self.rows, "row {} out of bounds for {} rows", index, self.rows);
        &self.data[index * self.cols..(index + 1) * self.cols]
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[self.offset(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        let offset = self.offset(row, col);
        self.data[offset] = value;
    }

    pub fn transpose(&self) -> Tensor {
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                data.push(self.data[r * self.cols + c]);
            }
        }
        Tensor::from_vec(data, self.cols, self.rows)
    }

    pub fn matmul(&self, other: &Tensor) -> Tensor {
        assert_eq!(
            self.cols, other.rows,
            "cannot multiply {}x{} by {}x{}",
            self.rows, self.cols, other.rows, other.cols
        );

        let k = self.cols;
        let n = other.cols;
        let mut out = Tensor::zeros(self.rows, n);

        // one output row per task
        out.data.par_chunks_mut(n.max(1)).enumerate().for_each(|(m_idx, out_row)| {
            let a_row = &self.data[m_idx * k..(m_idx + 1) * k];
            for (k_idx, &a_val) in a_row.iter().enumerate() {
                let b_row = &other.data[k_idx * n..(k_idx + 1) * n];
                for (o, &b_val) in out_row.iter_mut().zip(b_row) {
                    *o += a_val * b_val;
                }
            }
        });

        out
    }

    /// Adds a `1 x cols` tensor to every row.
    pub fn add_row(&self, row: &Tensor) -> Tensor {
        assert_eq!(row.rows, 1, "broadcast operand must be a single row");
        assert_eq!(row.cols, self.cols, "broadcast operand has {} columns, expected {}", row.cols, self.cols);

        let mut out = self.clone();
        out.data.par_chunks_mut(self.cols.max(1)).for_each(|out_row| {
            for (o, &b) in out_row.iter_mut().zip(&row.data) {
                *o += b;
            }
        });
        out
    }

    /// Column sums as a `1 x cols` tensor.
    pub fn sum_rows(&self) -> Tensor {
        let mut sums = vec![0.0; self.cols];
        for row in self.data.chunks(self.cols.max(1)) {
            for (s, &v) in sums.iter_mut().zip(row) {
                *s += v;
            }
        }
        Tensor::from_vec(sums, 1, self.cols)
    }

    pub fn map<F>(&self, f: F) -> Tensor
    where
        F: Fn(f32) -> f32 + Sync + Send,
    {
        let data = self.data.par_iter().map(|&x| f(x)).collect();
        Tensor::from_vec(data, self.rows, self.cols)
    }

    pub fn map2<F>(&self, other: &Tensor, f: F) -> Tensor
    where
        F: Fn(f32, f32) -> f32 + Sync + Send,
    {
        assert_eq!(
            (self.rows, self.cols),
            (other.rows, other.cols),
            "tensors must have the same shape"
        );
        let data = self
            .data
            .par_iter()
            .zip(other.data.par_iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Tensor::from_vec(data, self.rows, self.cols)
    }

    /// Largest value of each row.
    pub fn row_max(&self) -> Vec<f32> {
        self.data
            .chunks(self.cols.max(1))
            .map(|row| row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b)))
            .collect()
    }

    /// Column index of the largest value of each row, lowest index on ties.
    pub fn row_argmax(&self) -> Vec<usize> {
        self.data
            .chunks(self.cols.max(1))
            .map(|row| {
                let mut best = 0;
                for (i, &v) in row.iter().enumerate() {
                    if v > row[best] {
                        best = i;
                    }
                }
                best
            })
            .collect()
    }

    fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of bounds for {}x{} tensor",
            row, col, self.rows, self.cols
        );
        row * self.cols + col
    }
}
