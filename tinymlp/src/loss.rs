use crate::activation::ActivationFn;
use crate::error::{check_dims, check_len, Result};
use crate::matrix::{Matrix, MatrixBase};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::iter::zip;

const BCE_EPSILON: f32 = 1e-7;

/// Per-example loss functions, applied column-wise to batches.
///
/// Each variant fuses its output nonlinearity into the loss, so the model's output
/// layer has to use [`LossFn::required_output_activation`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LossFn {
    /// Softmax over raw logits followed by cross-entropy against a (one-hot) target.
    SoftmaxCrossEntropy,
    /// Sigmoid over a single logit followed by binary cross-entropy.
    BinaryCrossEntropy,
    /// `0.5 * sum((o - t)^2)`
    MeanSquaredError,
}

/// `ln(sum(exp(x)))` and `max(x)`.
fn log_sum_exp(x: &[f32]) -> (f32, f32) {
    let max = x.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let sum: f32 = x.iter().map(|&v| (v - max).exp()).sum();
    (sum.ln(), max)
}

#[inline]
fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

impl LossFn {
    #[inline]
    pub fn required_output_activation(&self) -> ActivationFn {
        ActivationFn::Identity
    }

    /// Writes `d(loss)/d(output)` for one example into `out`.
    pub fn error_gradient(&self, output: &[f32], target: &[f32], out: &mut [f32]) -> Result<()> {
        self.check_example(output, target)?;
        check_len("LossFn::error_gradient", output.len(), out.len())?;
        match self {
            LossFn::SoftmaxCrossEntropy => {
                let (lse, max) = log_sum_exp(output);
                for (o, (&x, &t)) in zip(out, zip(output, target)) {
                    *o = (x - max - lse).exp() - t;
                }
            }
            LossFn::BinaryCrossEntropy => {
                out[0] = sigmoid(output[0]) - target[0];
            }
            LossFn::MeanSquaredError => {
                for (o, (&x, &t)) in zip(out, zip(output, target)) {
                    *o = x - t;
                }
            }
        }
        Ok(())
    }

    /// Scalar loss of one example.
    pub fn loss(&self, output: &[f32], target: &[f32]) -> Result<f32> {
        self.check_example(output, target)?;
        let loss = match self {
            LossFn::SoftmaxCrossEntropy => {
                let (lse, max) = log_sum_exp(output);
                -zip(output, target)
                    .map(|(&x, &t)| if t == 0.0 { 0.0 } else { t * (x - max - lse) })
                    .sum::<f32>()
            }
            LossFn::BinaryCrossEntropy => {
                let y = target[0];
                let y_hat = sigmoid(output[0]).clamp(BCE_EPSILON, 1.0 - BCE_EPSILON);
                -(y * y_hat.ln() + (1.0 - y) * (1.0 - y_hat).ln())
            }
            LossFn::MeanSquaredError => {
                0.5 * zip(output, target).map(|(&x, &t)| (x - t) * (x - t)).sum::<f32>()
            }
        };
        Ok(loss)
    }

    /// Column-wise [`LossFn::error_gradient`] over a `(outputs, batch)` matrix.
    pub fn error_gradient_batch<O, T>(&self, output: &O, target: &T, out: &mut Matrix) -> Result<()>
    where
        O: MatrixBase + ?Sized,
        T: MatrixBase + ?Sized,
    {
        check_dims("LossFn::error_gradient_batch", output.dims(), target.dims())?;
        check_dims("LossFn::error_gradient_batch", output.dims(), out.dims())?;
        let rows = output.rows();
        self.check_rows(rows)?;
        let mut o = vec![0.0; rows];
        let mut t = vec![0.0; rows];
        let mut g = vec![0.0; rows];
        for col in 0..output.cols() {
            output.read_col(col, &mut o)?;
            target.read_col(col, &mut t)?;
            self.error_gradient(&o, &t, &mut g)?;
            out.write_col(col, &g)?;
        }
        Ok(())
    }

    /// Average of [`LossFn::loss`] over the columns of a batch.
    pub fn loss_batch<O, T>(&self, output: &O, target: &T) -> Result<f32>
    where
        O: MatrixBase + ?Sized,
        T: MatrixBase + ?Sized,
    {
        check_dims("LossFn::loss_batch", output.dims(), target.dims())?;
        let rows = output.rows();
        let cols = output.cols();
        self.check_rows(rows)?;
        if cols == 0 {
            return Ok(0.0);
        }
        let mut o = vec![0.0; rows];
        let mut t = vec![0.0; rows];
        let mut sum = 0.0;
        for col in 0..cols {
            output.read_col(col, &mut o)?;
            target.read_col(col, &mut t)?;
            sum += self.loss(&o, &t)?;
        }
        Ok(sum / cols as f32)
    }

    fn check_example(&self, output: &[f32], target: &[f32]) -> Result<()> {
        check_len("LossFn target", output.len(), target.len())?;
        self.check_rows(output.len())
    }

    fn check_rows(&self, rows: usize) -> Result<()> {
        match self {
            LossFn::BinaryCrossEntropy => check_len("LossFn::BinaryCrossEntropy output", 1, rows),
            _ => Ok(()),
        }
    }
}
