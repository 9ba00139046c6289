use crate::error::{check_len, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::iter::zip;

const LEAK: f32 = 0.01;

/// Elementwise activation functions. Stateless, so freely shared between models.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ActivationFn {
    /// `x` for positive inputs, `0.01 x` otherwise.
    LeakyReLU,
    ReLU,
    Sigmoid,
    Tanh,
    Softplus,
    Sin,
    ELU,
    Swish,
    Identity,
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl ActivationFn {
    #[inline]
    pub fn compute(self, x: f32) -> f32 {
        match self {
            ActivationFn::LeakyReLU => {
                if x > 0.0 {
                    x
                } else {
                    LEAK * x
                }
            }
            ActivationFn::ReLU => x.max(0.0),
            ActivationFn::Sigmoid => sigmoid(x),
            ActivationFn::Tanh => x.tanh(),
            // ln(1 + e^x) without overflowing for large x
            ActivationFn::Softplus => x.max(0.0) + (-x.abs()).exp().ln_1p(),
            ActivationFn::Sin => x.sin(),
            ActivationFn::ELU => {
                if x > 0.0 {
                    x
                } else {
                    x.exp_m1()
                }
            }
            ActivationFn::Swish => x * sigmoid(x),
            ActivationFn::Identity => x,
        }
    }

    #[inline]
    pub fn derivative_at(self, x: f32) -> f32 {
        match self {
            ActivationFn::LeakyReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    LEAK
                }
            }
            ActivationFn::ReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            ActivationFn::Sigmoid => {
                let s = sigmoid(x);
                s * (1.0 - s)
            }
            ActivationFn::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFn::Softplus => sigmoid(x),
            ActivationFn::Sin => x.cos(),
            ActivationFn::ELU => {
                if x > 0.0 {
                    1.0
                } else {
                    x.exp()
                }
            }
            ActivationFn::Swish => {
                let s = sigmoid(x);
                s * (1.0 + x * (1.0 - s))
            }
            ActivationFn::Identity => 1.0,
        }
    }

    /// `out[i] = f(x[i])`
    pub fn apply(&self, x: &[f32], out: &mut [f32]) -> Result<()> {
        check_len("ActivationFn::apply", x.len(), out.len())?;
        for (o, &v) in zip(out, x) {
            *o = self.compute(v);
        }
        Ok(())
    }

    /// `out[i] = f'(x[i])`
    pub fn derivative(&self, x: &[f32], out: &mut [f32]) -> Result<()> {
        check_len("ActivationFn::derivative", x.len(), out.len())?;
        for (o, &v) in zip(out, x) {
            *o = self.derivative_at(v);
        }
        Ok(())
    }
}

/// Numerically stable softmax, computed in place.
pub fn softmax(values: &mut [f32]) {
    // shift the values by -max(inputs) to prevent overflow (does not affect the result)
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
}
