use crate::activation::ActivationFn;
use crate::error::Result;
use crate::matrix::{multiply, Matrix, MatrixBase};
use std::fmt::{Debug, Formatter};

/// One affine transform followed by an elementwise activation, plus the forward-pass
/// caches sized to the model's batch width.
#[derive(Clone)]
pub struct Layer {
    input_size: usize,
    output_size: usize,
    weights: Matrix,
    biases: Matrix,
    activation_fn: ActivationFn,
    pre_activation: Matrix,
    activation: Matrix,
}

impl Layer {
    pub(crate) fn new(
        input_size: usize,
        output_size: usize,
        activation_fn: ActivationFn,
        weights: Matrix,
        biases: Matrix,
        batch_width: usize,
    ) -> Self {
        debug_assert_eq!(weights.dims().rows(), output_size);
        debug_assert_eq!(weights.dims().cols(), input_size);
        debug_assert_eq!(biases.dims().rows(), output_size);
        Layer {
            input_size,
            output_size,
            weights,
            biases,
            activation_fn,
            pre_activation: Matrix::new(output_size, batch_width),
            activation: Matrix::new(output_size, batch_width),
        }
    }

    /// Same parameters, caches reallocated for `batch_width`.
    pub(super) fn with_batch_width(&self, batch_width: usize) -> Self {
        Layer::new(
            self.input_size,
            self.output_size,
            self.activation_fn,
            self.weights.clone(),
            self.biases.clone(),
            batch_width,
        )
    }

    /// `Z = W · input + b`, `a = g(Z)`
    pub(super) fn forward(&mut self, input: &Matrix) -> Result<()> {
        multiply(&self.weights, input, &mut self.pre_activation)?;
        self.pre_activation.add_broadcasted(&self.biases)?;
        self.activation_fn
            .apply(self.pre_activation.as_slice(), self.activation.as_mut_slice())
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// `(output_size, input_size)`
    #[inline]
    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    /// `(output_size, 1)`
    #[inline]
    pub fn biases(&self) -> &Matrix {
        &self.biases
    }

    /// Row-major `(output_size, input_size)` weight buffer.
    #[inline]
    pub fn weights_mut(&mut self) -> &mut [f32] {
        self.weights.as_mut_slice()
    }

    #[inline]
    pub fn biases_mut(&mut self) -> &mut [f32] {
        self.biases.as_mut_slice()
    }

    #[inline]
    pub fn activation_fn(&self) -> ActivationFn {
        self.activation_fn
    }

    /// `Z` of the last forward pass.
    #[inline]
    pub fn pre_activation(&self) -> &Matrix {
        &self.pre_activation
    }

    /// `a = g(Z)` of the last forward pass.
    #[inline]
    pub fn activation(&self) -> &Matrix {
        &self.activation
    }
}

impl Debug for Layer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("size", &self.output_size)
            .field("activation_fn", &self.activation_fn)
            .field("weights", &self.weights)
            .field("biases", &self.biases)
            .finish_non_exhaustive()
    }
}
