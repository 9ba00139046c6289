use crate::error::{check_dims, Error, Result};
use crate::loss::LossFn;
use crate::matrix::{hadamard_product, multiply, Dim2, Matrix, MatrixBase};
use crate::net::Model;
use moments::{Moments, StepParams};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

mod moments;

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdamConfig {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
}

impl Default for AdamConfig {
    fn default() -> Self {
        AdamConfig {
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-5,
        }
    }
}

impl AdamConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(Error::InvalidConfig(format!("{name} must be in [0, 1), got {beta}")));
            }
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "epsilon must be positive and finite, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Gradient buffers and moment accumulators of one layer.
#[derive(Clone, Debug)]
struct LayerState {
    /// `(n_l, n_{l-1})`
    dw: Matrix,
    /// `(n_l, 1)`
    db: Matrix,
    /// error w.r.t. this layer's activation, `(n_l, m)`
    da: Matrix,
    /// error w.r.t. this layer's pre-activation, `(n_l, m)`
    dz: Matrix,
    weight_moments: Moments,
    bias_moments: Moments,
}

impl LayerState {
    fn new(input_size: usize, output_size: usize, batch_width: usize) -> Self {
        LayerState {
            dw: Matrix::new(output_size, input_size),
            db: Matrix::new(output_size, 1),
            da: Matrix::new(output_size, batch_width),
            dz: Matrix::new(output_size, batch_width),
            weight_moments: Moments::new(output_size * input_size),
            bias_moments: Moments::new(output_size),
        }
    }

    fn clear(&mut self) {
        self.dw.clear_to_zero();
        self.db.clear_to_zero();
        self.da.clear_to_zero();
        self.dz.clear_to_zero();
    }
}

/// Backpropagation with Adam updates for a [`Model`] of fixed topology and batch width.
///
/// The optimizer does not own the model. Each [`Adam::step`] borrows the caller's live model
/// and updates its weights and biases in place.
#[derive(Clone, Debug)]
pub struct Adam {
    loss: LossFn,
    config: AdamConfig,
    layer_sizes: Box<[usize]>,
    batch_width: usize,
    t: u64,
    output: Matrix,
    layers: Box<[LayerState]>,
}

impl Adam {
    pub fn new(model: &Model, loss: LossFn, beta1: f32, beta2: f32) -> Result<Adam> {
        let config = AdamConfig {
            beta1,
            beta2,
            ..AdamConfig::default()
        };
        Adam::with_config(model, loss, config)
    }

    /// Fails if the config is out of range or `loss` is not fused with the model's output activation.
    pub fn with_config(model: &Model, loss: LossFn, config: AdamConfig) -> Result<Adam> {
        config.validate()?;
        check_output_activation(model, loss)?;
        let batch_width = model.batch_width();
        let layers = model
            .layers()
            .iter()
            .map(|l| LayerState::new(l.input_size(), l.output_size(), batch_width))
            .collect();
        debug!(?loss, ?config, layer_sizes = ?model.layer_sizes(), "created Adam optimizer");
        Ok(Adam {
            loss,
            config,
            layer_sizes: model.layer_sizes().into(),
            batch_width,
            t: 1,
            output: Matrix::new(model.output_size(), batch_width),
            layers,
        })
    }

    /// One forward pass, backward pass and parameter update on a full batch.
    ///
    /// `input` must be `(input_size, m)` and `target` `(output_size, m)`. Every argument is
    /// validated before any buffer is touched, so on `Err` neither the model nor the
    /// optimizer has changed.
    pub fn step<I, T>(&mut self, model: &mut Model, input: &I, target: &T, learning_rate: f32) -> Result<()>
    where
        I: MatrixBase + ?Sized,
        T: MatrixBase + ?Sized,
    {
        self.validate_step(model, input.dims(), target.dims(), learning_rate)?;
        trace!(t = self.t, learning_rate, "Adam step");

        self.layers.iter_mut().for_each(LayerState::clear);
        self.output.clear_to_zero();

        model.forward_propagate(input, &mut self.output)?;

        let last = self.layers.len() - 1;
        self.loss
            .error_gradient_batch(&self.output, target, &mut self.layers[last].dz)?;

        let step = StepParams::new(
            learning_rate,
            self.config.beta1,
            self.config.beta2,
            self.config.epsilon,
            self.t,
        );
        let inv_m = 1.0 / self.batch_width as f32;
        for idx in (0..=last).rev() {
            let (layer_input, layer) = model.layer_with_input_mut(idx).ok_or_else(|| {
                Error::InvalidConfig(format!("model has no layer {idx}"))
            })?;
            let (prev, rest) = self.layers.split_at_mut(idx);
            let state = &mut rest[0];

            if idx != last {
                layer
                    .activation_fn()
                    .derivative(layer.pre_activation().as_slice(), state.dz.as_mut_slice())?;
                hadamard_product(&mut state.dz, &state.da)?;
            }

            multiply(&state.dz, &layer_input.t(), &mut state.dw)?;
            state.dw.scale(inv_m);
            state.dz.sum_of_cols(&mut state.db)?;
            state.db.scale(inv_m);

            if let Some(prev) = prev.last_mut() {
                multiply(&layer.weights().t(), &state.dz, &mut prev.da)?;
            }

            state
                .weight_moments
                .update(layer.weights_mut(), state.dw.as_slice(), &step);
            state
                .bias_moments
                .update(layer.biases_mut(), state.db.as_slice(), &step);
        }

        self.t += 1;
        Ok(())
    }

    fn validate_step(&self, model: &Model, input: Dim2, target: Dim2, learning_rate: f32) -> Result<()> {
        if model.layer_sizes() != &*self.layer_sizes || model.batch_width() != self.batch_width {
            return Err(Error::InvalidConfig(format!(
                "optimizer was built for layer sizes {:?} at batch width {}, got {:?} at batch width {}",
                self.layer_sizes,
                self.batch_width,
                model.layer_sizes(),
                model.batch_width()
            )));
        }
        check_output_activation(model, self.loss)?;
        check_dims("Adam::step input", model.input_dims(), input)?;
        check_dims("Adam::step target", model.output_dims(), target)?;
        if !(learning_rate.is_finite() && learning_rate >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and non-negative, got {learning_rate}"
            )));
        }
        Ok(())
    }

    /// Average loss of the output of the last step against `target`.
    pub fn batch_loss<T: MatrixBase + ?Sized>(&self, target: &T) -> Result<f32> {
        self.loss.loss_batch(&self.output, target)
    }

    /// Model output of the last step, `(output_size, m)`.
    #[inline]
    pub fn output(&self) -> &Matrix {
        &self.output
    }

    /// `(dW, db)` of layer `index` computed by the last step.
    pub fn gradients(&self, index: usize) -> Option<(&Matrix, &Matrix)> {
        self.layers.get(index).map(|s| (&s.dw, &s.db))
    }

    /// Number of the next step, starting at 1.
    #[inline]
    pub fn step_count(&self) -> u64 {
        self.t
    }

    #[inline]
    pub fn loss_fn(&self) -> LossFn {
        self.loss
    }

    #[inline]
    pub fn config(&self) -> &AdamConfig {
        &self.config
    }
}

fn check_output_activation(model: &Model, loss: LossFn) -> Result<()> {
    let required = loss.required_output_activation();
    let actual = model
        .layers()
        .last()
        .map(|l| l.activation_fn())
        .unwrap_or(required);
    if actual == required {
        Ok(())
    } else {
        Err(Error::IncompatibleLoss {
            loss,
            required,
            actual,
        })
    }
}
