use crate::activation::ActivationFn;
use crate::error::{check_dims, Error, Result};
use crate::matrix::{Dim2, Matrix, MatrixBase};
use crate::net::initializer::{InitScheme, Initializer, RandomInitializer};
use std::fmt::{Debug, Formatter};
use tracing::debug;

pub mod initializer;
mod layer;

pub use layer::Layer;

/// Fixed-width multilayer perceptron.
///
/// Every cache (`a[0]`, and `Z`/`a` of each layer) is allocated for `batch_width` examples
/// at construction and reused by every forward pass.
#[derive(Clone)]
pub struct Model {
    batch_width: usize,
    input: Matrix,
    layers: Box<[Layer]>,
    layer_sizes: Box<[usize]>,
}

impl Model {
    /// Builds a model with `activations.len()` layers, where layer `i` maps
    /// `layer_sizes[i]` inputs to `layer_sizes[i + 1]` outputs.
    ///
    /// Weights are drawn from `initializer` in row-major order, layer by layer, biases start at zero.
    pub fn new(
        activations: &[ActivationFn],
        layer_sizes: &[usize],
        batch_width: usize,
        initializer: &mut dyn Initializer,
    ) -> Result<Model> {
        validate_topology(activations, layer_sizes, batch_width)?;
        let layers: Vec<Layer> = activations
            .iter()
            .zip(layer_sizes.windows(2))
            .map(|(&activation_fn, sizes)| -> Result<Layer> {
                let (fan_in, fan_out) = (sizes[0], sizes[1]);
                let weights: Vec<f32> = (0..fan_in * fan_out)
                    .map(|_| initializer.sample(fan_in, fan_out))
                    .collect();
                let weights = Matrix::from_vec(fan_out, fan_in, weights)?;
                Ok(Layer::new(
                    fan_in,
                    fan_out,
                    activation_fn,
                    weights,
                    Matrix::new(fan_out, 1),
                    batch_width,
                ))
            })
            .collect::<Result<_>>()?;
        let model = Model::from_layers(layers, batch_width);
        debug!(layer_sizes = ?model.layer_sizes, batch_width, "created model");
        Ok(model)
    }

    /// Assembles a model from already validated, chained layers.
    pub(crate) fn from_layers(layers: Vec<Layer>, batch_width: usize) -> Model {
        let input_size = layers.first().map_or(0, Layer::input_size);
        let layer_sizes = std::iter::once(input_size)
            .chain(layers.iter().map(Layer::output_size))
            .collect();
        Model {
            batch_width,
            input: Matrix::new(input_size, batch_width),
            layers: layers.into_boxed_slice(),
            layer_sizes,
        }
    }

    /// Deep copy of the parameters with every cache reallocated for `batch_width` examples.
    pub fn with_batch_width(&self, batch_width: usize) -> Result<Model> {
        if batch_width == 0 {
            return Err(Error::InvalidConfig("batch width must be positive".into()));
        }
        let layers = self
            .layers
            .iter()
            .map(|l| l.with_batch_width(batch_width))
            .collect();
        Ok(Model::from_layers(layers, batch_width))
    }

    /// Runs the network on `input` `(input_size, m)`, caching `Z` and `a` of every layer,
    /// and copies the final activation into `output` `(output_size, m)`.
    pub fn forward_propagate<I>(&mut self, input: &I, output: &mut Matrix) -> Result<()>
    where
        I: MatrixBase + ?Sized,
    {
        check_dims("Model::forward_propagate output", self.output_dims(), output.dims())?;
        self.forward(input)?;
        output.copy_from(self.last_activation())
    }

    /// Like [`Model::forward_propagate`], but returns the output cache instead of copying it.
    pub fn predict<I>(&mut self, input: &I) -> Result<&Matrix>
    where
        I: MatrixBase + ?Sized,
    {
        self.forward(input)?;
        Ok(self.last_activation())
    }

    fn forward<I>(&mut self, input: &I) -> Result<()>
    where
        I: MatrixBase + ?Sized,
    {
        check_dims("Model::forward_propagate input", self.input_dims(), input.dims())?;
        self.input.copy_from(input)?;
        for i in 0..self.layers.len() {
            let (prev, rest) = self.layers.split_at_mut(i);
            let layer_input = prev.last().map_or(&self.input, Layer::activation);
            rest[0].forward(layer_input)?;
        }
        Ok(())
    }

    #[inline]
    fn last_activation(&self) -> &Matrix {
        self.layers
            .last()
            .map_or(&self.input, Layer::activation)
    }

    /// `(input_size, batch_width)`
    #[inline]
    pub fn input_dims(&self) -> Dim2 {
        Dim2(self.input_size(), self.batch_width)
    }

    /// `(output_size, batch_width)`
    #[inline]
    pub fn output_dims(&self) -> Dim2 {
        Dim2(self.output_size(), self.batch_width)
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    #[inline]
    pub fn batch_width(&self) -> usize {
        self.batch_width
    }

    /// Input size followed by every layer's output size.
    #[inline]
    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Cached input batch `a[0]` of the last forward pass.
    #[inline]
    pub fn input(&self) -> &Matrix {
        &self.input
    }

    #[inline]
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    /// Layer `index` with mutation rights together with the activation it consumes:
    /// `a[0]` for the first layer, the previous layer's activation otherwise.
    pub fn layer_with_input_mut(&mut self, index: usize) -> Option<(&Matrix, &mut Layer)> {
        if index >= self.layers.len() {
            return None;
        }
        let (prev, rest) = self.layers.split_at_mut(index);
        let input = prev.last().map_or(&self.input, Layer::activation);
        Some((input, &mut rest[0]))
    }
}

pub(crate) fn validate_topology(
    activations: &[ActivationFn],
    layer_sizes: &[usize],
    batch_width: usize,
) -> Result<()> {
    if activations.is_empty() {
        return Err(Error::InvalidConfig("model needs at least one layer".into()));
    }
    if activations.len() + 1 != layer_sizes.len() {
        return Err(Error::InvalidConfig(format!(
            "{} activation functions need {} layer sizes, got {}",
            activations.len(),
            activations.len() + 1,
            layer_sizes.len()
        )));
    }
    if let Some(i) = layer_sizes.iter().position(|&s| s == 0) {
        return Err(Error::InvalidConfig(format!("layer size {i} is zero")));
    }
    if batch_width == 0 {
        return Err(Error::InvalidConfig("batch width must be positive".into()));
    }
    Ok(())
}

impl Debug for Model {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("layer_sizes", &self.layer_sizes)
            .field("batch_width", &self.batch_width)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

pub struct ModelBuilder {
    input_size: usize,
    batch_width: usize,
    initializer: Box<dyn Initializer>,
    layers: Vec<(usize, ActivationFn)>,
}

impl ModelBuilder {
    pub fn new(input_size: usize) -> Self {
        ModelBuilder {
            input_size,
            batch_width: 1,
            initializer: Box::new(RandomInitializer::from_entropy(InitScheme::XavierUniform)),
            layers: Vec::new(),
        }
    }

    pub fn with_batch_width(mut self, batch_width: usize) -> Self {
        self.batch_width = batch_width;
        self
    }

    pub fn with_initializer<I>(mut self, initializer: I) -> Self
    where
        I: 'static + Initializer,
    {
        self.initializer = Box::new(initializer);
        self
    }

    pub fn with_layer(mut self, size: usize, activation: ActivationFn) -> Self {
        self.layers.push((size, activation));
        self
    }

    pub fn build(mut self) -> Result<Model> {
        let layer_sizes: Vec<usize> = std::iter::once(self.input_size)
            .chain(self.layers.iter().map(|&(size, _)| size))
            .collect();
        let activations: Vec<ActivationFn> = self.layers.iter().map(|&(_, f)| f).collect();
        Model::new(
            &activations,
            &layer_sizes,
            self.batch_width,
            self.initializer.as_mut(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::{Model, ModelBuilder};
    use crate::activation::ActivationFn;
    use crate::error::Error;
    use crate::matrix::{Dim2, Matrix, MatrixBase};
    use crate::net::initializer::{ConstantInitializer, InitScheme, RandomInitializer};
    use approx::assert_abs_diff_eq;

    fn constant_model(batch_width: usize) -> Model {
        ModelBuilder::new(2)
            .with_batch_width(batch_width)
            .with_initializer(ConstantInitializer(0.5))
            .with_layer(3, ActivationFn::ReLU)
            .with_layer(1, ActivationFn::Identity)
            .build()
            .unwrap()
    }

    #[test]
    fn test_construction() {
        let model = constant_model(4);
        assert_eq!(model.layer_sizes(), &[2, 3, 1]);
        assert_eq!(model.num_layers(), 2);
        assert_eq!(model.input_dims(), Dim2(2, 4));
        assert_eq!(model.output_dims(), Dim2(1, 4));
        let first = &model.layers()[0];
        assert_eq!(first.weights().dims(), Dim2(3, 2));
        assert_eq!(first.biases(), &Matrix::new(3, 1));
        assert_eq!(first.pre_activation().dims(), Dim2(3, 4));
        assert_eq!(model.layers()[1].weights(), &Matrix::filled(0.5, 1, 3));
    }

    #[test]
    fn test_invalid_topology() {
        let mut init = ConstantInitializer(1.0);
        let relu = ActivationFn::ReLU;
        assert!(matches!(
            Model::new(&[relu, relu], &[2, 3], 1, &mut init),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Model::new(&[], &[2], 1, &mut init),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Model::new(&[relu], &[2, 0], 1, &mut init),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Model::new(&[relu], &[2, 3], 0, &mut init),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_fan_in_per_layer() {
        struct Recorder(Vec<(usize, usize)>);
        impl super::Initializer for Recorder {
            fn sample(&mut self, fan_in: usize, fan_out: usize) -> f32 {
                self.0.push((fan_in, fan_out));
                0.0
            }
        }
        let mut rec = Recorder(Vec::new());
        let f = ActivationFn::Tanh;
        Model::new(&[f, f], &[4, 3, 2], 1, &mut rec).unwrap();
        assert_eq!(rec.0.len(), 4 * 3 + 3 * 2);
        assert!(rec.0[..12].iter().all(|&s| s == (4, 3)));
        assert!(rec.0[12..].iter().all(|&s| s == (3, 2)));
    }

    #[test]
    fn test_forward_propagate() {
        let mut model = constant_model(2);
        model.layer_mut(0).unwrap().biases_mut()[2] = -10.0;
        let input = Matrix::from_rows(&[[1.0, -2.0], [3.0, 0.0]]);
        let mut output = Matrix::new(1, 2);
        model.forward_propagate(&input, &mut output).unwrap();

        // hidden pre-activations: [2, -1] per unit, third unit shifted by -10
        let z = model.layers()[0].pre_activation();
        assert_eq!(z, &Matrix::from_rows(&[[2.0, -1.0], [2.0, -1.0], [-8.0, -11.0]]));
        let a = model.layers()[0].activation();
        assert_eq!(a, &Matrix::from_rows(&[[2.0, 0.0], [2.0, 0.0], [0.0, 0.0]]));
        assert_eq!(output, Matrix::from_rows(&[[2.0, 0.0]]));
        assert_eq!(model.input(), &input);
    }

    #[test]
    fn test_forward_transposed_input() {
        let mut model = constant_model(2);
        let mut input = Matrix::from_rows(&[[1.0, 3.0], [-2.0, 0.0]]);
        input.transpose();
        // logical input [[1, -2], [3, 0]]: every hidden unit sees [2, -1]
        assert_eq!(model.predict(&input).unwrap(), &Matrix::from_rows(&[[3.0, 0.0]]));
        assert_eq!(
            model.layers()[0].pre_activation(),
            &Matrix::from_rows(&[[2.0, -1.0], [2.0, -1.0], [2.0, -1.0]])
        );

        // same result as the materialised input
        let mut plain = constant_model(2);
        let expected = plain.predict(&input.to_matrix()).unwrap().clone();
        assert_eq!(model.predict(&input).unwrap(), &expected);
    }

    #[test]
    fn test_forward_shape_errors() {
        let mut model = constant_model(2);
        let mut output = Matrix::new(1, 2);
        assert!(matches!(
            model.forward_propagate(&Matrix::new(2, 3), &mut output),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            model.forward_propagate(&Matrix::new(2, 2), &mut Matrix::new(2, 2)),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(model.predict(&Matrix::new(3, 2)).is_err());
    }

    #[test]
    fn test_with_batch_width() {
        let mut init = RandomInitializer::seed_from_u64(InitScheme::XavierNormal, 11);
        let f = ActivationFn::Sigmoid;
        let mut model = Model::new(&[f, ActivationFn::Identity], &[3, 4, 2], 5, &mut init).unwrap();
        let mut single = model.with_batch_width(1).unwrap();
        assert_eq!(single.batch_width(), 1);
        assert_eq!(single.layers()[0].activation().dims(), Dim2(4, 1));
        for (a, b) in model.layers().iter().zip(single.layers()) {
            assert_eq!(a.weights(), b.weights());
            assert_eq!(a.biases(), b.biases());
        }

        // parameters are copies, not shared
        single.layer_mut(0).unwrap().weights_mut()[0] += 1.0;
        assert_ne!(model.layers()[0].weights(), single.layers()[0].weights());

        let batch = Matrix::from_vec(3, 5, (0..15).map(|x| x as f32 * 0.1).collect()).unwrap();
        let batch_out = model.predict(&batch).unwrap().clone();
        let mut single = model.with_batch_width(1).unwrap();
        let mut column = [0.0; 3];
        for col in 0..5 {
            batch.read_col(col, &mut column).unwrap();
            let out = single.predict(&Matrix::column_vector(&column)).unwrap();
            for row in 0..2 {
                assert_abs_diff_eq!(
                    out.get(row, 0).unwrap(),
                    batch_out.get(row, col).unwrap(),
                    epsilon = 1e-6
                );
            }
        }
        assert!(model.with_batch_width(0).is_err());
    }

    #[test]
    fn test_layer_with_input() {
        let mut model = constant_model(1);
        model.predict(&Matrix::column_vector(&[1.0, 1.0])).unwrap();
        let (input, layer) = model.layer_with_input_mut(1).unwrap();
        assert_eq!(input, &Matrix::filled(1.0, 3, 1));
        assert_eq!(layer.output_size(), 1);
        let (input, _) = model.layer_with_input_mut(0).unwrap();
        assert_eq!(input, &Matrix::column_vector(&[1.0, 1.0]));
        assert!(model.layer_with_input_mut(2).is_none());
        assert!(model.layer_with_input_mut(usize::MAX).is_none());
        assert!(model.layer_mut(2).is_none());
    }
}
