use crate::activation::ActivationFn;
use crate::matrix::Matrix;
use crate::net::initializer::{InitScheme, RandomInitializer};
use crate::net::Model;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

pub const SIZE_LG: usize = 1024;
pub const SIZE_MD: usize = 256;
pub const SIZE_SM: usize = 64;
const SEED: u64 = 0x8371943;

fn normal_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Matrix {
    let mut m = Matrix::new(rows, cols);
    for x in m.as_mut_slice() {
        *x = rng.sample(StandardNormal);
    }
    m
}

/// Two standard-normal operands and a zeroed output, all `size x size`.
pub fn get_square_matrices(size: usize) -> [Matrix; 3] {
    let mut rng = StdRng::seed_from_u64(SEED);
    [
        normal_matrix(&mut rng, size, size),
        normal_matrix(&mut rng, size, size),
        Matrix::new(size, size),
    ]
}

/// Tanh MLP with an identity output layer and a matching random batch and one-hot target.
pub fn get_training_batch(layer_sizes: &[usize], batch_width: usize) -> Option<(Model, Matrix, Matrix)> {
    let (&input_size, rest) = layer_sizes.split_first()?;
    let output_size = *rest.last()?;
    let mut activations = vec![ActivationFn::Tanh; rest.len()];
    *activations.last_mut()? = ActivationFn::Identity;
    let mut init = RandomInitializer::seed_from_u64(InitScheme::XavierUniform, SEED);
    let model = Model::new(&activations, layer_sizes, batch_width, &mut init).ok()?;

    let mut rng = StdRng::seed_from_u64(SEED);
    let input = normal_matrix(&mut rng, input_size, batch_width);
    let mut target = Matrix::new(output_size, batch_width);
    for col in 0..batch_width {
        target.set(rng.gen_range(0..output_size), col, 1.0).ok()?;
    }
    Some((model, input, target))
}
