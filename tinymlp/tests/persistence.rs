#![cfg(feature = "serde")]

use tinymlp::activation::ActivationFn;
use tinymlp::loss::LossFn;
use tinymlp::matrix::{Matrix, MatrixBase};
use tinymlp::net::initializer::{InitScheme, RandomInitializer};
use tinymlp::net::{Model, ModelBuilder};
use tinymlp::optim::Adam;

#[test]
fn trained_model_survives_json_round_trip() {
    let mut model = ModelBuilder::new(3)
        .with_batch_width(8)
        .with_initializer(RandomInitializer::seed_from_u64(InitScheme::LeCunNormal, 3))
        .with_layer(6, ActivationFn::Swish)
        .with_layer(4, ActivationFn::Identity)
        .build()
        .unwrap();
    let input = Matrix::from_vec(3, 8, (0..24).map(|x| (x as f32 * 0.37).sin()).collect()).unwrap();
    let mut target = Matrix::new(4, 8);
    for col in 0..8 {
        target.set(col % 4, col, 1.0).unwrap();
    }
    let mut adam = Adam::new(&model, LossFn::SoftmaxCrossEntropy, 0.9, 0.999).unwrap();
    for _ in 0..50 {
        adam.step(&mut model, &input, &target, 0.01).unwrap();
    }

    let json = model.to_json().unwrap();
    let mut restored = Model::from_json(&json, 8).unwrap();
    let expected = model.predict(&input).unwrap().clone();
    let actual = restored.predict(&input).unwrap();
    let bits = |m: &Matrix| m.iter_row_major().map(f32::to_bits).collect::<Vec<_>>();
    assert_eq!(bits(&expected), bits(actual));

    // narrower inference model from the same file
    let mut single = Model::from_json(&json, 1).unwrap();
    let mut column = [0.0; 3];
    input.read_col(5, &mut column).unwrap();
    let out = single.predict(&Matrix::column_vector(&column)).unwrap();
    for row in 0..4 {
        approx::assert_abs_diff_eq!(
            out.get(row, 0).unwrap(),
            expected.get(row, 5).unwrap(),
            epsilon = 1e-6
        );
    }
}
