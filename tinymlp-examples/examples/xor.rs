use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tinymlp::activation::{softmax, ActivationFn};
use tinymlp::loss::LossFn;
use tinymlp::matrix::{Matrix, MatrixBase};
use tinymlp::net::initializer::{InitScheme, RandomInitializer};
use tinymlp::net::{Model, ModelBuilder};
use tinymlp::optim::Adam;
use tinymlp::scoring::MulticlassScorer;
use tinymlp_examples::batch::Batch;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const MAX_STEPS: usize = 50_000;
const REPORT_EVERY: usize = 5_000;
const TARGET_LOSS: f32 = 0.05;
const LEARNING_RATE: f32 = 0.001;

pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let embeddings = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
    let labels = vec![0, 1, 1, 0];
    let mut batch = Batch::new(embeddings, labels, 2, 4, StdRng::seed_from_u64(3))?;

    let mut model = ModelBuilder::new(2)
        .with_batch_width(4)
        .with_initializer(RandomInitializer::seed_from_u64(InitScheme::XavierNormal, 0xf1234567))
        .with_layer(8, ActivationFn::Tanh)
        .with_layer(8, ActivationFn::Tanh)
        .with_layer(2, ActivationFn::Identity)
        .build()?;
    let mut adam = Adam::new(&model, LossFn::SoftmaxCrossEntropy, 0.9, 0.99)?;

    let start = Instant::now();
    for step in 1..=MAX_STEPS {
        let (input, target) = batch.next()?;
        adam.step(&mut model, input, target, LEARNING_RATE)?;
        let loss = adam.batch_loss(target)?;
        if step % REPORT_EVERY == 0 || loss < TARGET_LOSS {
            info!(step, loss, "training");
        }
        if loss < TARGET_LOSS {
            break;
        }
    }
    info!("Training time: {:.3} sec", start.elapsed().as_secs_f32());

    let mut scorer = MulticlassScorer::new(2);
    let (input, target) = (batch.input().clone(), batch.target().clone());
    scorer.process_batch(model.predict(&input)?, &target)?;
    scorer.log_report();

    // per-example inference at batch width 1, through a JSON round trip
    let json = model.to_json()?;
    let mut single = Model::from_json(&json, 1)?;
    for (a, b) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
        let logits = single.predict(&Matrix::column_vector(&[a, b]))?;
        let mut probs = [logits.get(0, 0)?, logits.get(1, 0)?];
        softmax(&mut probs);
        let prediction = if probs[1] > probs[0] { 1 } else { 0 };
        info!("{a} ^ {b} = {prediction}   (p0={:.3}, p1={:.3})", probs[0], probs[1]);
    }
    Ok(())
}
