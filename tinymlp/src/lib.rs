pub mod activation;
pub mod error;
pub mod loss;
pub mod matrix;
pub mod net;
pub mod optim;
#[cfg(feature = "serde")]
pub mod persist;
pub mod scoring;
pub mod util;

pub use error::{Error, Result};

extern crate matrixmultiply;
extern crate rand;
extern crate rand_distr;
