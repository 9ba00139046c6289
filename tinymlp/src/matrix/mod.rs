mod base;
mod debug;
mod dims;
mod extras;
mod ops;
mod owned;
mod view;
#[cfg(feature = "approx")]
mod approx;

pub use base::{MatrixBase, RowMajorIter};
pub use dims::{Dim2, Layout};
pub use ops::{hadamard_product, multiply};
pub use owned::Matrix;
pub use view::MatrixRef;
