use super::base::MatrixBase;
use super::owned::Matrix;
use super::view::MatrixRef;
use approx::{AbsDiffEq, RelativeEq};
use std::iter::zip;

macro_rules! impl_matrix_approx {
    ($type_name: ident $(, $l: lifetime )?) => {
        impl<$($l,)?> AbsDiffEq<Matrix> for $type_name<$($l,)?> {
            type Epsilon = f32;
            fn default_epsilon() -> f32 {
                f32::default_epsilon()
            }
            fn abs_diff_eq(&self, other: &Matrix, epsilon: f32) -> bool {
                self.dims() == other.dims()
                    && zip(self.iter_row_major(), other.iter_row_major())
                        .all(|(a, b)| f32::abs_diff_eq(&a, &b, epsilon))
            }
        }

        impl<$($l,)?> RelativeEq<Matrix> for $type_name<$($l,)?> {
            fn default_max_relative() -> f32 {
                f32::default_max_relative()
            }
            fn relative_eq(&self, other: &Matrix, epsilon: f32, max_relative: f32) -> bool {
                self.dims() == other.dims()
                    && zip(self.iter_row_major(), other.iter_row_major())
                        .all(|(a, b)| f32::relative_eq(&a, &b, epsilon, max_relative))
            }
        }
    };
}

impl_matrix_approx!(Matrix);
impl_matrix_approx!(MatrixRef, 'a);

#[cfg(test)]
mod test {
    use crate::matrix::{Matrix, MatrixBase};
    use approx::{assert_abs_diff_eq, assert_relative_eq, assert_abs_diff_ne};

    #[test]
    fn test_approx() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]);
        let b = Matrix::from_rows(&[[1.0, 3.0], [2.0, 4.0 + 1e-7]]);
        assert_abs_diff_eq!(a.t(), b, epsilon = 1e-6);
        assert_relative_eq!(a.t(), b);
        assert_abs_diff_ne!(a, b, epsilon = 1e-6);
        // differing shapes never compare equal
        assert_abs_diff_ne!(a, Matrix::new(1, 4), epsilon = 100.0);
    }
}
