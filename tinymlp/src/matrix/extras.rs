use super::base::MatrixBase;
use super::owned::Matrix;
use super::view::MatrixRef;
use std::iter::zip;

/// Logical equality: same logical shape and elements, whatever the physical layout.
#[inline]
pub(super) fn logical_eq<A, B>(a: &A, b: &B) -> bool
where
    A: MatrixBase + ?Sized,
    B: MatrixBase + ?Sized,
{
    a.dims() == b.dims() && zip(a.iter_row_major(), b.iter_row_major()).all(|(x, y)| x == y)
}

macro_rules! impl_matrix_eq {
    ($type_name: ident $(, $l: lifetime )?) => {
        impl<$($l,)?> PartialEq<Matrix> for $type_name<$($l,)?> {
            fn eq(&self, other: &Matrix) -> bool {
                logical_eq(self, other)
            }
        }

        impl<$($l,)?'b> PartialEq<MatrixRef<'b>> for $type_name<$($l,)?> {
            fn eq(&self, other: &MatrixRef<'b>) -> bool {
                logical_eq(self, other)
            }
        }
    };
}

impl_matrix_eq!(Matrix);
impl_matrix_eq!(MatrixRef, 'a);
