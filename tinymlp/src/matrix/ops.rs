use super::base::MatrixBase;
use super::dims::Dim2;
use super::owned::Matrix;
use crate::error::{check_dims, Error, Result};
use std::iter::zip;

/// `out = a · b`. Either operand may be a lazily transposed view; the strides are
/// handed straight to the GEMM kernel so nothing is copied.
pub fn multiply<A, B>(a: &A, b: &B, out: &mut Matrix) -> Result<()>
where
    A: MatrixBase + ?Sized,
    B: MatrixBase + ?Sized,
{
    let Dim2(m, k) = a.dims();
    let Dim2(kb, n) = b.dims();
    if k != kb {
        return Err(Error::shape("multiply", Dim2(k, n), b.dims()));
    }
    check_dims("multiply", Dim2(m, n), out.dims())?;

    let (rsa, csa) = a.layout().strides();
    let (rsb, csb) = b.layout().strides();
    let (rsc, csc) = out.layout().strides();
    unsafe {
        // SAFETY: shapes were checked above, every stride pair describes a buffer of
        // exactly m*k, k*n and m*n elements, and `out` is uniquely borrowed.
        matrixmultiply::sgemm(
            m,
            k,
            n,
            1.0,
            a.data().as_ptr(),
            rsa,
            csa,
            b.data().as_ptr(),
            rsb,
            csb,
            0.0,
            out.as_mut_slice().as_mut_ptr(),
            rsc,
            csc,
        );
    }
    Ok(())
}

/// Elementwise `a *= b`.
pub fn hadamard_product<B: MatrixBase + ?Sized>(a: &mut Matrix, b: &B) -> Result<()> {
    check_dims("hadamard_product", a.dims(), b.dims())?;
    if a.layout() == b.layout() {
        for (x, &y) in zip(a.as_mut_slice(), b.data()) {
            *x *= y;
        }
    } else {
        let Dim2(rows, cols) = a.dims();
        for i in 0..rows {
            for j in 0..cols {
                let value = a.value_at(i, j) * b.value_at(i, j);
                a.set_at(i, j, value);
            }
        }
    }
    Ok(())
}

impl Matrix {
    /// Adds a `1 x cols` row vector to every row, a `rows x 1` column vector to every
    /// column, or a `1 x 1` scalar to every element.
    pub fn add_broadcasted<B: MatrixBase + ?Sized>(&mut self, operand: &B) -> Result<()> {
        let Dim2(rows, cols) = self.dims();
        let Dim2(b_rows, b_cols) = operand.dims();
        if b_rows == 1 && b_cols == cols {
            for i in 0..rows {
                for j in 0..cols {
                    let value = self.value_at(i, j) + operand.value_at(0, j);
                    self.set_at(i, j, value);
                }
            }
        } else if b_cols == 1 && b_rows == rows {
            for i in 0..rows {
                let addend = operand.value_at(i, 0);
                for j in 0..cols {
                    let value = self.value_at(i, j) + addend;
                    self.set_at(i, j, value);
                }
            }
        } else if b_rows == 1 && b_cols == 1 {
            self.add_scalar(operand.value_at(0, 0));
        } else {
            return Err(Error::InvalidBroadcast {
                target: self.dims(),
                operand: operand.dims(),
            });
        }
        Ok(())
    }

    /// Sums each row into the `rows x 1` column vector `out`, in column order.
    pub fn sum_of_cols(&self, out: &mut Matrix) -> Result<()> {
        let Dim2(rows, cols) = self.dims();
        check_dims("sum_of_cols", Dim2(rows, 1), out.dims())?;
        for i in 0..rows {
            let mut sum = 0.0;
            for j in 0..cols {
                sum += self.value_at(i, j);
            }
            out.set_at(i, 0, sum);
        }
        Ok(())
    }

    pub fn scale(&mut self, k: f32) {
        self.as_mut_slice().iter_mut().for_each(|x| *x *= k);
    }

    pub fn add_scalar(&mut self, k: f32) {
        self.as_mut_slice().iter_mut().for_each(|x| *x += k);
    }

    /// Overwrites this matrix with `other`; logical shapes must match exactly.
    pub fn copy_from<B: MatrixBase + ?Sized>(&mut self, other: &B) -> Result<()> {
        check_dims("copy_from", self.dims(), other.dims())?;
        if self.layout() == other.layout() {
            self.as_mut_slice().copy_from_slice(other.data());
        } else {
            let Dim2(rows, cols) = self.dims();
            for i in 0..rows {
                for j in 0..cols {
                    self.set_at(i, j, other.value_at(i, j));
                }
            }
        }
        Ok(())
    }

    pub fn clear_to_zero(&mut self) {
        self.as_mut_slice().fill(0.0);
    }

    /// Writes logical column `col` from `values`.
    pub fn write_col(&mut self, col: usize, values: &[f32]) -> Result<()> {
        let Dim2(rows, cols) = self.dims();
        if col >= cols {
            return Err(Error::IndexOutOfBounds {
                row: 0,
                col,
                dims: self.dims(),
            });
        }
        crate::error::check_len("write_col", rows, values.len())?;
        for (row, &v) in values.iter().enumerate() {
            self.set_at(row, col, v);
        }
        Ok(())
    }
}
