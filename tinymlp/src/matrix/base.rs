use super::dims::{Dim2, Layout};
use super::owned::Matrix;
use super::view::MatrixRef;
use crate::error::{Error, Result};

/// Read access shared by owned matrices and borrowed views.
///
/// All shape queries and element accessors are logical, i.e. they honor the
/// transpose flag of [`MatrixBase::layout`].
pub trait MatrixBase {
    fn layout(&self) -> Layout;

    /// Backing buffer in physical row-major order.
    fn data(&self) -> &[f32];

    #[inline]
    fn dims(&self) -> Dim2 {
        self.layout().dims()
    }

    #[inline]
    fn rows(&self) -> usize {
        self.dims().rows()
    }

    #[inline]
    fn cols(&self) -> usize {
        self.dims().cols()
    }

    #[inline]
    fn len(&self) -> usize {
        self.data().len()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn is_transposed(&self) -> bool {
        self.layout().is_transposed()
    }

    fn get(&self, row: usize, col: usize) -> Result<f32> {
        check_index(self.dims(), row, col)?;
        Ok(self.value_at(row, col))
    }

    /// Element at the logical position `(row, col)`, bounds already established by the caller.
    #[inline]
    fn value_at(&self, row: usize, col: usize) -> f32 {
        self.data()[self.layout().index(row, col)]
    }

    /// O(1) transposed view of this matrix. The matrix itself is left untouched.
    #[inline]
    fn t(&self) -> MatrixRef<'_> {
        MatrixRef::new(self.data(), self.layout().flipped())
    }

    #[inline]
    fn view(&self) -> MatrixRef<'_> {
        MatrixRef::new(self.data(), self.layout())
    }

    /// Iterates elements in logical row-major order.
    fn iter_row_major(&self) -> RowMajorIter<'_> {
        RowMajorIter {
            data: self.data(),
            layout: self.layout(),
            pos: 0,
        }
    }

    /// Copies the logical contents into a new, non-transposed matrix.
    fn to_matrix(&self) -> Matrix {
        let Dim2(rows, cols) = self.dims();
        let data: Vec<f32> = self.iter_row_major().collect();
        Matrix::from_parts(data, Layout::new(rows, cols))
    }

    /// Logical column `col` copied into `out`.
    fn read_col(&self, col: usize, out: &mut [f32]) -> Result<()> {
        let Dim2(rows, cols) = self.dims();
        if col >= cols {
            return Err(Error::IndexOutOfBounds {
                row: 0,
                col,
                dims: self.dims(),
            });
        }
        crate::error::check_len("read_col", rows, out.len())?;
        for (row, o) in out.iter_mut().enumerate() {
            *o = self.value_at(row, col);
        }
        Ok(())
    }
}

#[inline]
pub(crate) fn check_index(dims: Dim2, row: usize, col: usize) -> Result<()> {
    if row >= dims.rows() || col >= dims.cols() {
        Err(Error::IndexOutOfBounds { row, col, dims })
    } else {
        Ok(())
    }
}

pub struct RowMajorIter<'a> {
    data: &'a [f32],
    layout: Layout,
    pos: usize,
}

impl<'a> Iterator for RowMajorIter<'a> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let Dim2(_, cols) = self.layout.dims();
        if self.pos >= self.data.len() {
            return None;
        }
        let (row, col) = (self.pos / cols, self.pos % cols);
        self.pos += 1;
        Some(self.data[self.layout.index(row, col)])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.data.len() - self.pos.min(self.data.len());
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for RowMajorIter<'a> {}
