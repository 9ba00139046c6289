use super::base::{check_index, MatrixBase};
use super::dims::{Dim2, Layout};
use crate::error::{check_len, Result};

/// Fixed-size dense `f32` matrix with an O(1) logical transpose.
///
/// The buffer is allocated once and never resized.
#[derive(Clone)]
pub struct Matrix {
    data: Box<[f32]>,
    layout: Layout,
}

impl Matrix {
    /// Zero-filled `rows x cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Matrix::filled(0.0, rows, cols)
    }

    pub fn filled(value: f32, rows: usize, cols: usize) -> Self {
        Matrix {
            data: vec![value; rows * cols].into_boxed_slice(),
            layout: Layout::new(rows, cols),
        }
    }

    /// Wraps a row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        check_len("Matrix::from_vec", rows * cols, data.len())?;
        Ok(Matrix::from_parts(data, Layout::new(rows, cols)))
    }

    pub fn from_rows<const N: usize>(rows: &[[f32; N]]) -> Self {
        let data: Vec<f32> = rows.iter().flat_map(|row| row.iter().copied()).collect();
        Matrix::from_parts(data, Layout::new(rows.len(), N))
    }

    pub fn column_vector(values: &[f32]) -> Self {
        Matrix::from_parts(values.to_vec(), Layout::new(values.len(), 1))
    }

    #[inline]
    pub(super) fn from_parts(data: Vec<f32>, layout: Layout) -> Self {
        debug_assert_eq!(data.len(), layout.len());
        Matrix {
            data: data.into_boxed_slice(),
            layout,
        }
    }

    /// Zero-filled matrix with the same logical shape as `other`.
    pub fn zeros_like<M: MatrixBase + ?Sized>(other: &M) -> Self {
        let Dim2(rows, cols) = other.dims();
        Matrix::new(rows, cols)
    }

    /// Flips the transpose flag. No data moves.
    #[inline]
    pub fn transpose(&mut self) {
        self.layout.flip();
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        check_index(self.dims(), row, col)?;
        let idx = self.layout.index(row, col);
        self.data[idx] = value;
        Ok(())
    }

    #[inline]
    pub(crate) fn set_at(&mut self, row: usize, col: usize, value: f32) {
        let idx = self.layout.index(row, col);
        self.data[idx] = value;
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Backing buffer in physical row-major order.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data.into_vec()
    }
}

impl MatrixBase for Matrix {
    #[inline]
    fn layout(&self) -> Layout {
        self.layout
    }
    #[inline]
    fn data(&self) -> &[f32] {
        &self.data
    }
}
