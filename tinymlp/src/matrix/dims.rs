use std::fmt::{Display, Formatter, Write};

/// Logical `(rows, cols)` shape of a matrix.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Dim2(pub usize, pub usize);

impl Dim2 {
    #[inline]
    pub fn rows(&self) -> usize {
        self.0
    }
    #[inline]
    pub fn cols(&self) -> usize {
        self.1
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.0 * self.1
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    #[inline]
    pub fn transposed(&self) -> Dim2 {
        Dim2(self.1, self.0)
    }
}

impl Display for Dim2 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_char('(')?;
        Display::fmt(&self.0, f)?;
        f.write_str(", ")?;
        Display::fmt(&self.1, f)?;
        f.write_char(')')
    }
}

/// Physical storage shape of a row-major buffer plus the lazy transpose flag.
///
/// `rows`/`cols` are fixed at allocation; transposing only flips `transposed`,
/// which swaps the logical shape and the index arithmetic.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Layout {
    rows: usize,
    cols: usize,
    transposed: bool,
}

impl Layout {
    #[inline]
    pub fn new(rows: usize, cols: usize) -> Self {
        Layout {
            rows,
            cols,
            transposed: false,
        }
    }

    /// Logical shape.
    #[inline]
    pub fn dims(&self) -> Dim2 {
        if self.transposed {
            Dim2(self.cols, self.rows)
        } else {
            Dim2(self.rows, self.cols)
        }
    }

    /// Shape of the backing buffer, ignoring the transpose flag.
    #[inline]
    pub fn physical_dims(&self) -> Dim2 {
        Dim2(self.rows, self.cols)
    }

    #[inline]
    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn flipped(self) -> Layout {
        Layout {
            transposed: !self.transposed,
            ..self
        }
    }

    #[inline]
    pub(crate) fn flip(&mut self) {
        self.transposed = !self.transposed;
    }

    /// Physical index of the logical element `(row, col)`. Bounds are not checked.
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        if self.transposed {
            col * self.cols + row
        } else {
            row * self.cols + col
        }
    }

    /// `(row stride, column stride)` of the logical matrix within the backing buffer.
    #[inline]
    pub fn strides(&self) -> (isize, isize) {
        if self.transposed {
            (1, self.cols as isize)
        } else {
            (self.cols as isize, 1)
        }
    }
}
