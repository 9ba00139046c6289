use super::base::MatrixBase;
use super::dims::Layout;

/// Borrowed, read-only view of a matrix buffer with its own transpose flag.
#[derive(Copy, Clone)]
pub struct MatrixRef<'a> {
    data: &'a [f32],
    layout: Layout,
}

impl<'a> MatrixRef<'a> {
    #[inline]
    pub(super) fn new(data: &'a [f32], layout: Layout) -> Self {
        debug_assert_eq!(data.len(), layout.len());
        MatrixRef { data, layout }
    }

    /// Flips this view; the borrowed buffer is never modified.
    #[inline]
    pub fn transpose(&mut self) {
        self.layout.flip();
    }
}

impl<'a> MatrixBase for MatrixRef<'a> {
    #[inline]
    fn layout(&self) -> Layout {
        self.layout
    }
    #[inline]
    fn data(&self) -> &[f32] {
        self.data
    }
}
