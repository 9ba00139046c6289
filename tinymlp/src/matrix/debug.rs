use super::base::MatrixBase;
use super::dims::Dim2;
use super::owned::Matrix;
use super::view::MatrixRef;
use std::fmt::{Debug, Formatter, Write};

/// Writes `fmt(0..len)` separated by `sep`, eliding the middle once `len` exceeds `max`.
fn fmt_truncated(
    len: usize,
    max: usize,
    f: &mut Formatter,
    sep: &str,
    mut fmt: impl FnMut(usize, &mut Formatter) -> std::fmt::Result,
) -> std::fmt::Result {
    let keep = max / 2;
    let hidden = if len > max { len - 2 * keep } else { 0 };
    let mut i = 0;
    while i < len {
        if i > 0 {
            f.write_str(sep)?;
        }
        if hidden > 0 && i == keep {
            write!(f, "...({hidden} hidden)")?;
            i += hidden;
            continue;
        }
        fmt(i, f)?;
        i += 1;
    }
    Ok(())
}

const DEBUG_LIMIT_ROWS: usize = 6;
const DEBUG_LIMIT_COLS: usize = 10;

fn format_matrix<M: MatrixBase + ?Sized>(m: &M, f: &mut Formatter) -> std::fmt::Result {
    let Dim2(rows, cols) = m.dims();
    f.write_char('[')?;
    if !m.is_empty() {
        write!(f, "\n   ")?;
        fmt_truncated(rows, DEBUG_LIMIT_ROWS, f, ",\n   ", |row, f| {
            f.write_char('[')?;
            fmt_truncated(cols, DEBUG_LIMIT_COLS, f, ", ", |col, f| {
                Debug::fmt(&m.value_at(row, col), f)
            })?;
            f.write_char(']')
        })?;
        f.write_char('\n')?;
    }
    write!(f, "] dims={} transposed={}", m.dims(), m.is_transposed())
}

impl Debug for Matrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        format_matrix(self, f)
    }
}

impl<'a> Debug for MatrixRef<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        format_matrix(self, f)
    }
}
