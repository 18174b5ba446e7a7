//! Fixed-width rows, the column type of every store.
use crate::error::KelpError;

/// A column of fixed-width rows stored contiguously.
///
/// Stores allocate one [`Rows`] per field, and batches gather rows into a new
/// [`Rows`] of the same width.
#[derive(Clone, Debug, PartialEq)]
pub struct Rows<T> {
    width: usize,
    n_rows: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Rows<T> {
    /// Allocates `n_rows` zero-filled rows.
    pub fn new(n_rows: usize, width: usize) -> Self {
        Self {
            width,
            n_rows,
            data: vec![T::default(); n_rows * width],
        }
    }

    /// Number of elements in a row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// Returns `true` if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Row `i`.
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    /// Row-major view of all rows.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Consumes the rows and returns the row-major data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Checks that `row` fits this column.
    pub(crate) fn check(&self, field: &str, row: &[T]) -> Result<(), KelpError> {
        if row.len() != self.width {
            return Err(KelpError::mismatch(field, self.width, row.len()));
        }
        Ok(())
    }

    /// Overwrites row `i`. The width must have been checked.
    #[inline]
    pub(crate) fn push(&mut self, i: usize, row: &[T]) {
        self.data[i * self.width..(i + 1) * self.width].copy_from_slice(row);
    }

    /// Gathers the rows at `ixs`.
    pub fn sample(&self, ixs: &[usize]) -> Self {
        let mut data = Vec::with_capacity(ixs.len() * self.width);
        for &ix in ixs {
            data.extend_from_slice(self.row(ix));
        }

        Self {
            width: self.width,
            n_rows: ixs.len(),
            data,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.data.iter_mut().for_each(|x| *x = T::default());
    }
}
