/// An ordered selection of row indices into a [`DataMatrix`](crate::DataMatrix).
///
/// Rows may repeat (bootstrap bags do). Iteration is restartable and always
/// yields the rows in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexView {
    rows: Vec<usize>,
}

impl IndexView {
    /// A view over every row `0..n_rows`.
    #[must_use]
    pub fn all(n_rows: usize) -> Self {
        Self {
            rows: (0..n_rows).collect(),
        }
    }

    /// Iterate the selected row indices.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = usize> + Clone + '_ {
        self.rows.iter().copied()
    }

    /// Return the number of selected rows, counting repeats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return `true` if no rows are selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Return the selected rows as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.rows
    }
}

impl From<Vec<usize>> for IndexView {
    fn from(rows: Vec<usize>) -> Self {
        Self { rows }
    }
}

impl FromIterator<usize> for IndexView {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}
