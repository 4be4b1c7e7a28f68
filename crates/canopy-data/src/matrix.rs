use std::fmt;

use crate::DataError;

/// Whether a feature column holds category indices or real numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    /// Category indices in `[0, category_count)`.
    Discrete,
    /// Finite real values.
    Continuous,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Discrete => f.write_str("discrete"),
            FeatureKind::Continuous => f.write_str("continuous"),
        }
    }
}

/// A single cell of a feature table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// A category index from a discrete column.
    Category(usize),
    /// A finite number from a continuous column.
    Number(f64),
}

impl Value {
    /// Return the value as a real number; categories convert to their index.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Category(c) => c as f64,
            Value::Number(x) => x,
        }
    }

    /// Return the category index, or `None` for a continuous value.
    #[must_use]
    pub fn as_category(self) -> Option<usize> {
        match self {
            Value::Category(c) => Some(c),
            Value::Number(_) => None,
        }
    }
}

/// Read-only access to a rectangular table of training values.
///
/// Implementations must be cheap to query cell by cell: leaf summaries call
/// [`DataMatrix::value`] once per row in their view, per feature.
pub trait DataMatrix {
    /// Number of rows (exemplars).
    fn n_rows(&self) -> usize;

    /// Number of feature columns.
    fn n_features(&self) -> usize;

    /// Kind of the given feature column.
    ///
    /// # Panics
    ///
    /// May panic if `feature >= n_features()`.
    fn feature_kind(&self, feature: usize) -> FeatureKind;

    /// Value at `(row, feature)`.
    ///
    /// # Panics
    ///
    /// May panic if either index is out of range.
    fn value(&self, row: usize, feature: usize) -> Value;

    /// Number of categories of a discrete feature; zero for continuous ones.
    fn category_count(&self, feature: usize) -> usize;
}

/// One column of a [`FeatureTable`].
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Category indices, each below `categories`.
    Discrete {
        /// Per-row category index.
        values: Vec<usize>,
        /// Number of distinct categories the column may take.
        categories: usize,
    },
    /// Finite real values.
    Continuous(Vec<f64>),
}

impl Column {
    /// Return the number of rows in this column.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Column::Discrete { values, .. } => values.len(),
            Column::Continuous(values) => values.len(),
        }
    }

    /// Return `true` if the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the kind of this column.
    #[must_use]
    pub fn kind(&self) -> FeatureKind {
        match self {
            Column::Discrete { .. } => FeatureKind::Discrete,
            Column::Continuous(_) => FeatureKind::Continuous,
        }
    }
}

/// A validated, column-major feature table.
///
/// Guaranteed non-empty, rectangular, with finite continuous values and
/// in-range category indices.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl FeatureTable {
    /// Build a table from named columns.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DataError::NoColumns`] | `columns` is empty |
    /// | [`DataError::EmptyDataset`] | the first column has no rows |
    /// | [`DataError::ColumnLengthMismatch`] | columns differ in length |
    /// | [`DataError::NonFiniteValue`] | a continuous value is NaN or infinite |
    /// | [`DataError::CategoryOutOfRange`] | a category index is `>= categories` |
    pub fn new(names: Vec<String>, columns: Vec<Column>) -> Result<Self, DataError> {
        let first = columns.first().ok_or(DataError::NoColumns)?;
        let n_rows = first.len();
        if n_rows == 0 {
            return Err(DataError::EmptyDataset);
        }

        for (feature, column) in columns.iter().enumerate() {
            if column.len() != n_rows {
                return Err(DataError::ColumnLengthMismatch {
                    feature,
                    expected: n_rows,
                    got: column.len(),
                });
            }
            match column {
                Column::Continuous(values) => {
                    if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                        return Err(DataError::NonFiniteValue { row, feature });
                    }
                }
                Column::Discrete { values, categories } => {
                    if let Some(row) = values.iter().position(|&c| c >= *categories) {
                        return Err(DataError::CategoryOutOfRange {
                            row,
                            feature,
                            category: values[row],
                            categories: *categories,
                        });
                    }
                }
            }
        }

        // Missing names fall back to positional ones.
        let names = (0..columns.len())
            .map(|f| names.get(f).cloned().unwrap_or_else(|| format!("f{f}")))
            .collect();

        Ok(Self {
            names,
            columns,
            n_rows,
        })
    }

    /// Return the column names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Return the columns.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

impl DataMatrix for FeatureTable {
    fn n_rows(&self) -> usize {
        self.n_rows
    }

    fn n_features(&self) -> usize {
        self.columns.len()
    }

    fn feature_kind(&self, feature: usize) -> FeatureKind {
        self.columns[feature].kind()
    }

    fn value(&self, row: usize, feature: usize) -> Value {
        match &self.columns[feature] {
            Column::Discrete { values, .. } => Value::Category(values[row]),
            Column::Continuous(values) => Value::Number(values[row]),
        }
    }

    fn category_count(&self, feature: usize) -> usize {
        match &self.columns[feature] {
            Column::Discrete { categories, .. } => *categories,
            Column::Continuous(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|f| format!("c{f}")).collect()
    }

    #[test]
    fn table_reports_shape_and_kinds() {
        let table = FeatureTable::new(
            names(2),
            vec![
                Column::Discrete {
                    values: vec![0, 1, 1],
                    categories: 2,
                },
                Column::Continuous(vec![0.5, 1.5, 2.5]),
            ],
        )
        .unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.n_features(), 2);
        assert_eq!(table.feature_kind(0), FeatureKind::Discrete);
        assert_eq!(table.feature_kind(1), FeatureKind::Continuous);
        assert_eq!(table.category_count(0), 2);
        assert_eq!(table.category_count(1), 0);
        assert_eq!(table.value(2, 0), Value::Category(1));
        assert_eq!(table.value(1, 1), Value::Number(1.5));
    }

    #[test]
    fn missing_names_are_positional() {
        let table =
            FeatureTable::new(vec![], vec![Column::Continuous(vec![1.0])]).unwrap();
        assert_eq!(table.names(), &["f0"]);
    }

    #[test]
    fn no_columns_error() {
        let err = FeatureTable::new(vec![], vec![]).unwrap_err();
        assert!(matches!(err, DataError::NoColumns));
    }

    #[test]
    fn empty_rows_error() {
        let err = FeatureTable::new(names(1), vec![Column::Continuous(vec![])]).unwrap_err();
        assert!(matches!(err, DataError::EmptyDataset));
    }

    #[test]
    fn column_length_mismatch_error() {
        let err = FeatureTable::new(
            names(2),
            vec![
                Column::Continuous(vec![1.0, 2.0]),
                Column::Continuous(vec![1.0]),
            ],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DataError::ColumnLengthMismatch { feature: 1, expected: 2, got: 1 }
        ));
    }

    #[test]
    fn non_finite_value_error() {
        let err = FeatureTable::new(names(1), vec![Column::Continuous(vec![1.0, f64::NAN])])
            .unwrap_err();
        assert!(matches!(err, DataError::NonFiniteValue { row: 1, feature: 0 }));
    }

    #[test]
    fn category_out_of_range_error() {
        let err = FeatureTable::new(
            names(1),
            vec![Column::Discrete {
                values: vec![0, 3],
                categories: 3,
            }],
        )
        .unwrap_err();
        assert!(matches!(err, DataError::CategoryOutOfRange { category: 3, .. }));
    }

    #[test]
    fn value_conversions() {
        assert!((Value::Category(2).as_f64() - 2.0).abs() < f64::EPSILON);
        assert_eq!(Value::Category(2).as_category(), Some(2));
        assert_eq!(Value::Number(0.5).as_category(), None);
    }

    #[test]
    fn feature_kind_display() {
        assert_eq!(format!("{}", FeatureKind::Discrete), "discrete");
        assert_eq!(format!("{}", FeatureKind::Continuous), "continuous");
    }
}
