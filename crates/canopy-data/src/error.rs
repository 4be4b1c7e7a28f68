//! Error types for canopy-data.

use std::path::PathBuf;

/// Errors from building feature tables and reading them from CSV.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a table has zero rows.
    #[error("feature table has zero rows")]
    EmptyDataset,

    /// Returned when a table has zero feature columns.
    #[error("feature table has zero columns")]
    NoColumns,

    /// Returned when a CSV data row has a different number of cells than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} cells, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of cells (from header).
        expected: usize,
        /// Actual number of cells in this row.
        got: usize,
    },

    /// Returned when the columns handed to [`FeatureTable::new`](crate::FeatureTable::new)
    /// do not all have the same length.
    #[error("column {feature} has {got} rows, expected {expected}")]
    ColumnLengthMismatch {
        /// Zero-based index of the offending column.
        feature: usize,
        /// Row count of the first column.
        expected: usize,
        /// Row count of the offending column.
        got: usize,
    },

    /// Returned when a continuous value is NaN or infinite.
    #[error("non-finite value at row {row}, feature {feature}")]
    NonFiniteValue {
        /// Zero-based row index.
        row: usize,
        /// Zero-based feature column index.
        feature: usize,
    },

    /// Returned when a discrete value is not below the column's category count.
    #[error("category {category} at row {row}, feature {feature} is outside [0, {categories})")]
    CategoryOutOfRange {
        /// Zero-based row index.
        row: usize,
        /// Zero-based feature column index.
        feature: usize,
        /// The offending category index.
        category: usize,
        /// Declared number of categories for the column.
        categories: usize,
    },
}
