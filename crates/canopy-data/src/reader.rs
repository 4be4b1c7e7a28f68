//! CSV feature table reader with full input validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::matrix::{Column, FeatureTable};
use crate::DataError;

/// Reads a [`FeatureTable`] from a CSV file.
///
/// Expected CSV format:
/// - Header row required, one name per feature column
/// - All rows must have the same number of cells as the header
///
/// A column whose every cell parses as a number is continuous, unless it was
/// named in [`TableReader::with_discrete`]. Any other column is discrete, with
/// category indices assigned in order of first appearance.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DataError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`DataError::CsvParse`] | Malformed CSV record |
/// | [`DataError::NoColumns`] | Header has no columns |
/// | [`DataError::EmptyDataset`] | Zero data rows after header |
/// | [`DataError::InconsistentRowLength`] | Row has different cell count than header |
/// | [`DataError::NonFiniteValue`] | A numeric column holds NaN or infinity |
pub struct TableReader {
    path: PathBuf,
    discrete: Vec<String>,
}

impl TableReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            discrete: Vec::new(),
        }
    }

    /// Force the named columns to be read as discrete even if numeric.
    #[must_use]
    pub fn with_discrete(mut self, names: Vec<String>) -> Self {
        self.discrete = names;
        self
    }

    /// Read and validate the CSV file, returning a [`FeatureTable`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<FeatureTable, DataError> {
        let file = std::fs::File::open(&self.path).map_err(|e| DataError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so that our own InconsistentRowLength check fires
        // instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| DataError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;
        let names: Vec<String> = header.iter().map(String::from).collect();
        if names.is_empty() {
            return Err(DataError::NoColumns);
        }
        debug!(n_columns = names.len(), "read CSV header");

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| DataError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            if record.len() != names.len() {
                return Err(DataError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: names.len(),
                    got: record.len(),
                });
            }

            for (column, raw) in cells.iter_mut().zip(record.iter()) {
                column.push(raw.trim().to_string());
            }
        }

        if cells[0].is_empty() {
            return Err(DataError::EmptyDataset);
        }

        let columns: Vec<Column> = cells
            .into_iter()
            .enumerate()
            .map(|(feature, raw)| {
                let forced = self.discrete.contains(&names[feature]);
                build_column(feature, raw, forced)
            })
            .collect::<Result<_, _>>()?;

        let n_discrete = columns
            .iter()
            .filter(|c| matches!(c, Column::Discrete { .. }))
            .count();
        info!(
            n_rows = columns[0].len(),
            n_features = columns.len(),
            n_discrete,
            "feature table loaded"
        );

        FeatureTable::new(names, columns)
    }
}

/// Turn one column of raw cells into a typed column.
fn build_column(
    feature: usize,
    raw: Vec<String>,
    forced_discrete: bool,
) -> Result<Column, DataError> {
    if !forced_discrete {
        let parsed: Option<Vec<f64>> = raw.iter().map(|s| s.parse::<f64>().ok()).collect();
        if let Some(values) = parsed {
            if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                return Err(DataError::NonFiniteValue { row, feature });
            }
            return Ok(Column::Continuous(values));
        }
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    let values: Vec<usize> = raw
        .into_iter()
        .map(|cell| {
            let next = index.len();
            *index.entry(cell).or_insert(next)
        })
        .collect();

    Ok(Column::Discrete {
        values,
        categories: index.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataMatrix, FeatureKind, Value};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn read_mixed_columns() {
        let f = write_csv("height,species\n1.5,oak\n2.5,ash\n3.0,oak\n");
        let table = TableReader::new(f.path()).read().unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.names(), &["height", "species"]);
        assert_eq!(table.feature_kind(0), FeatureKind::Continuous);
        assert_eq!(table.feature_kind(1), FeatureKind::Discrete);
        assert_eq!(table.category_count(1), 2);
        assert_eq!(table.value(0, 1), Value::Category(0));
        assert_eq!(table.value(1, 1), Value::Category(1));
        assert_eq!(table.value(2, 1), Value::Category(0));
    }

    #[test]
    fn forced_discrete_column() {
        let f = write_csv("label\n3\n7\n3\n");
        let table = TableReader::new(f.path())
            .with_discrete(vec!["label".to_string()])
            .read()
            .unwrap();
        assert_eq!(table.feature_kind(0), FeatureKind::Discrete);
        assert_eq!(table.category_count(0), 2);
    }

    #[test]
    fn file_not_found_error() {
        let err = TableReader::new(Path::new("/tmp/canopy_missing_table_7f3a.csv"))
            .read()
            .unwrap_err();
        assert!(matches!(err, DataError::FileNotFound { .. }));
    }

    #[test]
    fn empty_dataset_error() {
        let f = write_csv("a,b\n");
        let err = TableReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, DataError::EmptyDataset));
    }

    #[test]
    fn inconsistent_row_length_error() {
        let f = write_csv("a,b\n1.0,2.0\n3.0\n");
        let err = TableReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, DataError::InconsistentRowLength { row_index: 1, .. }));
    }

    #[test]
    fn non_finite_value_error() {
        let f = write_csv("a\n1.0\ninf\n");
        let err = TableReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, DataError::NonFiniteValue { row: 1, feature: 0 }));
    }
}
