//! On-disk persistence of a forest's leaf summary sets via bincode.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::codec::ByteReader;
use crate::error::SummaryError;
use crate::set::SummarySet;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope around the concatenated set records.
#[derive(serde::Serialize, serde::Deserialize)]
struct StoreEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Number of summary sets in the payload.
    n_sets: usize,
    /// Number of features every set covers.
    n_features: usize,
    /// Concatenated `SummarySet` byte records.
    payload: Vec<u8>,
}

/// A collection of leaf summary sets sharing one feature count.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafStore {
    n_features: usize,
    sets: Vec<SummarySet>,
}

impl LeafStore {
    /// Create a store from sets that all cover `n_features` features.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::FeatureCountMismatch`] if any set has a
    /// different length.
    pub fn new(n_features: usize, sets: Vec<SummarySet>) -> Result<Self, SummaryError> {
        if let Some((index, set)) = sets.iter().enumerate().find(|(_, s)| s.len() != n_features) {
            return Err(SummaryError::FeatureCountMismatch {
                expected: n_features,
                got: set.len(),
                index,
            });
        }
        Ok(Self { n_features, sets })
    }

    /// Return the feature count shared by every set.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the stored sets.
    #[must_use]
    pub fn sets(&self) -> &[SummarySet] {
        &self.sets
    }

    /// Return the number of stored sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Return `true` if the store holds no sets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Consume the store, returning its sets.
    #[must_use]
    pub fn into_sets(self) -> Vec<SummarySet> {
        self.sets
    }

    /// Save the store to a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SummaryError::SerializeStore`] | bincode encoding failed |
    /// | [`SummaryError::WriteStore`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SummaryError> {
        let path = path.as_ref();

        let mut payload =
            Vec::with_capacity(self.sets.iter().map(SummarySet::encoded_len).sum());
        for set in &self.sets {
            set.write_bytes(&mut payload);
        }

        let envelope = StoreEnvelope {
            format_version: FORMAT_VERSION,
            n_sets: self.sets.len(),
            n_features: self.n_features,
            payload,
        };

        let bytes = bincode::serialize(&envelope)
            .map_err(|e| SummaryError::SerializeStore { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| SummaryError::WriteStore {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = bytes.len(),
            n_sets = self.sets.len(),
            "leaf store saved"
        );

        Ok(())
    }

    /// Load a store from a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SummaryError::ReadStore`] | file read failed |
    /// | [`SummaryError::DeserializeStore`] | bincode decoding failed |
    /// | [`SummaryError::IncompatibleStoreVersion`] | format version mismatch |
    /// | [`SummaryError::CorruptData`] | a set record is malformed or bytes are left over |
    /// | [`SummaryError::FeatureCountMismatch`] | a set disagrees with the header |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SummaryError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| SummaryError::ReadStore {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: StoreEnvelope =
            bincode::deserialize(&bytes).map_err(|e| SummaryError::DeserializeStore {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(SummaryError::IncompatibleStoreVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        let mut reader = ByteReader::new(&envelope.payload);
        let mut sets = Vec::with_capacity(envelope.n_sets.min(reader.remaining()));
        for _ in 0..envelope.n_sets {
            sets.push(SummarySet::read(&mut reader)?);
        }
        if reader.remaining() > 0 {
            return Err(reader.corrupt(format!(
                "{} trailing bytes after {} sets",
                reader.remaining(),
                envelope.n_sets
            )));
        }

        debug!(
            n_sets = envelope.n_sets,
            n_features = envelope.n_features,
            "leaf store loaded"
        );

        Self::new(envelope.n_features, sets)
    }
}

#[cfg(test)]
mod tests {
    use canopy_data::{Column, FeatureTable, IndexView};
    use tempfile::TempDir;

    use super::*;

    fn store() -> LeafStore {
        let table = FeatureTable::new(
            vec!["x".into(), "y".into(), "c".into()],
            vec![
                Column::Continuous(vec![1.0, 2.0, 3.0, 4.0]),
                Column::Continuous(vec![4.0, 3.0, 2.0, 1.5]),
                Column::Discrete {
                    values: vec![0, 2, 1, 1],
                    categories: 3,
                },
            ],
        )
        .unwrap();
        let sets = vec![
            SummarySet::new(&table, &IndexView::from(vec![0, 1]), None).unwrap(),
            SummarySet::new(&table, &IndexView::from(vec![1, 2, 3]), Some("BNC")).unwrap(),
            SummarySet::new(&table, &IndexView::default(), Some("NGN")).unwrap(),
        ];
        LeafStore::new(3, sets).unwrap()
    }

    #[test]
    fn round_trip_is_exact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leaves.bin");
        let original = store();
        original.save(&path).unwrap();
        let loaded = LeafStore::load(&path).unwrap();
        assert_eq!(loaded, original);
        assert_eq!(loaded.sets()[1].codes(), "BNC");
    }

    #[test]
    fn new_rejects_ragged_sets() {
        let s = store();
        let mut sets = s.into_sets();
        sets.push(SummarySet::from_summaries(Vec::new()).unwrap());
        let err = LeafStore::new(3, sets).unwrap_err();
        assert!(matches!(
            err,
            SummaryError::FeatureCountMismatch { expected: 3, got: 0, index: 3 }
        ));
    }

    #[test]
    fn load_nonexistent_file_error() {
        let dir = TempDir::new().unwrap();
        let err = LeafStore::load(dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err, SummaryError::ReadStore { .. }));
    }

    #[test]
    fn load_corrupt_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, b"nope").unwrap();
        let err = LeafStore::load(&path).unwrap_err();
        assert!(matches!(err, SummaryError::DeserializeStore { .. }));
    }

    #[test]
    fn load_rejects_other_versions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.bin");
        let envelope = StoreEnvelope {
            format_version: FORMAT_VERSION + 1,
            n_sets: 0,
            n_features: 0,
            payload: Vec::new(),
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();
        let err = LeafStore::load(&path).unwrap_err();
        assert!(matches!(
            err,
            SummaryError::IncompatibleStoreVersion { expected: 1, found: 2, .. }
        ));
    }

    #[test]
    fn load_rejects_trailing_payload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trailing.bin");
        let envelope = StoreEnvelope {
            format_version: FORMAT_VERSION,
            n_sets: 0,
            n_features: 0,
            payload: vec![0xFF],
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();
        let err = LeafStore::load(&path).unwrap_err();
        assert!(matches!(err, SummaryError::CorruptData { offset: 0, .. }));
    }

    #[test]
    fn load_rejects_payload_cut_mid_set() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cut.bin");
        let original = store();
        let mut payload = Vec::new();
        for set in original.sets() {
            set.write_bytes(&mut payload);
        }
        let last_start = payload.len() - original.sets()[2].encoded_len();
        for cut in [last_start + 1, payload.len() - 1] {
            let envelope = StoreEnvelope {
                format_version: FORMAT_VERSION,
                n_sets: original.len(),
                n_features: original.n_features(),
                payload: payload[..cut].to_vec(),
            };
            std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();
            let err = LeafStore::load(&path).unwrap_err();
            assert!(matches!(err, SummaryError::CorruptData { .. }), "cut at {cut}: {err}");
        }
    }
}
