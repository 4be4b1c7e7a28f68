use std::path::PathBuf;

/// Errors from building, merging, and (de)serializing leaf summaries.
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    /// Returned when a type code does not name any registered summary kind.
    #[error("unknown summary type code {code:?}")]
    UnknownTypeCode {
        /// The offending code character.
        code: char,
    },

    /// Returned when a summary would read past the last feature column.
    #[error("summary of arity {arity} at feature {feature} exceeds the {n_features} available features")]
    InvalidFeatureIndex {
        /// The feature index the summary was requested for.
        feature: usize,
        /// Number of consecutive features the summary kind consumes.
        arity: usize,
        /// Number of features in the data matrix.
        n_features: usize,
    },

    /// Returned when a categorical summary is requested on a continuous feature.
    #[error("feature {feature} is continuous, a categorical summary needs a discrete feature")]
    NotDiscrete {
        /// The offending feature index.
        feature: usize,
    },

    /// Returned when a byte buffer is truncated or malformed.
    #[error("corrupt summary data at byte {offset}: {reason}")]
    CorruptData {
        /// Byte offset into the buffer where decoding failed.
        offset: usize,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// Returned when summaries of different kinds are merged together.
    #[error("cannot merge summary {index} of type {found:?} with type {expected:?}")]
    TagMismatch {
        /// Type code of the first summary in the merge.
        expected: char,
        /// Type code of the offending summary.
        found: char,
        /// Position of the offending summary in the merge input.
        index: usize,
    },

    /// Returned when a merge is asked to combine zero summaries.
    #[error("cannot merge zero summaries")]
    EmptyMerge,

    /// Returned when the merge input is not an `exemplars x trees` array.
    #[error("merge expected {exemplars} x {trees} summaries, got {got}")]
    MergeShape {
        /// Requested number of exemplars.
        exemplars: usize,
        /// Requested number of trees.
        trees: usize,
        /// Number of items actually supplied.
        got: usize,
    },

    /// Returned when summary sets with different feature counts are combined.
    #[error("summary set {index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// Feature count of the first set.
        expected: usize,
        /// Feature count of the offending set.
        got: usize,
        /// Position of the offending set.
        index: usize,
    },

    /// Returned when n_bags is zero.
    #[error("n_bags must be at least 1, got {n_bags}")]
    InvalidBagCount {
        /// The invalid n_bags value provided.
        n_bags: usize,
    },

    /// Returned when bootstrap_fraction is not in (0.0, 1.0].
    #[error("bootstrap_fraction must be in (0.0, 1.0], got {fraction}")]
    InvalidBootstrapFraction {
        /// The invalid bootstrap_fraction value provided.
        fraction: f64,
    },

    /// Returned when bagging is run on a data matrix with zero rows.
    #[error("data matrix has zero rows")]
    EmptyDataset,

    /// Returned when OOB evaluation fails (no row is out of bag for any bag).
    #[error("OOB evaluation failed: {reason}")]
    OobEvaluationFailed {
        /// Human-readable description of why OOB evaluation failed.
        reason: String,
    },

    /// Returned when leaf store serialization fails.
    #[error("failed to serialize leaf store")]
    SerializeStore {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when leaf store deserialization fails.
    #[error("failed to deserialize leaf store from {path}")]
    DeserializeStore {
        /// Path to the store file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the leaf store file fails.
    #[error("failed to write leaf store to {path}")]
    WriteStore {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the leaf store file fails.
    #[error("failed to read leaf store from {path}")]
    ReadStore {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a leaf store with an incompatible format version.
    #[error("incompatible leaf store version in {path}: expected {expected}, found {found}")]
    IncompatibleStoreVersion {
        /// The format version this build expects.
        expected: u32,
        /// The format version found in the file.
        found: u32,
        /// Path to the store file with the incompatible version.
        path: PathBuf,
    },
}
