//! Per-leaf multivariate statistic: one summary per output feature.

use canopy_data::{DataMatrix, IndexView};
use tracing::{debug, instrument, warn};

use crate::codec::{self, ByteReader, U32_LEN};
use crate::error::SummaryError;
use crate::merged::{MergedBatch, MergedSet};
use crate::registry::SummaryType;
use crate::summary::{self, Summary, SummarySlot};

/// An ordered, fixed-length collection of [`Summary`], one per feature.
///
/// Read-only after construction. Slot `f` always summarises feature `f`
/// (a [`BiGaussian`](crate::BiGaussian) in slot `f` also reads `f + 1`).
#[derive(Debug, Clone, PartialEq)]
pub struct SummarySet {
    summaries: Vec<Summary>,
}

impl SummarySet {
    /// Summarise every feature of `data` over `rows`.
    ///
    /// `codes` holds one type code per feature. When it is `None` or shorter
    /// than the feature count, the remaining features get the registry
    /// default for their kind (Categorical for discrete, Gaussian for
    /// continuous). Codes beyond the last feature are ignored.
    ///
    /// Every code is resolved and arity-checked before any statistic is
    /// computed.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SummaryError::UnknownTypeCode`] | a code names no registered kind |
    /// | [`SummaryError::InvalidFeatureIndex`] | a kind's arity runs past the last feature |
    /// | [`SummaryError::NotDiscrete`] | `C` requested for a continuous feature |
    #[instrument(skip(data, rows), fields(n_rows = rows.len(), n_features = data.n_features()))]
    pub fn new<D: DataMatrix + ?Sized>(
        data: &D,
        rows: &IndexView,
        codes: Option<&str>,
    ) -> Result<Self, SummaryError> {
        let n_features = data.n_features();
        let codes: Vec<char> = codes.map(|c| c.chars().collect()).unwrap_or_default();
        if codes.len() > n_features {
            warn!(
                n_codes = codes.len(),
                n_features,
                "ignoring type codes beyond the last feature"
            );
        }

        let kinds = (0..n_features)
            .map(|feature| {
                let summary_type = match codes.get(feature) {
                    Some(&code) => SummaryType::lookup(code)?,
                    None => SummaryType::default_for(data.feature_kind(feature)),
                };
                summary::check_arity(summary_type.kind, feature, n_features)?;
                Ok(summary_type.kind)
            })
            .collect::<Result<Vec<_>, SummaryError>>()?;

        let summaries = kinds
            .into_iter()
            .enumerate()
            .map(|(feature, kind)| Summary::new(kind, data, rows, feature))
            .collect::<Result<Vec<_>, _>>()?;

        let set = Self { summaries };
        debug!(codes = %set.codes(), "summary set built");
        Ok(set)
    }

    /// Wrap already-built summaries, slot `f` being feature `f`.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::InvalidFeatureIndex`] if a slot's kind reads
    /// past the last slot (a [`BiGaussian`](crate::BiGaussian) in the final
    /// position).
    pub fn from_summaries(summaries: Vec<Summary>) -> Result<Self, SummaryError> {
        check_slots(&summaries)?;
        Ok(Self { summaries })
    }

    /// Return the number of feature slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    /// Return `true` if the set has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// Return the summary for one feature.
    #[must_use]
    pub fn get(&self, feature: usize) -> Option<&Summary> {
        self.summaries.get(feature)
    }

    /// Return all summaries in slot order.
    #[must_use]
    pub fn summaries(&self) -> &[Summary] {
        &self.summaries
    }

    /// Return the type-code string that would rebuild this set's kinds.
    #[must_use]
    pub fn codes(&self) -> String {
        self.summaries.iter().map(|s| s.kind().code()).collect()
    }

    /// Add each slot's error over `rows` into `out[feature]`.
    ///
    /// Never overwrites: `out` is an accumulator the caller zeroes before the
    /// first call of a sequence.
    ///
    /// # Panics
    ///
    /// Panics if `out.len()` differs from the number of slots.
    pub fn error<D: DataMatrix + ?Sized>(&self, data: &D, rows: &IndexView, out: &mut [f64]) {
        assert_eq!(
            out.len(),
            self.summaries.len(),
            "error accumulator has {} slots for {} features",
            out.len(),
            self.summaries.len()
        );
        for (feature, (summary, acc)) in self.summaries.iter().zip(out.iter_mut()).enumerate() {
            *acc += summary.error(data, rows, feature);
        }
    }

    /// Merge the sets reached by one exemplar, one set per tree.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SummaryError::EmptyMerge`] | `sets` is empty |
    /// | [`SummaryError::FeatureCountMismatch`] | the sets differ in length |
    /// | [`SummaryError::TagMismatch`] | a slot holds different kinds across sets |
    pub fn merge<S: SummarySlot>(sets: &[S]) -> Result<MergedSet, SummaryError> {
        let n_features = common_len(sets)?;
        let features = (0..n_features)
            .map(|feature| Summary::merge(sets, feature))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MergedSet::new(features))
    }

    /// Merge an `exemplars x trees` array of sets (exemplar outer, tree
    /// inner), producing `[feature][exemplar]` results.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SummaryError::EmptyMerge`] | `trees` is zero |
    /// | [`SummaryError::MergeShape`] | `sets.len() != exemplars * trees` |
    /// | [`SummaryError::FeatureCountMismatch`] | the sets differ in length |
    /// | [`SummaryError::TagMismatch`] | a slot holds different kinds across sets |
    pub fn merge_many<S: SummarySlot>(
        exemplars: usize,
        trees: usize,
        sets: &[S],
    ) -> Result<MergedBatch, SummaryError> {
        summary::check_shape(exemplars, trees, sets.len())?;
        if exemplars == 0 {
            return Ok(MergedBatch::new(0, Vec::new()));
        }
        let n_features = common_len(sets)?;
        let features = (0..n_features)
            .map(|feature| Summary::merge_many(exemplars, trees, sets, feature))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MergedBatch::new(exemplars, features))
    }

    /// Length in bytes of this set's encoding.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        U32_LEN + self.summaries.iter().map(Summary::encoded_len).sum::<usize>()
    }

    /// Encode the feature count followed by every slot's record.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_bytes(&mut out);
        out
    }

    /// Append this set's encoding to `out`.
    pub fn write_bytes(&self, out: &mut Vec<u8>) {
        codec::put_u32(out, codec::count_u32(self.summaries.len()));
        for summary in &self.summaries {
            summary.write_bytes(out);
        }
    }

    /// Decode a set from the front of `buf`, returning it and the number of
    /// bytes consumed. Records may be of any mix of kinds.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::CorruptData`] on a truncated buffer, an
    /// unknown type code, or a kind whose arity runs past the last slot.
    pub fn from_bytes(buf: &[u8]) -> Result<(Self, usize), SummaryError> {
        let mut reader = ByteReader::new(buf);
        let set = Self::read(&mut reader)?;
        Ok((set, reader.position()))
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self, SummaryError> {
        let n_features = reader.read_u32()? as usize;
        // Every record is at least one byte.
        if n_features > reader.remaining() {
            return Err(reader.corrupt(format!(
                "set claims {n_features} features but only {} bytes remain",
                reader.remaining()
            )));
        }
        let summaries = (0..n_features)
            .map(|_| Summary::read(reader))
            .collect::<Result<Vec<_>, _>>()?;
        check_slots(&summaries).map_err(|e| reader.corrupt(e.to_string()))?;
        Ok(Self { summaries })
    }
}

impl SummarySlot for SummarySet {
    fn summary_at(&self, slot: usize) -> &Summary {
        &self.summaries[slot]
    }

    fn slot_count(&self) -> usize {
        self.summaries.len()
    }
}

/// Reject a set in which some kind would read past the last slot.
fn check_slots(summaries: &[Summary]) -> Result<(), SummaryError> {
    summaries
        .iter()
        .enumerate()
        .try_for_each(|(feature, s)| summary::check_arity(s.kind(), feature, summaries.len()))
}

/// Return the slot count shared by every set.
fn common_len<S: SummarySlot>(sets: &[S]) -> Result<usize, SummaryError> {
    let expected = sets.first().ok_or(SummaryError::EmptyMerge)?.slot_count();
    for (index, set) in sets.iter().enumerate().skip(1) {
        let got = set.slot_count();
        if got != expected {
            return Err(SummaryError::FeatureCountMismatch {
                expected,
                got,
                index,
            });
        }
    }
    Ok(expected)
}
