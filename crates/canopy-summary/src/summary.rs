//! The tagged summary value and the per-kind statistic interface.

use canopy_data::{DataMatrix, IndexView};

use crate::bigaussian::BiGaussian;
use crate::categorical::Categorical;
use crate::codec::ByteReader;
use crate::error::SummaryError;
use crate::gaussian::Gaussian;
use crate::merged::Merged;
use crate::nothing::Nothing;
use crate::registry::{Kind, SummaryType};

/// Operations every summary kind provides.
///
/// Adding a kind means implementing this trait, adding a [`Summary`]
/// variant and registering a [`SummaryType`]; [`SummarySet`](crate::SummarySet)
/// and the merge fan-out never change.
pub trait Statistic: Sized {
    /// Registry kind implemented by this type.
    const KIND: Kind;

    /// Compute the statistic over `rows` of `feature` (and its successors, up
    /// to the kind's arity). Bounds are already checked by the caller.
    ///
    /// # Errors
    ///
    /// Kind-specific; see each implementation.
    fn fit<D: DataMatrix + ?Sized>(
        data: &D,
        rows: &IndexView,
        feature: usize,
    ) -> Result<Self, SummaryError>;

    /// Finite, non-negative loss of this statistic over `rows`, summed per row.
    fn error<D: DataMatrix + ?Sized>(&self, data: &D, rows: &IndexView, feature: usize) -> f64;

    /// Reduce a non-empty run of same-kind statistics to an output value.
    fn merge<'a, I>(items: I) -> Merged
    where
        I: Iterator<Item = &'a Self> + Clone,
        Self: 'a;

    /// Length in bytes of the payload following the type code.
    fn payload_len(&self) -> usize;

    /// Append the payload (without the type code) to `out`.
    fn write_payload(&self, out: &mut Vec<u8>);

    /// Read a payload written by [`Statistic::write_payload`].
    fn read_payload(reader: &mut ByteReader<'_>) -> Result<Self, SummaryError>;
}

/// One feature's learned statistic at a tree leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    /// See [`Nothing`].
    Nothing(Nothing),
    /// See [`Categorical`].
    Categorical(Categorical),
    /// See [`Gaussian`].
    Gaussian(Gaussian),
    /// See [`BiGaussian`].
    BiGaussian(BiGaussian),
}

/// Anything that holds summaries addressable by slot index.
///
/// Merges read `item.summary_at(slot)` from each input, so merging feature
/// `f` across many [`SummarySet`](crate::SummarySet)s touches the sets in
/// place rather than gathering their summaries into a new array.
pub trait SummarySlot {
    /// Return the summary stored in `slot`.
    ///
    /// # Panics
    ///
    /// May panic if `slot >= self.slot_count()`.
    fn summary_at(&self, slot: usize) -> &Summary;

    /// Number of addressable slots.
    fn slot_count(&self) -> usize;
}

impl SummarySlot for Summary {
    /// A bare summary is its own single slot, slot 0.
    fn summary_at(&self, _slot: usize) -> &Summary {
        self
    }

    fn slot_count(&self) -> usize {
        1
    }
}

impl<T: SummarySlot + ?Sized> SummarySlot for &T {
    fn summary_at(&self, slot: usize) -> &Summary {
        (**self).summary_at(slot)
    }

    fn slot_count(&self) -> usize {
        (**self).slot_count()
    }
}

impl Summary {
    /// Build a summary of the given kind over `rows` of `feature`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SummaryError::InvalidFeatureIndex`] | `feature + arity` exceeds the feature count |
    /// | [`SummaryError::NotDiscrete`] | Categorical on a continuous feature |
    pub fn new<D: DataMatrix + ?Sized>(
        kind: Kind,
        data: &D,
        rows: &IndexView,
        feature: usize,
    ) -> Result<Self, SummaryError> {
        check_arity(kind, feature, data.n_features())?;
        Ok(match kind {
            Kind::Nothing => Summary::Nothing(Nothing::fit(data, rows, feature)?),
            Kind::Categorical => Summary::Categorical(Categorical::fit(data, rows, feature)?),
            Kind::Gaussian => Summary::Gaussian(Gaussian::fit(data, rows, feature)?),
            Kind::BiGaussian => Summary::BiGaussian(BiGaussian::fit(data, rows, feature)?),
        })
    }

    /// Return the kind tag.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Summary::Nothing(_) => Nothing::KIND,
            Summary::Categorical(_) => Categorical::KIND,
            Summary::Gaussian(_) => Gaussian::KIND,
            Summary::BiGaussian(_) => BiGaussian::KIND,
        }
    }

    /// Return the registry entry for this summary's kind.
    #[must_use]
    pub fn summary_type(&self) -> &'static SummaryType {
        self.kind().descriptor()
    }

    /// Loss of this summary's prediction over `rows` of `feature`.
    ///
    /// Finite and non-negative, summed over the rows, ready to be added to a
    /// running total.
    #[must_use]
    pub fn error<D: DataMatrix + ?Sized>(&self, data: &D, rows: &IndexView, feature: usize) -> f64 {
        match self {
            Summary::Nothing(s) => s.error(data, rows, feature),
            Summary::Categorical(s) => s.error(data, rows, feature),
            Summary::Gaussian(s) => s.error(data, rows, feature),
            Summary::BiGaussian(s) => s.error(data, rows, feature),
        }
    }

    /// Merge slot `slot` of every item (one per tree) into a single value.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SummaryError::EmptyMerge`] | `items` is empty |
    /// | [`SummaryError::InvalidFeatureIndex`] | some item has no slot `slot` |
    /// | [`SummaryError::TagMismatch`] | the summaries are not all the same kind |
    pub fn merge<S: SummarySlot>(items: &[S], slot: usize) -> Result<Merged, SummaryError> {
        check_slot(items, slot)?;
        let kind = common_kind(items.iter().map(|s| s.summary_at(slot)))?;
        Ok(merge_run(kind, items.iter().map(|s| s.summary_at(slot))))
    }

    /// Merge an `exemplars x trees` array (exemplar outer, tree inner),
    /// producing one value per exemplar.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SummaryError::EmptyMerge`] | `trees` is zero |
    /// | [`SummaryError::MergeShape`] | `items.len() != exemplars * trees` |
    /// | [`SummaryError::InvalidFeatureIndex`] | some item has no slot `slot` |
    /// | [`SummaryError::TagMismatch`] | the summaries are not all the same kind |
    pub fn merge_many<S: SummarySlot>(
        exemplars: usize,
        trees: usize,
        items: &[S],
        slot: usize,
    ) -> Result<Vec<Merged>, SummaryError> {
        check_shape(exemplars, trees, items.len())?;
        if exemplars == 0 {
            return Ok(Vec::new());
        }
        check_slot(items, slot)?;
        let kind = common_kind(items.iter().map(|s| s.summary_at(slot)))?;
        Ok(items
            .chunks(trees)
            .map(|run| merge_run(kind, run.iter().map(|s| s.summary_at(slot))))
            .collect())
    }

    /// Length in bytes of this summary's self-describing record.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        1 + match self {
            Summary::Nothing(s) => s.payload_len(),
            Summary::Categorical(s) => s.payload_len(),
            Summary::Gaussian(s) => s.payload_len(),
            Summary::BiGaussian(s) => s.payload_len(),
        }
    }

    /// Encode this summary as a self-describing record.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_bytes(&mut out);
        out
    }

    /// Append this summary's record to `out`.
    pub fn write_bytes(&self, out: &mut Vec<u8>) {
        // Codes are ASCII by registry construction.
        out.push(self.kind().code() as u8);
        match self {
            Summary::Nothing(s) => s.write_payload(out),
            Summary::Categorical(s) => s.write_payload(out),
            Summary::Gaussian(s) => s.write_payload(out),
            Summary::BiGaussian(s) => s.write_payload(out),
        }
    }

    /// Decode one record from the front of `buf`, returning the summary and
    /// the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::CorruptData`] if the code byte names no
    /// registered kind or the buffer ends before the payload does.
    pub fn from_bytes(buf: &[u8]) -> Result<(Self, usize), SummaryError> {
        let mut reader = ByteReader::new(buf);
        let summary = Self::read(&mut reader)?;
        Ok((summary, reader.position()))
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self, SummaryError> {
        let code = reader.read_u8()?;
        let summary_type = SummaryType::from_byte(code).ok_or_else(|| {
            reader.corrupt(format!("unknown type code byte 0x{code:02x}"))
        })?;
        Ok(match summary_type.kind {
            Kind::Nothing => Summary::Nothing(Nothing::read_payload(reader)?),
            Kind::Categorical => Summary::Categorical(Categorical::read_payload(reader)?),
            Kind::Gaussian => Summary::Gaussian(Gaussian::read_payload(reader)?),
            Kind::BiGaussian => Summary::BiGaussian(BiGaussian::read_payload(reader)?),
        })
    }
}

/// Reject a kind whose arity runs past the last feature.
pub(crate) fn check_arity(
    kind: Kind,
    feature: usize,
    n_features: usize,
) -> Result<(), SummaryError> {
    let arity = kind.arity();
    if feature.checked_add(arity).is_none_or(|end| end > n_features) {
        return Err(SummaryError::InvalidFeatureIndex {
            feature,
            arity,
            n_features,
        });
    }
    Ok(())
}

/// Reject a slot index past the end of any item.
fn check_slot<S: SummarySlot>(items: &[S], slot: usize) -> Result<(), SummaryError> {
    match items.iter().map(SummarySlot::slot_count).find(|&n| slot >= n) {
        Some(n_features) => Err(SummaryError::InvalidFeatureIndex {
            feature: slot,
            arity: 1,
            n_features,
        }),
        None => Ok(()),
    }
}

pub(crate) fn check_shape(exemplars: usize, trees: usize, got: usize) -> Result<(), SummaryError> {
    if trees == 0 {
        return Err(SummaryError::EmptyMerge);
    }
    if exemplars.checked_mul(trees) != Some(got) {
        return Err(SummaryError::MergeShape {
            exemplars,
            trees,
            got,
        });
    }
    Ok(())
}

/// Return the kind shared by every summary, or the first disagreement.
fn common_kind<'a>(mut summaries: impl Iterator<Item = &'a Summary>) -> Result<Kind, SummaryError> {
    let expected = summaries.next().ok_or(SummaryError::EmptyMerge)?.kind();
    for (offset, summary) in summaries.enumerate() {
        let found = summary.kind();
        if found != expected {
            return Err(SummaryError::TagMismatch {
                expected: expected.code(),
                found: found.code(),
                index: offset + 1,
            });
        }
    }
    Ok(expected)
}

/// Merge a run already known to be non-empty and all of `kind`.
fn merge_run<'a>(kind: Kind, run: impl Iterator<Item = &'a Summary> + Clone) -> Merged {
    match kind {
        Kind::Nothing => Nothing::merge(run.filter_map(|s| match s {
            Summary::Nothing(x) => Some(x),
            _ => None,
        })),
        Kind::Categorical => Categorical::merge(run.filter_map(|s| match s {
            Summary::Categorical(x) => Some(x),
            _ => None,
        })),
        Kind::Gaussian => Gaussian::merge(run.filter_map(|s| match s {
            Summary::Gaussian(x) => Some(x),
            _ => None,
        })),
        Kind::BiGaussian => BiGaussian::merge(run.filter_map(|s| match s {
            Summary::BiGaussian(x) => Some(x),
            _ => None,
        })),
    }
}
