use canopy_data::{DataMatrix, IndexView};

use crate::codec::ByteReader;
use crate::error::SummaryError;
use crate::merged::Merged;
use crate::registry::Kind;
use crate::summary::Statistic;

/// Placeholder that computes nothing.
///
/// Used to suppress a feature deliberately, typically the second slot
/// covered by a [`BiGaussian`](crate::BiGaussian).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nothing;

impl Statistic for Nothing {
    const KIND: Kind = Kind::Nothing;

    fn fit<D: DataMatrix + ?Sized>(
        _data: &D,
        _rows: &IndexView,
        _feature: usize,
    ) -> Result<Self, SummaryError> {
        Ok(Nothing)
    }

    fn error<D: DataMatrix + ?Sized>(&self, _data: &D, _rows: &IndexView, _feature: usize) -> f64 {
        0.0
    }

    fn merge<'a, I>(_items: I) -> Merged
    where
        I: Iterator<Item = &'a Self> + Clone,
        Self: 'a,
    {
        Merged::Nothing
    }

    fn payload_len(&self) -> usize {
        0
    }

    fn write_payload(&self, _out: &mut Vec<u8>) {}

    fn read_payload(_reader: &mut ByteReader<'_>) -> Result<Self, SummaryError> {
        Ok(Nothing)
    }
}
