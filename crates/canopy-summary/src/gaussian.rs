use canopy_data::{DataMatrix, IndexView};
use tracing::debug;

use crate::codec::{self, ByteReader, F64_LEN, U32_LEN};
use crate::error::SummaryError;
use crate::merged::Merged;
use crate::registry::Kind;
use crate::summary::Statistic;

/// Mean and population variance of one continuous feature.
///
/// Discrete features are summarised by their category index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    count: u32,
    mean: f64,
    variance: f64,
}

impl Gaussian {
    /// Return the number of rows the estimate was built from.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Return the mean.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Return the population variance (divided by `count`, not `count - 1`).
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.variance
    }
}

impl Statistic for Gaussian {
    const KIND: Kind = Kind::Gaussian;

    fn fit<D: DataMatrix + ?Sized>(
        data: &D,
        rows: &IndexView,
        feature: usize,
    ) -> Result<Self, SummaryError> {
        let n = rows.len();
        if n == 0 {
            return Ok(Self {
                count: 0,
                mean: 0.0,
                variance: 0.0,
            });
        }

        // Two passes: the mean first, then squared deviations from it.
        let sum: f64 = rows.iter().map(|r| data.value(r, feature).as_f64()).sum();
        let mean = sum / n as f64;
        let sq: f64 = rows
            .iter()
            .map(|r| {
                let d = data.value(r, feature).as_f64() - mean;
                d * d
            })
            .sum();
        let variance = sq / n as f64;

        debug!(feature, count = n, mean, variance, "gaussian summary built");
        Ok(Self {
            count: codec::count_u32(n),
            mean,
            variance,
        })
    }

    /// Sum of squared deviations of the rows from the fitted mean.
    fn error<D: DataMatrix + ?Sized>(&self, data: &D, rows: &IndexView, feature: usize) -> f64 {
        rows.iter()
            .map(|r| {
                let d = data.value(r, feature).as_f64() - self.mean;
                d * d
            })
            .sum()
    }

    /// Equal-weight mixture reduced to a single Gaussian by moment matching.
    fn merge<'a, I>(items: I) -> Merged
    where
        I: Iterator<Item = &'a Self> + Clone,
        Self: 'a,
    {
        let n = items.clone().count() as f64;
        let mean = items.clone().map(|g| g.mean).sum::<f64>() / n;
        let variance = items
            .map(|g| {
                let d = g.mean - mean;
                g.variance + d * d
            })
            .sum::<f64>()
            / n;
        Merged::Gaussian { mean, variance }
    }

    fn payload_len(&self) -> usize {
        U32_LEN + 2 * F64_LEN
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        codec::put_u32(out, self.count);
        codec::put_f64(out, self.mean);
        codec::put_f64(out, self.variance);
    }

    fn read_payload(reader: &mut ByteReader<'_>) -> Result<Self, SummaryError> {
        Ok(Self {
            count: reader.read_u32()?,
            mean: reader.read_f64()?,
            variance: reader.read_f64()?,
        })
    }
}
