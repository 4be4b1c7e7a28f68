use canopy_data::{DataMatrix, FeatureKind, IndexView};
use tracing::debug;

use crate::codec::{self, ByteReader, F64_LEN, U32_LEN};
use crate::error::SummaryError;
use crate::merged::Merged;
use crate::registry::Kind;
use crate::summary::Statistic;

/// Frequency table over the categories of a discrete feature.
///
/// Counts are kept per category; probabilities are derived on demand. An
/// empty table (no rows reached the leaf) reports a uniform distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorical {
    count: u32,
    counts: Vec<f64>,
}

impl Categorical {
    /// Return the number of rows the table was built from.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Return the number of categories.
    #[must_use]
    pub fn categories(&self) -> usize {
        self.counts.len()
    }

    /// Return the observed count per category.
    #[must_use]
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// Return the probability of one category; zero outside the table.
    #[must_use]
    pub fn probability(&self, category: usize) -> f64 {
        if category >= self.counts.len() {
            return 0.0;
        }
        if self.count == 0 {
            return 1.0 / self.counts.len() as f64;
        }
        self.counts[category] / f64::from(self.count)
    }

    /// Return the probability of every category.
    #[must_use]
    pub fn probabilities(&self) -> Vec<f64> {
        (0..self.counts.len()).map(|c| self.probability(c)).collect()
    }
}

impl Statistic for Categorical {
    const KIND: Kind = Kind::Categorical;

    /// # Errors
    ///
    /// Returns [`SummaryError::NotDiscrete`] if `feature` is continuous.
    fn fit<D: DataMatrix + ?Sized>(
        data: &D,
        rows: &IndexView,
        feature: usize,
    ) -> Result<Self, SummaryError> {
        if data.feature_kind(feature) != FeatureKind::Discrete {
            return Err(SummaryError::NotDiscrete { feature });
        }

        let mut counts = vec![0.0f64; data.category_count(feature)];
        let mut count = 0usize;
        for row in rows.iter() {
            if let Some(slot) = data
                .value(row, feature)
                .as_category()
                .and_then(|c| counts.get_mut(c))
            {
                *slot += 1.0;
                count += 1;
            }
        }

        debug!(feature, count, categories = counts.len(), "categorical summary built");
        Ok(Self {
            count: codec::count_u32(count),
            counts,
        })
    }

    /// Expected misclassification: `1 - p(observed category)` per row.
    fn error<D: DataMatrix + ?Sized>(&self, data: &D, rows: &IndexView, feature: usize) -> f64 {
        rows.iter()
            .map(|row| {
                let p = data
                    .value(row, feature)
                    .as_category()
                    .map_or(0.0, |c| self.probability(c));
                (1.0 - p).max(0.0)
            })
            .sum()
    }

    /// Arithmetic mean of the per-tree distributions; shorter tables count
    /// as zero probability for the missing categories.
    fn merge<'a, I>(items: I) -> Merged
    where
        I: Iterator<Item = &'a Self> + Clone,
        Self: 'a,
    {
        let mut probabilities: Vec<f64> = Vec::new();
        let mut n = 0usize;
        for item in items {
            if probabilities.len() < item.counts.len() {
                probabilities.resize(item.counts.len(), 0.0);
            }
            for (acc, c) in probabilities.iter_mut().zip(0..item.counts.len()) {
                *acc += item.probability(c);
            }
            n += 1;
        }
        if n > 1 {
            let n = n as f64;
            probabilities.iter_mut().for_each(|p| *p /= n);
        }
        Merged::Categorical { probabilities }
    }

    fn payload_len(&self) -> usize {
        2 * U32_LEN + self.counts.len() * F64_LEN
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        codec::put_u32(out, self.count);
        codec::put_u32(out, codec::count_u32(self.counts.len()));
        for &c in &self.counts {
            codec::put_f64(out, c);
        }
    }

    fn read_payload(reader: &mut ByteReader<'_>) -> Result<Self, SummaryError> {
        let count = reader.read_u32()?;
        let categories = reader.read_u32()? as usize;
        if categories.saturating_mul(F64_LEN) > reader.remaining() {
            return Err(reader.corrupt(format!(
                "categorical table of {categories} entries runs past the end of the buffer"
            )));
        }
        let counts = (0..categories)
            .map(|_| reader.read_f64())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { count, counts })
    }
}
