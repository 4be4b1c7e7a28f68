use canopy_data::{DataMatrix, IndexView};
use tracing::debug;

use crate::codec::{self, ByteReader, F64_LEN, U32_LEN};
use crate::error::SummaryError;
use crate::merged::Merged;
use crate::registry::Kind;
use crate::summary::Statistic;

/// Joint mean and population covariance of feature `f` and feature `f + 1`.
///
/// The covariance is stored as its upper triangle `(c00, c01, c11)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiGaussian {
    count: u32,
    mean: [f64; 2],
    covariance: [f64; 3],
}

impl BiGaussian {
    /// Return the number of rows the estimate was built from.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Return the mean of the feature and its successor.
    #[must_use]
    pub fn mean(&self) -> [f64; 2] {
        self.mean
    }

    /// Return the full symmetric covariance matrix.
    #[must_use]
    pub fn covariance(&self) -> [[f64; 2]; 2] {
        let [c00, c01, c11] = self.covariance;
        [[c00, c01], [c01, c11]]
    }
}

fn point<D: DataMatrix + ?Sized>(data: &D, row: usize, feature: usize) -> [f64; 2] {
    [
        data.value(row, feature).as_f64(),
        data.value(row, feature + 1).as_f64(),
    ]
}

impl Statistic for BiGaussian {
    const KIND: Kind = Kind::BiGaussian;

    fn fit<D: DataMatrix + ?Sized>(
        data: &D,
        rows: &IndexView,
        feature: usize,
    ) -> Result<Self, SummaryError> {
        let n = rows.len();
        if n == 0 {
            return Ok(Self {
                count: 0,
                mean: [0.0; 2],
                covariance: [0.0; 3],
            });
        }
        let total = n as f64;

        let mut sum = [0.0f64; 2];
        for row in rows.iter() {
            let [x, y] = point(data, row, feature);
            sum[0] += x;
            sum[1] += y;
        }
        let mean = [sum[0] / total, sum[1] / total];

        let mut acc = [0.0f64; 3];
        for row in rows.iter() {
            let [x, y] = point(data, row, feature);
            let (dx, dy) = (x - mean[0], y - mean[1]);
            acc[0] += dx * dx;
            acc[1] += dx * dy;
            acc[2] += dy * dy;
        }
        let covariance = acc.map(|c| c / total);

        debug!(feature, count = n, ?mean, ?covariance, "bigaussian summary built");
        Ok(Self {
            count: codec::count_u32(n),
            mean,
            covariance,
        })
    }

    /// Squared Euclidean distance of each row's pair from the fitted mean.
    fn error<D: DataMatrix + ?Sized>(&self, data: &D, rows: &IndexView, feature: usize) -> f64 {
        rows.iter()
            .map(|row| {
                let [x, y] = point(data, row, feature);
                let (dx, dy) = (x - self.mean[0], y - self.mean[1]);
                dx * dx + dy * dy
            })
            .sum()
    }

    /// Equal-weight mixture reduced to a single bivariate Gaussian.
    fn merge<'a, I>(items: I) -> Merged
    where
        I: Iterator<Item = &'a Self> + Clone,
        Self: 'a,
    {
        let n = items.clone().count() as f64;
        let mut sum = [0.0f64; 2];
        for item in items.clone() {
            sum[0] += item.mean[0];
            sum[1] += item.mean[1];
        }
        let mean = [sum[0] / n, sum[1] / n];

        let mut acc = [0.0f64; 3];
        for item in items {
            let (dx, dy) = (item.mean[0] - mean[0], item.mean[1] - mean[1]);
            acc[0] += item.covariance[0] + dx * dx;
            acc[1] += item.covariance[1] + dx * dy;
            acc[2] += item.covariance[2] + dy * dy;
        }
        let [c00, c01, c11] = acc.map(|c| c / n);

        Merged::BiGaussian {
            mean,
            covariance: [[c00, c01], [c01, c11]],
        }
    }

    fn payload_len(&self) -> usize {
        U32_LEN + 5 * F64_LEN
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        codec::put_u32(out, self.count);
        for &m in &self.mean {
            codec::put_f64(out, m);
        }
        for &c in &self.covariance {
            codec::put_f64(out, c);
        }
    }

    fn read_payload(reader: &mut ByteReader<'_>) -> Result<Self, SummaryError> {
        let count = reader.read_u32()?;
        let mean = [reader.read_f64()?, reader.read_f64()?];
        let covariance = [reader.read_f64()?, reader.read_f64()?, reader.read_f64()?];
        Ok(Self {
            count,
            mean,
            covariance,
        })
    }
}

#[cfg(test)]
mod tests {
    use canopy_data::{Column, FeatureTable};

    use super::*;

    fn table() -> FeatureTable {
        FeatureTable::new(
            vec!["x".into(), "y".into()],
            vec![
                Column::Continuous(vec![1.0, 2.0, 3.0]),
                Column::Continuous(vec![2.0, 4.0, 6.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn mean_and_covariance() {
        let b = BiGaussian::fit(&table(), &IndexView::all(3), 0).unwrap();
        assert_eq!(b.count(), 3);
        assert_eq!(b.mean(), [2.0, 4.0]);
        let c = b.covariance();
        assert!((c[0][0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((c[0][1] - 4.0 / 3.0).abs() < 1e-12);
        assert!((c[1][1] - 8.0 / 3.0).abs() < 1e-12);
        assert_eq!(c[0][1], c[1][0]);
    }

    #[test]
    fn error_is_squared_distance() {
        let t = table();
        let b = BiGaussian::fit(&t, &IndexView::all(3), 0).unwrap();
        // Row 0 is (1, 2); mean is (2, 4).
        let err = b.error(&t, &IndexView::from(vec![0]), 0);
        assert!((err - 5.0).abs() < 1e-12);
    }

    #[test]
    fn merge_adds_spread_of_means() {
        let a = BiGaussian { count: 1, mean: [0.0, 0.0], covariance: [1.0, 0.0, 1.0] };
        let b = BiGaussian { count: 1, mean: [2.0, 2.0], covariance: [1.0, 0.0, 1.0] };
        let Merged::BiGaussian { mean, covariance } = BiGaussian::merge([&a, &b].into_iter())
        else {
            panic!("expected bigaussian output");
        };
        assert_eq!(mean, [1.0, 1.0]);
        assert_eq!(covariance, [[2.0, 1.0], [1.0, 2.0]]);
    }

    #[test]
    fn merge_of_one_is_identity() {
        let b = BiGaussian::fit(&table(), &IndexView::all(3), 0).unwrap();
        assert_eq!(
            BiGaussian::merge(std::iter::once(&b)),
            Merged::BiGaussian {
                mean: b.mean(),
                covariance: b.covariance(),
            }
        );
    }

    #[test]
    fn payload_round_trip_is_bit_exact() {
        let b = BiGaussian::fit(&table(), &IndexView::from(vec![0, 2]), 0).unwrap();
        let mut out = Vec::new();
        b.write_payload(&mut out);
        assert_eq!(out.len(), b.payload_len());
        let back = BiGaussian::read_payload(&mut ByteReader::new(&out)).unwrap();
        assert_eq!(back, b);
    }
}
