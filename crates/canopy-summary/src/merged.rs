//! Caller-visible results of merging leaf summaries.
//!
//! A merge is a terminal, read-only reduction: its output is one of these
//! plain values, never a new [`Summary`](crate::Summary).

use serde::Serialize;

use crate::registry::Kind;

/// Aggregate of one feature slot across many trees.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Merged {
    /// Merge of [`Kind::Nothing`] summaries.
    Nothing,
    /// Averaged category distribution.
    Categorical {
        /// Probability per category index; sums to 1.0.
        probabilities: Vec<f64>,
    },
    /// Moment-matched single Gaussian.
    Gaussian {
        /// Mixture mean.
        mean: f64,
        /// Mixture variance.
        variance: f64,
    },
    /// Moment-matched bivariate Gaussian.
    BiGaussian {
        /// Mixture mean of the feature and its successor.
        mean: [f64; 2],
        /// Symmetric 2x2 mixture covariance.
        covariance: [[f64; 2]; 2],
    },
}

impl Merged {
    /// Return the summary kind this value was merged from.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Merged::Nothing => Kind::Nothing,
            Merged::Categorical { .. } => Kind::Categorical,
            Merged::Gaussian { .. } => Kind::Gaussian,
            Merged::BiGaussian { .. } => Kind::BiGaussian,
        }
    }
}

/// Per-feature merge results for one exemplar, indexed by feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MergedSet {
    features: Vec<Merged>,
}

impl MergedSet {
    pub(crate) fn new(features: Vec<Merged>) -> Self {
        Self { features }
    }

    /// Return the merged value of every feature.
    #[must_use]
    pub fn features(&self) -> &[Merged] {
        &self.features
    }

    /// Return the merged value of one feature.
    #[must_use]
    pub fn get(&self, feature: usize) -> Option<&Merged> {
        self.features.get(feature)
    }

    /// Return the number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Return `true` if there are no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Consume and return the per-feature values.
    #[must_use]
    pub fn into_inner(self) -> Vec<Merged> {
        self.features
    }
}

/// Merge results for many exemplars at once: `features[feature][exemplar]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedBatch {
    n_exemplars: usize,
    features: Vec<Vec<Merged>>,
}

impl MergedBatch {
    pub(crate) fn new(n_exemplars: usize, features: Vec<Vec<Merged>>) -> Self {
        debug_assert!(features.iter().all(|f| f.len() == n_exemplars));
        Self {
            n_exemplars,
            features,
        }
    }

    /// Return the number of exemplars.
    #[must_use]
    pub fn n_exemplars(&self) -> usize {
        self.n_exemplars
    }

    /// Return the number of features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Return every exemplar's merged value for one feature.
    #[must_use]
    pub fn feature(&self, feature: usize) -> Option<&[Merged]> {
        self.features.get(feature).map(Vec::as_slice)
    }

    /// Gather one exemplar's values across all features.
    #[must_use]
    pub fn exemplar(&self, exemplar: usize) -> Option<MergedSet> {
        if exemplar >= self.n_exemplars {
            return None;
        }
        Some(MergedSet::new(
            self.features.iter().map(|f| f[exemplar].clone()).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> MergedBatch {
        MergedBatch::new(
            2,
            vec![
                vec![
                    Merged::Gaussian { mean: 1.0, variance: 0.5 },
                    Merged::Gaussian { mean: 2.0, variance: 0.25 },
                ],
                vec![Merged::Nothing, Merged::Nothing],
            ],
        )
    }

    #[test]
    fn batch_exemplar_gathers_features() {
        let b = batch();
        assert_eq!(b.n_exemplars(), 2);
        assert_eq!(b.n_features(), 2);
        let second = b.exemplar(1).unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(
            second.get(0),
            Some(&Merged::Gaussian { mean: 2.0, variance: 0.25 })
        );
        assert!(b.exemplar(2).is_none());
    }

    #[test]
    fn merged_kind() {
        assert_eq!(Merged::Nothing.kind(), Kind::Nothing);
        let c = Merged::Categorical { probabilities: vec![1.0] };
        assert_eq!(c.kind(), Kind::Categorical);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(Merged::Gaussian { mean: 1.0, variance: 2.0 }).unwrap();
        assert_eq!(json["kind"], "gaussian");
        assert_eq!(json["mean"], 1.0);
        let set = MergedSet::new(vec![Merged::Nothing]);
        let json = serde_json::to_value(&set).unwrap();
        assert!(json.is_array());
    }
}
