//! Bootstrap bagging of leaf summaries with out-of-bag error scoring.
//!
//! Each bag draws a bootstrap sample of the rows, summarises every feature
//! over it, and keeps the rows it never drew. The out-of-bag error of a bag
//! is its summaries' error over those held-out rows.

use canopy_data::{DataMatrix, IndexView};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::error::SummaryError;
use crate::set::SummarySet;
use crate::store::LeafStore;

/// Whether to score each bag on its out-of-bag rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OobMode {
    /// Accumulate out-of-bag error per feature.
    Enabled,
    /// Skip out-of-bag scoring.
    Disabled,
}

/// Configuration for bagged summary construction.
///
/// Construct via [`BaggingConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter            | Default            |
/// |----------------------|--------------------|
/// | `codes`              | `None` (auto)      |
/// | `seed`               | 42                 |
/// | `oob_mode`           | `Enabled`          |
/// | `bootstrap_fraction` | 1.0                |
#[derive(Debug, Clone)]
pub struct BaggingConfig {
    n_bags: usize,
    codes: Option<String>,
    seed: u64,
    oob_mode: OobMode,
    bootstrap_fraction: f64,
}

impl BaggingConfig {
    /// Create a new config with the given number of bags.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::InvalidBagCount`] if `n_bags` is zero.
    pub fn new(n_bags: usize) -> Result<Self, SummaryError> {
        if n_bags == 0 {
            return Err(SummaryError::InvalidBagCount { n_bags });
        }
        Ok(Self {
            n_bags,
            codes: None,
            seed: 42,
            oob_mode: OobMode::Enabled,
            bootstrap_fraction: 1.0,
        })
    }

    /// Set the type-code string; `None` picks defaults from feature kinds.
    #[must_use]
    pub fn with_codes(mut self, codes: Option<String>) -> Self {
        self.codes = codes;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the out-of-bag scoring mode.
    #[must_use]
    pub fn with_oob_mode(mut self, oob_mode: OobMode) -> Self {
        self.oob_mode = oob_mode;
        self
    }

    /// Set the bootstrap fraction (proportion of rows drawn per bag).
    #[must_use]
    pub fn with_bootstrap_fraction(mut self, bootstrap_fraction: f64) -> Self {
        self.bootstrap_fraction = bootstrap_fraction;
        self
    }

    /// Return the number of bags.
    #[must_use]
    pub fn n_bags(&self) -> usize {
        self.n_bags
    }

    /// Return the type-code string, if one was set.
    #[must_use]
    pub fn codes(&self) -> Option<&str> {
        self.codes.as_deref()
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the out-of-bag scoring mode.
    #[must_use]
    pub fn oob_mode(&self) -> OobMode {
        self.oob_mode
    }

    /// Return the bootstrap fraction.
    #[must_use]
    pub fn bootstrap_fraction(&self) -> f64 {
        self.bootstrap_fraction
    }

    /// Build one summary set per bag over `data`.
    ///
    /// Bags are built in parallel; the result is identical for a given seed
    /// regardless of thread count.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SummaryError::EmptyDataset`] | `data` has no rows |
    /// | [`SummaryError::InvalidBootstrapFraction`] | fraction is not in (0.0, 1.0] |
    /// | [`SummaryError::OobEvaluationFailed`] | OOB enabled but no bag left a row out |
    /// | construction errors | see [`SummarySet::new`] |
    #[instrument(skip_all, fields(n_bags = self.n_bags, n_rows = data.n_rows()))]
    pub fn fit<D: DataMatrix + Sync + ?Sized>(
        &self,
        data: &D,
    ) -> Result<BaggingResult, SummaryError> {
        let n_rows = data.n_rows();
        if n_rows == 0 {
            return Err(SummaryError::EmptyDataset);
        }
        if !(self.bootstrap_fraction > 0.0 && self.bootstrap_fraction <= 1.0) {
            return Err(SummaryError::InvalidBootstrapFraction {
                fraction: self.bootstrap_fraction,
            });
        }
        let n_features = data.n_features();
        let draw_count = ((n_rows as f64) * self.bootstrap_fraction).ceil() as usize;

        info!(
            n_bags = self.n_bags,
            n_rows,
            n_features,
            draw_count,
            "bagging leaf summaries"
        );

        let mut master_rng = ChaCha8Rng::seed_from_u64(self.seed);
        let bag_seeds: Vec<u64> = (0..self.n_bags).map(|_| master_rng.r#gen()).collect();

        let codes = self.codes.as_deref();
        let bags: Vec<(SummarySet, IndexView)> = bag_seeds
            .into_par_iter()
            .map(|seed| -> Result<(SummarySet, IndexView), SummaryError> {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let (in_bag, out_of_bag) = bootstrap_sample(n_rows, draw_count, &mut rng);
                let set = SummarySet::new(data, &in_bag, codes)?;
                Ok((set, out_of_bag))
            })
            .collect::<Result<_, _>>()?;

        debug!(n_bags_built = bags.len(), "bag construction complete");

        let oob_error = match self.oob_mode {
            OobMode::Enabled => Some(score_out_of_bag(data, &bags, n_features)?),
            OobMode::Disabled => None,
        };

        let sets = bags.into_iter().map(|(set, _)| set).collect();
        let store = LeafStore::new(n_features, sets)?;
        Ok(BaggingResult { store, oob_error })
    }
}

/// Draw a bootstrap sample and return it with the rows never drawn.
fn bootstrap_sample(
    n_rows: usize,
    draw_count: usize,
    rng: &mut impl Rng,
) -> (IndexView, IndexView) {
    let mut in_bag = vec![false; n_rows];
    let mut drawn = Vec::with_capacity(draw_count);
    for _ in 0..draw_count {
        let row = rng.gen_range(0..n_rows);
        drawn.push(row);
        in_bag[row] = true;
    }
    let out_of_bag = (0..n_rows).filter(|&r| !in_bag[r]).collect();
    (IndexView::from(drawn), out_of_bag)
}

/// Sum every bag's error over its own out-of-bag rows.
///
/// Bags are scored in parallel into one vector each, then added in bag
/// order; the total is the same for any thread count.
fn score_out_of_bag<D: DataMatrix + Sync + ?Sized>(
    data: &D,
    bags: &[(SummarySet, IndexView)],
    n_features: usize,
) -> Result<OobError, SummaryError> {
    let per_bag: Vec<Vec<f64>> = bags
        .par_iter()
        .map(|(set, oob)| {
            let mut acc = vec![0.0f64; n_features];
            set.error(data, oob, &mut acc);
            acc
        })
        .collect();

    let mut total = vec![0.0f64; n_features];
    for bag in &per_bag {
        total.iter_mut().zip(bag).for_each(|(t, e)| *t += e);
    }
    let n_scored = bags.iter().map(|(_, oob)| oob.len()).sum::<usize>();

    if n_scored == 0 {
        return Err(SummaryError::OobEvaluationFailed {
            reason: "no bag left any row out of its sample".to_string(),
        });
    }

    debug!(n_scored, "out-of-bag scoring complete");
    Ok(OobError { total, n_scored })
}

/// Per-feature out-of-bag error summed over all bags.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OobError {
    /// Summed error per feature.
    pub total: Vec<f64>,
    /// Number of (bag, held-out row) pairs scored.
    pub n_scored: usize,
}

impl OobError {
    /// Return the error per scored row for each feature.
    #[must_use]
    pub fn mean(&self) -> Vec<f64> {
        let n = self.n_scored as f64;
        self.total.iter().map(|t| t / n).collect()
    }
}

/// Result of bagging: the stored leaf sets and the optional OOB error.
#[derive(Debug)]
pub struct BaggingResult {
    store: LeafStore,
    oob_error: Option<OobError>,
}

impl BaggingResult {
    /// Borrow the leaf store.
    #[must_use]
    pub fn store(&self) -> &LeafStore {
        &self.store
    }

    /// Consume the result and return the leaf store.
    #[must_use]
    pub fn into_store(self) -> LeafStore {
        self.store
    }

    /// Return the out-of-bag error, if computed.
    #[must_use]
    pub fn oob_error(&self) -> Option<&OobError> {
        self.oob_error.as_ref()
    }
}
