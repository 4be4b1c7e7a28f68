//! Per-feature statistical summaries at random-forest leaves.
//!
//! A [`Summary`] is one feature's learned statistic (categorical
//! distribution, Gaussian, bivariate Gaussian, or nothing), chosen through
//! the static [`SummaryType`] registry. A [`SummarySet`] holds one summary
//! per feature for a leaf. Sets can be scored on held-out rows, merged
//! across trees into plain [`Merged`] values, encoded to a compact
//! little-endian byte form, persisted as a [`LeafStore`], and built in bulk
//! over bootstrap bags with [`BaggingConfig`].

mod bagging;
mod bigaussian;
mod categorical;
mod codec;
mod error;
mod gaussian;
mod merged;
mod nothing;
mod registry;
mod set;
mod store;
mod summary;

pub use bagging::{BaggingConfig, BaggingResult, OobError, OobMode};
pub use bigaussian::BiGaussian;
pub use categorical::Categorical;
pub use error::SummaryError;
pub use gaussian::Gaussian;
pub use merged::{Merged, MergedBatch, MergedSet};
pub use nothing::Nothing;
pub use registry::{Kind, SummaryType};
pub use set::SummarySet;
pub use store::LeafStore;
pub use summary::{Statistic, Summary, SummarySlot};
