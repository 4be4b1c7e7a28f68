//! Training data collaborators for canopy: a column-major feature table,
//! row-subset views over it, and a validating CSV reader.

mod error;
mod matrix;
mod reader;
mod view;

pub use error::DataError;
pub use matrix::{Column, DataMatrix, FeatureKind, FeatureTable, Value};
pub use reader::TableReader;
pub use view::IndexView;
