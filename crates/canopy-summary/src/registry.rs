//! The static table of summary kinds.

use std::fmt;

use canopy_data::FeatureKind;

use crate::error::SummaryError;

/// Discriminator selecting which statistic a [`Summary`](crate::Summary) holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Kind {
    /// No statistic; placeholder for a feature that is deliberately skipped.
    Nothing,
    /// Frequency table over a discrete feature's categories.
    Categorical,
    /// Mean and variance of one continuous feature.
    Gaussian,
    /// Joint mean and covariance of a feature and its successor.
    BiGaussian,
}

impl Kind {
    /// Return the registry entry describing this kind.
    #[must_use]
    pub fn descriptor(self) -> &'static SummaryType {
        match self {
            Kind::Nothing => &REGISTRY[0],
            Kind::Categorical => &REGISTRY[1],
            Kind::Gaussian => &REGISTRY[2],
            Kind::BiGaussian => &REGISTRY[3],
        }
    }

    /// Return the one-character type code of this kind.
    #[must_use]
    pub fn code(self) -> char {
        self.descriptor().code
    }

    /// Return the number of consecutive features this kind consumes.
    #[must_use]
    pub fn arity(self) -> usize {
        self.descriptor().arity
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().name)
    }
}

/// Descriptor of one summary kind: its code, documentation, and shape.
#[derive(Debug, PartialEq, Eq, serde::Serialize)]
pub struct SummaryType {
    /// Character used for the kind in type-code strings and byte records.
    pub code: char,
    /// Short human-readable name.
    pub name: &'static str,
    /// One-line description of what the statistic captures.
    pub description: &'static str,
    /// Number of consecutive features consumed, starting at the summary's own.
    pub arity: usize,
    /// Feature kind for which this is the automatic choice, if any.
    pub default_for: Option<FeatureKind>,
    /// The kind this descriptor belongs to.
    pub kind: Kind,
}

static REGISTRY: [SummaryType; 4] = [
    SummaryType {
        code: 'N',
        name: "Nothing",
        description: "Does nothing; fills the slot consumed by a bivariate summary",
        arity: 1,
        default_for: None,
        kind: Kind::Nothing,
    },
    SummaryType {
        code: 'C',
        name: "Categorical",
        description: "Distribution over the categories of a discrete feature",
        arity: 1,
        default_for: Some(FeatureKind::Discrete),
        kind: Kind::Categorical,
    },
    SummaryType {
        code: 'G',
        name: "Gaussian",
        description: "Mean and population variance of a continuous feature",
        arity: 1,
        default_for: Some(FeatureKind::Continuous),
        kind: Kind::Gaussian,
    },
    SummaryType {
        code: 'B',
        name: "BiGaussian",
        description: "Bivariate Gaussian over a feature and the one after it",
        arity: 2,
        default_for: None,
        kind: Kind::BiGaussian,
    },
];

impl SummaryType {
    /// Find the kind registered under `code`.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::UnknownTypeCode`] if no kind uses that code.
    pub fn lookup(code: char) -> Result<&'static SummaryType, SummaryError> {
        Self::list()
            .find(|t| t.code == code)
            .ok_or(SummaryError::UnknownTypeCode { code })
    }

    /// Iterate every registered kind in registration order.
    pub fn list() -> impl ExactSizeIterator<Item = &'static SummaryType> + Clone {
        REGISTRY.iter()
    }

    /// Pick the automatic summary kind for a feature of the given kind.
    ///
    /// Falls back to [`Kind::Nothing`] when no registered kind claims it.
    #[must_use]
    pub fn default_for(feature_kind: FeatureKind) -> &'static SummaryType {
        Self::list()
            .find(|t| t.default_for == Some(feature_kind))
            .unwrap_or(Kind::Nothing.descriptor())
    }

    /// Find the kind whose code matches a record's leading byte.
    pub(crate) fn from_byte(byte: u8) -> Option<&'static SummaryType> {
        Self::list().find(|t| t.code as u32 == u32::from(byte))
    }
}
