//! Known mathematical domains.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Canonical domain labels the engine is asked to pick from.
///
/// The engine's `domain` string stays free-form; this enum is only used to
/// classify it for display.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum MathDomain {
    Arithmetic,
    Algebra,
    Trigonometry,
    Calculus,
    #[strum(to_string = "Coordinate Geometry", serialize = "Geometry")]
    Geometry,
    #[strum(
        to_string = "Matrices & Determinants",
        serialize = "Linear Algebra",
        serialize = "Matrices"
    )]
    Matrices,
    #[strum(
        to_string = "Probability & Statistics",
        serialize = "Probability",
        serialize = "Statistics"
    )]
    Probability,
    #[strum(to_string = "Number Theory")]
    NumberTheory,
    #[strum(to_string = "General Mathematics")]
    Other,
}

impl MathDomain {
    /// Maps a free-form domain label onto a known domain.
    ///
    /// Matching ignores ASCII case and surrounding whitespace. Unknown labels
    /// map to [`MathDomain::Other`].
    pub fn classify(label: &str) -> Self {
        MathDomain::from_str(label.trim()).unwrap_or(MathDomain::Other)
    }

    /// Display labels of every known domain, in declaration order.
    pub fn labels() -> Vec<String> {
        MathDomain::iter().map(|domain| domain.to_string()).collect()
    }
}
