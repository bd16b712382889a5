//! Response schema: the contract for a solved-problem result.

mod domain;
mod model;
mod output_shape;
mod wire;

pub use domain::MathDomain;
pub use model::{CalculationRecord, MathResponse, MathStep};
pub use output_shape::{REQUIRED_FIELDS, response_schema};
pub use wire::{RawMathResponse, RawMathStep, parse_math_response};
