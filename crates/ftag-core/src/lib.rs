//! # ftag-core
//!
//! Shared vocabulary for the ftagweight workspace:
//! - the [`Error`] type used by every crate,
//! - jet flavor / calibration regime / uncertainty-kind enums,
//! - the 7-slot [`EventWeights`] vector,
//! - the [`CalibrationProvider`] trait implemented by calibration backends.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::CalibrationProvider;
pub use types::{
    CalibrationHandle, CalibrationResult, Direction, EventWeights, Flavor, Regime,
    SystematicGroup, UncertaintyKind,
};
