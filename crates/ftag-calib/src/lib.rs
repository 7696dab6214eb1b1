//! # ftag-calib
//!
//! Binned scale-factor provider for ftagweight.
//!
//! Calibration sets are read from a JSON file (schema `ftag_calibration_v0`),
//! one entry per (flavor, operating point, jet author, regime). Each entry is a
//! (pT, |eta|) grid of scale factors with optional statistical and systematic
//! uncertainties. Inefficiency scale factors may be given explicitly or derived
//! from an efficiency entry that carries MC efficiencies.
//!
//! ## Example
//!
//! ```no_run
//! use ftag_calib::BinnedCalibrationProvider;
//! use ftag_core::{CalibrationProvider, Flavor, Regime, UncertaintyKind};
//!
//! let provider = BinnedCalibrationProvider::from_path("calibration.json").unwrap();
//! let h = provider
//!     .resolve_index(Flavor::B, "0_7892", "AntiKt4TopoEMJVF0_5", Regime::Efficiency)
//!     .unwrap();
//! let sf = provider.lookup(h, 45.0, 0.3, UncertaintyKind::Total).unwrap();
//! println!("SF = {} ± {}", sf.value, sf.uncertainty);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod binning;
pub mod provider;
pub mod schema;
pub mod table;

pub use binning::OutOfRangePolicy;
pub use provider::BinnedCalibrationProvider;
pub use schema::{CALIBRATION_SPEC_V0, CalibrationEntry, CalibrationFile};
pub use table::{CalibrationTable, TableCell};
