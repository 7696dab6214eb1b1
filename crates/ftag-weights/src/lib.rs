//! # ftag-weights
//!
//! Flavor-tagging calibration weights for simulated events.
//!
//! For every jet the engine decides tagged/untagged from its discriminant(s),
//! looks up the efficiency or inefficiency scale factor from a
//! [`CalibrationProvider`](ftag_core::CalibrationProvider), optionally applies a
//! generator-dependence correction, and multiplies the result into a 7-slot
//! [`EventWeights`](ftag_core::EventWeights) vector (nominal plus b, c/tau and
//! light down/up variations).
//!
//! ## Example
//!
//! ```no_run
//! use ftag_calib::BinnedCalibrationProvider;
//! use ftag_weights::{EngineConfig, WeightEngine};
//!
//! let provider = BinnedCalibrationProvider::from_path("calibration.json").unwrap();
//! let config = EngineConfig::new("AntiKt4TopoEMJVF0_5", 0.7892);
//! let engine = WeightEngine::new(&provider, config).unwrap();
//!
//! let r = engine
//!     .compute_event_and_jet_weights_single(&[45.0, 80.0], &[0.3, -1.6], &[0.93, 0.12], &[5, 0], false)
//!     .unwrap();
//! println!("event weight {} (b down {})", r.event.nominal(), r.event.as_array()[1]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod evaluator;
pub mod generator;
pub mod resolver;

pub use config::{EnergyUnit, EngineConfig, jet_author_label, operating_point_label};
pub use engine::{WeightEngine, WeightResult};
pub use evaluator::{JetInput, JetWeight, Thresholds, evaluate_jet};
pub use generator::GeneratorCorrectionTable;
pub use resolver::CalibrationIndexSet;
