//! Core traits for ftagweight
//!
//! The weight engine never touches calibration storage directly. It talks to
//! a [`CalibrationProvider`], which owns the binned scale-factor tables and
//! performs the (pt, eta) lookup.

use crate::Result;
use crate::types::{CalibrationHandle, CalibrationResult, Flavor, Regime, UncertaintyKind};

/// Calibration backend: resolves calibration sets once, then serves lookups.
///
/// Implementations are shared across threads when events are processed in
/// parallel, so `lookup` must be reentrant.
pub trait CalibrationProvider: Send + Sync {
    /// Resolve the calibration set for `(flavor, operating_point, jet_author, regime)`.
    ///
    /// Must be idempotent: resolving the same key twice yields the same handle.
    fn resolve_index(
        &self,
        flavor: Flavor,
        operating_point: &str,
        jet_author: &str,
        regime: Regime,
    ) -> Result<CalibrationHandle>;

    /// Scale factor and uncertainty for one jet.
    ///
    /// Inputs outside the calibrated range must produce an error rather than
    /// a default scale factor.
    fn lookup(
        &self,
        handle: CalibrationHandle,
        pt: f64,
        eta: f64,
        kind: UncertaintyKind,
    ) -> Result<CalibrationResult>;

    /// Provider name, used in log and error messages.
    fn name(&self) -> &str {
        "calibration"
    }
}

impl<P: CalibrationProvider + ?Sized> CalibrationProvider for &P {
    fn resolve_index(
        &self,
        flavor: Flavor,
        operating_point: &str,
        jet_author: &str,
        regime: Regime,
    ) -> Result<CalibrationHandle> {
        (**self).resolve_index(flavor, operating_point, jet_author, regime)
    }

    fn lookup(
        &self,
        handle: CalibrationHandle,
        pt: f64,
        eta: f64,
        kind: UncertaintyKind,
    ) -> Result<CalibrationResult> {
        (**self).lookup(handle, pt, eta, kind)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
