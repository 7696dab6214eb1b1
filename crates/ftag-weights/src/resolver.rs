//! Calibration handles resolved once per engine.

use ftag_core::{CalibrationHandle, CalibrationProvider, Error, Flavor, Regime, Result};

/// Handles for every (flavor, regime) pair, resolved at construction.
///
/// A pair the provider could not resolve is stored as `None` and reported as a
/// [`Error::Configuration`] the first time a jet needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationIndexSet {
    operating_point: String,
    jet_author: String,
    handles: [[Option<CalibrationHandle>; 2]; 4],
}

impl CalibrationIndexSet {
    /// Resolve all eight handles for `(operating_point, jet_author)`.
    pub fn resolve<P: CalibrationProvider + ?Sized>(
        provider: &P,
        operating_point: &str,
        jet_author: &str,
    ) -> Self {
        let mut handles = [[None; 2]; 4];
        for flavor in Flavor::ALL {
            for regime in Regime::ALL {
                match provider.resolve_index(flavor, operating_point, jet_author, regime) {
                    Ok(h) => handles[flavor.index()][regime.index()] = Some(h),
                    Err(e) => log::warn!(
                        "{}: no {regime} calibration for {flavor}/{operating_point}/{jet_author}: {e}",
                        provider.name()
                    ),
                }
            }
        }
        Self {
            operating_point: operating_point.to_string(),
            jet_author: jet_author.to_string(),
            handles,
        }
    }

    /// Handle for `(flavor, regime)`, or `None` if unresolved.
    pub fn get(&self, flavor: Flavor, regime: Regime) -> Option<CalibrationHandle> {
        self.handles[flavor.index()][regime.index()]
    }

    /// Handle for `(flavor, regime)`; unresolved pairs are a configuration error.
    pub fn handle(&self, flavor: Flavor, regime: Regime) -> Result<CalibrationHandle> {
        self.get(flavor, regime).ok_or_else(|| {
            Error::Configuration(format!(
                "{regime} calibration for {flavor}/{}/{} was not resolved",
                self.operating_point, self.jet_author
            ))
        })
    }

    /// Unresolved `(flavor, regime)` pairs.
    pub fn missing(&self) -> Vec<(Flavor, Regime)> {
        Flavor::ALL
            .iter()
            .flat_map(|&f| Regime::ALL.iter().map(move |&r| (f, r)))
            .filter(|&(f, r)| self.get(f, r).is_none())
            .collect()
    }

    /// Whether all eight handles resolved.
    pub fn is_complete(&self) -> bool {
        self.handles.iter().flatten().all(Option::is_some)
    }

    /// Operating-point label the handles were resolved for.
    pub fn operating_point(&self) -> &str {
        &self.operating_point
    }

    /// Jet author the handles were resolved for.
    pub fn jet_author(&self) -> &str {
        &self.jet_author
    }
}
