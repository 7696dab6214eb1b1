//! Per-jet scale-factor weight and its flavor-split systematic variations.

use ftag_core::{CalibrationProvider, Error, Flavor, Regime, Result, UncertaintyKind};
use serde::Serialize;

use crate::resolver::CalibrationIndexSet;

/// Sign of the uncertainty in the *down* variation, indexed by [`Regime::index`].
///
/// Efficiency and inefficiency scale factors are anti-correlated: a shift that
/// lowers the weight of tagged jets raises the weight of untagged jets.
pub const DOWN_SIGN: [f64; 2] = [-1.0, 1.0];

/// Discriminant cuts. A jet is tagged iff both discriminants pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Cut on the first discriminant.
    pub first: f64,
    /// Cut on the second discriminant.
    pub second: f64,
}

impl Thresholds {
    /// Same cut on both discriminants.
    pub fn single(cut: f64) -> Self {
        Self { first: cut, second: cut }
    }

    /// Independent cuts.
    pub fn pair(first: f64, second: f64) -> Self {
        Self { first, second }
    }

    /// Tag decision.
    pub fn is_tagged(&self, weight1: f64, weight2: f64) -> bool {
        weight1 > self.first && weight2 > self.second
    }
}

/// One jet as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JetInput {
    /// Transverse momentum; negative means outside acceptance.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// PDG-style truth flavor label.
    pub flavor_code: i32,
    /// First tag discriminant.
    pub weight1: f64,
    /// Second tag discriminant.
    pub weight2: f64,
}

impl JetInput {
    /// Jet with a single discriminant (used for both slots).
    pub fn new(pt: f64, eta: f64, flavor_code: i32, weight: f64) -> Self {
        Self { pt, eta, flavor_code, weight1: weight, weight2: weight }
    }

    /// Override the second discriminant.
    pub fn with_second_weight(mut self, weight2: f64) -> Self {
        self.weight2 = weight2;
        self
    }

    /// False only for the negative-pT sentinel. NaN pT is not the sentinel;
    /// evaluation rejects it.
    pub fn in_acceptance(&self) -> bool {
        self.pt >= 0.0 || self.pt.is_nan()
    }
}

/// Nominal weight plus down/up variations per [`SystematicGroup`](ftag_core::SystematicGroup).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JetWeight {
    /// Nominal weight.
    pub nominal: f64,
    /// Down variations, indexed by systematic group.
    pub down: [f64; 3],
    /// Up variations, indexed by systematic group.
    pub up: [f64; 3],
}

impl JetWeight {
    /// Every value equal to `w`.
    pub fn uniform(w: f64) -> Self {
        Self { nominal: w, down: [w; 3], up: [w; 3] }
    }

    /// Contribution of a jet outside acceptance.
    pub fn neutral() -> Self {
        Self::uniform(1.0)
    }
}

/// Apply the shift table: only the jet's own flavor group moves, in the
/// direction given by [`DOWN_SIGN`] for its regime.
pub fn shifted(nominal: f64, uncertainty: f64, flavor: Flavor, regime: Regime) -> JetWeight {
    let g = flavor.systematic_group().index();
    let sign = DOWN_SIGN[regime.index()];
    let mut w = JetWeight::uniform(nominal);
    w.down[g] = nominal + sign * uncertainty;
    w.up[g] = nominal - sign * uncertainty;
    w
}

/// Evaluate one jet.
///
/// `generator_correction` multiplies the nominal scale factor (pass 1 for
/// reference-generator samples). Jets outside acceptance return
/// [`JetWeight::neutral`] without touching the provider.
pub fn evaluate_jet<P: CalibrationProvider + ?Sized>(
    provider: &P,
    indices: &CalibrationIndexSet,
    jet: &JetInput,
    thresholds: &Thresholds,
    kind: UncertaintyKind,
    generator_correction: f64,
) -> Result<JetWeight> {
    if !jet.in_acceptance() {
        return Ok(JetWeight::neutral());
    }
    if !(jet.pt.is_finite() && jet.eta.is_finite()) {
        return Err(Error::Validation(format!(
            "jet kinematics must be finite, got pt={}, eta={}",
            jet.pt, jet.eta
        )));
    }

    let flavor = Flavor::from_pdg(jet.flavor_code);
    let regime = Regime::from_tagged(thresholds.is_tagged(jet.weight1, jet.weight2));
    let handle = indices.handle(flavor, regime)?;

    let sf = provider.lookup(handle, jet.pt, jet.eta, kind).map_err(|e| match e {
        Error::Lookup(msg) => Error::Lookup(format!(
            "{flavor} jet (pt={}, eta={}, {regime}): {msg}",
            jet.pt, jet.eta
        )),
        other => other,
    })?;

    Ok(shifted(sf.value * generator_correction, sf.uncertainty, flavor, regime))
}
