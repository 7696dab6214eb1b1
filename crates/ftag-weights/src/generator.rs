//! Generator-dependence correction for tagging efficiencies.
//!
//! Scale factors are derived against a reference MC generator. Samples from
//! an alternate generator have different b/c/tau/light efficiencies; the
//! correction rescales the per-jet weight by the efficiency ratio:
//!
//! ```text
//! tagged:    eff_ref / eff_alt
//! untagged:  (1 - eff_ref) / (1 - eff_alt)
//! ```
//!
//! Binning: ten pT bins `[20, 30, 40, 50, 60, 75, 90, 110, 140, 200, ∞)` GeV
//! and two |eta| regions split at 1.2. The last pT bin is open-ended, so very
//! hard jets use it. Jets below 20 GeV are not covered and get factor 1.

use std::path::Path;

use ftag_core::{Error, Flavor, Result};
use serde::{Deserialize, Serialize};

/// Number of pT bins.
pub const N_PT_BINS: usize = 10;

/// pT bin edges in GeV (last bin open-ended).
pub const PT_EDGES_GEV: [f64; N_PT_BINS + 1] =
    [20.0, 30.0, 40.0, 50.0, 60.0, 75.0, 90.0, 110.0, 140.0, 200.0, f64::INFINITY];

/// |eta| boundary between the central and forward regions.
pub const ETA_SPLIT: f64 = 1.2;

/// Efficiencies for one flavor: `[eta_region][pt_bin]`.
pub type FlavorEfficiencies = [[f64; N_PT_BINS]; 2];

/// Efficiencies for all four flavors, keyed by calibration-file flavor label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EfficiencyGrid {
    #[serde(rename = "B")]
    b: FlavorEfficiencies,
    #[serde(rename = "C")]
    c: FlavorEfficiencies,
    #[serde(rename = "T")]
    t: FlavorEfficiencies,
    #[serde(rename = "Light")]
    light: FlavorEfficiencies,
}

impl EfficiencyGrid {
    fn flavor(&self, flavor: Flavor) -> &FlavorEfficiencies {
        match flavor {
            Flavor::B => &self.b,
            Flavor::C => &self.c,
            Flavor::T => &self.t,
            Flavor::Light => &self.light,
        }
    }
}

/// Reference and alternate-generator efficiencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorCorrectionTable {
    /// Efficiencies of the generator the calibration was derived with.
    pub reference: EfficiencyGrid,
    /// Efficiencies of the alternate generator.
    pub alternate: EfficiencyGrid,
}

impl GeneratorCorrectionTable {
    /// Built-in MV1 (0.7892) efficiencies.
    pub fn builtin() -> Self {
        Self {
            reference: EfficiencyGrid { b: REF_B, c: REF_C, t: REF_T, light: REF_LIGHT },
            alternate: EfficiencyGrid { b: ALT_B, c: ALT_C, t: ALT_T, light: ALT_LIGHT },
        }
    }

    /// Parse and validate from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let table: GeneratorCorrectionTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Every efficiency must lie strictly inside (0, 1).
    pub fn validate(&self) -> Result<()> {
        for (name, grid) in [("reference", &self.reference), ("alternate", &self.alternate)] {
            for flavor in Flavor::ALL {
                for (region, row) in grid.flavor(flavor).iter().enumerate() {
                    if let Some(bad) = row.iter().find(|&&e| !(e > 0.0 && e < 1.0)) {
                        return Err(Error::Validation(format!(
                            "{name} efficiency for {flavor} (eta region {region}) must lie in (0, 1), got {bad}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// `(reference, alternate)` efficiencies for one cell.
    pub fn efficiencies(&self, flavor: Flavor, eta_region: usize, pt_bin: usize) -> (f64, f64) {
        (
            self.reference.flavor(flavor)[eta_region][pt_bin],
            self.alternate.flavor(flavor)[eta_region][pt_bin],
        )
    }

    /// Multiplicative correction for one jet; `pt_gev` in GeV.
    ///
    /// Returns 1 when the jet falls below the first pT edge.
    pub fn correction(&self, flavor_code: i32, eta: f64, pt_gev: f64, tagged: bool) -> f64 {
        let Some(pt_bin) = pt_bin(pt_gev) else {
            return 1.0;
        };
        let region = eta_region(eta);
        let (eff_ref, eff_alt) = self.efficiencies(Flavor::from_pdg(flavor_code), region, pt_bin);
        if tagged { eff_ref / eff_alt } else { (1.0 - eff_ref) / (1.0 - eff_alt) }
    }
}

impl Default for GeneratorCorrectionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// pT bin in GeV, `None` below the first edge (or NaN).
pub fn pt_bin(pt_gev: f64) -> Option<usize> {
    (0..N_PT_BINS).find(|&i| pt_gev >= PT_EDGES_GEV[i] && pt_gev < PT_EDGES_GEV[i + 1])
}

/// 0 for |eta| < 1.2, 1 otherwise.
pub fn eta_region(eta: f64) -> usize {
    if eta.abs() < ETA_SPLIT { 0 } else { 1 }
}

const REF_B: FlavorEfficiencies = [
    [0.585, 0.652, 0.690, 0.712, 0.724, 0.733, 0.736, 0.731, 0.715, 0.672],
    [0.548, 0.617, 0.657, 0.681, 0.694, 0.703, 0.705, 0.698, 0.679, 0.631],
];
const ALT_B: FlavorEfficiencies = [
    [0.571, 0.641, 0.681, 0.705, 0.719, 0.729, 0.734, 0.731, 0.717, 0.679],
    [0.532, 0.603, 0.645, 0.671, 0.686, 0.697, 0.701, 0.696, 0.680, 0.636],
];

const REF_C: FlavorEfficiencies = [
    [0.172, 0.188, 0.196, 0.201, 0.204, 0.206, 0.205, 0.201, 0.193, 0.176],
    [0.158, 0.174, 0.183, 0.188, 0.191, 0.193, 0.192, 0.188, 0.180, 0.163],
];
const ALT_C: FlavorEfficiencies = [
    [0.181, 0.197, 0.205, 0.210, 0.213, 0.214, 0.213, 0.208, 0.199, 0.181],
    [0.166, 0.182, 0.191, 0.196, 0.199, 0.200, 0.199, 0.195, 0.186, 0.168],
];

const REF_T: FlavorEfficiencies = [
    [0.061, 0.070, 0.075, 0.078, 0.080, 0.081, 0.081, 0.079, 0.075, 0.067],
    [0.055, 0.064, 0.069, 0.072, 0.074, 0.075, 0.075, 0.073, 0.069, 0.062],
];
const ALT_T: FlavorEfficiencies = [
    [0.066, 0.075, 0.080, 0.083, 0.085, 0.086, 0.085, 0.083, 0.079, 0.070],
    [0.059, 0.068, 0.073, 0.076, 0.078, 0.079, 0.078, 0.076, 0.072, 0.065],
];

const REF_LIGHT: FlavorEfficiencies = [
    [0.0062, 0.0048, 0.0043, 0.0042, 0.0043, 0.0046, 0.0051, 0.0059, 0.0074, 0.0108],
    [0.0081, 0.0063, 0.0057, 0.0055, 0.0056, 0.0060, 0.0066, 0.0076, 0.0094, 0.0135],
];
const ALT_LIGHT: FlavorEfficiencies = [
    [0.0071, 0.0055, 0.0049, 0.0047, 0.0048, 0.0051, 0.0056, 0.0064, 0.0080, 0.0116],
    [0.0092, 0.0071, 0.0064, 0.0061, 0.0062, 0.0066, 0.0072, 0.0083, 0.0102, 0.0146],
];

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn builtin_is_valid() {
        GeneratorCorrectionTable::builtin().validate().unwrap();
    }

    #[test]
    fn pt_binning() {
        assert_eq!(pt_bin(19.99), None);
        assert_eq!(pt_bin(20.0), Some(0));
        assert_eq!(pt_bin(29.999), Some(0));
        assert_eq!(pt_bin(30.0), Some(1));
        assert_eq!(pt_bin(74.0), Some(4));
        assert_eq!(pt_bin(199.9), Some(8));
        assert_eq!(pt_bin(200.0), Some(9));
        assert_eq!(pt_bin(5000.0), Some(9));
        assert_eq!(pt_bin(f64::NAN), None);
    }

    #[test]
    fn eta_regions() {
        assert_eq!(eta_region(0.0), 0);
        assert_eq!(eta_region(-1.19), 0);
        assert_eq!(eta_region(1.2), 1);
        assert_eq!(eta_region(-2.4), 1);
    }

    #[test]
    fn tagged_and_untagged_ratios() {
        let table = GeneratorCorrectionTable::builtin();
        let (r, a) = table.efficiencies(Flavor::B, 0, 3);
        assert_relative_eq!(table.correction(5, 0.5, 55.0, true), r / a);
        assert_relative_eq!(table.correction(5, -0.5, 55.0, false), (1.0 - r) / (1.0 - a));

        let (r, a) = table.efficiencies(Flavor::Light, 1, 9);
        assert_relative_eq!(table.correction(21, 2.0, 650.0, true), r / a);
    }

    #[test]
    fn tau_and_charm_use_own_rows() {
        let table = GeneratorCorrectionTable::builtin();
        let (rt, at) = table.efficiencies(Flavor::T, 1, 0);
        let (rc, ac) = table.efficiencies(Flavor::C, 1, 0);
        assert_relative_eq!(table.correction(15, 1.5, 25.0, true), rt / at);
        assert_relative_eq!(table.correction(4, 1.5, 25.0, true), rc / ac);
    }

    #[test]
    fn below_first_edge_is_identity() {
        let table = GeneratorCorrectionTable::builtin();
        assert_eq!(table.correction(5, 0.1, 15.0, true), 1.0);
        assert_eq!(table.correction(0, 0.1, -1.0, false), 1.0);
    }

    #[test]
    fn json_round_trip_and_validation() {
        let table = GeneratorCorrectionTable::builtin();
        let json = serde_json::to_string(&table).unwrap();
        let back = GeneratorCorrectionTable::from_json_str(&json).unwrap();
        assert_eq!(back, table);

        let mut bad = table.clone();
        bad.alternate.c[0][2] = 1.0;
        let err = bad.validate().unwrap_err();
        assert!(err.to_string().contains("alternate efficiency for C"));
    }
}
