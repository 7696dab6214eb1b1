//! Calibration file format (`ftag_calibration_v0`).

use std::path::Path;

use ftag_core::{Error, Flavor, Regime, Result};
use serde::{Deserialize, Serialize};

use crate::binning::OutOfRangePolicy;

/// Schema version accepted by [`CalibrationFile`].
pub const CALIBRATION_SPEC_V0: &str = "ftag_calibration_v0";

/// Top-level calibration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationFile {
    /// Must equal [`CALIBRATION_SPEC_V0`].
    pub schema_version: String,
    /// Tagger the calibration applies to (informational).
    #[serde(default)]
    pub tagger: Option<String>,
    /// Lookup policy outside the calibrated (pT, |eta|) range.
    #[serde(default)]
    pub out_of_range: OutOfRangePolicy,
    /// Calibration sets.
    pub entries: Vec<CalibrationEntry>,
}

/// One calibration set: a (pT, |eta|) grid for a single
/// (flavor, operating point, jet author, regime).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationEntry {
    /// Jet flavor.
    pub flavor: Flavor,
    /// Operating-point label (e.g. `"0_7892"`).
    pub operating_point: String,
    /// Jet collection label (e.g. `"AntiKt4TopoEMJVF0_5"`).
    pub jet_author: String,
    /// Efficiency or inefficiency scale factors.
    pub regime: Regime,
    /// pT bin edges, in the unit jets are looked up with.
    pub pt_edges: Vec<f64>,
    /// |eta| bin edges.
    pub abs_eta_edges: Vec<f64>,
    /// Scale factors, `[pt_bin][eta_bin]`.
    pub scale_factor: Vec<Vec<f64>>,
    /// Statistical uncertainties, same shape as `scale_factor`.
    #[serde(default)]
    pub stat: Option<Vec<Vec<f64>>>,
    /// Systematic uncertainties, same shape as `scale_factor`.
    #[serde(default)]
    pub syst: Option<Vec<Vec<f64>>>,
    /// MC tagging efficiencies, same shape as `scale_factor`.
    ///
    /// Only meaningful on efficiency entries; enables derived inefficiency
    /// scale factors when no explicit inefficiency entry exists.
    #[serde(default)]
    pub mc_efficiency: Option<Vec<Vec<f64>>>,
}

impl CalibrationEntry {
    /// Short human-readable key, used in messages.
    pub fn describe(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.flavor, self.operating_point, self.jet_author, self.regime
        )
    }
}

impl CalibrationFile {
    /// Parse from a JSON string and check the schema version.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CalibrationFile = serde_json::from_str(json)?;
        file.check_schema()?;
        Ok(file)
    }

    /// Read and parse a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    fn check_schema(&self) -> Result<()> {
        if self.schema_version != CALIBRATION_SPEC_V0 {
            return Err(Error::Validation(format!(
                "unsupported calibration schema_version '{}', expected '{}'",
                self.schema_version, CALIBRATION_SPEC_V0
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "schema_version": "ftag_calibration_v0",
        "entries": [{
            "flavor": "Light",
            "operating_point": "0_7892",
            "jet_author": "AntiKt4TopoEMJVF0_5",
            "regime": "inefficiency",
            "pt_edges": [20.0, 1000.0],
            "abs_eta_edges": [0.0, 2.5],
            "scale_factor": [[1.01]]
        }]
    }"#;

    #[test]
    fn parse_minimal() {
        let f = CalibrationFile::from_json_str(MINIMAL).unwrap();
        assert_eq!(f.out_of_range, OutOfRangePolicy::Error);
        assert!(f.tagger.is_none());
        assert_eq!(f.entries.len(), 1);
        let e = &f.entries[0];
        assert_eq!(e.flavor, Flavor::Light);
        assert_eq!(e.regime, Regime::Inefficiency);
        assert!(e.stat.is_none());
        assert_eq!(e.describe(), "Light/0_7892/AntiKt4TopoEMJVF0_5/inefficiency");
    }

    #[test]
    fn reject_wrong_schema() {
        let bad = MINIMAL.replace("ftag_calibration_v0", "ftag_calibration_v9");
        let err = CalibrationFile::from_json_str(&bad).unwrap_err();
        assert!(err.to_string().contains("unsupported calibration schema_version"));
    }

    #[test]
    fn reject_unknown_flavor() {
        let bad = MINIMAL.replace("\"Light\"", "\"Top\"");
        assert!(matches!(CalibrationFile::from_json_str(&bad), Err(Error::Json(_))));
    }
}
