//! Engine configuration.

use std::path::Path;

use ftag_core::{Error, Result, UncertaintyKind};
use serde::{Deserialize, Serialize};

use crate::evaluator::Thresholds;

/// Unit of incoming jet pT.
///
/// Only the generator-correction table cares (it is binned in GeV); the
/// provider receives pT unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnergyUnit {
    /// Giga-electronvolt.
    #[default]
    GeV,
    /// Mega-electronvolt.
    MeV,
}

impl EnergyUnit {
    /// Convert a value in this unit to GeV.
    pub fn to_gev(self, value: f64) -> f64 {
        match self {
            EnergyUnit::GeV => value,
            EnergyUnit::MeV => value / 1000.0,
        }
    }
}

/// Configuration of a [`WeightEngine`](crate::WeightEngine).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Tagger name (informational).
    #[serde(default = "default_tagger")]
    pub tagger: String,
    /// Operating-point label understood by the provider.
    /// Derived from `threshold` when absent.
    #[serde(default)]
    pub operating_point: Option<String>,
    /// Jet collection label understood by the provider.
    pub jet_author: String,
    /// Cut on the first discriminant.
    pub threshold: f64,
    /// Cut on the second discriminant (defaults to `threshold`).
    #[serde(default)]
    pub threshold2: Option<f64>,
    /// Uncertainty component requested from the provider.
    #[serde(default)]
    pub uncertainty: UncertaintyKind,
    /// Unit of jet pT.
    #[serde(default)]
    pub pt_unit: EnergyUnit,
    /// Fail at construction if any calibration handle is unresolved.
    #[serde(default)]
    pub require_complete_calibration: bool,
}

fn default_tagger() -> String {
    "MV1".to_string()
}

impl EngineConfig {
    /// Create a config with defaults for everything but the jet author and cut.
    pub fn new(jet_author: impl Into<String>, threshold: f64) -> Self {
        Self {
            tagger: default_tagger(),
            operating_point: None,
            jet_author: jet_author.into(),
            threshold,
            threshold2: None,
            uncertainty: UncertaintyKind::default(),
            pt_unit: EnergyUnit::default(),
            require_complete_calibration: false,
        }
    }

    /// Set the tagger name.
    pub fn tagger(mut self, name: impl Into<String>) -> Self {
        self.tagger = name.into();
        self
    }

    /// Set an explicit operating-point label.
    pub fn operating_point(mut self, label: impl Into<String>) -> Self {
        self.operating_point = Some(label.into());
        self
    }

    /// Set the second-discriminant cut.
    pub fn threshold2(mut self, cut: f64) -> Self {
        self.threshold2 = Some(cut);
        self
    }

    /// Set the uncertainty kind.
    pub fn uncertainty(mut self, kind: UncertaintyKind) -> Self {
        self.uncertainty = kind;
        self
    }

    /// Set the pT unit.
    pub fn pt_unit(mut self, unit: EnergyUnit) -> Self {
        self.pt_unit = unit;
        self
    }

    /// Require every calibration handle to resolve.
    pub fn require_complete_calibration(mut self, yes: bool) -> Self {
        self.require_complete_calibration = yes;
        self
    }

    /// Operating-point label: explicit, or derived from `threshold`.
    pub fn operating_point_name(&self) -> String {
        match &self.operating_point {
            Some(op) => op.clone(),
            None => operating_point_label(self.threshold),
        }
    }

    /// Tag thresholds.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds::pair(self.threshold, self.threshold2.unwrap_or(self.threshold))
    }

    /// Check the config for obvious mistakes.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(Error::Validation(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        if let Some(t2) = self.threshold2
            && !t2.is_finite()
        {
            return Err(Error::Validation(format!("threshold2 must be finite, got {t2}")));
        }
        if self.jet_author.trim().is_empty() {
            return Err(Error::Validation("jet_author must not be empty".into()));
        }
        if let Some(op) = &self.operating_point
            && op.trim().is_empty()
        {
            return Err(Error::Validation("operating_point must not be empty".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: EngineConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }
}

/// Operating-point label for a discriminant cut: four decimals, `.` → `_`.
///
/// `0.7892` → `"0_7892"`.
pub fn operating_point_label(cut: f64) -> String {
    format!("{cut:.4}").replace('.', "_")
}

/// Jet-author label for a jet collection with an optional JVF cut.
///
/// `("AntiKt4TopoEM", Some(0.5))` → `"AntiKt4TopoEMJVF0_5"`.
pub fn jet_author_label(collection: &str, jvf_cut: Option<f64>) -> String {
    match jvf_cut {
        Some(cut) => format!("{collection}JVF{}", cut.to_string().replace('.', "_")),
        None => collection.to_string(),
    }
}
