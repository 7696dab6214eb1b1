//! Common data types for ftagweight

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Jet flavor class used to select a calibration.
///
/// The serialized labels (`B`, `C`, `T`, `Light`) follow the naming used in
/// calibration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flavor {
    /// b-quark jet (PDG 5).
    B,
    /// c-quark jet (PDG 4).
    C,
    /// Hadronic tau jet (PDG 15).
    T,
    /// Everything else (u/d/s/g).
    Light,
}

impl Flavor {
    /// All flavor classes, in the order calibration indices are resolved.
    pub const ALL: [Flavor; 4] = [Flavor::C, Flavor::B, Flavor::T, Flavor::Light];

    /// Classify a PDG-style truth label (`5`, `4`, `15`, anything else is light).
    pub fn from_pdg(code: i32) -> Self {
        match code {
            5 => Flavor::B,
            4 => Flavor::C,
            15 => Flavor::T,
            _ => Flavor::Light,
        }
    }

    /// Dense index in `0..4`.
    pub fn index(self) -> usize {
        match self {
            Flavor::B => 0,
            Flavor::C => 1,
            Flavor::T => 2,
            Flavor::Light => 3,
        }
    }

    /// Label as it appears in calibration files.
    pub fn label(self) -> &'static str {
        match self {
            Flavor::B => "B",
            Flavor::C => "C",
            Flavor::T => "T",
            Flavor::Light => "Light",
        }
    }

    /// Systematic group whose slots this flavor perturbs.
    pub fn systematic_group(self) -> SystematicGroup {
        match self {
            Flavor::B => SystematicGroup::B,
            Flavor::C | Flavor::T => SystematicGroup::CTau,
            Flavor::Light => SystematicGroup::Light,
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Calibration regime: jets passing the tag requirement use efficiency
/// scale factors, jets failing it use inefficiency scale factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Tagged jets.
    Efficiency,
    /// Untagged jets.
    Inefficiency,
}

impl Regime {
    /// Both regimes, efficiency first.
    pub const ALL: [Regime; 2] = [Regime::Efficiency, Regime::Inefficiency];

    /// Regime selected by a tag decision.
    pub fn from_tagged(tagged: bool) -> Self {
        if tagged { Regime::Efficiency } else { Regime::Inefficiency }
    }

    /// Dense index in `0..2`.
    pub fn index(self) -> usize {
        match self {
            Regime::Efficiency => 0,
            Regime::Inefficiency => 1,
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::Efficiency => f.write_str("efficiency"),
            Regime::Inefficiency => f.write_str("inefficiency"),
        }
    }
}

/// Which uncertainty component a calibration lookup returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyKind {
    /// No uncertainty (always 0).
    None,
    /// Statistical and systematic components added in quadrature.
    #[default]
    Total,
    /// Statistical component only.
    Statistical,
    /// Systematic component only.
    Systematic,
}

/// Opaque handle into a calibration provider, obtained from
/// [`CalibrationProvider::resolve_index`](crate::CalibrationProvider::resolve_index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalibrationHandle(pub u32);

impl fmt::Display for CalibrationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scale factor and its one-sigma uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Scale factor.
    pub value: f64,
    /// One-sigma uncertainty of the requested kind.
    pub uncertainty: f64,
}

impl CalibrationResult {
    /// Create a new result
    pub fn new(value: f64, uncertainty: f64) -> Self {
        Self { value, uncertainty }
    }
}

/// Flavor-uncertainty source a systematic slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystematicGroup {
    /// b-jet scale-factor uncertainty.
    B,
    /// c- and tau-jet scale-factor uncertainty.
    CTau,
    /// Light-jet mistag-rate uncertainty.
    Light,
}

impl SystematicGroup {
    /// All groups in slot order.
    pub const ALL: [SystematicGroup; 3] =
        [SystematicGroup::B, SystematicGroup::CTau, SystematicGroup::Light];

    /// Dense index in `0..3`.
    pub fn index(self) -> usize {
        match self {
            SystematicGroup::B => 0,
            SystematicGroup::CTau => 1,
            SystematicGroup::Light => 2,
        }
    }
}

/// Direction of a systematic shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// -1σ
    Down,
    /// +1σ
    Up,
}

/// Event weight with its flavor-tagging systematic envelope.
///
/// Slot layout: `[nominal, b_down, ctau_down, light_down, b_up, ctau_up, light_up]`.
/// Every slot is a product over the jets of the event; a fresh vector is all ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventWeights {
    slots: [f64; EventWeights::N_SLOTS],
}

impl EventWeights {
    /// Number of slots.
    pub const N_SLOTS: usize = 7;
    /// Index of the nominal slot.
    pub const NOMINAL: usize = 0;

    const LABELS: [&'static str; EventWeights::N_SLOTS] =
        ["nominal", "b_down", "ctau_down", "light_down", "b_up", "ctau_up", "light_up"];

    /// Neutral vector (all slots 1).
    pub fn new() -> Self {
        Self { slots: [1.0; Self::N_SLOTS] }
    }

    /// Build from raw slot values.
    pub fn from_slots(slots: [f64; Self::N_SLOTS]) -> Self {
        Self { slots }
    }

    /// Slot index of a systematic variation.
    pub fn slot(group: SystematicGroup, direction: Direction) -> usize {
        match direction {
            Direction::Down => 1 + group.index(),
            Direction::Up => 4 + group.index(),
        }
    }

    /// Stable slot names, in slot order.
    pub fn labels() -> &'static [&'static str; Self::N_SLOTS] {
        &Self::LABELS
    }

    /// Nominal event weight.
    pub fn nominal(&self) -> f64 {
        self.slots[Self::NOMINAL]
    }

    /// Weight for one systematic variation.
    pub fn variation(&self, group: SystematicGroup, direction: Direction) -> f64 {
        self.slots[Self::slot(group, direction)]
    }

    /// Raw slot values.
    pub fn as_array(&self) -> &[f64; Self::N_SLOTS] {
        &self.slots
    }

    /// Multiply in one jet's contribution.
    ///
    /// `down[g]` / `up[g]` are indexed by [`SystematicGroup::index`].
    pub fn accumulate(&mut self, nominal: f64, down: &[f64; 3], up: &[f64; 3]) {
        self.slots[Self::NOMINAL] *= nominal;
        for g in 0..3 {
            self.slots[1 + g] *= down[g];
            self.slots[4 + g] *= up[g];
        }
    }
}

impl Default for EventWeights {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for EventWeights {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Self::N_SLOTS))?;
        for (label, value) in Self::LABELS.iter().zip(self.slots.iter()) {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}
