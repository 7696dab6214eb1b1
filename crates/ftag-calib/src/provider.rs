//! [`CalibrationProvider`] backed by in-memory binned tables.

use std::collections::HashMap;
use std::path::Path;

use ftag_core::{
    CalibrationHandle, CalibrationProvider, CalibrationResult, Error, Flavor, Regime, Result,
    UncertaintyKind,
};

use crate::binning::OutOfRangePolicy;
use crate::schema::CalibrationFile;
use crate::table::{CalibrationTable, TableCell};

type Key = (Flavor, String, String, Regime);

/// What a handle points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// Values are read straight from the table.
    Direct(usize),
    /// Inefficiency scale factor derived from an efficiency table with MC efficiencies.
    DerivedInefficiency(usize),
}

/// Calibration provider over a set of binned tables.
///
/// Handles are dense indices assigned at load time; the provider is immutable
/// afterwards, so concurrent lookups need no synchronization.
#[derive(Debug, Clone)]
pub struct BinnedCalibrationProvider {
    name: String,
    out_of_range: OutOfRangePolicy,
    tables: Vec<CalibrationTable>,
    targets: Vec<Target>,
    index: HashMap<Key, CalibrationHandle>,
}

impl BinnedCalibrationProvider {
    /// Build from a parsed calibration file.
    pub fn from_file(file: &CalibrationFile) -> Result<Self> {
        let name = file.tagger.clone().unwrap_or_else(|| "binned".to_string());
        let mut provider = Self {
            name,
            out_of_range: file.out_of_range,
            tables: Vec::with_capacity(file.entries.len()),
            targets: Vec::new(),
            index: HashMap::new(),
        };

        for entry in &file.entries {
            let table = CalibrationTable::from_entry(entry)?;
            let key = key_of(&table);
            if provider.index.contains_key(&key) {
                return Err(Error::Validation(format!(
                    "duplicate calibration entry {}",
                    entry.describe()
                )));
            }
            let t = provider.tables.len();
            provider.tables.push(table);
            provider.insert(key, Target::Direct(t));
        }

        // Efficiency tables with MC efficiencies also serve the inefficiency
        // regime unless an explicit inefficiency table exists.
        for t in 0..provider.tables.len() {
            let table = &provider.tables[t];
            if table.regime != Regime::Efficiency || !table.has_mc_efficiency() {
                continue;
            }
            let mut key = key_of(table);
            key.3 = Regime::Inefficiency;
            if !provider.index.contains_key(&key) {
                provider.insert(key, Target::DerivedInefficiency(t));
            }
        }

        log::info!(
            "calibration '{}': {} tables, {} handles, out_of_range={:?}",
            provider.name,
            provider.tables.len(),
            provider.targets.len(),
            provider.out_of_range
        );
        Ok(provider)
    }

    /// Parse a JSON string and build the provider.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_file(&CalibrationFile::from_json_str(json)?)
    }

    /// Read a JSON calibration file and build the provider.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("loading calibration file {}", path.display());
        Self::from_file(&CalibrationFile::from_path(path)?)
    }

    /// Number of loaded tables.
    pub fn n_tables(&self) -> usize {
        self.tables.len()
    }

    /// Out-of-range policy in effect.
    pub fn out_of_range(&self) -> OutOfRangePolicy {
        self.out_of_range
    }

    fn insert(&mut self, key: Key, target: Target) {
        let handle = CalibrationHandle(self.targets.len() as u32);
        self.targets.push(target);
        self.index.insert(key, handle);
    }

    fn target(&self, handle: CalibrationHandle) -> Result<Target> {
        self.targets.get(handle.0 as usize).copied().ok_or_else(|| {
            Error::Lookup(format!("unknown calibration handle {handle} in '{}'", self.name))
        })
    }
}

fn key_of(table: &CalibrationTable) -> Key {
    (table.flavor, table.operating_point.clone(), table.jet_author.clone(), table.regime)
}

/// Combine a cell's uncertainty components according to `kind`.
fn select_uncertainty(stat: f64, syst: f64, kind: UncertaintyKind) -> f64 {
    match kind {
        UncertaintyKind::None => 0.0,
        UncertaintyKind::Total => stat.hypot(syst),
        UncertaintyKind::Statistical => stat,
        UncertaintyKind::Systematic => syst,
    }
}

/// Inefficiency scale factor from an efficiency cell:
/// `SF' = (1 - SF·ε) / (1 - ε)`, `σ' = σ·ε / (1 - ε)`.
fn derive_inefficiency(cell: &TableCell, eff: f64) -> (f64, f64, f64) {
    let r = eff / (1.0 - eff);
    let sf = (1.0 - cell.scale_factor * eff) / (1.0 - eff);
    (sf, cell.stat * r, cell.syst * r)
}

impl CalibrationProvider for BinnedCalibrationProvider {
    fn resolve_index(
        &self,
        flavor: Flavor,
        operating_point: &str,
        jet_author: &str,
        regime: Regime,
    ) -> Result<CalibrationHandle> {
        let key = (flavor, operating_point.to_string(), jet_author.to_string(), regime);
        self.index.get(&key).copied().ok_or_else(|| {
            Error::Lookup(format!(
                "no {regime} calibration for {flavor}/{operating_point}/{jet_author} in '{}'",
                self.name
            ))
        })
    }

    fn lookup(
        &self,
        handle: CalibrationHandle,
        pt: f64,
        eta: f64,
        kind: UncertaintyKind,
    ) -> Result<CalibrationResult> {
        match self.target(handle)? {
            Target::Direct(t) => {
                let cell = self.tables[t].cell(pt, eta, self.out_of_range)?;
                Ok(CalibrationResult::new(
                    cell.scale_factor,
                    select_uncertainty(cell.stat, cell.syst, kind),
                ))
            }
            Target::DerivedInefficiency(t) => {
                let table = &self.tables[t];
                let cell = table.cell(pt, eta, self.out_of_range)?;
                let eff = cell.mc_efficiency.ok_or_else(|| {
                    Error::Lookup(format!(
                        "{}/{}/{} has no MC efficiency for derived inefficiency",
                        table.flavor, table.operating_point, table.jet_author
                    ))
                })?;
                let (sf, stat, syst) = derive_inefficiency(&cell, eff);
                Ok(CalibrationResult::new(sf, select_uncertainty(stat, syst, kind)))
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
