//! Validated (pT, |eta|) scale-factor grid.

use ftag_core::{Error, Flavor, Regime, Result};

use crate::binning::{OutOfRangePolicy, locate, validate_edges};
use crate::schema::CalibrationEntry;

/// Contents of one (pT, |eta|) cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableCell {
    /// Scale factor.
    pub scale_factor: f64,
    /// Statistical uncertainty (0 if not stored).
    pub stat: f64,
    /// Systematic uncertainty (0 if not stored).
    pub syst: f64,
    /// MC efficiency, if stored.
    pub mc_efficiency: Option<f64>,
}

/// A calibration grid after validation, stored row-major (`pt_bin * n_eta + eta_bin`).
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    /// Jet flavor.
    pub flavor: Flavor,
    /// Operating-point label.
    pub operating_point: String,
    /// Jet collection label.
    pub jet_author: String,
    /// Regime.
    pub regime: Regime,
    pt_edges: Vec<f64>,
    abs_eta_edges: Vec<f64>,
    scale_factor: Vec<f64>,
    stat: Vec<f64>,
    syst: Vec<f64>,
    mc_efficiency: Option<Vec<f64>>,
}

impl CalibrationTable {
    /// Validate a file entry and flatten its grids.
    pub fn from_entry(entry: &CalibrationEntry) -> Result<Self> {
        let key = entry.describe();
        validate_edges(&format!("{key}: pt_edges"), &entry.pt_edges)?;
        validate_edges(&format!("{key}: abs_eta_edges"), &entry.abs_eta_edges)?;
        if entry.abs_eta_edges[0] < 0.0 {
            return Err(Error::Validation(format!(
                "{key}: abs_eta_edges must start at >= 0, got {}",
                entry.abs_eta_edges[0]
            )));
        }

        let n_pt = entry.pt_edges.len() - 1;
        let n_eta = entry.abs_eta_edges.len() - 1;

        let scale_factor = flatten_grid(&key, "scale_factor", &entry.scale_factor, n_pt, n_eta)?;
        let stat = match &entry.stat {
            Some(g) => flatten_grid(&key, "stat", g, n_pt, n_eta)?,
            None => vec![0.0; n_pt * n_eta],
        };
        let syst = match &entry.syst {
            Some(g) => flatten_grid(&key, "syst", g, n_pt, n_eta)?,
            None => vec![0.0; n_pt * n_eta],
        };
        if let Some(bad) = stat.iter().chain(syst.iter()).find(|&&u| u < 0.0) {
            return Err(Error::Validation(format!("{key}: negative uncertainty {bad}")));
        }

        let mc_efficiency = match &entry.mc_efficiency {
            Some(g) => {
                let eff = flatten_grid(&key, "mc_efficiency", g, n_pt, n_eta)?;
                if let Some(bad) = eff.iter().find(|&&e| e <= 0.0 || e >= 1.0) {
                    return Err(Error::Validation(format!(
                        "{key}: mc_efficiency must lie in (0, 1), got {bad}"
                    )));
                }
                Some(eff)
            }
            None => None,
        };

        Ok(Self {
            flavor: entry.flavor,
            operating_point: entry.operating_point.clone(),
            jet_author: entry.jet_author.clone(),
            regime: entry.regime,
            pt_edges: entry.pt_edges.clone(),
            abs_eta_edges: entry.abs_eta_edges.clone(),
            scale_factor,
            stat,
            syst,
            mc_efficiency,
        })
    }

    /// Whether MC efficiencies are stored (needed for derived inefficiency).
    pub fn has_mc_efficiency(&self) -> bool {
        self.mc_efficiency.is_some()
    }

    /// Number of (pT, |eta|) bins.
    pub fn shape(&self) -> (usize, usize) {
        (self.pt_edges.len() - 1, self.abs_eta_edges.len() - 1)
    }

    /// Cell containing `(pt, |eta|)`.
    pub fn cell(&self, pt: f64, eta: f64, policy: OutOfRangePolicy) -> Result<TableCell> {
        let ipt = locate(&self.pt_edges, pt, policy, "pt")?;
        let ieta = locate(&self.abs_eta_edges, eta.abs(), policy, "|eta|")?;
        let (_, n_eta) = self.shape();
        let i = ipt * n_eta + ieta;
        Ok(TableCell {
            scale_factor: self.scale_factor[i],
            stat: self.stat[i],
            syst: self.syst[i],
            mc_efficiency: self.mc_efficiency.as_ref().map(|e| e[i]),
        })
    }
}

fn flatten_grid(
    key: &str,
    what: &str,
    grid: &[Vec<f64>],
    n_pt: usize,
    n_eta: usize,
) -> Result<Vec<f64>> {
    if grid.len() != n_pt {
        return Err(Error::Validation(format!(
            "{key}: {what} has {} pt rows, expected {n_pt}",
            grid.len()
        )));
    }
    let mut out = Vec::with_capacity(n_pt * n_eta);
    for (i, row) in grid.iter().enumerate() {
        if row.len() != n_eta {
            return Err(Error::Validation(format!(
                "{key}: {what} row {i} has {} eta bins, expected {n_eta}",
                row.len()
            )));
        }
        if let Some(bad) = row.iter().find(|v| !v.is_finite()) {
            return Err(Error::Validation(format!("{key}: {what} row {i} has non-finite {bad}")));
        }
        out.extend_from_slice(row);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> CalibrationEntry {
        CalibrationEntry {
            flavor: Flavor::B,
            operating_point: "0_7892".into(),
            jet_author: "AntiKt4TopoEMJVF0_5".into(),
            regime: Regime::Efficiency,
            pt_edges: vec![20.0, 40.0, 100.0],
            abs_eta_edges: vec![0.0, 1.2, 2.5],
            scale_factor: vec![vec![0.95, 0.93], vec![0.97, 0.96]],
            stat: Some(vec![vec![0.03, 0.04], vec![0.02, 0.03]]),
            syst: None,
            mc_efficiency: Some(vec![vec![0.6, 0.55], vec![0.7, 0.65]]),
        }
    }

    #[test]
    fn cell_lookup_uses_abs_eta() {
        let t = CalibrationTable::from_entry(&entry()).unwrap();
        assert_eq!(t.shape(), (2, 2));
        let c = t.cell(50.0, -1.5, OutOfRangePolicy::Error).unwrap();
        assert_eq!(c.scale_factor, 0.96);
        assert_eq!(c.stat, 0.03);
        assert_eq!(c.syst, 0.0);
        assert_eq!(c.mc_efficiency, Some(0.65));
    }

    #[test]
    fn shape_mismatch_rejected() {
        let mut e = entry();
        e.scale_factor[1].pop();
        let err = CalibrationTable::from_entry(&e).unwrap_err();
        assert!(err.to_string().contains("row 1 has 1 eta bins"));

        let mut e = entry();
        e.stat = Some(vec![vec![0.1, 0.1]]);
        assert!(CalibrationTable::from_entry(&e).is_err());
    }

    #[test]
    fn efficiency_bounds_enforced() {
        let mut e = entry();
        e.mc_efficiency = Some(vec![vec![0.6, 1.0], vec![0.7, 0.65]]);
        let err = CalibrationTable::from_entry(&e).unwrap_err();
        assert!(err.to_string().contains("mc_efficiency must lie in (0, 1)"));
    }

    #[test]
    fn negative_uncertainty_rejected() {
        let mut e = entry();
        e.syst = Some(vec![vec![0.01, -0.01], vec![0.0, 0.0]]);
        assert!(CalibrationTable::from_entry(&e).is_err());
    }
}
