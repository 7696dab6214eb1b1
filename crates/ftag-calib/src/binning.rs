//! Bin lookup on sorted edges, with an explicit out-of-range policy.

use ftag_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// What to do with a lookup outside the calibrated range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRangePolicy {
    /// Fail the lookup.
    #[default]
    Error,
    /// Use the first/last bin.
    Clamp,
}

/// Find the bin index for a value given sorted bin edges.
///
/// Bins are half-open `[lo, hi)`. Returns `None` for underflow/overflow and NaN.
pub fn find_bin(edges: &[f64], val: f64) -> Option<usize> {
    if edges.len() < 2 || val.is_nan() {
        return None;
    }
    if val < edges[0] || val >= edges[edges.len() - 1] {
        return None;
    }
    match edges.binary_search_by(|e| e.total_cmp(&val)) {
        Ok(i) => {
            if i >= edges.len() - 1 {
                None
            } else {
                Some(i)
            }
        }
        Err(i) => {
            if i == 0 || i >= edges.len() {
                None
            } else {
                Some(i - 1)
            }
        }
    }
}

/// Locate `val` on `axis`, applying `policy` outside the edges.
pub fn locate(edges: &[f64], val: f64, policy: OutOfRangePolicy, axis: &str) -> Result<usize> {
    if !val.is_finite() {
        return Err(Error::Lookup(format!("{axis}={val} is not finite")));
    }
    if let Some(b) = find_bin(edges, val) {
        return Ok(b);
    }
    let n_bins = edges.len().saturating_sub(1);
    let (lo, hi) = (edges[0], edges[edges.len() - 1]);
    match policy {
        OutOfRangePolicy::Error => Err(Error::Lookup(format!(
            "{axis}={val} outside calibrated range [{lo}, {hi})"
        ))),
        OutOfRangePolicy::Clamp => {
            let b = if val < lo { 0 } else { n_bins - 1 };
            log::debug!("{axis}={val} outside [{lo}, {hi}); clamped to bin {b}");
            Ok(b)
        }
    }
}

/// Check that `edges` has at least two finite, strictly increasing entries.
pub fn validate_edges(name: &str, edges: &[f64]) -> Result<()> {
    if edges.len() < 2 {
        return Err(Error::Validation(format!(
            "{name} needs at least 2 edges, got {}",
            edges.len()
        )));
    }
    if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
        return Err(Error::Validation(format!("{name} has non-finite edge {bad}")));
    }
    if let Some(w) = edges.windows(2).find(|w| w[1] <= w[0]) {
        return Err(Error::Validation(format!(
            "{name} must be strictly increasing, got {} then {}",
            w[0], w[1]
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn find_bin_edge_cases() {
        let edges = vec![0.0, 1.0, 2.0, 3.0];
        assert_eq!(find_bin(&edges, -0.5), None);
        assert_eq!(find_bin(&edges, 3.0), None);
        assert_eq!(find_bin(&edges, 0.0), Some(0));
        assert_eq!(find_bin(&edges, 1.0), Some(1));
        assert_eq!(find_bin(&edges, 2.99), Some(2));
        assert_eq!(find_bin(&edges, f64::NAN), None);
    }

    #[test]
    fn locate_error_policy() {
        let edges = [20.0, 30.0, 60.0];
        assert_eq!(locate(&edges, 25.0, OutOfRangePolicy::Error, "pt").unwrap(), 0);
        let err = locate(&edges, 60.0, OutOfRangePolicy::Error, "pt").unwrap_err();
        assert!(err.to_string().contains("outside calibrated range"));
        assert!(locate(&edges, 10.0, OutOfRangePolicy::Error, "pt").is_err());
    }

    #[test]
    fn locate_clamp_policy() {
        let edges = [20.0, 30.0, 60.0];
        assert_eq!(locate(&edges, 5.0, OutOfRangePolicy::Clamp, "pt").unwrap(), 0);
        assert_eq!(locate(&edges, 500.0, OutOfRangePolicy::Clamp, "pt").unwrap(), 1);
        assert!(locate(&edges, f64::INFINITY, OutOfRangePolicy::Clamp, "pt").is_err());
    }

    #[test]
    fn validate_edges_rejects_bad_input() {
        assert!(validate_edges("pt", &[1.0]).is_err());
        assert!(validate_edges("pt", &[1.0, 1.0]).is_err());
        assert!(validate_edges("pt", &[1.0, f64::NAN]).is_err());
        assert!(validate_edges("pt", &[0.0, 1.2, 2.5]).is_ok());
    }

    proptest! {
        #[test]
        fn found_bin_contains_value(val in 0.0f64..100.0) {
            let edges = [0.0, 10.0, 25.0, 40.0, 75.0, 100.0];
            let b = find_bin(&edges, val).unwrap();
            prop_assert!(edges[b] <= val && val < edges[b + 1]);
        }
    }
}
