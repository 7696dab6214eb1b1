//! Event-level weight aggregation.

use ftag_core::{CalibrationProvider, Error, EventWeights, Result};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::evaluator::{JetInput, JetWeight, Thresholds, evaluate_jet};
use crate::generator::GeneratorCorrectionTable;
use crate::resolver::CalibrationIndexSet;

/// Event weight vector plus the nominal weight of every input jet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightResult {
    /// Product over jets, with systematic variations.
    pub event: EventWeights,
    /// Nominal weight per jet, in input order (1 for jets outside acceptance).
    pub per_jet: Vec<f64>,
}

/// Flavor-tagging weight engine.
///
/// Calibration handles are resolved once in [`WeightEngine::new`]; afterwards
/// the engine is immutable and can be shared across threads when the
/// provider is.
pub struct WeightEngine<'p, P: CalibrationProvider + ?Sized> {
    provider: &'p P,
    config: EngineConfig,
    indices: CalibrationIndexSet,
    thresholds: Thresholds,
    generator: GeneratorCorrectionTable,
}

impl<'p, P: CalibrationProvider + ?Sized> WeightEngine<'p, P> {
    /// Validate `config` and resolve calibration handles against `provider`.
    pub fn new(provider: &'p P, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let operating_point = config.operating_point_name();
        let indices = CalibrationIndexSet::resolve(provider, &operating_point, &config.jet_author);

        if !indices.is_complete() {
            let missing: Vec<String> =
                indices.missing().iter().map(|(f, r)| format!("{f}/{r}")).collect();
            if config.require_complete_calibration {
                return Err(Error::Configuration(format!(
                    "unresolved calibrations for {operating_point}/{}: {}",
                    config.jet_author,
                    missing.join(", ")
                )));
            }
            log::warn!(
                "{} calibration(s) unresolved ({}); jets needing them will fail",
                missing.len(),
                missing.join(", ")
            );
        }

        let thresholds = config.thresholds();
        log::info!(
            "weight engine: tagger={} op={} author={} cuts=({}, {}) provider={}",
            config.tagger,
            operating_point,
            config.jet_author,
            thresholds.first,
            thresholds.second,
            provider.name()
        );

        Ok(Self {
            provider,
            config,
            indices,
            thresholds,
            generator: GeneratorCorrectionTable::builtin(),
        })
    }

    /// Replace the generator-correction table.
    pub fn with_generator_table(mut self, table: GeneratorCorrectionTable) -> Self {
        self.generator = table;
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolved calibration handles.
    pub fn indices(&self) -> &CalibrationIndexSet {
        &self.indices
    }

    /// Discriminant cuts in use.
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Generator-correction table in use.
    pub fn generator_table(&self) -> &GeneratorCorrectionTable {
        &self.generator
    }

    /// Weights for one jet.
    pub fn jet_weight(&self, jet: &JetInput, alternate_generator: bool) -> Result<JetWeight> {
        self.jet_weight_with(jet, &self.thresholds, alternate_generator)
    }

    fn jet_weight_with(
        &self,
        jet: &JetInput,
        thresholds: &Thresholds,
        alternate_generator: bool,
    ) -> Result<JetWeight> {
        if !jet.in_acceptance() {
            return Ok(JetWeight::neutral());
        }
        let correction = if alternate_generator {
            let tagged = thresholds.is_tagged(jet.weight1, jet.weight2);
            let pt_gev = self.config.pt_unit.to_gev(jet.pt);
            self.generator.correction(jet.flavor_code, jet.eta, pt_gev, tagged)
        } else {
            1.0
        };
        evaluate_jet(
            self.provider,
            &self.indices,
            jet,
            thresholds,
            self.config.uncertainty,
            correction,
        )
    }

    /// Fold jets left to right into the event vector.
    fn fold<I>(&self, jets: I, n: usize, thresholds: &Thresholds, alt: bool) -> Result<WeightResult>
    where
        I: Iterator<Item = JetInput>,
    {
        let mut event = EventWeights::new();
        let mut per_jet = Vec::with_capacity(n);
        for (i, jet) in jets.enumerate() {
            let w = self.jet_weight_with(&jet, thresholds, alt).inspect_err(|e| {
                log::debug!("event aborted at jet {i}: {e}");
            })?;
            event.accumulate(w.nominal, &w.down, &w.up);
            per_jet.push(w.nominal);
        }
        Ok(WeightResult { event, per_jet })
    }

    /// Event and per-jet weights from column data with two discriminants per jet.
    ///
    /// All slices must have the same length. Any error aborts the event.
    pub fn compute_event_and_jet_weights(
        &self,
        pt: &[f64],
        eta: &[f64],
        weight1: &[f64],
        weight2: &[f64],
        flavor_code: &[i32],
        alternate_generator: bool,
    ) -> Result<WeightResult> {
        let n = pt.len();
        check_len("eta", eta.len(), n)?;
        check_len("weight1", weight1.len(), n)?;
        check_len("weight2", weight2.len(), n)?;
        check_len("flavor_code", flavor_code.len(), n)?;

        let jets = (0..n).map(|i| JetInput {
            pt: pt[i],
            eta: eta[i],
            flavor_code: flavor_code[i],
            weight1: weight1[i],
            weight2: weight2[i],
        });
        self.fold(jets, n, &self.thresholds, alternate_generator)
    }

    /// Single-discriminant form: the discriminant fills both slots and the
    /// first cut applies to both.
    pub fn compute_event_and_jet_weights_single(
        &self,
        pt: &[f64],
        eta: &[f64],
        weight: &[f64],
        flavor_code: &[i32],
        alternate_generator: bool,
    ) -> Result<WeightResult> {
        let n = pt.len();
        check_len("eta", eta.len(), n)?;
        check_len("weight", weight.len(), n)?;
        check_len("flavor_code", flavor_code.len(), n)?;

        let thresholds = Thresholds::single(self.thresholds.first);
        let jets = (0..n).map(|i| JetInput::new(pt[i], eta[i], flavor_code[i], weight[i]));
        self.fold(jets, n, &thresholds, alternate_generator)
    }

    /// Event and per-jet weights from jet structs.
    pub fn evaluate_jets(&self, jets: &[JetInput], alternate_generator: bool) -> Result<WeightResult> {
        self.fold(jets.iter().copied(), jets.len(), &self.thresholds, alternate_generator)
    }

    /// Weights for many events, in parallel across events.
    ///
    /// Each event is folded in input order, so results are bit-identical to
    /// calling [`evaluate_jets`](Self::evaluate_jets) per event. The first
    /// failing event fails the batch.
    pub fn compute_events<E>(&self, events: &[E], alternate_generator: bool) -> Result<Vec<WeightResult>>
    where
        E: AsRef<[JetInput]> + Sync,
    {
        events
            .par_iter()
            .map(|jets| self.evaluate_jets(jets.as_ref(), alternate_generator))
            .collect()
    }
}

fn check_len(what: &'static str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(Error::Shape { what, expected, got });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftag_core::{CalibrationHandle, CalibrationResult, Flavor, Regime, UncertaintyKind};

    /// Scale factor 1 + 0.01 * flavor index, uncertainty 0.02, except tau
    /// inefficiency, which is not calibrated.
    struct Simple;

    impl CalibrationProvider for Simple {
        fn resolve_index(
            &self,
            flavor: Flavor,
            _operating_point: &str,
            _jet_author: &str,
            regime: Regime,
        ) -> Result<CalibrationHandle> {
            if flavor == Flavor::T && regime == Regime::Inefficiency {
                return Err(Error::Lookup("no tau inefficiency".into()));
            }
            Ok(CalibrationHandle(flavor.index() as u32))
        }

        fn lookup(
            &self,
            handle: CalibrationHandle,
            _pt: f64,
            _eta: f64,
            _kind: UncertaintyKind,
        ) -> Result<CalibrationResult> {
            Ok(CalibrationResult::new(1.0 + 0.01 * handle.0 as f64, 0.02))
        }
    }

    fn engine(p: &Simple) -> WeightEngine<'_, Simple> {
        WeightEngine::new(p, EngineConfig::new("AK4", 0.5)).unwrap()
    }

    #[test]
    fn shape_mismatch_rejected_before_evaluation() {
        let p = Simple;
        let e = engine(&p);
        let err = e
            .compute_event_and_jet_weights(&[50.0, 60.0], &[0.1, 0.2], &[0.9], &[0.9, 0.9], &[5, 0], false)
            .unwrap_err();
        match err {
            Error::Shape { what, expected, got } => {
                assert_eq!((what, expected, got), ("weight1", 2, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn strict_construction_fails_on_missing() {
        let p = Simple;
        let cfg = EngineConfig::new("AK4", 0.5).require_complete_calibration(true);
        let err = WeightEngine::new(&p, cfg).err().unwrap();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("T/inefficiency"));
    }

    #[test]
    fn lenient_construction_fails_at_use() {
        let p = Simple;
        let e = engine(&p);
        assert_eq!(e.indices().missing(), vec![(Flavor::T, Regime::Inefficiency)]);
        // Tagged tau is fine, untagged tau is not.
        assert!(e.jet_weight(&JetInput::new(40.0, 0.0, 15, 0.9), false).is_ok());
        let err = e
            .compute_event_and_jet_weights_single(&[40.0, 40.0], &[0.0, 0.0], &[0.9, 0.1], &[5, 15], false)
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn single_form_matches_pair_form() {
        let p = Simple;
        let e = engine(&p);
        let pt = [45.0, 80.0, -1.0, 30.0];
        let eta = [0.2, -1.7, 0.0, 2.1];
        let w = [0.9, 0.2, 0.95, 0.7];
        let fl = [5, 4, 5, 0];
        let a = e.compute_event_and_jet_weights_single(&pt, &eta, &w, &fl, true).unwrap();
        let b = e.compute_event_and_jet_weights(&pt, &eta, &w, &w, &fl, true).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.per_jet[2], 1.0);
    }

    #[test]
    fn accessors() {
        let p = Simple;
        let e = engine(&p).with_generator_table(GeneratorCorrectionTable::builtin());
        assert_eq!(e.config().jet_author, "AK4");
        assert_eq!(e.indices().operating_point(), "0_5000");
        assert_eq!(e.thresholds(), Thresholds::single(0.5));
        assert_eq!(e.generator_table(), &GeneratorCorrectionTable::builtin());
    }
}
