use crate::engine::pot::{resolve_simulated, PotOutcome};
use crate::engine::result::{CalculationResult, EngineMode, Rate};
use crate::engine::{EngineError, Prepared};
use crate::input::{CardsState, DeckState, LabelState, PatternState, PotState};
use crate::pattern::{evaluate, HitSet, MatchOptions, PatternSet};
use crate::rng::{GameRng, RandomSource};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

fn default_trials() -> u64 {
    100_000
}

/// Settings for the Monte-Carlo engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_trials")]
    pub trials: u64,
    /// Fixed seed for reproducible runs; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Check `required_distinct` conditions too. Off by default: the
    /// simulation has always treated them as satisfied.
    #[serde(default)]
    pub honor_required_distinct: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            trials: default_trials(),
            seed: None,
            honor_required_distinct: false,
        }
    }
}

impl SimulationConfig {
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            required_distinct: self.honor_required_distinct,
        }
    }
}

/// Hand and library of one trial. The library front is the top of the deck.
#[derive(Debug, Clone)]
pub struct TrialState {
    hand: Vec<u32>,
    library: VecDeque<usize>,
    library_counts: Vec<u32>,
}

impl TrialState {
    /// Deal the first `hand_size` cards of an already shuffled order
    pub fn from_order(order: Vec<usize>, hand_size: usize, kinds: usize) -> Self {
        let mut hand = vec![0u32; kinds];
        let mut library_counts = vec![0u32; kinds];
        let mut library = VecDeque::with_capacity(order.len());
        for (i, kind) in order.into_iter().enumerate() {
            if i < hand_size {
                hand[kind] += 1;
            } else {
                library_counts[kind] += 1;
                library.push_back(kind);
            }
        }
        TrialState {
            hand,
            library,
            library_counts,
        }
    }

    pub fn hand(&self) -> &[u32] {
        &self.hand
    }

    pub fn library_counts(&self) -> &[u32] {
        &self.library_counts
    }

    pub fn library_len(&self) -> usize {
        self.library.len()
    }

    pub fn library_order(&self) -> Vec<usize> {
        self.library.iter().copied().collect()
    }

    pub fn discard_from_hand(&mut self, kind: usize) {
        self.hand[kind] = self.hand[kind].saturating_sub(1);
    }

    pub fn add_to_hand(&mut self, kind: usize) {
        self.hand[kind] += 1;
    }

    /// Take up to `n` cards off the top of the library
    pub fn reveal_top(&mut self, n: usize) -> Vec<usize> {
        let n = n.min(self.library.len());
        let revealed: Vec<usize> = self.library.drain(..n).collect();
        for &kind in &revealed {
            self.library_counts[kind] -= 1;
        }
        revealed
    }

    pub fn put_bottom(&mut self, kind: usize) {
        self.library_counts[kind] += 1;
        self.library.push_back(kind);
    }
}

/// Raw counters of a batch of trials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrialCounts {
    pub trials: u64,
    pub success: u64,
    pub patterns: Vec<u64>,
    pub labels: Vec<u64>,
    pub prosperity_resolved: u64,
    pub desires_resolved: u64,
}

impl TrialCounts {
    fn new(set: &PatternSet) -> Self {
        TrialCounts {
            patterns: vec![0; set.patterns().len()],
            labels: vec![0; set.labels().len()],
            ..TrialCounts::default()
        }
    }

    fn record(&mut self, hits: &HitSet, outcome: PotOutcome) {
        self.trials += 1;
        if hits.is_success() {
            self.success += 1;
        }
        for idx in hits.pattern_hits() {
            self.patterns[idx] += 1;
        }
        for idx in hits.label_hits() {
            self.labels[idx] += 1;
        }
        match outcome {
            PotOutcome::Prosperity { .. } => self.prosperity_resolved += 1,
            PotOutcome::Desires { .. } => self.desires_resolved += 1,
            _ => {}
        }
    }

    pub fn merge(&mut self, other: &TrialCounts) {
        self.trials += other.trials;
        self.success += other.success;
        for (a, b) in self.patterns.iter_mut().zip(&other.patterns) {
            *a += b;
        }
        for (a, b) in self.labels.iter_mut().zip(&other.labels) {
            *a += b;
        }
        self.prosperity_resolved += other.prosperity_resolved;
        self.desires_resolved += other.desires_resolved;
    }

    pub fn into_result(self, set: &PatternSet) -> CalculationResult {
        let trials = self.trials;
        let overall = Rate::rounded_ratio(self.success, trials);
        let pattern_rates: Vec<Rate> = self.patterns.iter().map(|&c| Rate::rounded_ratio(c, trials)).collect();
        let label_rates: Vec<Rate> = self.labels.iter().map(|&c| Rate::rounded_ratio(c, trials)).collect();
        CalculationResult::from_rates(set, overall, &pattern_rates, &label_rates, EngineMode::Simulation)
    }
}

/// Run `trials` shuffles of the prepared deck and count pattern hits
pub fn run_trials<R: RandomSource>(
    prepared: &Prepared,
    trials: u64,
    options: MatchOptions,
    rng: &mut R,
    cancel: Option<&AtomicBool>,
) -> Result<TrialCounts, EngineError> {
    let set = &prepared.patterns;
    let kinds = prepared.composition.len();
    let hand_size = prepared.composition.hand_size() as usize;
    let base_deck = prepared.composition.flat_deck();

    let mut counts = TrialCounts::new(set);
    for _ in 0..trials {
        if cancel.map_or(false, |flag| flag.load(Ordering::Relaxed)) {
            return Err(EngineError::Cancelled);
        }

        let mut order = base_deck.clone();
        rng.shuffle(&mut order);
        let mut state = TrialState::from_order(order, hand_size, kinds);

        let outcome = resolve_simulated(&prepared.pots, set, &mut state, options);
        let hits = evaluate(set, state.hand(), state.library_counts(), options);
        counts.record(&hits, outcome);
    }
    Ok(counts)
}

/// Simulated success rates, sequential, with the caller's random source
pub fn simulate_prepared<R: RandomSource>(
    prepared: &Prepared,
    config: &SimulationConfig,
    rng: &mut R,
    cancel: Option<&AtomicBool>,
) -> Result<CalculationResult, EngineError> {
    if config.trials == 0 {
        return Err(EngineError::NoTrials);
    }
    if !prepared.patterns.has_active() {
        return Ok(CalculationResult::zero(&prepared.patterns, EngineMode::Simulation));
    }

    let counts = run_trials(prepared, config.trials, config.match_options(), rng, cancel)?;
    debug!(
        trials = counts.trials,
        success = counts.success,
        prosperity_resolved = counts.prosperity_resolved,
        desires_resolved = counts.desires_resolved,
        "simulation finished"
    );

    let result = counts.into_result(&prepared.patterns);
    info!(mode = "simulation", overall = %result.overall_probability, "calculation finished");
    Ok(result)
}

/// Monte-Carlo estimate of the success rates from an unseeded generator
pub fn compute_simulation(
    deck: &DeckState,
    cards: &CardsState,
    patterns: &PatternState,
    pot: &PotState,
    labels: &LabelState,
    trials: u64,
) -> Result<CalculationResult, EngineError> {
    let prepared = Prepared::new(deck, cards, patterns, pot, labels)?;
    let config = SimulationConfig {
        trials,
        ..SimulationConfig::default()
    };
    let mut rng = GameRng::new(None);
    simulate_prepared(&prepared, &config, &mut rng, None)
}

/// Split the trials into `chunks` independently seeded batches run on the
/// rayon pool. Fixed seed and chunk count give the same result every time.
pub fn compute_simulation_parallel(
    prepared: &Prepared,
    config: &SimulationConfig,
    chunks: usize,
    on_chunk_done: &(dyn Fn() + Sync),
    cancel: Option<&AtomicBool>,
) -> Result<CalculationResult, EngineError> {
    if config.trials == 0 {
        return Err(EngineError::NoTrials);
    }
    if !prepared.patterns.has_active() {
        return Ok(CalculationResult::zero(&prepared.patterns, EngineMode::Simulation));
    }

    let chunks = (chunks.max(1) as u64).min(config.trials);
    let base_seed = config.seed.unwrap_or_else(|| GameRng::new(None).seed());
    let per_chunk = config.trials / chunks;
    let extra = config.trials % chunks;
    let options = config.match_options();

    let batches: Vec<TrialCounts> = (0..chunks)
        .into_par_iter()
        .map(|i| {
            let trials = per_chunk + u64::from(i < extra);
            let mut rng = GameRng::new(Some(base_seed.wrapping_add(i)));
            let counts = run_trials(prepared, trials, options, &mut rng, cancel);
            on_chunk_done();
            counts
        })
        .collect::<Result<_, _>>()?;

    let mut total = TrialCounts::new(&prepared.patterns);
    for batch in &batches {
        total.merge(batch);
    }
    debug!(
        trials = total.trials,
        chunks,
        base_seed,
        prosperity_resolved = total.prosperity_resolved,
        desires_resolved = total.desires_resolved,
        "parallel simulation finished"
    );

    let result = total.into_result(&prepared.patterns);
    info!(mode = "simulation", overall = %result.overall_probability, "calculation finished");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::exact::exact_from_prepared;
    use crate::input::{CardEntry, ConditionEntry, ConditionMode, LabelEntry, LabelRef, PatternEntry, ProsperityPot};

    fn prepared(deck: (i64, i64), cards: &[(&str, i64)], patterns: Vec<PatternEntry>, pot: PotState) -> Prepared {
        let cards = CardsState {
            cards: cards
                .iter()
                .map(|(uid, count)| CardEntry {
                    uid: uid.to_string(),
                    name: uid.to_string(),
                    count: *count,
                    memo: None,
                })
                .collect(),
        };
        let labels = LabelState {
            labels: vec![LabelEntry { uid: "l".into(), name: "L".into(), memo: None }],
        };
        Prepared::new(
            &DeckState { card_count: deck.0, first_hand: deck.1 },
            &cards,
            &PatternState { patterns },
            &pot,
            &labels,
        )
        .expect("inputs should be valid")
    }

    fn pattern(uid: &str, mode: ConditionMode, kinds: &[&str], count: i64) -> PatternEntry {
        PatternEntry {
            uid: uid.into(),
            name: uid.into(),
            conditions: vec![ConditionEntry {
                uids: kinds.iter().map(|k| k.to_string()).collect(),
                count,
                mode,
                invalid: false,
            }],
            labels: vec![LabelRef { uid: "l".into() }],
            priority: 0,
            active: true,
            expanded: false,
            memo: String::new(),
        }
    }

    fn seeded(trials: u64, seed: u64) -> SimulationConfig {
        SimulationConfig {
            trials,
            seed: Some(seed),
            honor_required_distinct: false,
        }
    }

    #[test]
    fn test_trial_state_deal() {
        let state = TrialState::from_order(vec![2, 0, 1, 1, 2], 2, 3);
        assert_eq!(state.hand(), &[1, 0, 1]);
        assert_eq!(state.library_counts(), &[0, 2, 1]);
        assert_eq!(state.library_order(), vec![1, 1, 2]);
    }

    #[test]
    fn test_reveal_and_bottom() {
        let mut state = TrialState::from_order(vec![0, 1, 2, 3], 1, 4);
        let revealed = state.reveal_top(2);
        assert_eq!(revealed, vec![1, 2]);
        state.put_bottom(1);
        assert_eq!(state.library_order(), vec![3, 1]);
        assert_eq!(state.library_counts(), &[0, 1, 0, 1]);
    }

    #[test]
    fn test_same_seed_same_result() {
        let prep = prepared((40, 5), &[("a", 3)], vec![pattern("p", ConditionMode::Required, &["a"], 1)], PotState::default());
        let config = seeded(2_000, 12345);
        let first = simulate_prepared(&prep, &config, &mut GameRng::new(config.seed), None).expect("simulation runs");
        let second = simulate_prepared(&prep, &config, &mut GameRng::new(config.seed), None).expect("simulation runs");
        assert_eq!(first, second);
        assert_eq!(first.mode, Some(EngineMode::Simulation));
    }

    #[test]
    fn test_certain_and_impossible_patterns() {
        let patterns = vec![
            pattern("always", ConditionMode::Required, &["a"], 5),
            pattern("never", ConditionMode::NotDrawn, &["a"], 0),
        ];
        let prep = prepared((5, 5), &[("a", 5)], patterns, PotState::default());
        let result = simulate_prepared(&prep, &seeded(200, 1), &mut GameRng::new(Some(1)), None).expect("simulation runs");
        assert_eq!(result.pattern_success_rates.get("always"), Some(Rate::CERTAIN));
        assert_eq!(result.pattern_success_rates.get("never"), Some(Rate::ZERO));
        assert_eq!(result.label_success_rates.get("l"), Some(Rate::CERTAIN));
    }

    #[test]
    fn test_converges_to_exact() {
        let patterns = vec![
            pattern("one", ConditionMode::Required, &["a", "b"], 1),
            pattern("two", ConditionMode::Required, &["a"], 2),
        ];
        let prep = prepared((40, 5), &[("a", 3), ("b", 3), ("c", 9)], patterns, PotState::default());
        let exact = exact_from_prepared(&prep);
        let simulated = simulate_prepared(&prep, &seeded(200_000, 7), &mut GameRng::new(Some(7)), None)
            .expect("simulation runs");

        for id in ["one", "two"] {
            let e = exact.pattern_success_rates.get(id).expect("exact rate").as_percent();
            let s = simulated.pattern_success_rates.get(id).expect("simulated rate").as_percent();
            assert!((e - s).abs() < 1.0, "{}: exact {} vs simulated {}", id, e, s);
        }
    }

    #[test]
    fn test_required_distinct_ignored_unless_enabled() {
        // Hand of 2 from {a, a, a, b}: drawing both kinds is not guaranteed
        let prep = prepared(
            (4, 2),
            &[("a", 3), ("b", 1)],
            vec![pattern("distinct", ConditionMode::RequiredDistinct, &["a", "b"], 2)],
            PotState::default(),
        );
        let ignored = simulate_prepared(&prep, &seeded(500, 3), &mut GameRng::new(Some(3)), None).expect("simulation runs");
        assert_eq!(ignored.overall_probability, Rate::CERTAIN, "simulation skips required_distinct by default");

        let mut config = seeded(20_000, 3);
        config.honor_required_distinct = true;
        let honored = simulate_prepared(&prep, &config, &mut GameRng::new(Some(3)), None).expect("simulation runs");
        // Exact value is 3/6 == 50%
        assert!((honored.overall_probability.as_percent() - 50.0).abs() < 2.0);
        assert_eq!(exact_from_prepared(&prep).overall_probability.to_string(), "50.00");
    }

    #[test]
    fn test_prosperity_lifts_rate() {
        let patterns = vec![pattern("p", ConditionMode::Required, &["a"], 1)];
        let plain = prepared((40, 5), &[("a", 3)], patterns.clone(), PotState::default());
        let pot = PotState {
            prosperity: ProsperityPot { count: 3, cost: 6 },
            ..PotState::default()
        };
        let with_pot = prepared((40, 5), &[("a", 3)], patterns, pot);

        let base = simulate_prepared(&plain, &seeded(20_000, 9), &mut GameRng::new(Some(9)), None).expect("simulation runs");
        let boosted = simulate_prepared(&with_pot, &seeded(20_000, 9), &mut GameRng::new(Some(9)), None).expect("simulation runs");
        assert!(boosted.overall_probability > base.overall_probability);
    }

    #[test]
    fn test_zero_trials_rejected() {
        let prep = prepared((40, 5), &[("a", 3)], vec![pattern("p", ConditionMode::Required, &["a"], 1)], PotState::default());
        let result = simulate_prepared(&prep, &seeded(0, 1), &mut GameRng::new(Some(1)), None);
        assert_eq!(result, Err(EngineError::NoTrials));
    }

    #[test]
    fn test_cancelled_before_first_trial() {
        let prep = prepared((40, 5), &[("a", 3)], vec![pattern("p", ConditionMode::Required, &["a"], 1)], PotState::default());
        let cancel = AtomicBool::new(true);
        let result = simulate_prepared(&prep, &seeded(100, 1), &mut GameRng::new(Some(1)), Some(&cancel));
        assert_eq!(result, Err(EngineError::Cancelled));
    }

    #[test]
    fn test_parallel_is_reproducible() {
        let prep = prepared((40, 5), &[("a", 3), ("b", 2)], vec![pattern("p", ConditionMode::Required, &["a", "b"], 1)], PotState::default());
        let config = seeded(10_001, 42);
        let first = compute_simulation_parallel(&prep, &config, 4, &|| {}, None).expect("simulation runs");
        let second = compute_simulation_parallel(&prep, &config, 4, &|| {}, None).expect("simulation runs");
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_match_entries_still_listed() {
        let prep = prepared((40, 5), &[("a", 3)], vec![pattern("p", ConditionMode::Required, &["a"], 4)], PotState::default());
        let result = simulate_prepared(&prep, &seeded(100, 5), &mut GameRng::new(Some(5)), None).expect("simulation runs");
        assert_eq!(result.pattern_success_rates.get("p"), Some(Rate::ZERO));
        assert_eq!(result.label_success_rates.get("l"), Some(Rate::ZERO));
    }
}
