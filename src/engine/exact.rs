use crate::deck::CompositionError;
use crate::engine::pot::resolve_exact;
use crate::engine::result::{CalculationResult, EngineMode, Rate};
use crate::engine::Prepared;
use crate::input::{CardsState, DeckState, LabelState, PatternState, PotState};
use crate::pattern::{HitSet, MatchOptions};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// `C(n, k)` in product form, using `C(n, k) == C(n, n - k)`
pub fn binomial(n: u64, k: u64) -> BigUint {
    if k > n {
        return BigUint::zero();
    }
    let k = k.min(n - k);
    let mut result = BigUint::one();
    for i in 0..k {
        // result holds C(n, i) here, so the division is exact
        result *= n - i;
        result /= i + 1;
    }
    result
}

/// Weighted success counts for a subtree of the enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tally {
    success: BigUint,
    patterns: Vec<BigUint>,
    labels: Vec<BigUint>,
}

impl Tally {
    fn zero(patterns: usize, labels: usize) -> Self {
        Tally {
            success: BigUint::zero(),
            patterns: vec![BigUint::zero(); patterns],
            labels: vec![BigUint::zero(); labels],
        }
    }

    fn from_hits(hits: &HitSet, patterns: usize, labels: usize) -> Self {
        let mut tally = Tally::zero(patterns, labels);
        if hits.is_success() {
            tally.success = BigUint::one();
        }
        for idx in hits.pattern_hits() {
            tally.patterns[idx] = BigUint::one();
        }
        for idx in hits.label_hits() {
            tally.labels[idx] = BigUint::one();
        }
        tally
    }

    fn add_scaled(&mut self, other: &Tally, weight: &BigUint) {
        if other.success.is_zero() {
            // Nothing matched anywhere below; every other counter is zero too
            return;
        }
        self.success += &other.success * weight;
        for (a, b) in self.patterns.iter_mut().zip(&other.patterns) {
            *a += b * weight;
        }
        for (a, b) in self.labels.iter_mut().zip(&other.labels) {
            *a += b * weight;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    kind: usize,
    slots: u32,
    hand: Vec<u32>,
}

/// Subtree results for one top-level call; never shared between calls.
/// The key carries the whole hand, which already fixes `kind` and `slots`,
/// so a single enumeration never repeats a key and `hits` stays at zero.
#[derive(Debug, Default)]
struct MemoCache {
    entries: HashMap<MemoKey, Tally>,
    hits: u64,
}

impl MemoCache {
    fn get(&mut self, key: &MemoKey) -> Option<Tally> {
        let found = self.entries.get(key).cloned();
        if found.is_some() {
            self.hits += 1;
        }
        found
    }

    fn insert(&mut self, key: MemoKey, tally: Tally) {
        self.entries.insert(key, tally);
    }
}

/// Depth-first enumeration of hand compositions, one kind at a time
struct ExactSearch<'a> {
    prepared: &'a Prepared,
    options: MatchOptions,
    /// `weights[kind][draw] == C(count(kind), draw)`
    weights: Vec<Vec<BigUint>>,
    /// Cards left in kinds `kind..`
    suffix_counts: Vec<u32>,
    memo: MemoCache,
    leaves: u64,
}

impl<'a> ExactSearch<'a> {
    fn new(prepared: &'a Prepared) -> Self {
        let counts = prepared.composition.counts();
        let hand_size = prepared.composition.hand_size();

        let weights: Vec<Vec<BigUint>> = counts
            .iter()
            .map(|&n| {
                (0..=n.min(hand_size))
                    .map(|k| binomial(n as u64, k as u64))
                    .collect()
            })
            .collect();

        let mut suffix_counts = vec![0u32; counts.len() + 1];
        for kind in (0..counts.len()).rev() {
            suffix_counts[kind] = suffix_counts[kind + 1] + counts[kind];
        }

        ExactSearch {
            prepared,
            options: MatchOptions::default(),
            weights,
            suffix_counts,
            memo: MemoCache::default(),
            leaves: 0,
        }
    }

    fn empty_tally(&self) -> Tally {
        let set = &self.prepared.patterns;
        Tally::zero(set.patterns().len(), set.labels().len())
    }

    fn count_from(&mut self, kind: usize, slots: u32, hand: &mut [u32]) -> Tally {
        if slots == 0 {
            return self.evaluate_leaf(hand);
        }
        if kind == hand.len() || self.suffix_counts[kind] < slots {
            return self.empty_tally();
        }

        let key = MemoKey {
            kind,
            slots,
            hand: hand.to_vec(),
        };
        if let Some(tally) = self.memo.get(&key) {
            return tally;
        }

        let available = self.prepared.composition.counts()[kind];
        let mut acc = self.empty_tally();
        for draw in 0..=slots.min(available) {
            hand[kind] = draw;
            let sub = self.count_from(kind + 1, slots - draw, hand);
            acc.add_scaled(&sub, &self.weights[kind][draw as usize]);
        }
        hand[kind] = 0;

        self.memo.insert(key, acc.clone());
        acc
    }

    fn evaluate_leaf(&mut self, hand: &[u32]) -> Tally {
        self.leaves += 1;
        let deck: Vec<u32> = self
            .prepared
            .composition
            .counts()
            .iter()
            .zip(hand)
            .map(|(&total, &drawn)| total - drawn)
            .collect();
        let set = &self.prepared.patterns;
        let hits = resolve_exact(&self.prepared.pots, set, hand, &deck, self.options);
        Tally::from_hits(&hits, set.patterns().len(), set.labels().len())
    }
}

/// Exact success rates over every possible opening hand
pub fn compute_exact(
    deck: &DeckState,
    cards: &CardsState,
    patterns: &PatternState,
    pot: &PotState,
    labels: &LabelState,
) -> Result<CalculationResult, CompositionError> {
    let prepared = Prepared::new(deck, cards, patterns, pot, labels)?;
    Ok(exact_from_prepared(&prepared))
}

pub fn exact_from_prepared(prepared: &Prepared) -> CalculationResult {
    let set = &prepared.patterns;
    if !set.has_active() && !prepared.pots.in_play() {
        return CalculationResult::zero(set, EngineMode::Exact);
    }
    if prepared.pots.prosperity.is_some() {
        warn!("exact engine running with the cost-based pot in the deck; its branch is a best-case bound");
    }

    let composition = &prepared.composition;
    let total = binomial(composition.deck_size() as u64, composition.hand_size() as u64);
    if total.is_zero() {
        return CalculationResult::zero(set, EngineMode::Exact);
    }

    let mut search = ExactSearch::new(prepared);
    let mut hand = vec![0u32; composition.len()];
    let tally = search.count_from(0, composition.hand_size(), &mut hand);

    debug!(
        kinds = composition.len(),
        leaves = search.leaves,
        memo_entries = search.memo.entries.len(),
        memo_hits = search.memo.hits,
        total_hands = %total,
        "exact enumeration finished"
    );

    let overall = Rate::floor_ratio(&tally.success, &total);
    let pattern_rates: Vec<Rate> = tally.patterns.iter().map(|c| Rate::floor_ratio(c, &total)).collect();
    let label_rates: Vec<Rate> = tally.labels.iter().map(|c| Rate::floor_ratio(c, &total)).collect();

    info!(mode = "exact", overall = %overall, "calculation finished");
    CalculationResult::from_rates(set, overall, &pattern_rates, &label_rates, EngineMode::Exact)
}
