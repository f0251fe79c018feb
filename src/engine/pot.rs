//! Bonus-draw card effects.
//!
//! Two pot kinds can sit in the opening hand and change it before patterns
//! are checked. The cost-based pot wins if both were drawn; only one copy is
//! spent. The exact engine cannot see the deck order, so it takes the union
//! over every addition the effect could produce (a best case, not a
//! probability). The simulation resolves both effects against the real
//! shuffled library.

use crate::deck::{Composition, KindClass};
use crate::engine::simulation::TrialState;
use crate::input::PotState;
use crate::pattern::{best_match_rank, evaluate, HitSet, MatchOptions, PatternSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProsperityRule {
    pub kind: usize,
    /// Cards revealed from the top of the deck
    pub cost: u32,
}

/// Where the pot kinds live in a composition, if they are in the deck at all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PotRules {
    pub prosperity: Option<ProsperityRule>,
    pub desires: Option<usize>,
}

impl PotRules {
    pub fn new(composition: &Composition, pot: &PotState) -> Self {
        let prosperity = composition
            .index_of_class(KindClass::Prosperity)
            .filter(|_| pot.prosperity.count > 0)
            .map(|kind| ProsperityRule {
                kind,
                cost: pot.prosperity.cost,
            });
        let desires = composition
            .index_of_class(KindClass::DesiresOrExtravagance)
            .filter(|_| pot.desires_or_extravagance.count > 0);
        PotRules { prosperity, desires }
    }

    pub fn in_play(&self) -> bool {
        self.prosperity.is_some() || self.desires.is_some()
    }
}

/// Union of pattern hits over every hand the pot effects could leave behind
pub fn resolve_exact(
    rules: &PotRules,
    set: &PatternSet,
    hand: &[u32],
    deck: &[u32],
    options: MatchOptions,
) -> HitSet {
    let mut hand = hand.to_vec();
    let mut deck = deck.to_vec();

    if let Some(rule) = rules.prosperity.filter(|r| hand[r.kind] > 0) {
        hand[rule.kind] -= 1;
        let mut hits = evaluate(set, &hand, &deck, options);
        let remaining: u32 = deck.iter().sum();
        if remaining >= rule.cost {
            for kind in 0..deck.len() {
                if deck[kind] == 0 {
                    continue;
                }
                hand[kind] += 1;
                deck[kind] -= 1;
                hits.merge(&evaluate(set, &hand, &deck, options));
                hand[kind] -= 1;
                deck[kind] += 1;
            }
        }
        return hits;
    }

    if let Some(kind) = rules.desires.filter(|&k| hand[k] > 0) {
        hand[kind] -= 1;
        let mut hits = evaluate(set, &hand, &deck, options);
        for first in 0..deck.len() {
            for second in first..deck.len() {
                let needed_first = if first == second { 2 } else { 1 };
                if deck[first] < needed_first || deck[second] == 0 {
                    continue;
                }
                hand[first] += 1;
                hand[second] += 1;
                deck[first] -= 1;
                deck[second] -= 1;
                hits.merge(&evaluate(set, &hand, &deck, options));
                hand[first] -= 1;
                hand[second] -= 1;
                deck[first] += 1;
                deck[second] += 1;
            }
        }
        return hits;
    }

    evaluate(set, &hand, &deck, options)
}

/// What a pot did during one simulated trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PotOutcome {
    Idle,
    /// Cost-based pot resolved and added the kind at this index
    Prosperity { added: usize },
    /// Cost-based pot spent but the deck was too thin to reveal
    ProsperityFizzled,
    Desires { drawn: [usize; 2] },
    DesiresFizzled,
}

/// Resolve pot effects on a dealt trial, mutating hand and library in place
pub fn resolve_simulated(
    rules: &PotRules,
    set: &PatternSet,
    state: &mut TrialState,
    options: MatchOptions,
) -> PotOutcome {
    if let Some(rule) = rules.prosperity.filter(|r| state.hand()[r.kind] > 0) {
        state.discard_from_hand(rule.kind);
        let cost = rule.cost as usize;
        if state.library_len() < cost {
            return PotOutcome::ProsperityFizzled;
        }

        let revealed = state.reveal_top(cost);
        if revealed.is_empty() {
            return PotOutcome::ProsperityFizzled;
        }
        let pos = choose_revealed(set, state, &revealed, options);
        let added = revealed[pos];
        state.add_to_hand(added);
        for (i, &kind) in revealed.iter().enumerate() {
            if i != pos {
                state.put_bottom(kind);
            }
        }
        return PotOutcome::Prosperity { added };
    }

    if let Some(kind) = rules.desires.filter(|&k| state.hand()[k] > 0) {
        state.discard_from_hand(kind);
        if state.library_len() < 2 {
            return PotOutcome::DesiresFizzled;
        }
        let drawn = state.reveal_top(2);
        for &k in &drawn {
            state.add_to_hand(k);
        }
        return PotOutcome::Desires {
            drawn: [drawn[0], drawn[1]],
        };
    }

    PotOutcome::Idle
}

/// Pick the revealed card whose addition meets the most preferred pattern;
/// ties and total misses fall back to the earliest revealed card
fn choose_revealed(set: &PatternSet, state: &TrialState, revealed: &[usize], options: MatchOptions) -> usize {
    let mut hand = state.hand().to_vec();
    // Unchosen reveals go back to the deck, so they count as remaining
    let mut deck = state.library_counts().to_vec();
    for &kind in revealed {
        deck[kind] += 1;
    }

    let mut best: Option<(usize, usize)> = None;
    for (pos, &kind) in revealed.iter().enumerate() {
        hand[kind] += 1;
        deck[kind] -= 1;
        let rank = best_match_rank(set, &hand, &deck, options);
        hand[kind] -= 1;
        deck[kind] += 1;

        if let Some(rank) = rank {
            if best.map_or(true, |(best_rank, _)| rank < best_rank) {
                best = Some((rank, pos));
            }
        }
    }
    best.map_or(0, |(_, pos)| pos)
}
