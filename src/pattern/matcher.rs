use crate::input::ConditionMode;
use crate::pattern::types::{Condition, Pattern, PatternSet};

/// Knobs that differ between callers of the shared evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// When false, `required_distinct` conditions are skipped (always pass)
    pub required_distinct: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            required_distinct: true,
        }
    }
}

/// Decide whether one pattern holds for a hand and the deck left behind.
///
/// `hand` and `deck` are count vectors indexed by kind.
pub fn pattern_matches(pattern: &Pattern, hand: &[u32], deck: &[u32], options: MatchOptions) -> bool {
    if !pattern.active || pattern.is_broken() {
        return false;
    }

    let mut required: Vec<&Condition> = Vec::new();
    let mut leave_deck: Vec<&Condition> = Vec::new();

    for condition in &pattern.conditions {
        match condition.mode {
            ConditionMode::NotDrawn => {
                if condition.candidates.iter().any(|&k| hand[k] > 0) {
                    return false;
                }
            }
            ConditionMode::RequiredDistinct => {
                if options.required_distinct {
                    let distinct = condition.candidates.iter().filter(|&&k| hand[k] > 0).count();
                    if distinct < condition.count as usize {
                        return false;
                    }
                }
            }
            ConditionMode::Required => required.push(condition),
            ConditionMode::LeaveDeck => leave_deck.push(condition),
        }
    }

    can_pack(&required, hand) && can_pack(&leave_deck, deck)
}

/// Assign `count` distinct units from `pool` to every condition, one physical
/// card per slot across all conditions.
fn can_pack(conditions: &[&Condition], pool: &[u32]) -> bool {
    if conditions.iter().all(|c| c.count == 0) {
        return true;
    }
    let mut work = pool.to_vec();
    fill_slot(conditions, 0, 0, 0, &mut work)
}

fn fill_slot(
    conditions: &[&Condition],
    cond_idx: usize,
    filled: u32,
    first_candidate: usize,
    work: &mut [u32],
) -> bool {
    let Some(condition) = conditions.get(cond_idx) else {
        return true;
    };
    if filled == condition.count {
        return fill_slot(conditions, cond_idx + 1, 0, 0, work);
    }

    let left_in_pool: u32 = condition.candidates[first_candidate..]
        .iter()
        .map(|&k| work[k])
        .sum();
    if left_in_pool < condition.count - filled {
        return false;
    }

    // Slots of one condition are interchangeable, so candidates are taken in
    // non-decreasing position to avoid retrying permutations
    for pos in first_candidate..condition.candidates.len() {
        let kind = condition.candidates[pos];
        if work[kind] == 0 {
            continue;
        }
        work[kind] -= 1;
        let packed = fill_slot(conditions, cond_idx, filled + 1, pos, work);
        work[kind] += 1;
        if packed {
            return true;
        }
    }
    false
}

/// Patterns and labels satisfied by one hand (or a union of hands)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitSet {
    patterns: Vec<bool>,
    labels: Vec<bool>,
}

impl HitSet {
    pub fn empty(set: &PatternSet) -> Self {
        HitSet {
            patterns: vec![false; set.patterns().len()],
            labels: vec![false; set.labels().len()],
        }
    }

    pub fn merge(&mut self, other: &HitSet) {
        for (a, b) in self.patterns.iter_mut().zip(&other.patterns) {
            *a |= *b;
        }
        for (a, b) in self.labels.iter_mut().zip(&other.labels) {
            *a |= *b;
        }
    }

    /// A hand succeeds when anything at all was satisfied
    pub fn is_success(&self) -> bool {
        self.patterns.iter().any(|&h| h) || self.labels.iter().any(|&h| h)
    }

    pub fn pattern_hits(&self) -> impl Iterator<Item = usize> + '_ {
        self.patterns.iter().enumerate().filter(|(_, h)| **h).map(|(i, _)| i)
    }

    pub fn label_hits(&self) -> impl Iterator<Item = usize> + '_ {
        self.labels.iter().enumerate().filter(|(_, h)| **h).map(|(i, _)| i)
    }
}

/// Evaluate every pattern against one hand/deck pair
pub fn evaluate(set: &PatternSet, hand: &[u32], deck: &[u32], options: MatchOptions) -> HitSet {
    let mut hits = HitSet::empty(set);
    for &idx in set.priority_order() {
        let pattern = &set.patterns()[idx];
        if pattern_matches(pattern, hand, deck, options) {
            hits.patterns[idx] = true;
            for &label in &pattern.labels {
                hits.labels[label] = true;
            }
        }
    }
    hits
}

/// Position in priority order of the most preferred pattern this hand meets
pub fn best_match_rank(set: &PatternSet, hand: &[u32], deck: &[u32], options: MatchOptions) -> Option<usize> {
    set.priority_order()
        .iter()
        .position(|&idx| pattern_matches(&set.patterns()[idx], hand, deck, options))
}
