use crate::deck::Composition;
use crate::input::{ConditionMode, LabelState, PatternState};

/// A condition with its candidate uids resolved to kind indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub mode: ConditionMode,
    pub count: u32,
    pub candidates: Vec<usize>,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub id: String,
    pub name: String,
    pub active: bool,
    /// Lower wins when a bonus draw has to pick one card
    pub priority: i64,
    pub conditions: Vec<Condition>,
    /// Indices into the owning set's label table
    pub labels: Vec<usize>,
}

impl Pattern {
    /// True if any condition was flagged invalid upstream
    pub fn is_broken(&self) -> bool {
        self.conditions.iter().any(|c| !c.valid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelInfo {
    pub id: String,
    pub name: String,
}

/// All patterns of one calculation call, compiled against a composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
    labels: Vec<LabelInfo>,
    priority_order: Vec<usize>,
}

impl PatternSet {
    pub fn compile(patterns: &PatternState, labels: &LabelState, composition: &Composition) -> Self {
        let labels: Vec<LabelInfo> = labels
            .labels
            .iter()
            .map(|l| LabelInfo {
                id: l.uid.clone(),
                name: l.name.clone(),
            })
            .collect();

        let compiled: Vec<Pattern> = patterns
            .patterns
            .iter()
            .map(|p| {
                let conditions = p
                    .conditions
                    .iter()
                    .map(|c| {
                        let mut candidates: Vec<usize> = Vec::new();
                        // Cards with zero copies have no kind and can never be drawn
                        for idx in c.uids.iter().filter_map(|uid| composition.index_of(uid)) {
                            if !candidates.contains(&idx) {
                                candidates.push(idx);
                            }
                        }
                        Condition {
                            mode: c.mode,
                            count: c.count.max(0) as u32,
                            candidates,
                            valid: !c.invalid,
                        }
                    })
                    .collect();

                let mut label_idx: Vec<usize> = Vec::new();
                for l in &p.labels {
                    if let Some(idx) = labels.iter().position(|info| info.id == l.uid) {
                        if !label_idx.contains(&idx) {
                            label_idx.push(idx);
                        }
                    }
                }

                Pattern {
                    id: p.uid.clone(),
                    name: p.name.clone(),
                    active: p.active,
                    priority: p.priority,
                    conditions,
                    labels: label_idx,
                }
            })
            .collect();

        Self::from_parts(compiled, labels)
    }

    /// Assemble a set from already-resolved patterns
    pub fn from_parts(patterns: Vec<Pattern>, labels: Vec<LabelInfo>) -> Self {
        let mut priority_order: Vec<usize> = (0..patterns.len())
            .filter(|&i| patterns[i].active)
            .collect();
        // Stable sort keeps list order among equal priorities
        priority_order.sort_by_key(|&i| patterns[i].priority);

        PatternSet {
            patterns,
            labels,
            priority_order,
        }
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn labels(&self) -> &[LabelInfo] {
        &self.labels
    }

    /// Active pattern indices, ascending priority then list order
    pub fn priority_order(&self) -> &[usize] {
        &self.priority_order
    }

    pub fn has_active(&self) -> bool {
        !self.priority_order.is_empty()
    }
}
