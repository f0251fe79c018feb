pub mod matcher;
pub mod types;

pub use matcher::{best_match_rank, evaluate, pattern_matches, HitSet, MatchOptions};
pub use types::{Condition, LabelInfo, Pattern, PatternSet};
