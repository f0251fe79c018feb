pub mod load;
pub mod types;

pub use load::{Scenario, ScenarioError};
pub use types::{
    CardEntry, CardsState, ConditionEntry, ConditionMode, DeckState, DesiresPot, LabelEntry,
    LabelRef, LabelState, PatternEntry, PatternState, PotState, ProsperityPot,
};
