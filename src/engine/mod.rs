pub mod calculate;
pub mod exact;
pub mod pot;
pub mod result;
pub mod simulation;

pub use calculate::{calculate, select_engine, CalculationMode};
pub use exact::{binomial, compute_exact};
pub use result::{CalculationResult, EngineMode, Rate, RateEntry, RateTable};
pub use simulation::{compute_simulation, compute_simulation_parallel, SimulationConfig};

use crate::deck::{build_composition, Composition, CompositionError};
use crate::input::{CardsState, DeckState, LabelState, PatternState, PotState};
use crate::pattern::PatternSet;
use pot::PotRules;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid deck: {0}")]
    Composition(#[from] CompositionError),
    #[error("simulation needs at least one trial")]
    NoTrials,
    #[error("calculation cancelled")]
    Cancelled,
}

/// Inputs of one calculation call after validation and compilation
#[derive(Debug, Clone)]
pub struct Prepared {
    pub composition: Composition,
    pub patterns: PatternSet,
    pub pots: PotRules,
}

impl Prepared {
    pub fn new(
        deck: &DeckState,
        cards: &CardsState,
        patterns: &PatternState,
        pot: &PotState,
        labels: &LabelState,
    ) -> Result<Self, CompositionError> {
        let composition = build_composition(deck, cards, pot)?;
        let patterns = PatternSet::compile(patterns, labels, &composition);
        let pots = PotRules::new(&composition, pot);
        Ok(Prepared {
            composition,
            patterns,
            pots,
        })
    }
}
