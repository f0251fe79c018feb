use crate::engine::exact::exact_from_prepared;
use crate::engine::result::{CalculationResult, EngineMode};
use crate::engine::simulation::{simulate_prepared, SimulationConfig};
use crate::engine::{EngineError, Prepared};
use crate::input::{PotState, Scenario};
use crate::rng::GameRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which engine the caller asks for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CalculationMode {
    /// Simulation when the cost-based pot is in the deck, exact otherwise
    #[default]
    Auto,
    Exact,
    Simulation,
}

/// Resolve a requested mode to the engine that will actually run
pub fn select_engine(pot: &PotState, mode: CalculationMode) -> EngineMode {
    match mode {
        CalculationMode::Exact => EngineMode::Exact,
        CalculationMode::Simulation => EngineMode::Simulation,
        CalculationMode::Auto if pot.prosperity.count > 0 => EngineMode::Simulation,
        CalculationMode::Auto => EngineMode::Exact,
    }
}

/// Run one calculation call on a scenario
pub fn calculate(
    scenario: &Scenario,
    mode: CalculationMode,
    config: &SimulationConfig,
) -> Result<CalculationResult, EngineError> {
    let prepared = Prepared::new(
        &scenario.deck,
        &scenario.cards,
        &scenario.patterns,
        &scenario.pot,
        &scenario.labels,
    )?;

    let engine = select_engine(&scenario.pot, mode);
    debug!(requested = ?mode, engine = %engine, "engine selected");

    match engine {
        EngineMode::Exact => Ok(exact_from_prepared(&prepared)),
        EngineMode::Simulation => {
            let mut rng = GameRng::new(config.seed);
            simulate_prepared(&prepared, config, &mut rng, None)
        }
    }
}
