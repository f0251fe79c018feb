pub mod deck;
pub mod engine;
pub mod input;
pub mod pattern;
pub mod rng;


pub use engine::{
    calculate, compute_exact, compute_simulation, CalculationMode, CalculationResult, EngineError,
    EngineMode, Rate, SimulationConfig,
};
pub use input::Scenario;
