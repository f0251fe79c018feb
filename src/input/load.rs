use crate::input::types::{CardsState, DeckState, LabelState, PatternState, PotState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Everything one calculation call needs, bundled the way callers store it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub deck: DeckState,
    #[serde(default)]
    pub cards: CardsState,
    #[serde(default)]
    pub patterns: PatternState,
    #[serde(default)]
    pub pot: PotState,
    #[serde(default)]
    pub labels: LabelState,
}

impl Scenario {
    /// Load a scenario from a JSON file
    pub fn from_file(path: &str) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Display name for a pattern uid, falling back to the uid itself
    pub fn pattern_name<'a>(&'a self, uid: &'a str) -> &'a str {
        self.patterns
            .patterns
            .iter()
            .find(|p| p.uid == uid)
            .map(|p| p.name.as_str())
            .unwrap_or(uid)
    }

    pub fn label_name<'a>(&'a self, uid: &'a str) -> &'a str {
        self.labels
            .labels
            .iter()
            .find(|l| l.uid == uid)
            .map(|l| l.name.as_str())
            .unwrap_or(uid)
    }
}
