use serde::{Deserialize, Serialize};

/// Deck size and opening hand size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckState {
    pub card_count: i64,
    pub first_hand: i64,
}

/// One explicitly tracked card and how many copies the deck runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardEntry {
    pub uid: String,
    pub name: String,
    #[serde(default)]
    pub count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardsState {
    #[serde(default)]
    pub cards: Vec<CardEntry>,
}

/// How a condition reads the hand (or the remaining deck)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionMode {
    /// At least `count` cards drawn from the candidates
    Required,
    /// At least `count` different candidates drawn
    RequiredDistinct,
    /// At least `count` candidate cards still in the deck
    LeaveDeck,
    /// None of the candidates drawn
    NotDrawn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEntry {
    #[serde(default)]
    pub uids: Vec<String>,
    #[serde(default)]
    pub count: i64,
    pub mode: ConditionMode,
    #[serde(default)]
    pub invalid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRef {
    pub uid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub uid: String,
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<ConditionEntry>,
    #[serde(default)]
    pub labels: Vec<LabelRef>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default = "default_active")]
    pub active: bool,
    // UI-only state, carried so records round-trip unchanged
    #[serde(default)]
    pub expanded: bool,
    #[serde(default)]
    pub memo: String,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternState {
    #[serde(default)]
    pub patterns: Vec<PatternEntry>,
}

/// Cost-based bonus draw: banish `cost` cards from the extra deck, reveal
/// that many from the top of the deck and add one of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProsperityPot {
    #[serde(default)]
    pub count: i64,
    #[serde(default = "default_prosperity_cost")]
    pub cost: u32,
}

fn default_prosperity_cost() -> u32 {
    6
}

impl Default for ProsperityPot {
    fn default() -> Self {
        ProsperityPot {
            count: 0,
            cost: default_prosperity_cost(),
        }
    }
}

/// Count-based bonus draw: draw two more cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiresPot {
    #[serde(default)]
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotState {
    #[serde(default)]
    pub prosperity: ProsperityPot,
    #[serde(default)]
    pub desires_or_extravagance: DesiresPot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub uid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelState {
    #[serde(default)]
    pub labels: Vec<LabelEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pot_state_camel_case() {
        let json = r#"{"prosperity":{"count":2,"cost":3},"desiresOrExtravagance":{"count":1}}"#;
        let pot: PotState = serde_json::from_str(json).expect("pot should parse");
        assert_eq!(pot.prosperity.count, 2);
        assert_eq!(pot.prosperity.cost, 3);
        assert_eq!(pot.desires_or_extravagance.count, 1);
    }

    #[test]
    fn test_condition_mode_names() {
        let json = r#"[{"uids":["a"],"count":1,"mode":"required_distinct"},
                      {"uids":[],"count":0,"mode":"leave_deck","invalid":true}]"#;
        let conditions: Vec<ConditionEntry> = serde_json::from_str(json).expect("conditions should parse");
        assert_eq!(conditions[0].mode, ConditionMode::RequiredDistinct);
        assert!(!conditions[0].invalid);
        assert_eq!(conditions[1].mode, ConditionMode::LeaveDeck);
        assert!(conditions[1].invalid);
    }

    #[test]
    fn test_pattern_defaults() {
        let json = r#"{"uid":"p1","name":"Starter"}"#;
        let pattern: PatternEntry = serde_json::from_str(json).expect("pattern should parse");
        assert!(pattern.active, "patterns are active unless disabled");
        assert_eq!(pattern.priority, 0);
        assert!(pattern.conditions.is_empty());
    }
}
