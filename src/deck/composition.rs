use crate::input::{CardsState, DeckState, PotState};
use thiserror::Error;
use tracing::debug;

pub const PROSPERITY_ID: &str = "__pot_of_prosperity__";
pub const DESIRES_ID: &str = "__pot_of_desires__";
pub const UNKNOWN_ID: &str = "__unknown__";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositionError {
    #[error("card counts add up to {explicit}, more than the deck size {deck_size}")]
    CountExceedsDeckSize { explicit: i64, deck_size: i64 },
    #[error("composition sums to {sum} but the deck size is {deck_size}")]
    CompositionChecksumMismatch { sum: i64, deck_size: i64 },
    #[error("hand size {hand_size} is outside [0, {deck_size}]")]
    InvalidHandSize { hand_size: i64, deck_size: i64 },
    #[error("deck size {deck_size} is out of range")]
    DeckSizeOutOfRange { deck_size: i64 },
    #[error("cost-based pot must reveal 3 or 6 cards, got {cost}")]
    InvalidPotCost { cost: u32 },
}

/// What a kind stands for in the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindClass {
    Card,
    /// Cost-based bonus draw
    Prosperity,
    /// Count-based bonus draw
    DesiresOrExtravagance,
    /// Every card the caller did not list
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kind {
    pub id: String,
    pub name: String,
    pub class: KindClass,
}

/// Validated deck contents: distinct kinds with their copy counts.
///
/// Kinds are addressed by index everywhere downstream. Hands and remaining
/// decks are plain count vectors parallel to `kinds()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    kinds: Vec<Kind>,
    counts: Vec<u32>,
    deck_size: u32,
    hand_size: u32,
}

impl Composition {
    pub fn kinds(&self) -> &[Kind] {
        &self.kinds
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn deck_size(&self) -> u32 {
        self.deck_size
    }

    pub fn hand_size(&self) -> u32 {
        self.hand_size
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.kinds.iter().position(|k| k.id == id)
    }

    pub fn index_of_class(&self, class: KindClass) -> Option<usize> {
        self.kinds.iter().position(|k| k.class == class)
    }

    /// One entry per physical card, holding its kind index
    pub fn flat_deck(&self) -> Vec<usize> {
        let mut deck = Vec::with_capacity(self.deck_size as usize);
        for (idx, &count) in self.counts.iter().enumerate() {
            deck.extend(std::iter::repeat(idx).take(count as usize));
        }
        deck
    }
}

fn push_kind(kinds: &mut Vec<Kind>, counts: &mut Vec<i64>, kind: Kind, count: i64) {
    // Repeated uids collapse into one kind
    if let Some(idx) = kinds.iter().position(|k| k.id == kind.id) {
        counts[idx] += count;
    } else {
        kinds.push(kind);
        counts.push(count);
    }
}

/// Build the kind -> count composition for one calculation call
pub fn build_composition(
    deck: &DeckState,
    cards: &CardsState,
    pot: &PotState,
) -> Result<Composition, CompositionError> {
    let deck_size = deck.card_count;
    let hand_size = deck.first_hand;

    let mut kinds = Vec::new();
    let mut counts: Vec<i64> = Vec::new();

    if pot.prosperity.count > 0 {
        if !matches!(pot.prosperity.cost, 3 | 6) {
            return Err(CompositionError::InvalidPotCost {
                cost: pot.prosperity.cost,
            });
        }
        let kind = Kind {
            id: PROSPERITY_ID.to_string(),
            name: "Pot of Prosperity".to_string(),
            class: KindClass::Prosperity,
        };
        push_kind(&mut kinds, &mut counts, kind, pot.prosperity.count);
    }
    if pot.desires_or_extravagance.count > 0 {
        let kind = Kind {
            id: DESIRES_ID.to_string(),
            name: "Pot of Desires / Extravagance".to_string(),
            class: KindClass::DesiresOrExtravagance,
        };
        push_kind(&mut kinds, &mut counts, kind, pot.desires_or_extravagance.count);
    }

    for card in cards.cards.iter().filter(|c| c.count > 0) {
        let kind = Kind {
            id: card.uid.clone(),
            name: card.name.clone(),
            class: KindClass::Card,
        };
        push_kind(&mut kinds, &mut counts, kind, card.count);
    }

    let explicit: i64 = counts.iter().sum();
    let unknown = deck_size - explicit;
    if unknown < 0 {
        return Err(CompositionError::CountExceedsDeckSize { explicit, deck_size });
    }
    if unknown > 0 {
        kinds.push(Kind {
            id: UNKNOWN_ID.to_string(),
            name: "Other cards".to_string(),
            class: KindClass::Unknown,
        });
        counts.push(unknown);
    }

    let sum: i64 = counts.iter().sum();
    if sum != deck_size {
        return Err(CompositionError::CompositionChecksumMismatch { sum, deck_size });
    }

    if hand_size < 0 || hand_size > deck_size {
        return Err(CompositionError::InvalidHandSize { hand_size, deck_size });
    }

    let deck_size_u32 =
        u32::try_from(deck_size).map_err(|_| CompositionError::DeckSizeOutOfRange { deck_size })?;
    // Every count is positive and bounded by the deck size at this point
    let counts: Vec<u32> = counts.into_iter().map(|c| c as u32).collect();

    debug!(
        kinds = kinds.len(),
        deck_size,
        hand_size,
        unknown,
        "built deck composition"
    );

    Ok(Composition {
        kinds,
        counts,
        deck_size: deck_size_u32,
        hand_size: hand_size as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{CardEntry, DesiresPot, ProsperityPot};

    fn cards(entries: &[(&str, i64)]) -> CardsState {
        CardsState {
            cards: entries
                .iter()
                .map(|(uid, count)| CardEntry {
                    uid: uid.to_string(),
                    name: uid.to_uppercase(),
                    count: *count,
                    memo: None,
                })
                .collect(),
        }
    }

    fn deck(card_count: i64, first_hand: i64) -> DeckState {
        DeckState { card_count, first_hand }
    }

    #[test]
    fn test_unknown_fills_gap() {
        let comp = build_composition(&deck(40, 5), &cards(&[("a", 3), ("b", 2)]), &PotState::default())
            .expect("composition should build");
        assert_eq!(comp.len(), 3);
        assert_eq!(comp.counts(), &[3, 2, 35]);
        assert_eq!(comp.kinds()[2].class, KindClass::Unknown);
        assert_eq!(comp.hand_size(), 5);
    }

    #[test]
    fn test_no_unknown_when_exact() {
        let comp = build_composition(&deck(5, 1), &cards(&[("a", 3), ("b", 2)]), &PotState::default())
            .expect("composition should build");
        assert_eq!(comp.index_of_class(KindClass::Unknown), None);
        assert_eq!(comp.counts().iter().sum::<u32>(), 5);
    }

    #[test]
    fn test_pots_come_first_and_zero_counts_are_skipped() {
        let pot = PotState {
            prosperity: ProsperityPot { count: 2, cost: 6 },
            desires_or_extravagance: DesiresPot { count: 0 },
        };
        let comp = build_composition(&deck(40, 5), &cards(&[("a", 0), ("b", 3)]), &pot)
            .expect("composition should build");
        assert_eq!(comp.index_of_class(KindClass::Prosperity), Some(0));
        assert_eq!(comp.index_of_class(KindClass::DesiresOrExtravagance), None);
        assert_eq!(comp.index_of("a"), None);
        assert_eq!(comp.index_of("b"), Some(1));
        assert_eq!(comp.counts(), &[2, 3, 35]);
    }

    #[test]
    fn test_duplicate_uids_merge() {
        let comp = build_composition(&deck(10, 2), &cards(&[("a", 1), ("a", 2)]), &PotState::default())
            .expect("composition should build");
        assert_eq!(comp.counts()[0], 3);
    }

    #[test]
    fn test_counts_exceed_deck() {
        let result = build_composition(&deck(4, 1), &cards(&[("a", 3), ("b", 2)]), &PotState::default());
        assert_eq!(
            result,
            Err(CompositionError::CountExceedsDeckSize { explicit: 5, deck_size: 4 })
        );
    }

    #[test]
    fn test_invalid_hand_size() {
        let too_big = build_composition(&deck(4, 5), &cards(&[]), &PotState::default());
        assert!(matches!(too_big, Err(CompositionError::InvalidHandSize { .. })));

        let negative = build_composition(&deck(4, -1), &cards(&[]), &PotState::default());
        assert!(matches!(negative, Err(CompositionError::InvalidHandSize { .. })));
    }

    #[test]
    fn test_prosperity_cost_must_be_three_or_six() {
        let pot = |count, cost| PotState {
            prosperity: ProsperityPot { count, cost },
            ..PotState::default()
        };
        let result = build_composition(&deck(10, 5), &cards(&[]), &pot(7, 0));
        assert_eq!(result, Err(CompositionError::InvalidPotCost { cost: 0 }));

        assert!(build_composition(&deck(10, 5), &cards(&[]), &pot(1, 3)).is_ok());
        assert!(build_composition(&deck(10, 5), &cards(&[]), &pot(1, 6)).is_ok());
        assert!(
            build_composition(&deck(10, 5), &cards(&[]), &pot(0, 0)).is_ok(),
            "cost is not checked when no pot is in the deck"
        );
    }

    #[test]
    fn test_flat_deck() {
        let comp = build_composition(&deck(4, 1), &cards(&[("a", 1), ("b", 2)]), &PotState::default())
            .expect("composition should build");
        assert_eq!(comp.flat_deck(), vec![0, 1, 1, 2]);
    }
}
