//! Resource deck and the visible draw window.
//!
//! The deck is a closed cycle: every card that leaves the visible window
//! (placed on the board or swapped by a Factory substitution) goes back to
//! the tail, and the head of the deck refills the emptied slot. Cards are
//! never created or destroyed after the deck is built.

use crate::board::Resource;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Number of face-up resource slots
pub const VISIBLE_SLOTS: usize = 3;

/// Copies of each resource kind in the standard deck
pub const DEFAULT_COPIES_PER_KIND: usize = 15;

/// Largest deck that will be built
pub const MAX_DECK_CARDS: usize = 100_000;

/// Errors raised by deck operations
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DeckError {
    #[error("Deck of {0} cards cannot fill {VISIBLE_SLOTS} visible slots")]
    TooSmall(usize),

    #[error("{0} copies per kind exceeds the {MAX_DECK_CARDS}-card deck limit")]
    TooLarge(usize),

    #[error("Invalid visible slot {0}")]
    InvalidSlot(usize),
}

/// Deck construction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Copies of each resource kind
    pub copies_per_kind: usize,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            copies_per_kind: DEFAULT_COPIES_PER_KIND,
        }
    }
}

impl DeckConfig {
    /// Total cards a deck built from this config holds
    pub fn total_cards(&self) -> Result<usize, DeckError> {
        deck_size(Resource::ALL.len(), self.copies_per_kind)
    }
}

fn deck_size(kinds: usize, copies_per_kind: usize) -> Result<usize, DeckError> {
    kinds
        .checked_mul(copies_per_kind)
        .filter(|total| *total <= MAX_DECK_CARDS)
        .ok_or(DeckError::TooLarge(copies_per_kind))
}

/// Build a uniformly shuffled deck with `copies_per_kind` of each kind
pub fn new_deck<R: Rng>(
    kinds: &[Resource],
    copies_per_kind: usize,
    rng: &mut R,
) -> Result<Vec<Resource>, DeckError> {
    let mut deck = Vec::with_capacity(deck_size(kinds.len(), copies_per_kind)?);
    for kind in kinds {
        deck.extend(std::iter::repeat(*kind).take(copies_per_kind));
    }
    // Fisher-Yates
    deck.shuffle(rng);
    Ok(deck)
}

/// The remaining deck plus the three face-up slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDeck {
    remaining: VecDeque<Resource>,
    visible: [Resource; VISIBLE_SLOTS],
}

impl ResourceDeck {
    /// Shuffle a fresh deck and deal the visible window from its head
    pub fn shuffled<R: Rng>(config: &DeckConfig, rng: &mut R) -> Result<Self, DeckError> {
        Self::from_cards(new_deck(&Resource::ALL, config.copies_per_kind, rng)?)
    }

    /// Split an already-ordered card sequence into visible window and deck
    pub fn from_cards(cards: Vec<Resource>) -> Result<Self, DeckError> {
        if cards.len() < VISIBLE_SLOTS {
            return Err(DeckError::TooSmall(cards.len()));
        }
        let mut remaining: VecDeque<Resource> = cards.into();
        let mut visible = [Resource::Wood; VISIBLE_SLOTS];
        for slot in visible.iter_mut() {
            *slot = remaining.pop_front().ok_or(DeckError::TooSmall(0))?;
        }
        Ok(Self { remaining, visible })
    }

    pub fn visible(&self) -> &[Resource; VISIBLE_SLOTS] {
        &self.visible
    }

    /// Card face-up in a slot
    pub fn visible_at(&self, slot: usize) -> Result<Resource, DeckError> {
        self.visible
            .get(slot)
            .copied()
            .ok_or(DeckError::InvalidSlot(slot))
    }

    /// Cards not yet visible, head first
    pub fn remaining(&self) -> impl Iterator<Item = Resource> + '_ {
        self.remaining.iter().copied()
    }

    pub fn remaining_len(&self) -> usize {
        self.remaining.len()
    }

    /// Total cards in circulation (remaining + visible)
    pub fn total_len(&self) -> usize {
        self.remaining.len() + VISIBLE_SLOTS
    }

    /// Refill `slot` from the deck head and recycle `consumed` to the tail.
    ///
    /// `consumed` goes in before the head is taken, so a deck with no
    /// remaining cards hands the same card straight back.
    pub fn draw_replace(&mut self, slot: usize, consumed: Resource) -> Result<Resource, DeckError> {
        if slot >= VISIBLE_SLOTS {
            return Err(DeckError::InvalidSlot(slot));
        }
        self.remaining.push_back(consumed);
        let next = self
            .remaining
            .pop_front()
            .ok_or(DeckError::TooSmall(0))?;
        self.visible[slot] = next;
        Ok(next)
    }

    /// Count of each kind across remaining deck and visible window
    pub fn counts(&self) -> [usize; 5] {
        let mut counts = [0; 5];
        for card in self.remaining.iter().chain(self.visible.iter()) {
            counts[*card as usize] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_standard_deck_size() {
        let mut rng = StdRng::seed_from_u64(7);
        let deck = new_deck(&Resource::ALL, DEFAULT_COPIES_PER_KIND, &mut rng).unwrap();
        assert_eq!(deck.len(), 75);
        for kind in Resource::ALL {
            assert_eq!(deck.iter().filter(|r| **r == kind).count(), 15);
        }
    }

    #[test]
    fn test_empty_deck_is_allowed_but_cannot_deal() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(new_deck(&Resource::ALL, 0, &mut rng).unwrap().is_empty());
        let config = DeckConfig { copies_per_kind: 0 };
        assert_eq!(
            ResourceDeck::shuffled(&config, &mut rng),
            Err(DeckError::TooSmall(0))
        );
    }

    #[test]
    fn test_oversized_deck_is_rejected() {
        let mut rng = StdRng::seed_from_u64(7);
        let huge = usize::MAX / 2;
        assert_eq!(
            new_deck(&Resource::ALL, huge, &mut rng),
            Err(DeckError::TooLarge(huge))
        );
        let config = DeckConfig { copies_per_kind: huge };
        assert_eq!(config.total_cards(), Err(DeckError::TooLarge(huge)));
        assert_eq!(
            ResourceDeck::shuffled(&config, &mut rng),
            Err(DeckError::TooLarge(huge))
        );

        let limit = MAX_DECK_CARDS / Resource::ALL.len();
        let config = DeckConfig { copies_per_kind: limit };
        assert_eq!(config.total_cards(), Ok(MAX_DECK_CARDS));
        let config = DeckConfig { copies_per_kind: limit + 1 };
        assert_eq!(config.total_cards(), Err(DeckError::TooLarge(limit + 1)));
    }

    #[test]
    fn test_shuffle_is_seed_deterministic() {
        let a = new_deck(&Resource::ALL, 15, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = new_deck(&Resource::ALL, 15, &mut StdRng::seed_from_u64(42)).unwrap();
        let c = new_deck(&Resource::ALL, 15, &mut StdRng::seed_from_u64(43)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_deal_splits_visible_and_remaining() {
        let mut rng = StdRng::seed_from_u64(1);
        let deck = ResourceDeck::shuffled(&DeckConfig::default(), &mut rng).unwrap();
        assert_eq!(deck.remaining_len() + VISIBLE_SLOTS, 75);
        assert_eq!(deck.total_len(), 75);
    }

    #[test]
    fn test_draw_replace_cycles_card() {
        use Resource::*;
        let mut deck = ResourceDeck::from_cards(vec![Wood, Stone, Glass, Brick, Wheat]).unwrap();
        assert_eq!(deck.visible(), &[Wood, Stone, Glass]);

        let next = deck.draw_replace(1, Stone).unwrap();
        assert_eq!(next, Brick);
        assert_eq!(deck.visible(), &[Wood, Brick, Glass]);
        assert_eq!(deck.remaining().collect::<Vec<_>>(), vec![Wheat, Stone]);
    }

    #[test]
    fn test_draw_replace_invalid_slot() {
        use Resource::*;
        let mut deck = ResourceDeck::from_cards(vec![Wood, Stone, Glass, Brick]).unwrap();
        let before = deck.clone();
        assert_eq!(deck.draw_replace(3, Wood), Err(DeckError::InvalidSlot(3)));
        assert_eq!(deck, before);
    }

    #[test]
    fn test_draw_replace_with_no_remaining_cards() {
        use Resource::*;
        let mut deck = ResourceDeck::from_cards(vec![Wood, Stone, Glass]).unwrap();
        assert_eq!(deck.draw_replace(0, Wood).unwrap(), Wood);
        assert_eq!(deck.remaining_len(), 0);
    }

    #[test]
    fn test_counts_are_preserved_across_draws() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut deck = ResourceDeck::shuffled(&DeckConfig::default(), &mut rng).unwrap();
        let before = deck.counts();
        for i in 0..200 {
            let slot = i % VISIBLE_SLOTS;
            let card = deck.visible_at(slot).unwrap();
            deck.draw_replace(slot, card).unwrap();
        }
        assert_eq!(deck.counts(), before);
        assert_eq!(deck.total_len(), 75);
    }
}
