//! Memory-matching mini-game.
//!
//! Cards come in pairs. Two face-up cards are compared: a match stays
//! discovered for the rest of the game, a mismatch stays visible until the
//! next flip turns both back down.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_DECK: [&str; 4] = ["Texto", "Sintaxis", "Vocabulario", "Ritmo"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: usize,
    pub value: String,
    pub face_up: bool,
    pub matched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FlipOutcome {
    /// First card of a turn; waiting for its partner
    FirstCard { index: usize },
    Matched { first: usize, second: usize },
    Mismatched { first: usize, second: usize },
    /// Last pair found
    Won,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlipError {
    #[error("no card at position {0}")]
    OutOfRange(usize),
    #[error("card {0} is already matched")]
    AlreadyMatched(usize),
    #[error("card {0} is already face up")]
    AlreadyFaceUp(usize),
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryBoard {
    cards: Vec<Card>,
    first_pick: Option<usize>,
    mismatch: Option<(usize, usize)>,
    pairs_found: usize,
    moves: u32,
}

impl MemoryBoard {
    /// Deck with every value twice, in input order.
    pub fn new<S: AsRef<str>>(values: &[S]) -> Self {
        let cards = values
            .iter()
            .flat_map(|v| [v.as_ref().to_string(), v.as_ref().to_string()])
            .enumerate()
            .map(|(id, value)| Card {
                id,
                value,
                face_up: false,
                matched: false,
            })
            .collect();

        Self {
            cards,
            first_pick: None,
            mismatch: None,
            pairs_found: 0,
            moves: 0,
        }
    }

    pub fn shuffled<S: AsRef<str>, R: Rng + ?Sized>(values: &[S], rng: &mut R) -> Self {
        let mut board = Self::new(values);
        board.cards.shuffle(rng);
        board
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn pairs_found(&self) -> usize {
        self.pairs_found
    }

    pub fn total_pairs(&self) -> usize {
        self.cards.len() / 2
    }

    /// Completed comparisons, matched or not.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn is_won(&self) -> bool {
        self.pairs_found == self.total_pairs()
    }

    pub fn flip(&mut self, index: usize) -> Result<FlipOutcome, FlipError> {
        let card = self.cards.get(index).ok_or(FlipError::OutOfRange(index))?;
        if card.matched {
            return Err(FlipError::AlreadyMatched(index));
        }
        let hiding = self
            .mismatch
            .is_some_and(|(a, b)| a == index || b == index);
        if card.face_up && !hiding {
            return Err(FlipError::AlreadyFaceUp(index));
        }

        if let Some((a, b)) = self.mismatch.take() {
            self.cards[a].face_up = false;
            self.cards[b].face_up = false;
        }

        self.cards[index].face_up = true;

        let Some(first) = self.first_pick.take() else {
            self.first_pick = Some(index);
            return Ok(FlipOutcome::FirstCard { index });
        };

        self.moves += 1;
        if self.cards[first].value == self.cards[index].value {
            self.cards[first].matched = true;
            self.cards[index].matched = true;
            self.pairs_found += 1;
            if self.is_won() {
                return Ok(FlipOutcome::Won);
            }
            Ok(FlipOutcome::Matched {
                first,
                second: index,
            })
        } else {
            self.mismatch = Some((first, index));
            Ok(FlipOutcome::Mismatched {
                first,
                second: index,
            })
        }
    }

    /// Turn every card face down and clear the score. Card positions stay.
    pub fn reset(&mut self) {
        for card in &mut self.cards {
            card.face_up = false;
            card.matched = false;
        }
        self.first_pick = None;
        self.mismatch = None;
        self.pairs_found = 0;
        self.moves = 0;
    }
}
