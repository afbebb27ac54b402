//! Game State Definitions
//!
//! The single source of truth for one game: deck, hands, discard pile,
//! turn marker and every obligation still owed.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher};
use crate::core::rng::DeterministicRng;
use crate::game::card::Card;
use crate::game::deck::Deck;
use crate::game::hand::Hand;

// =============================================================================
// PLAYER SLOT
// =============================================================================

/// One of the two seats at the table. Serialized as `0` or `1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlayerSlot {
    /// First player to connect; moves first.
    Zero,
    /// Second player to connect.
    One,
}

impl PlayerSlot {
    /// Both slots, in assignment order.
    pub const ALL: [PlayerSlot; 2] = [PlayerSlot::Zero, PlayerSlot::One];

    /// The opponent's slot.
    #[inline]
    pub fn other(self) -> PlayerSlot {
        match self {
            PlayerSlot::Zero => PlayerSlot::One,
            PlayerSlot::One => PlayerSlot::Zero,
        }
    }

    /// Index into per-player arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            PlayerSlot::Zero => 0,
            PlayerSlot::One => 1,
        }
    }
}

impl From<PlayerSlot> for u8 {
    fn from(slot: PlayerSlot) -> u8 {
        slot.index() as u8
    }
}

impl TryFrom<u8> for PlayerSlot {
    type Error = InvalidSlot;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlayerSlot::Zero),
            1 => Ok(PlayerSlot::One),
            other => Err(InvalidSlot(other)),
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// A slot number outside `{0, 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid player slot {0}")]
pub struct InvalidSlot(pub u8);

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Rule constants and deck composition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    /// How many of each card the deck starts with.
    pub composition: BTreeMap<Card, u32>,
    /// Cards revealed by See Future.
    pub see_future_depth: usize,
    /// Turns an attacked player owes.
    pub attack_turns: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        let composition = BTreeMap::from([
            (Card::Skip, 3),
            (Card::Defuse, 5),
            (Card::Attack, 3),
            (Card::Shuffle, 3),
            (Card::SeeFuture, 3),
            (Card::Nope, 3),
            (Card::Explode, 1),
        ]);

        Self {
            composition,
            see_future_depth: 3,
            attack_turns: 2,
        }
    }
}

impl GameConfig {
    /// Total cards in a fresh deck (21 by default).
    pub fn deck_size(&self) -> usize {
        self.composition.values().map(|n| *n as usize).sum()
    }

    /// Unshuffled deck in composition order.
    pub fn build_deck(&self) -> Vec<Card> {
        self.composition
            .iter()
            .flat_map(|(card, count)| std::iter::repeat(*card).take(*count as usize))
            .collect()
    }
}

// =============================================================================
// OBLIGATIONS
// =============================================================================

/// Turn bookkeeping captured before an effect resolved, so Nope can put it
/// back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSnapshot {
    /// Whose turn it was.
    pub current_player: PlayerSlot,
    /// Turns that player still owed.
    pub pending_turns: u32,
    /// Deck order, only for effects that reorder the deck.
    pub deck: Option<Deck>,
}

/// A played card whose effect can still be cancelled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEffect {
    /// Card that was played.
    pub card: Card,
    /// Who played it.
    pub player: PlayerSlot,
    /// State to restore if it is noped.
    pub prior: TurnSnapshot,
}

/// Current phase of the turn state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Waiting for this slot to act.
    AwaitingTurn(PlayerSlot),
    /// Game finished with this winner.
    GameOver(PlayerSlot),
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete state of a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Draw pile
    pub deck: Deck,

    /// Hands, indexed by slot
    pub player_hands: [Hand; 2],

    /// Whose turn it is
    pub current_player: PlayerSlot,

    /// Played and exploded cards, oldest first
    pub discard_pile: Vec<Card>,

    /// Set once a player explodes
    pub game_over: bool,

    /// Winning slot, set together with `game_over`
    pub winner: Option<PlayerSlot>,

    /// Turns the current player still owes after an Attack (0 = normal turn)
    pub pending_turns: u32,

    /// Slot that drew an Explode and must play a Defuse next
    pub pending_explosion: Option<PlayerSlot>,

    /// Effects played since the last draw, most recent last
    pub effect_stack: Vec<PendingEffect>,

    /// Deterministic RNG state
    #[serde(skip)]
    pub rng: DeterministicRng,
}

impl GameState {
    /// Start a game: full deck shuffled with `rng`, empty hands, player 0 to
    /// move.
    pub fn new(config: &GameConfig, mut rng: DeterministicRng) -> Self {
        let mut deck = Deck::from_cards(config.build_deck());
        deck.shuffle(&mut rng);

        Self {
            deck,
            player_hands: [Hand::new(), Hand::new()],
            current_player: PlayerSlot::Zero,
            discard_pile: Vec::new(),
            game_over: false,
            winner: None,
            pending_turns: 0,
            pending_explosion: None,
            effect_stack: Vec::new(),
            rng,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> TurnPhase {
        match (self.game_over, self.winner) {
            (true, Some(winner)) => TurnPhase::GameOver(winner),
            _ => TurnPhase::AwaitingTurn(self.current_player),
        }
    }

    /// Hand of `slot`.
    #[inline]
    pub fn hand(&self, slot: PlayerSlot) -> &Hand {
        &self.player_hands[slot.index()]
    }

    /// Mutable hand of `slot`.
    #[inline]
    pub fn hand_mut(&mut self, slot: PlayerSlot) -> &mut Hand {
        &mut self.player_hands[slot.index()]
    }

    /// Cards across deck, hands and discard. Constant within a game.
    pub fn total_cards(&self) -> usize {
        self.deck.size()
            + self.player_hands.iter().map(Hand::total).sum::<usize>()
            + self.discard_pile.len()
    }

    /// Capture turn bookkeeping, optionally with deck order.
    pub fn snapshot_turn(&self, with_deck: bool) -> TurnSnapshot {
        TurnSnapshot {
            current_player: self.current_player,
            pending_turns: self.pending_turns,
            deck: with_deck.then(|| self.deck.clone()),
        }
    }

    /// End the current player's turn.
    ///
    /// A player who still owes turns keeps the turn with one fewer owed;
    /// otherwise the turn passes to the opponent.
    pub fn end_turn(&mut self) {
        if self.pending_turns > 1 {
            self.pending_turns -= 1;
        } else {
            self.pending_turns = 0;
            self.current_player = self.current_player.other();
        }
    }

    /// Eliminate `loser`, ending the game.
    pub fn eliminate(&mut self, loser: PlayerSlot) {
        self.game_over = true;
        self.winner = Some(loser.other());
        self.pending_turns = 0;
        self.pending_explosion = None;
        self.effect_stack.clear();
    }

    /// Compute deterministic hash of the full state, including deck order
    /// and RNG position.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_game_state();

        let deck: Vec<u8> = self.deck.cards().iter().map(|c| c.code()).collect();
        hasher.update_seq(&deck);

        for hand in &self.player_hands {
            for card in Card::ALL {
                hasher.update_u32(hand.count(card));
            }
        }

        hasher.update_u8(self.current_player.into());

        let discard: Vec<u8> = self.discard_pile.iter().map(|c| c.code()).collect();
        hasher.update_seq(&discard);

        hasher.update_bool(self.game_over);
        hasher.update_u8(self.winner.map(u8::from).unwrap_or(u8::MAX));
        hasher.update_u32(self.pending_turns);
        hasher.update_u8(self.pending_explosion.map(u8::from).unwrap_or(u8::MAX));

        hasher.update_u32(self.effect_stack.len() as u32);
        for effect in &self.effect_stack {
            hasher.update_u8(effect.card.code());
            hasher.update_u8(effect.player.into());
        }

        let [s0, s1] = self.rng.state();
        hasher.update_u64(s0);
        hasher.update_u64(s1);

        hasher.finalize()
    }
}
