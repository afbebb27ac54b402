//! Turn Controller
//!
//! Validates player intents against the current state, applies the legal
//! ones, and keeps the player-facing log. Illegal intents never touch the
//! state.

use crate::core::rng::DeterministicRng;
use crate::game::card::Card;
use crate::game::effects::{self, finish_turn};
use crate::game::events::{GameEvent, GameLog};
use crate::game::state::{GameConfig, GameState, PlayerSlot, TurnPhase};

/// A player intent, already resolved to a slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Draw the top card.
    DrawCard(PlayerSlot),
    /// Play a card from hand. `position` is the reinsertion depth for Defuse.
    PlayCard {
        /// Acting slot
        slot: PlayerSlot,
        /// Card to play
        card: Card,
        /// Reinsertion depth for Defuse (0 = top)
        position: Option<usize>,
    },
    /// Start a new game.
    Reset,
}

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IllegalAction {
    /// The game has a winner; only Reset is accepted.
    #[error("Game is over")]
    GameOver,

    /// The slot is not the current player.
    #[error("Not player {0}'s turn")]
    NotYourTurn(PlayerSlot),

    /// Nothing left to draw.
    #[error("Deck is empty")]
    DeckEmpty,

    /// The hand does not hold the card.
    #[error("{0} is not in hand")]
    CardNotInHand(Card),

    /// The card has no legal use right now.
    #[error("{0} cannot be played now")]
    NotPlayable(Card),

    /// An Explode is waiting for a Defuse.
    #[error("Player must play Defuse")]
    MustDefuse,
}

/// Outcome of a legal action.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Transition {
    /// What happened, in order.
    pub events: Vec<GameEvent>,
    /// Cards revealed privately to the acting player.
    pub reveal: Option<Vec<Card>>,
}

/// Owns the game state and log, and is the only thing that mutates them.
#[derive(Debug)]
pub struct TurnController {
    config: GameConfig,
    base_seed: u64,
    game_number: u64,
    state: GameState,
    log: GameLog,
}

impl TurnController {
    /// Start game 0 for `base_seed`.
    pub fn new(config: GameConfig, base_seed: u64) -> Self {
        let rng = DeterministicRng::for_game(base_seed, 0);
        let state = GameState::new(&config, rng);

        Self {
            config,
            base_seed,
            game_number: 0,
            state,
            log: GameLog::new(),
        }
    }

    /// Wrap an existing state. Used to set up specific positions.
    pub fn with_state(config: GameConfig, base_seed: u64, state: GameState) -> Self {
        Self {
            config,
            base_seed,
            game_number: 0,
            state,
            log: GameLog::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Log of the current game.
    pub fn log(&self) -> &GameLog {
        &self.log
    }

    /// Current phase.
    pub fn phase(&self) -> TurnPhase {
        self.state.phase()
    }

    /// Rule constants.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Games started since the server came up (0 for the first).
    pub fn game_number(&self) -> u64 {
        self.game_number
    }

    /// Check an action without applying it.
    pub fn validate(&self, action: &Action) -> Result<(), IllegalAction> {
        match *action {
            Action::Reset => Ok(()),

            Action::DrawCard(slot) => {
                self.check_turn(slot)?;
                if self.state.pending_explosion == Some(slot) {
                    return Err(IllegalAction::MustDefuse);
                }
                if self.state.deck.is_empty() {
                    return Err(IllegalAction::DeckEmpty);
                }
                Ok(())
            }

            Action::PlayCard { slot, card, .. } => {
                self.check_turn(slot)?;
                if !self.state.hand(slot).contains(card) {
                    return Err(IllegalAction::CardNotInHand(card));
                }

                let defusing = self.state.pending_explosion == Some(slot);
                match (defusing, card) {
                    (true, Card::Defuse) => Ok(()),
                    (true, _) => Err(IllegalAction::MustDefuse),
                    (false, Card::Defuse | Card::Explode) => Err(IllegalAction::NotPlayable(card)),
                    (false, _) => Ok(()),
                }
            }
        }
    }

    fn check_turn(&self, slot: PlayerSlot) -> Result<(), IllegalAction> {
        if self.state.game_over {
            return Err(IllegalAction::GameOver);
        }
        if slot != self.state.current_player {
            return Err(IllegalAction::NotYourTurn(slot));
        }
        Ok(())
    }

    /// Validate and apply an action. On error nothing changed.
    pub fn apply(&mut self, action: Action) -> Result<Transition, IllegalAction> {
        self.validate(&action)?;

        let transition = match action {
            Action::Reset => {
                self.reset();
                Transition::default()
            }
            Action::DrawCard(slot) => self.draw(slot)?,
            Action::PlayCard { slot, card, position } => self.play(slot, card, position)?,
        };

        self.log.record(&transition.events);
        Ok(transition)
    }

    /// Throw away the current game and deal a fresh one.
    pub fn reset(&mut self) {
        self.game_number += 1;
        let rng = DeterministicRng::for_game(self.base_seed, self.game_number);
        self.state = GameState::new(&self.config, rng);
        self.log.clear();
    }

    fn draw(&mut self, slot: PlayerSlot) -> Result<Transition, IllegalAction> {
        let card = self.state.deck.draw().map_err(|_| IllegalAction::DeckEmpty)?;
        self.state.effect_stack.clear();

        let mut events = vec![GameEvent::CardDrawn { player: slot }];

        if card == Card::Explode {
            self.state.discard_pile.push(card);
            let resolution = effects::resolve(card, slot, None, &mut self.state, &self.config);
            events.extend(resolution.events);
        } else {
            self.state.hand_mut(slot).add(card);
            finish_turn(&mut self.state, &mut events);
        }

        Ok(Transition { events, reveal: None })
    }

    fn play(
        &mut self,
        slot: PlayerSlot,
        card: Card,
        position: Option<usize>,
    ) -> Result<Transition, IllegalAction> {
        if !self.state.hand_mut(slot).remove_one(card) {
            return Err(IllegalAction::CardNotInHand(card));
        }
        self.state.discard_pile.push(card);

        let mut events = vec![GameEvent::CardPlayed { player: slot, card }];
        let resolution = effects::resolve(card, slot, position, &mut self.state, &self.config);
        events.extend(resolution.events);

        Ok(Transition {
            events,
            reveal: resolution.reveal,
        })
    }
}
