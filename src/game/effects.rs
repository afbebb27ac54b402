//! Card Effects
//!
//! One match arm per card kind. By the time an effect resolves, the card has
//! already left the hand (or the deck, for a drawn Explode) and sits on top
//! of the discard pile.

use crate::game::card::Card;
use crate::game::events::GameEvent;
use crate::game::state::{GameConfig, GameState, PendingEffect, PlayerSlot};

/// What an effect produced besides the state change.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Events, in the order they happened.
    pub events: Vec<GameEvent>,
    /// Cards shown privately to the acting player (See Future).
    pub reveal: Option<Vec<Card>>,
}

/// Resolve `card` for `actor`.
///
/// `depth` is where a Defuse puts the Explode back (0 = top); `None` picks a
/// uniformly random depth. Other cards ignore it.
pub fn resolve(
    card: Card,
    actor: PlayerSlot,
    depth: Option<usize>,
    state: &mut GameState,
    config: &GameConfig,
) -> Resolution {
    let mut out = Resolution::default();

    match card {
        Card::Skip => {
            push_effect(state, card, actor, false);
            finish_turn(state, &mut out.events);
        }
        Card::Attack => {
            push_effect(state, card, actor, false);
            // Turns the attacker still owed carry over to the opponent.
            let owed = state.pending_turns + config.attack_turns;
            let target = actor.other();
            state.pending_turns = owed;
            state.current_player = target;
            out.events.push(GameEvent::TurnsOwed { player: target, turns: owed });
            out.events.push(GameEvent::TurnPassed { to: target });
        }
        Card::Shuffle => {
            push_effect(state, card, actor, true);
            state.deck.shuffle(&mut state.rng);
            out.events.push(GameEvent::DeckShuffled { player: actor });
        }
        Card::SeeFuture => {
            push_effect(state, card, actor, false);
            let top = state.deck.peek_top(config.see_future_depth);
            out.events.push(GameEvent::FutureSeen { player: actor, count: top.len() });
            out.reveal = Some(top);
        }
        Card::Nope => nope(actor, state, &mut out.events),
        Card::Defuse => defuse(actor, depth, state, &mut out.events),
        Card::Explode => explode(actor, state, &mut out.events),
    }

    out
}

fn push_effect(state: &mut GameState, card: Card, player: PlayerSlot, with_deck: bool) {
    let prior = state.snapshot_turn(with_deck);
    state.effect_stack.push(PendingEffect { card, player, prior });
}

/// End the turn and report who moves next.
pub(crate) fn finish_turn(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let before = state.current_player;
    state.end_turn();

    if state.current_player == before {
        events.push(GameEvent::ExtraTurn { player: before, remaining: state.pending_turns });
    } else {
        events.push(GameEvent::TurnPassed { to: state.current_player });
    }
}

fn nope(actor: PlayerSlot, state: &mut GameState, events: &mut Vec<GameEvent>) {
    let Some(effect) = state.effect_stack.pop() else {
        events.push(GameEvent::NopeFizzled { player: actor });
        return;
    };

    let prior = effect.prior;
    let before = state.current_player;
    state.current_player = prior.current_player;
    state.pending_turns = prior.pending_turns;
    if let Some(deck) = prior.deck {
        state.deck = deck;
    }

    events.push(GameEvent::EffectCancelled { player: actor, card: effect.card });
    if state.current_player != before {
        events.push(GameEvent::TurnPassed { to: state.current_player });
    }
}

fn defuse(
    actor: PlayerSlot,
    depth: Option<usize>,
    state: &mut GameState,
    events: &mut Vec<GameEvent>,
) {
    if state.pending_explosion != Some(actor) {
        return;
    }

    if let Some(index) = state.discard_pile.iter().rposition(|c| *c == Card::Explode) {
        let bomb = state.discard_pile.remove(index);
        let size = state.deck.size();
        let depth = match depth {
            Some(depth) => depth.min(size),
            None => state.rng.next_int(size as u32 + 1) as usize,
        };
        state.deck.insert_at_depth(depth, bomb);
    }

    state.pending_explosion = None;
    state.effect_stack.clear();
    events.push(GameEvent::ExplosionDefused { player: actor });
    finish_turn(state, events);
}

fn explode(actor: PlayerSlot, state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.hand(actor).contains(Card::Defuse) {
        state.pending_explosion = Some(actor);
        events.push(GameEvent::ExplosionPending { player: actor });
        return;
    }

    state.eliminate(actor);
    events.push(GameEvent::PlayerExploded { player: actor });
    events.push(GameEvent::GameWon { winner: actor.other() });
}
