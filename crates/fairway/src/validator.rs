//! Executable invariants over games, rooms, and hub snapshots.
//!
//! These are pure checks; nothing here mutates state. Tests call them
//! after every step as an oracle, and they are cheap enough to run on a
//! snapshot of a live hub.

use fairway_protocol::{GameId, GamePhase, PlayerId, RoomId};
use fairway_room::{Game, Room};
use fairway_rules::{HAND_SIZE, MAX_REVEALS};

use crate::hub::HubSnapshot;

const DECK_SIZE: usize = 52;

/// One broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("room {room_id} has {count} players")]
    RoomSize { room_id: RoomId, count: usize },

    #[error("game {game_id} is stored under room {room_id} but points at {points_at}")]
    RoomBackReference {
        game_id: GameId,
        room_id: RoomId,
        points_at: RoomId,
    },

    #[error("game {game_id} is {phase} with knocker {knocker:?}")]
    Knocker {
        game_id: GameId,
        phase: GamePhase,
        knocker: Option<PlayerId>,
    },

    #[error("game {game_id} is {phase} with {count} players")]
    TooFewPlayers {
        game_id: GameId,
        phase: GamePhase,
        count: usize,
    },

    #[error("game {game_id} has {count} seats, more than {max}")]
    TooManySeats {
        game_id: GameId,
        count: usize,
        max: usize,
    },

    #[error("{player_id} holds {count} cards in game {game_id}")]
    HandSize {
        game_id: GameId,
        player_id: PlayerId,
        count: usize,
    },

    #[error("{player_id} has invalid reveals {revealed:?} in game {game_id}")]
    Reveals {
        game_id: GameId,
        player_id: PlayerId,
        revealed: Vec<usize>,
    },

    #[error("game {game_id} draw pile has {actual} cards, expected {expected}")]
    DrawPile {
        game_id: GameId,
        expected: usize,
        actual: usize,
    },

    #[error("game {game_id} has cards out before it started")]
    DealtWhileWaiting { game_id: GameId },

    #[error("game {game_id} turn index {index} is out of {count} seats")]
    TurnIndex {
        game_id: GameId,
        index: usize,
        count: usize,
    },

    #[error("{player_id} is bound to room {room_id}, which does not hold them")]
    DanglingRoom { player_id: PlayerId, room_id: RoomId },

    #[error("{player_id} is bound to game {game_id}, which does not seat them")]
    DanglingGame { player_id: PlayerId, game_id: GameId },
}

/// Checks one game's phase, seat, and card bookkeeping.
pub fn validate_game(game: &Game) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let game_id = game.id();
    let phase = game.phase();
    let seats = game.seats();

    let knocker_ok = match phase {
        GamePhase::Knocked | GamePhase::Ended => {
            game.knocker().is_some_and(|k| game.is_seated(k))
        }
        _ => game.knocker().is_none(),
    };
    if !knocker_ok {
        violations.push(InvariantViolation::Knocker {
            game_id: game_id.clone(),
            phase,
            knocker: game.knocker().cloned(),
        });
    }

    if seats.len() > game.max_players() {
        violations.push(InvariantViolation::TooManySeats {
            game_id: game_id.clone(),
            count: seats.len(),
            max: game.max_players(),
        });
    }

    if !phase.is_started() {
        let dealt = seats.iter().any(|s| !s.hand.is_empty())
            || game.draw_pile_len() > 0
            || !game.discard_pile().is_empty()
            || game.drawn_card().is_some();
        if dealt {
            violations.push(InvariantViolation::DealtWhileWaiting {
                game_id: game_id.clone(),
            });
        }
        return violations;
    }

    if seats.len() < 2 {
        violations.push(InvariantViolation::TooFewPlayers {
            game_id: game_id.clone(),
            phase,
            count: seats.len(),
        });
    }

    for seat in seats {
        if seat.hand.len() != HAND_SIZE {
            violations.push(InvariantViolation::HandSize {
                game_id: game_id.clone(),
                player_id: seat.player_id.clone(),
                count: seat.hand.len(),
            });
        }
        let mut unique = seat.revealed.clone();
        unique.sort_unstable();
        unique.dedup();
        let reveals_ok = seat.revealed.len() <= MAX_REVEALS
            && unique.len() == seat.revealed.len()
            && seat.revealed.iter().all(|&i| i < HAND_SIZE);
        if !reveals_ok {
            violations.push(InvariantViolation::Reveals {
                game_id: game_id.clone(),
                player_id: seat.player_id.clone(),
                revealed: seat.revealed.clone(),
            });
        }
    }

    // The held card is counted as already off the draw pile.
    let held = usize::from(game.drawn_card().is_some());
    let expected = DECK_SIZE
        .checked_sub(HAND_SIZE * seats.len() + game.discard_pile().len() + held)
        .unwrap_or_default();
    if game.draw_pile_len() != expected {
        violations.push(InvariantViolation::DrawPile {
            game_id: game_id.clone(),
            expected,
            actual: game.draw_pile_len(),
        });
    }

    if phase != GamePhase::Ended && game.current_index() >= seats.len() {
        violations.push(InvariantViolation::TurnIndex {
            game_id: game_id.clone(),
            index: game.current_index(),
            count: seats.len(),
        });
    }

    violations
}

/// Checks a room's membership bounds and every active game inside it.
pub fn validate_room(room: &Room) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    let count = room.members().len();
    if count == 0 || count > room.config().max_players {
        violations.push(InvariantViolation::RoomSize {
            room_id: room.id().clone(),
            count,
        });
    }

    for game in room.games() {
        if game.room_id() != room.id() {
            violations.push(InvariantViolation::RoomBackReference {
                game_id: game.id().clone(),
                room_id: room.id().clone(),
                points_at: game.room_id().clone(),
            });
        }
        violations.extend(validate_game(game));
    }

    violations
}

/// Checks every room, plus that each player's bindings point somewhere real.
pub fn validate_hub(snapshot: &HubSnapshot) -> Vec<InvariantViolation> {
    let mut violations: Vec<InvariantViolation> =
        snapshot.rooms.values().flat_map(validate_room).collect();

    for ctx in snapshot.contexts.values() {
        let Some(room_id) = &ctx.room_id else {
            continue;
        };
        let Some(room) = snapshot.rooms.get(room_id).filter(|r| r.contains(&ctx.player_id)) else {
            violations.push(InvariantViolation::DanglingRoom {
                player_id: ctx.player_id.clone(),
                room_id: room_id.clone(),
            });
            continue;
        };
        if let Some(game_id) = &ctx.game_id {
            let seated = room.game(game_id).is_some_and(|g| g.is_seated(&ctx.player_id));
            if !seated {
                violations.push(InvariantViolation::DanglingGame {
                    player_id: ctx.player_id.clone(),
                    game_id: game_id.clone(),
                });
            }
        }
    }

    violations
}
