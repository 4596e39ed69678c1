//! State projections sent to clients.
//!
//! None of these are live state. The hub builds a fresh view for each
//! recipient, and a [`GameView`] in particular is personalized: it only
//! carries the card faces that recipient is entitled to see.

use std::fmt;

use fairway_rules::Card;
use serde::{Deserialize, Serialize};

use crate::{GameId, PlayerId, RoomId};

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a game.
///
/// ```text
/// Waiting → Playing ⇄ Peeking
///              │
///              ▼
///           Knocked → Ended
/// ```
///
/// - **Waiting**: seats are filling, nothing dealt.
/// - **Playing**: turns are being taken; players may still peek.
/// - **Peeking**: every seated player has looked at their two cards and
///   the reveal is on screen. `hideCards` returns to Playing.
/// - **Knocked**: someone knocked; each other player gets one more turn.
/// - **Ended**: terminal. Scores are final and every card is face up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Waiting,
    Playing,
    Peeking,
    Knocked,
    Ended,
}

impl GamePhase {
    /// `true` once cards have been dealt.
    pub fn is_started(self) -> bool {
        !matches!(self, Self::Waiting)
    }

    /// `true` in the phases where the current player may draw, swap,
    /// discard, or knock.
    pub fn allows_turns(self) -> bool {
        matches!(self, Self::Playing | Self::Knocked)
    }

    /// `true` in the phases where players may reveal their own cards.
    pub fn allows_peeking(self) -> bool {
        matches!(self, Self::Playing | Self::Peeking)
    }

    /// Returns `true` if moving from `self` to `target` is a legal step.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Playing)
                | (Self::Playing, Self::Peeking)
                | (Self::Peeking, Self::Playing)
                | (Self::Playing, Self::Knocked)
                | (Self::Playing, Self::Ended)
                | (Self::Knocked, Self::Ended)
        )
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Peeking => "peeking",
            Self::Knocked => "knocked",
            Self::Ended => "ended",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Game views
// ---------------------------------------------------------------------------

/// One seat as seen by a particular recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    /// One entry per held card; `None` is a face-down card.
    pub cards: Vec<Option<Card>>,
    /// Hand slots this player has revealed to themselves (at most two).
    pub revealed_cards: Vec<usize>,
    /// Final score, present only once the game has ended.
    pub score: Option<i32>,
    pub is_connected: bool,
}

/// A personalized snapshot of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub id: GameId,
    pub room_id: RoomId,
    pub players: Vec<PlayerView>,
    pub current_player_index: usize,
    /// Cards left in the draw pile. The pile itself is never sent.
    pub draw_pile: usize,
    /// Discard pile, bottom first; the last card is the top.
    pub discard_pile: Vec<Card>,
    pub game_phase: GamePhase,
    pub knocked_player_id: Option<PlayerId>,
    /// The held card, shown only to the player holding it.
    pub drawn_card: Option<Card>,
    pub all_players_peeked: bool,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One player's final score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalScore {
    pub player_name: String,
    pub score: i32,
}

/// Immutable record of one finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub game_id: GameId,
    pub room_id: RoomId,
    /// The first winner in seat order. Kept for clients that show one name.
    pub winner: String,
    /// Every winner. More than one only on a tie the knocker is not part of.
    pub winners: Vec<String>,
    pub final_scores: Vec<FinalScore>,
    /// Unix milliseconds.
    pub completed_at: u64,
}

// ---------------------------------------------------------------------------
// Room views
// ---------------------------------------------------------------------------

/// A room member as shown in the room lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPlayerView {
    pub id: PlayerId,
    pub name: String,
    pub is_connected: bool,
    /// Unix milliseconds; present while the player is inside a grace period.
    pub disconnected_at: Option<u64>,
    pub total_score: i64,
    pub games_played: u32,
    pub games_won: u32,
}

/// An active game listed in the room lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub id: GameId,
    pub phase: GamePhase,
    pub player_count: usize,
}

/// Snapshot of a room, identical for every member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: RoomId,
    pub players: Vec<RoomPlayerView>,
    pub games: Vec<GameSummary>,
    pub game_history: Vec<GameResult>,
    /// Unix milliseconds.
    pub created_at: u64,
    /// Unix milliseconds.
    pub last_activity: u64,
}
