//! Inbound and outbound messages.
//!
//! Both directions are internally tagged unions: the JSON object carries a
//! `type` field naming the variant, and the remaining fields are that
//! variant's payload.
//!
//! ```json
//! { "type": "joinGame", "roomId": "K3Q9ZD", "gameId": "AB12CD" }
//! { "type": "turnChanged", "playerName": "jolly-teal-wombat-9q2d" }
//! ```
//!
//! Room and game ids in requests are `Option`s so that a missing id is a
//! validation error ("Room ID is required") rather than a decode failure.

use serde::{Deserialize, Serialize};

use crate::{
    Codec, FinalScore, GameId, GameView, PlayerId, ProtocolError, RoomId,
    RoomView,
};

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// Client → server requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Start a session, or resume one by presenting its token.
    Authenticate {
        #[serde(default)]
        session_token: Option<String>,
    },
    CreateRoom,
    JoinRoom {
        #[serde(default)]
        room_id: Option<RoomId>,
    },
    LeaveRoom {
        #[serde(default)]
        room_id: Option<RoomId>,
    },
    CreateGame {
        #[serde(default)]
        room_id: Option<RoomId>,
    },
    JoinGame {
        #[serde(default)]
        room_id: Option<RoomId>,
        #[serde(default)]
        game_id: Option<GameId>,
    },
    StartGame,
    StartNewGame,
    GetRoomState,
    PeekCard {
        card_index: i64,
    },
    DrawCard,
    TakeFromDiscard,
    SwapCard {
        card_index: i64,
    },
    DiscardDrawn,
    Knock,
    HideCards,
}

impl ClientMessage {
    /// Every `type` discriminator a client may send.
    pub const TYPES: [&'static str; 16] = [
        "authenticate",
        "createRoom",
        "joinRoom",
        "leaveRoom",
        "createGame",
        "joinGame",
        "startGame",
        "startNewGame",
        "getRoomState",
        "peekCard",
        "drawCard",
        "takeFromDiscard",
        "swapCard",
        "discardDrawn",
        "knock",
        "hideCards",
    ];

    /// The wire discriminator of this message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authenticate { .. } => "authenticate",
            Self::CreateRoom => "createRoom",
            Self::JoinRoom { .. } => "joinRoom",
            Self::LeaveRoom { .. } => "leaveRoom",
            Self::CreateGame { .. } => "createGame",
            Self::JoinGame { .. } => "joinGame",
            Self::StartGame => "startGame",
            Self::StartNewGame => "startNewGame",
            Self::GetRoomState => "getRoomState",
            Self::PeekCard { .. } => "peekCard",
            Self::DrawCard => "drawCard",
            Self::TakeFromDiscard => "takeFromDiscard",
            Self::SwapCard { .. } => "swapCard",
            Self::DiscardDrawn => "discardDrawn",
            Self::Knock => "knock",
            Self::HideCards => "hideCards",
        }
    }
}

/// Just enough of a frame to read its discriminator.
#[derive(Deserialize)]
struct TypeProbe {
    #[serde(rename = "type")]
    kind: String,
}

/// Decodes one inbound frame.
///
/// Separates the two client-visible failures:
/// - [`ProtocolError::Malformed`] when the frame has no readable string
///   `type`, or its fields don't fit the named type;
/// - [`ProtocolError::UnknownType`] when `type` names nothing we handle.
pub fn decode_client_message<C: Codec>(
    codec: &C,
    data: &[u8],
) -> Result<ClientMessage, ProtocolError> {
    let probe: TypeProbe =
        codec.decode(data).map_err(|_| ProtocolError::Malformed)?;
    if !ClientMessage::TYPES.contains(&probe.kind.as_str()) {
        return Err(ProtocolError::UnknownType(probe.kind));
    }
    codec.decode(data).map_err(|_| ProtocolError::Malformed)
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// Server → client messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Reply to `authenticate`. `reconnected` is true when a presented
    /// token resumed an existing identity.
    Authenticated {
        session_token: String,
        reconnected: bool,
        player_id: PlayerId,
    },
    RoomJoined {
        player_id: PlayerId,
        session_token: String,
        room_state: RoomView,
    },
    RoomStateUpdate {
        room_state: RoomView,
    },
    GameJoined {
        player_id: PlayerId,
        game_state: GameView,
    },
    /// Personalized per recipient.
    GameState {
        game_state: GameView,
    },
    GameStarted,
    TurnChanged {
        player_name: String,
    },
    PlayerKnocked {
        player_name: String,
    },
    GameEnded {
        winner: String,
        final_scores: Vec<FinalScore>,
    },
    NewGameStarted {
        game_id: GameId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous_game_id: Option<GameId>,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    /// Shorthand for an error reply.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
