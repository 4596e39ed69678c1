//! Room configuration.

use serde::{Deserialize, Serialize};

/// Limits applied to every room and to the games inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum members of a room, and maximum seats in one of its games.
    pub max_players: usize,

    /// Seated players a game needs before it can be started.
    pub min_players_to_start: usize,

    /// How many random ids to try before falling back to a
    /// timestamp-suffixed one.
    pub id_attempts: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: 4,
            min_players_to_start: 2,
            id_attempts: 10,
        }
    }
}
