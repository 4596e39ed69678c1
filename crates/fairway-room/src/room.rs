//! Rooms: the persistent container players join.
//!
//! A room outlives its games. Members keep their identity and running
//! totals across every game played in it; a [`Game`] lives in the room's
//! active map only until it ends and its result is folded into history.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use fairway_protocol::{
    GameId, GameResult, GameSummary, PlayerId, RoomId, RoomPlayerView,
    RoomView,
};
use rand::Rng;

use crate::{unique_code, Game, RoomConfig, RoomError, SeatRemoval};

/// Unix milliseconds for a wall-clock time. Times before the epoch map to 0.
pub fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// A player's room-scoped identity and running totals.
#[derive(Debug, Clone)]
pub struct RoomMember {
    pub player_id: PlayerId,
    pub name: String,
    pub connected: bool,
    /// Set while the player is inside a reconnect grace period.
    pub disconnected_at: Option<SystemTime>,
    pub total_score: i64,
    pub games_played: u32,
    pub games_won: u32,
    pub joined_at: SystemTime,
}

impl RoomMember {
    fn new(player_id: PlayerId) -> Self {
        Self {
            name: player_id.to_string(),
            player_id,
            connected: true,
            disconnected_at: None,
            total_score: 0,
            games_played: 0,
            games_won: 0,
            joined_at: SystemTime::now(),
        }
    }
}

/// What [`Room::remove_player`] took away.
#[derive(Debug, Clone)]
pub struct Departure {
    pub member: RoomMember,
    /// The game the player was seated in, and what leaving did to it.
    /// An abandoned game has already been dropped from the room; an ended
    /// one is still there waiting for [`Room::complete_game`].
    pub game: Option<(GameId, SeatRemoval)>,
}

#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    members: Vec<RoomMember>,
    games: BTreeMap<GameId, Game>,
    history: Vec<GameResult>,
    created_at: SystemTime,
    last_activity: SystemTime,
    config: RoomConfig,
}

impl Room {
    /// A new room with `creator` as its only member.
    pub fn new(id: RoomId, creator: PlayerId, config: RoomConfig) -> Self {
        let now = SystemTime::now();
        tracing::info!(room_id = %id, player_id = %creator, "room created");
        Self {
            id,
            members: vec![RoomMember::new(creator)],
            games: BTreeMap::new(),
            history: Vec::new(),
            created_at: now,
            last_activity: now,
            config,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn members(&self) -> &[RoomMember] {
        &self.members
    }

    pub fn member(&self, player_id: &PlayerId) -> Option<&RoomMember> {
        self.members.iter().find(|m| &m.player_id == player_id)
    }

    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.member(player_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn history(&self) -> &[GameResult] {
        &self.history
    }

    fn touch(&mut self) {
        self.last_activity = SystemTime::now();
    }

    // -- Membership -------------------------------------------------------

    /// Adds a member.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`] if already a member, otherwise
    /// [`RoomError::RoomFull`] at capacity.
    pub fn add_player(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        if self.contains(&player_id) {
            return Err(RoomError::AlreadyInRoom);
        }
        if self.members.len() >= self.config.max_players {
            return Err(RoomError::RoomFull);
        }

        tracing::info!(
            room_id = %self.id,
            %player_id,
            players = self.members.len() + 1,
            "player joined"
        );
        self.members.push(RoomMember::new(player_id));
        self.touch();
        Ok(())
    }

    /// Removes a member for good, unseating them from any game first.
    pub fn remove_player(&mut self, player_id: &PlayerId) -> Option<Departure> {
        let pos = self.members.iter().position(|m| &m.player_id == player_id)?;
        let member = self.members.remove(pos);

        let game = self.seated_game_of(player_id).cloned().and_then(|game_id| {
            let outcome = self.games.get_mut(&game_id)?.remove_player(player_id)?;
            if outcome == SeatRemoval::Abandoned {
                self.abandon_game(&game_id);
            }
            Some((game_id, outcome))
        });

        tracing::info!(
            room_id = %self.id,
            %player_id,
            players = self.members.len(),
            "player left"
        );
        self.touch();
        Some(Departure { member, game })
    }

    /// Flags a member as inside a grace period. Returns `false` for
    /// non-members.
    pub fn mark_disconnected(&mut self, player_id: &PlayerId, at: SystemTime) -> bool {
        let Some(member) = self.members.iter_mut().find(|m| &m.player_id == player_id) else {
            return false;
        };
        member.connected = false;
        member.disconnected_at = Some(at);
        for game in self.games.values_mut() {
            game.set_connected(player_id, false);
        }
        true
    }

    /// Clears a member's disconnect flag and timestamp.
    pub fn mark_connected(&mut self, player_id: &PlayerId) -> bool {
        let Some(member) = self.members.iter_mut().find(|m| &m.player_id == player_id) else {
            return false;
        };
        member.connected = true;
        member.disconnected_at = None;
        for game in self.games.values_mut() {
            game.set_connected(player_id, true);
        }
        self.touch();
        true
    }

    // -- Games ------------------------------------------------------------

    /// Allocates an empty game with a code unique among active games.
    pub fn create_game<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GameId {
        let code = unique_code(rng, self.config.id_attempts, |c| {
            self.games.contains_key(c)
        });
        let game_id = GameId::new(code);
        let game = Game::new(
            game_id.clone(),
            self.id.clone(),
            self.config.max_players,
            self.config.min_players_to_start,
        );
        self.games.insert(game_id.clone(), game);
        self.touch();

        tracing::info!(room_id = %self.id, %game_id, "game created");
        game_id
    }

    pub fn game(&self, game_id: &GameId) -> Option<&Game> {
        self.games.get(game_id)
    }

    /// Mutable access for game actions. Counts as room activity.
    pub fn game_mut(&mut self, game_id: &GameId) -> Option<&mut Game> {
        self.last_activity = SystemTime::now();
        self.games.get_mut(game_id)
    }

    pub fn games(&self) -> impl Iterator<Item = &Game> {
        self.games.values()
    }

    /// The active game `player_id` is seated in, if any.
    pub fn seated_game_of(&self, player_id: &PlayerId) -> Option<&GameId> {
        self.games
            .iter()
            .find(|(_, game)| game.is_seated(player_id))
            .map(|(id, _)| id)
    }

    /// Folds an ended game into the room and drops it from the active map.
    ///
    /// Every seat's score is added to that member's total and counts as a
    /// game played; every winner gets a win.
    ///
    /// # Errors
    /// [`RoomError::GameNotFound`] for an unknown id, and
    /// [`GameError::NotCompleted`] if the game has not ended.
    pub fn complete_game(&mut self, game_id: &GameId) -> Result<GameResult, RoomError> {
        let game = self.games.get(game_id).ok_or(RoomError::GameNotFound)?;
        let result = game.result()?.clone();

        let is_winner = |name: &str| result.winners.iter().any(|w| w == name);
        for seat in game.seats() {
            if let Some(member) = self.members.iter_mut().find(|m| m.player_id == seat.player_id) {
                member.total_score += i64::from(seat.score.unwrap_or_default());
                member.games_played += 1;
                if is_winner(&seat.name) {
                    member.games_won += 1;
                }
            }
        }

        self.games.remove(game_id);
        self.history.push(result.clone());
        self.touch();
        tracing::info!(
            room_id = %self.id,
            %game_id,
            history = self.history.len(),
            "game folded into room history"
        );
        Ok(result)
    }

    /// Drops a game that can no longer finish. No result is recorded.
    pub fn abandon_game(&mut self, game_id: &GameId) -> Option<Game> {
        let game = self.games.remove(game_id)?;
        tracing::info!(room_id = %self.id, %game_id, "game abandoned");
        Some(game)
    }

    // -- Views ------------------------------------------------------------

    /// The lobby snapshot sent in `roomJoined` and `roomStateUpdate`.
    pub fn view(&self) -> RoomView {
        RoomView {
            id: self.id.clone(),
            players: self
                .members
                .iter()
                .map(|m| RoomPlayerView {
                    id: m.player_id.clone(),
                    name: m.name.clone(),
                    is_connected: m.connected,
                    disconnected_at: m.disconnected_at.map(unix_millis),
                    total_score: m.total_score,
                    games_played: m.games_played,
                    games_won: m.games_won,
                })
                .collect(),
            games: self
                .games
                .values()
                .map(|g| GameSummary {
                    id: g.id().clone(),
                    phase: g.phase(),
                    player_count: g.seats().len(),
                })
                .collect(),
            game_history: self.history.clone(),
            created_at: unix_millis(self.created_at),
            last_activity: unix_millis(self.last_activity),
        }
    }
}

#[cfg(test)]
mod tests {
    use fairway_protocol::GamePhase;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::GameError;

    fn pid(name: &str) -> PlayerId {
        PlayerId::new(name)
    }

    fn room_with(names: &[&str]) -> Room {
        let mut room = Room::new(RoomId::new("R1"), pid(names[0]), RoomConfig::default());
        for name in &names[1..] {
            room.add_player(pid(name)).unwrap();
        }
        room
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    // =====================================================================
    // add_player()
    // =====================================================================

    #[test]
    fn test_add_player_duplicate_returns_already_in_room() {
        let mut room = room_with(&["a"]);
        let err = room.add_player(pid("a")).unwrap_err();
        assert_eq!(err.to_string(), "player already in room");
    }

    #[test]
    fn test_add_player_fifth_returns_room_full() {
        let mut room = room_with(&["a", "b", "c", "d"]);
        assert_eq!(room.add_player(pid("e")), Err(RoomError::RoomFull));
        assert_eq!(room.members().len(), 4);
    }

    // =====================================================================
    // create_game() / complete_game()
    // =====================================================================

    #[test]
    fn test_create_game_ids_are_distinct() {
        let mut room = room_with(&["a"]);
        let mut rng = rng();
        let first = room.create_game(&mut rng);
        let second = room.create_game(&mut rng);
        assert_ne!(first, second);
        assert_eq!(room.view().games.len(), 2);
    }

    #[test]
    fn test_complete_game_unfinished_returns_not_completed() {
        let mut room = room_with(&["a", "b"]);
        let game_id = room.create_game(&mut rng());

        let err = room.complete_game(&game_id).unwrap_err();

        assert_eq!(err, RoomError::Game(GameError::NotCompleted));
        assert!(room.game(&game_id).is_some());
    }

    #[test]
    fn test_complete_game_unknown_returns_game_not_found() {
        let mut room = room_with(&["a"]);
        let err = room.complete_game(&GameId::new("NOPE")).unwrap_err();
        assert_eq!(err.to_string(), "Game does not exist in room");
    }

    #[test]
    fn test_complete_game_folds_totals_and_removes_game() {
        let mut room = room_with(&["a", "b"]);
        let mut rng = rng();
        let game_id = room.create_game(&mut rng);
        {
            let game = room.game_mut(&game_id).unwrap();
            game.add_player(pid("a"), "a").unwrap();
            game.add_player(pid("b"), "b").unwrap();
            game.start(&mut rng).unwrap();
            game.knock(&pid("a")).unwrap();
            game.draw(&pid("b")).unwrap();
            game.discard_drawn(&pid("b")).unwrap();
            assert_eq!(game.phase(), GamePhase::Ended);
        }

        let result = room.complete_game(&game_id).unwrap();

        assert!(room.game(&game_id).is_none());
        assert_eq!(room.history(), &[result.clone()]);
        for score in &result.final_scores {
            let member = room.member(&pid(&score.player_name)).unwrap();
            assert_eq!(member.total_score, i64::from(score.score));
            assert_eq!(member.games_played, 1);
        }
        let wins: u32 = room.members().iter().map(|m| m.games_won).sum();
        assert_eq!(wins as usize, result.winners.len());
    }

    // =====================================================================
    // remove_player()
    // =====================================================================

    #[test]
    fn test_remove_player_unseats_and_abandons_two_player_game() {
        let mut room = room_with(&["a", "b"]);
        let mut rng = rng();
        let game_id = room.create_game(&mut rng);
        {
            let game = room.game_mut(&game_id).unwrap();
            game.add_player(pid("a"), "a").unwrap();
            game.add_player(pid("b"), "b").unwrap();
            game.start(&mut rng).unwrap();
        }

        let departure = room.remove_player(&pid("b")).unwrap();

        assert_eq!(departure.member.player_id, pid("b"));
        assert_eq!(departure.game, Some((game_id.clone(), SeatRemoval::Abandoned)));
        assert!(room.game(&game_id).is_none());
        assert!(!room.contains(&pid("b")));
    }

    #[test]
    fn test_remove_player_not_member_returns_none() {
        let mut room = room_with(&["a"]);
        assert!(room.remove_player(&pid("zed")).is_none());
    }

    #[test]
    fn test_remove_player_last_member_leaves_room_empty() {
        let mut room = room_with(&["a"]);
        room.remove_player(&pid("a")).unwrap();
        assert!(room.is_empty());
    }

    // =====================================================================
    // mark_disconnected() / mark_connected()
    // =====================================================================

    #[test]
    fn test_mark_connected_clears_disconnect_timestamp() {
        let mut room = room_with(&["a", "b"]);
        assert!(room.mark_disconnected(&pid("a"), SystemTime::now()));
        let view = room.view();
        assert!(!view.players[0].is_connected);
        assert!(view.players[0].disconnected_at.is_some());

        assert!(room.mark_connected(&pid("a")));

        let view = room.view();
        assert!(view.players[0].is_connected);
        assert_eq!(view.players[0].disconnected_at, None);
    }

    #[test]
    fn test_mark_disconnected_updates_seat_flag() {
        let mut room = room_with(&["a", "b"]);
        let game_id = room.create_game(&mut rng());
        room.game_mut(&game_id).unwrap().add_player(pid("a"), "a").unwrap();

        room.mark_disconnected(&pid("a"), SystemTime::now());

        let view = room.game(&game_id).unwrap().view_for(&pid("b"));
        assert!(!view.players[0].is_connected);
    }

    #[test]
    fn test_unix_millis_epoch_is_zero() {
        assert_eq!(unix_millis(UNIX_EPOCH), 0);
    }
}
