//! Request handling: one method per client message type.
//!
//! Every handler validates first and mutates second, so a rejected request
//! leaves no trace. Failures come back as a [`RequestError`] and turn
//! into a single `error{message}` for the caller.

use std::time::SystemTime;

use fairway_protocol::{
    ClientMessage, GameId, GamePhase, PlayerId, RoomId, ServerMessage,
};
use fairway_room::{unique_code, Game, Room, RoomError, SeatRemoval, StoredGame};
use fairway_session::{Reclaimed, SessionError};
use fairway_transport::ConnectionId;

use crate::error::RequestError;
use crate::hub::{ClientContext, Hub};
use crate::outbox::Outbox;

type RequestResult = Result<(), RequestError>;

/// A turn action that ends the acting player's turn.
#[derive(Debug, Clone, Copy)]
enum TurnEnd {
    Swap(i64),
    Discard,
    Knock,
}

/// Treats an empty string like a missing id.
fn required<T, F>(id: Option<T>, blank: F, missing: RequestError) -> Result<T, RequestError>
where
    F: Fn(&T) -> bool,
{
    id.filter(|v| !blank(v)).ok_or(missing)
}

impl Hub {
    /// Routes one inbound message and queues the replies.
    pub(crate) fn dispatch(
        &mut self,
        conn: ConnectionId,
        message: ClientMessage,
        out: &mut Outbox,
    ) {
        let Some(entry) = self.connections.get(&conn) else {
            // Evicted while the message was in flight.
            return;
        };
        let kind = message.kind();

        let result = match (message, entry.player.clone()) {
            (ClientMessage::Authenticate { session_token }, _) => {
                self.authenticate(conn, session_token, out)
            }
            (_, None) => Err(SessionError::NotAuthenticated.into()),
            (message, Some(player_id)) => self.route(&player_id, message, out),
        };

        if let Err(err) = result {
            tracing::debug!(%conn, kind, error = %err, "request rejected");
            out.push(conn, ServerMessage::error(err.to_string()));
        }
    }

    fn route(
        &mut self,
        player_id: &PlayerId,
        message: ClientMessage,
        out: &mut Outbox,
    ) -> RequestResult {
        if let Some(ctx) = self.contexts.get_mut(player_id) {
            ctx.last_action = SystemTime::now();
        }
        tracing::debug!(%player_id, kind = message.kind(), "routing request");

        match message {
            ClientMessage::Authenticate { .. } => Err(SessionError::AlreadyAuthenticated.into()),
            ClientMessage::CreateRoom => self.create_room(player_id, out),
            ClientMessage::JoinRoom { room_id } => self.join_room(player_id, room_id, out),
            ClientMessage::LeaveRoom { room_id } => self.leave_room(player_id, room_id, out),
            ClientMessage::CreateGame { room_id } => self.create_game(player_id, room_id, out),
            ClientMessage::JoinGame { room_id, game_id } => {
                self.join_game(player_id, room_id, game_id, out)
            }
            ClientMessage::StartGame => self.start_game(player_id, out),
            ClientMessage::StartNewGame => self.start_new_game(player_id, out),
            ClientMessage::GetRoomState => self.room_state(player_id, out),
            ClientMessage::PeekCard { card_index } => self.peek_card(player_id, card_index, out),
            ClientMessage::DrawCard => {
                self.simple_action(player_id, out, |game, p| game.draw(p).map(drop))
            }
            ClientMessage::TakeFromDiscard => {
                self.simple_action(player_id, out, |game, p| game.take_discard(p).map(drop))
            }
            ClientMessage::HideCards => self.simple_action(player_id, out, |game, _| {
                game.hide_peeked_cards();
                Ok(())
            }),
            ClientMessage::SwapCard { card_index } => {
                self.end_turn_action(player_id, TurnEnd::Swap(card_index), out)
            }
            ClientMessage::DiscardDrawn => self.end_turn_action(player_id, TurnEnd::Discard, out),
            ClientMessage::Knock => self.end_turn_action(player_id, TurnEnd::Knock, out),
        }
    }

    fn context(&self, player_id: &PlayerId) -> Result<&ClientContext, RequestError> {
        self.contexts
            .get(player_id)
            .ok_or(RequestError::Session(SessionError::NotAuthenticated))
    }

    fn context_mut(&mut self, player_id: &PlayerId) -> Result<&mut ClientContext, RequestError> {
        self.contexts
            .get_mut(player_id)
            .ok_or(RequestError::Session(SessionError::NotAuthenticated))
    }

    // =====================================================================
    // Authentication
    // =====================================================================

    fn authenticate(
        &mut self,
        conn: ConnectionId,
        token: Option<String>,
        out: &mut Outbox,
    ) -> RequestResult {
        if self.connections.get(&conn).is_some_and(|e| e.player.is_some()) {
            return Err(SessionError::AlreadyAuthenticated.into());
        }

        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return self.authenticate_new(conn, out);
        };

        match self.sessions.reclaim(&token, conn) {
            Ok(reclaimed) => {
                self.resume(conn, reclaimed, out);
                Ok(())
            }
            Err(SessionError::SessionExpired) => {
                // The token is already gone; drop what it was holding.
                let stale = self
                    .contexts
                    .values()
                    .find(|ctx| ctx.token == token)
                    .map(|ctx| ctx.player_id.clone());
                if let Some(player_id) = stale {
                    self.purge_player(&player_id, out);
                }
                Err(SessionError::SessionExpired.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn authenticate_new(&mut self, conn: ConnectionId, out: &mut Outbox) -> RequestResult {
        let player_id = self.ids.generate();
        let session = self.sessions.create(player_id.clone(), conn)?;
        let (token, expires_at) = (session.token.clone(), session.expires_at);

        self.contexts.insert(
            player_id.clone(),
            ClientContext::new(player_id.clone(), token.clone(), expires_at, conn),
        );
        if let Some(entry) = self.connections.get_mut(&conn) {
            entry.player = Some(player_id.clone());
        }

        tracing::info!(%conn, %player_id, "player authenticated");
        out.push(
            conn,
            ServerMessage::Authenticated {
                session_token: token,
                reconnected: false,
                player_id,
            },
        );
        Ok(())
    }

    /// Rebinds a reclaimed session to `conn` and restores the player's
    /// room and game view.
    fn resume(&mut self, conn: ConnectionId, reclaimed: Reclaimed, out: &mut Outbox) {
        let Reclaimed {
            player_id,
            token,
            expires_at,
            displaced,
        } = reclaimed;

        self.cancel_grace_timer(&token);
        if let Some(old) = displaced.and_then(|c| self.connections.get_mut(&c)) {
            old.player = None;
        }
        if let Some(entry) = self.connections.get_mut(&conn) {
            entry.player = Some(player_id.clone());
        }

        let ctx = self
            .contexts
            .entry(player_id.clone())
            .or_insert_with(|| {
                ClientContext::new(player_id.clone(), token.clone(), expires_at, conn)
            });
        ctx.connection = Some(conn);
        ctx.token_expires_at = expires_at;
        ctx.last_action = SystemTime::now();
        let room_id = ctx.room_id.clone();

        tracing::info!(%conn, %player_id, "player reconnected");
        out.push(
            conn,
            ServerMessage::Authenticated {
                session_token: token,
                reconnected: true,
                player_id: player_id.clone(),
            },
        );

        let Some(room_id) = room_id else {
            return;
        };
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.mark_connected(&player_id);
        }
        self.broadcast_room(&room_id, out);
        if let Some(game_id) = self.seated_game(&player_id) {
            self.broadcast_game(&room_id, &game_id, out);
        }
    }

    // =====================================================================
    // Rooms
    // =====================================================================

    fn create_room(&mut self, player_id: &PlayerId, out: &mut Outbox) -> RequestResult {
        if self.context(player_id)?.room_id.is_some() {
            return Err(RequestError::AlreadyInRoom);
        }

        let code = unique_code(&mut rand::rng(), self.config.room.id_attempts, |c| {
            self.rooms.contains_key(c)
        });
        let room_id = RoomId::new(code);
        let room = Room::new(room_id.clone(), player_id.clone(), self.config.room.clone());
        let room_state = room.view();
        self.rooms.insert(room_id.clone(), room);

        let ctx = self.context_mut(player_id)?;
        ctx.room_id = Some(room_id);
        ctx.game_id = None;
        let session_token = ctx.token.clone();

        self.send_to(
            player_id,
            ServerMessage::RoomJoined {
                player_id: player_id.clone(),
                session_token,
                room_state,
            },
            out,
        );
        Ok(())
    }

    fn join_room(
        &mut self,
        player_id: &PlayerId,
        room_id: Option<RoomId>,
        out: &mut Outbox,
    ) -> RequestResult {
        let room_id = required(room_id, RoomId::is_blank, RequestError::RoomIdRequired)?;
        match &self.context(player_id)?.room_id {
            Some(current) if *current == room_id => return Err(RoomError::AlreadyInRoom.into()),
            Some(_) => return Err(RequestError::InDifferentRoom),
            None => {}
        }

        let room = self.rooms.get_mut(&room_id).ok_or(RoomError::NotFound)?;
        room.add_player(player_id.clone())?;
        let room_state = room.view();

        let ctx = self.context_mut(player_id)?;
        ctx.room_id = Some(room_id.clone());
        ctx.game_id = None;
        let session_token = ctx.token.clone();

        self.send_to(
            player_id,
            ServerMessage::RoomJoined {
                player_id: player_id.clone(),
                session_token,
                room_state,
            },
            out,
        );
        self.broadcast_room(&room_id, out);
        Ok(())
    }

    fn leave_room(
        &mut self,
        player_id: &PlayerId,
        room_id: Option<RoomId>,
        out: &mut Outbox,
    ) -> RequestResult {
        let room_id = required(room_id, RoomId::is_blank, RequestError::RoomIdRequired)?;
        if self.context(player_id)?.room_id.as_ref() != Some(&room_id) {
            return Err(RequestError::NotInSpecifiedRoom);
        }

        let ctx = self.context_mut(player_id)?;
        ctx.room_id = None;
        if let Some(game_id) = ctx.game_id.take() {
            ctx.last_game_id = Some(game_id);
        }
        self.remove_from_room(player_id, &room_id, out);
        Ok(())
    }

    fn room_state(&mut self, player_id: &PlayerId, out: &mut Outbox) -> RequestResult {
        let room_id = self
            .context(player_id)?
            .room_id
            .clone()
            .ok_or(RequestError::NotInRoom)?;
        let room_state = self
            .rooms
            .get(&room_id)
            .ok_or(RequestError::RoomNotFound)?
            .view();
        self.send_to(player_id, ServerMessage::RoomStateUpdate { room_state }, out);
        Ok(())
    }

    /// Takes `player_id` out of `room_id` for good and tells everyone
    /// left behind. Deletes the room if it is now empty.
    pub(crate) fn remove_from_room(
        &mut self,
        player_id: &PlayerId,
        room_id: &RoomId,
        out: &mut Outbox,
    ) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        let seated_game = room.seated_game_of(player_id).and_then(|g| room.game(g));
        let turn_before = seated_game
            .and_then(|g| g.current_seat())
            .map(|s| s.player_id.clone());
        let others: Vec<PlayerId> = seated_game
            .into_iter()
            .flat_map(|g| g.seats())
            .map(|s| s.player_id.clone())
            .filter(|p| p != player_id)
            .collect();
        let Some(departure) = room.remove_player(player_id) else {
            return;
        };
        let room_empty = room.is_empty();

        if let Some((game_id, removal)) = departure.game {
            match removal {
                SeatRemoval::Left => {
                    self.broadcast_game(room_id, &game_id, out);
                    self.announce_turn_if_moved(room_id, &game_id, turn_before.as_ref(), out);
                }
                SeatRemoval::Ended => {
                    self.broadcast_game(room_id, &game_id, out);
                    self.finish_game(room_id, &game_id, out);
                }
                SeatRemoval::Abandoned => {
                    self.drop_abandoned_game(room_id, &game_id, &others, out);
                }
            }
        }

        if room_empty {
            self.rooms.remove(room_id);
            tracing::info!(%room_id, "room deleted");
        } else {
            self.broadcast_room(room_id, out);
        }
    }

    /// Unbinds the players still seated in a game that was dropped without
    /// a result, and tells each of them it is gone.
    fn drop_abandoned_game(
        &mut self,
        room_id: &RoomId,
        game_id: &GameId,
        seated: &[PlayerId],
        out: &mut Outbox,
    ) {
        for player_id in seated {
            let Some(ctx) = self.contexts.get_mut(player_id) else {
                continue;
            };
            if ctx.game_id.as_ref() != Some(game_id) || ctx.room_id.as_ref() != Some(room_id) {
                continue;
            }
            ctx.game_id = None;
            ctx.last_game_id = Some(game_id.clone());
            tracing::debug!(%room_id, %game_id, %player_id, "unseated from abandoned game");
            let gone = ServerMessage::error(RequestError::GameNotFound.to_string());
            self.send_to(player_id, gone, out);
        }
    }

    // =====================================================================
    // Games
    // =====================================================================

    fn create_game(
        &mut self,
        player_id: &PlayerId,
        room_id: Option<RoomId>,
        out: &mut Outbox,
    ) -> RequestResult {
        let room_id = required(room_id, RoomId::is_blank, RequestError::RoomIdRequired)?;
        if self.context(player_id)?.room_id.as_ref() != Some(&room_id) {
            return Err(RequestError::MustBeInRoom);
        }
        let room = self.rooms.get_mut(&room_id).ok_or(RequestError::RoomNotFound)?;
        if room.seated_game_of(player_id).is_some() {
            return Err(RequestError::InAnotherGame);
        }

        let game_id = room.create_game(&mut rand::rng());
        let seated = room
            .game_mut(&game_id)
            .map(|game| game.add_player(player_id.clone(), player_id.to_string()));
        if let Some(Err(err)) = seated {
            room.abandon_game(&game_id);
            return Err(err.into());
        }

        self.seat_and_announce(player_id, &room_id, &game_id, out)
    }

    fn join_game(
        &mut self,
        player_id: &PlayerId,
        room_id: Option<RoomId>,
        game_id: Option<GameId>,
        out: &mut Outbox,
    ) -> RequestResult {
        let room_id = required(room_id, RoomId::is_blank, RequestError::RoomIdRequired)?;
        let game_id = required(game_id, GameId::is_blank, RequestError::GameIdRequired)?;
        if self.context(player_id)?.room_id.as_ref() != Some(&room_id) {
            return Err(RoomError::NotInRoom.into());
        }
        let room = self.rooms.get_mut(&room_id).ok_or(RequestError::RoomNotFound)?;
        if room.game(&game_id).is_none() {
            return Err(RoomError::GameNotFound.into());
        }
        if room.seated_game_of(player_id).is_some_and(|g| *g != game_id) {
            return Err(RequestError::InAnotherGame);
        }

        room.game_mut(&game_id)
            .ok_or(RoomError::GameNotFound)?
            .add_player(player_id.clone(), player_id.to_string())?;

        self.seat_and_announce(player_id, &room_id, &game_id, out)
    }

    /// Binds a freshly seated player to the game and tells the room.
    fn seat_and_announce(
        &mut self,
        player_id: &PlayerId,
        room_id: &RoomId,
        game_id: &GameId,
        out: &mut Outbox,
    ) -> RequestResult {
        self.context_mut(player_id)?.game_id = Some(game_id.clone());

        let game_state = self
            .rooms
            .get(room_id)
            .and_then(|r| r.game(game_id))
            .ok_or(RequestError::GameNotFound)?
            .view_for(player_id);
        tracing::info!(%room_id, %game_id, %player_id, "player joined game");

        self.send_to(
            player_id,
            ServerMessage::GameJoined {
                player_id: player_id.clone(),
                game_state,
            },
            out,
        );
        self.broadcast_game(room_id, game_id, out);
        self.broadcast_room(room_id, out);
        Ok(())
    }

    fn start_game(&mut self, player_id: &PlayerId, out: &mut Outbox) -> RequestResult {
        let ctx = self.context(player_id)?;
        let room_id = ctx.room_id.clone().ok_or(RequestError::NotInRoom)?;
        let game_id = ctx.game_id.clone().ok_or(RequestError::NotInSpecificGame)?;

        let game = self
            .rooms
            .get_mut(&room_id)
            .and_then(|r| r.game_mut(&game_id))
            .ok_or(RequestError::GameNotFound)?;
        game.start(&mut rand::rng())?;
        let first = game.current_seat().map(|s| s.name.clone()).unwrap_or_default();

        self.broadcast_to_game(&room_id, &game_id, &ServerMessage::GameStarted, out);
        self.broadcast_game(&room_id, &game_id, out);
        let first_turn = ServerMessage::TurnChanged { player_name: first };
        self.broadcast_to_game(&room_id, &game_id, &first_turn, out);
        self.broadcast_room(&room_id, out);
        Ok(())
    }

    fn start_new_game(&mut self, player_id: &PlayerId, out: &mut Outbox) -> RequestResult {
        let ctx = self.context(player_id)?;
        let room_id = ctx.room_id.clone().ok_or(RequestError::NotInRoom)?;
        let previous_game_id = ctx.game_id.clone().or_else(|| ctx.last_game_id.clone());

        let room = self.rooms.get_mut(&room_id).ok_or(RequestError::RoomNotFound)?;
        // An untouched table is offered again instead of opening another.
        let idle = room
            .games()
            .find(|g| g.phase() == GamePhase::Waiting && g.seats().is_empty())
            .map(|g| g.id().clone());
        let game_id = match idle {
            Some(game_id) => game_id,
            None => room.create_game(&mut rand::rng()),
        };

        let announcement = ServerMessage::NewGameStarted {
            game_id,
            previous_game_id,
        };
        for member in self.room_recipients(&room_id) {
            out.push(member, announcement.clone());
        }
        self.broadcast_room(&room_id, out);
        Ok(())
    }

    /// The room and game an in-game action applies to.
    fn game_binding(&self, player_id: &PlayerId) -> Result<(RoomId, GameId), RequestError> {
        let ctx = self.context(player_id)?;
        let room_id = ctx.room_id.clone().ok_or(RequestError::NotInGame)?;
        let game_id = ctx.game_id.clone().ok_or(RequestError::NotInGame)?;
        Ok((room_id, game_id))
    }

    fn game_mut(
        &mut self,
        room_id: &RoomId,
        game_id: &GameId,
    ) -> Result<&mut Game, RequestError> {
        self.rooms
            .get_mut(room_id)
            .and_then(|r| r.game_mut(game_id))
            .ok_or(RequestError::GameNotFound)
    }

    fn peek_card(
        &mut self,
        player_id: &PlayerId,
        card_index: i64,
        out: &mut Outbox,
    ) -> RequestResult {
        let (room_id, game_id) = self.game_binding(player_id)?;
        let game = self.game_mut(&room_id, &game_id)?;
        game.peek(player_id, card_index)?;

        if game.phase() == GamePhase::Peeking {
            self.broadcast_game(&room_id, &game_id, out);
        } else {
            let game_state = game.view_for(player_id);
            self.send_to(player_id, ServerMessage::GameState { game_state }, out);
        }
        Ok(())
    }

    /// An action that does not end the turn: apply, then show everyone.
    fn simple_action<F>(
        &mut self,
        player_id: &PlayerId,
        out: &mut Outbox,
        action: F,
    ) -> RequestResult
    where
        F: FnOnce(&mut Game, &PlayerId) -> Result<(), fairway_room::GameError>,
    {
        let (room_id, game_id) = self.game_binding(player_id)?;
        action(self.game_mut(&room_id, &game_id)?, player_id)?;
        self.broadcast_game(&room_id, &game_id, out);
        Ok(())
    }

    fn end_turn_action(
        &mut self,
        player_id: &PlayerId,
        action: TurnEnd,
        out: &mut Outbox,
    ) -> RequestResult {
        let (room_id, game_id) = self.game_binding(player_id)?;
        let game = self.game_mut(&room_id, &game_id)?;
        let turn_before = game.current_seat().map(|s| s.player_id.clone());

        match action {
            TurnEnd::Swap(index) => game.swap(player_id, index)?,
            TurnEnd::Discard => game.discard_drawn(player_id)?,
            TurnEnd::Knock => game.knock(player_id)?,
        }
        let ended = game.phase() == GamePhase::Ended;

        if let TurnEnd::Knock = action {
            let player_name = player_id.to_string();
            let knocked = ServerMessage::PlayerKnocked { player_name };
            self.broadcast_to_game(&room_id, &game_id, &knocked, out);
        }
        self.broadcast_game(&room_id, &game_id, out);

        if ended {
            self.finish_game(&room_id, &game_id, out);
        } else {
            self.announce_turn_if_moved(&room_id, &game_id, turn_before.as_ref(), out);
        }
        Ok(())
    }

    fn announce_turn_if_moved(
        &self,
        room_id: &RoomId,
        game_id: &GameId,
        before: Option<&PlayerId>,
        out: &mut Outbox,
    ) {
        let Some(now) = self
            .rooms
            .get(room_id)
            .and_then(|r| r.game(game_id))
            .filter(|g| g.phase().allows_turns())
            .and_then(|g| g.current_seat())
        else {
            return;
        };
        if before != Some(&now.player_id) {
            let msg = ServerMessage::TurnChanged {
                player_name: now.name.clone(),
            };
            self.broadcast_to_game(room_id, game_id, &msg, out);
        }
    }

    /// Announces an ended game, folds it into the room, and stores it.
    pub(crate) fn finish_game(&mut self, room_id: &RoomId, game_id: &GameId, out: &mut Outbox) {
        let Some(game) = self.rooms.get(room_id).and_then(|r| r.game(game_id)) else {
            return;
        };
        let Ok(result) = game.result() else {
            tracing::error!(%room_id, %game_id, "finishing a game that has not ended");
            return;
        };
        let ended = ServerMessage::GameEnded {
            winner: result.winner.clone(),
            final_scores: result.final_scores.clone(),
        };
        let seated: Vec<PlayerId> = game.seats().iter().map(|s| s.player_id.clone()).collect();
        self.broadcast_to_game(room_id, game_id, &ended, out);

        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        let result = match room.complete_game(game_id) {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(%room_id, %game_id, error = %err, "failed to complete game");
                return;
            }
        };
        if let Err(err) = self.store.insert(StoredGame::from_result(result)) {
            tracing::error!(%room_id, %game_id, error = %err, "failed to store game result");
        }

        for player_id in &seated {
            if let Some(ctx) = self.contexts.get_mut(player_id) {
                if ctx.game_id.as_ref() == Some(game_id) {
                    ctx.game_id = None;
                    ctx.last_game_id = Some(game_id.clone());
                }
            }
        }
        self.broadcast_room(room_id, out);
    }

    // =====================================================================
    // Fan-out
    // =====================================================================

    pub(crate) fn send_to(&self, player_id: &PlayerId, message: ServerMessage, out: &mut Outbox) {
        if let Some(conn) = self.connection_of(player_id) {
            out.push(conn, message);
        }
    }

    /// Live connections of the room's members that are bound to it.
    fn room_recipients(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let Some(room) = self.rooms.get(room_id) else {
            return Vec::new();
        };
        room.members()
            .iter()
            .filter_map(|m| self.contexts.get(&m.player_id))
            .filter(|ctx| ctx.room_id.as_ref() == Some(room_id))
            .filter_map(|ctx| ctx.connection)
            .collect()
    }

    /// Sends the room view to every connected member.
    pub(crate) fn broadcast_room(&self, room_id: &RoomId, out: &mut Outbox) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        let room_state = room.view();
        for conn in self.room_recipients(room_id) {
            out.push(
                conn,
                ServerMessage::RoomStateUpdate {
                    room_state: room_state.clone(),
                },
            );
        }
    }

    /// Sends each seated player their own view of the game.
    pub(crate) fn broadcast_game(&self, room_id: &RoomId, game_id: &GameId, out: &mut Outbox) {
        let Some(game) = self.rooms.get(room_id).and_then(|r| r.game(game_id)) else {
            return;
        };
        for seat in game.seats() {
            if let Some(conn) = self.connection_of(&seat.player_id) {
                out.push(
                    conn,
                    ServerMessage::GameState {
                        game_state: game.view_for(&seat.player_id),
                    },
                );
            }
        }
    }

    /// Sends the same message to every seated player.
    fn broadcast_to_game(
        &self,
        room_id: &RoomId,
        game_id: &GameId,
        message: &ServerMessage,
        out: &mut Outbox,
    ) {
        let Some(game) = self.rooms.get(room_id).and_then(|r| r.game(game_id)) else {
            return;
        };
        for seat in game.seats() {
            if let Some(conn) = self.connection_of(&seat.player_id) {
                out.push(conn, message.clone());
            }
        }
    }
}
