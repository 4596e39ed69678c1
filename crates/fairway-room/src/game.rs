//! One match of Golf.
//!
//! A [`Game`] owns its deck, discard pile, and seats, and only changes
//! through the methods below. Every method either applies its whole
//! effect or returns an error and leaves the game exactly as it was.
//!
//! # Turn structure
//!
//! ```text
//!            ┌── drawCard / takeFromDiscard ──→ [holding] ──┬── swapCard ────┐
//! [turn] ────┤                                              └── discardDrawn ┼──→ next seat
//!            └── knock ─────────────────────────────────────────────────────┘
//! ```
//!
//! Once someone knocks, every other seat gets one more turn. The game ends
//! when play comes back round to the knocker, or as soon as a turn ends
//! with the draw pile empty.

use std::time::SystemTime;

use fairway_protocol::{
    FinalScore, GameId, GamePhase, GameResult, GameView, PlayerId,
    PlayerView, RoomId,
};
use fairway_rules::{
    create_deck, score_hand, shuffle, validate_card_index, winners, Card,
    HAND_SIZE, MAX_REVEALS,
};
use rand::Rng;

use crate::{unix_millis, GameError};

/// A seated player's per-game state. Recreated for every game.
#[derive(Debug, Clone)]
pub struct Seat {
    pub player_id: PlayerId,
    pub name: String,
    pub hand: Vec<Card>,
    /// Hand slots this player has looked at, in order. Never more than
    /// [`MAX_REVEALS`] and never cleared during the game.
    pub revealed: Vec<usize>,
    /// Whether the revealed cards are currently on this player's screen.
    pub showing: bool,
    pub score: Option<i32>,
    pub connected: bool,
}

impl Seat {
    fn new(player_id: PlayerId, name: String) -> Self {
        Self {
            player_id,
            name,
            hand: Vec::with_capacity(HAND_SIZE),
            revealed: Vec::with_capacity(MAX_REVEALS),
            showing: false,
            score: None,
            connected: true,
        }
    }
}

/// What [`Game::remove_player`] did to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatRemoval {
    /// The seat is gone and play continues.
    Left,
    /// Too few players remain, or the knocker left. The game cannot be
    /// finished and should be dropped without a result.
    Abandoned,
    /// The departure closed a knocked round; the game is now `Ended`.
    Ended,
}

#[derive(Debug, Clone)]
pub struct Game {
    id: GameId,
    room_id: RoomId,
    seats: Vec<Seat>,
    /// Draw pile. The top card is the last element.
    deck: Vec<Card>,
    /// Discard pile. The top card is the last element.
    discard: Vec<Card>,
    drawn: Option<Card>,
    current: usize,
    phase: GamePhase,
    knocker: Option<PlayerId>,
    all_peeked: bool,
    result: Option<GameResult>,
    max_players: usize,
    min_players: usize,
}

impl Game {
    /// An empty game in the `Waiting` phase.
    pub fn new(
        id: GameId,
        room_id: RoomId,
        max_players: usize,
        min_players: usize,
    ) -> Self {
        Self {
            id,
            room_id,
            seats: Vec::with_capacity(max_players),
            deck: Vec::new(),
            discard: Vec::new(),
            drawn: None,
            current: 0,
            phase: GamePhase::Waiting,
            knocker: None,
            all_peeked: false,
            result: None,
            max_players,
            min_players,
        }
    }

    // -- Accessors --------------------------------------------------------

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The seat whose turn it is, if anyone is seated.
    pub fn current_seat(&self) -> Option<&Seat> {
        self.seats.get(self.current)
    }

    pub fn draw_pile_len(&self) -> usize {
        self.deck.len()
    }

    pub fn discard_pile(&self) -> &[Card] {
        &self.discard
    }

    pub fn drawn_card(&self) -> Option<Card> {
        self.drawn
    }

    pub fn knocker(&self) -> Option<&PlayerId> {
        self.knocker.as_ref()
    }

    pub fn all_players_peeked(&self) -> bool {
        self.all_peeked
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn is_seated(&self, player_id: &PlayerId) -> bool {
        self.seat_index(player_id).is_some()
    }

    fn seat_index(&self, player_id: &PlayerId) -> Option<usize> {
        self.seats.iter().position(|s| &s.player_id == player_id)
    }

    fn knocker_seat(&self) -> Option<usize> {
        self.knocker.as_ref().and_then(|k| self.seat_index(k))
    }

    fn set_phase(&mut self, next: GamePhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal phase change {} -> {next}",
            self.phase
        );
        self.phase = next;
    }

    // -- Seating ----------------------------------------------------------

    /// Seats a player. Only possible before the deal.
    pub fn add_player(
        &mut self,
        player_id: PlayerId,
        name: impl Into<String>,
    ) -> Result<(), GameError> {
        if self.is_seated(&player_id) {
            return Err(GameError::PlayerAlreadyInGame);
        }
        if self.phase.is_started() {
            return Err(GameError::AlreadyStarted);
        }
        if self.seats.len() >= self.max_players {
            return Err(GameError::GameFull);
        }
        self.seats.push(Seat::new(player_id, name.into()));
        Ok(())
    }

    /// Marks a seated player's connection status. Unknown ids are ignored.
    pub fn set_connected(&mut self, player_id: &PlayerId, connected: bool) {
        if let Some(seat) = self.seats.iter_mut().find(|s| &s.player_id == player_id) {
            seat.connected = connected;
        }
    }

    /// Removes a seated player, keeping the card count and turn index
    /// consistent. Returns `None` if the player was not seated.
    ///
    /// The leaver's hand goes to the bottom of the draw pile and a card
    /// they were holding goes on the discard pile.
    pub fn remove_player(&mut self, player_id: &PlayerId) -> Option<SeatRemoval> {
        let idx = self.seat_index(player_id)?;
        let seat = self.seats.remove(idx);

        if !self.phase.is_started() || self.phase == GamePhase::Ended {
            self.current = self.current.min(self.seats.len().saturating_sub(1));
            return Some(SeatRemoval::Left);
        }

        self.deck.splice(0..0, seat.hand);
        if idx == self.current {
            if let Some(card) = self.drawn.take() {
                self.discard.push(card);
            }
        }
        if idx < self.current {
            self.current -= 1;
        }

        let knocker_left = self.knocker.as_ref() == Some(&seat.player_id);
        if self.seats.len() < self.min_players || knocker_left {
            self.current = 0;
            return Some(SeatRemoval::Abandoned);
        }

        if self.current >= self.seats.len() {
            self.current = 0;
        }

        if self.phase == GamePhase::Knocked && self.knocker_seat() == Some(self.current) {
            self.finish();
            return Some(SeatRemoval::Ended);
        }
        Some(SeatRemoval::Left)
    }

    // -- Dealing ----------------------------------------------------------

    /// Shuffles a fresh 52-card deck and deals.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        let mut deck = create_deck();
        shuffle(&mut deck, rng);
        self.start_with_deck(deck)
    }

    /// Deals from `deck` as given; the top card is the last element.
    ///
    /// Each seat gets [`HAND_SIZE`] cards, one card is turned onto the
    /// discard pile, and seat 0 takes the first turn.
    pub fn start_with_deck(&mut self, mut deck: Vec<Card>) -> Result<(), GameError> {
        if self.phase.is_started() {
            return Err(GameError::AlreadyStarted);
        }
        if self.seats.len() < self.min_players {
            return Err(GameError::NotEnoughPlayers(self.min_players));
        }
        if deck.len() < HAND_SIZE * self.seats.len() + 1 {
            return Err(GameError::DeckEmpty);
        }

        for seat in &mut self.seats {
            let split = deck.len() - HAND_SIZE;
            seat.hand = deck.split_off(split);
        }
        self.discard = deck.pop().into_iter().collect();
        self.deck = deck;
        self.current = 0;
        self.set_phase(GamePhase::Playing);

        tracing::info!(
            room_id = %self.room_id,
            game_id = %self.id,
            players = self.seats.len(),
            "game started"
        );
        Ok(())
    }

    // -- Peeking ----------------------------------------------------------

    /// Lets a player look at one of their own cards.
    ///
    /// Each player may look at [`MAX_REVEALS`] distinct cards over the
    /// whole game. When every seat has used both, the game enters
    /// `Peeking` until someone hides the cards again.
    pub fn peek(&mut self, player_id: &PlayerId, card_index: i64) -> Result<(), GameError> {
        if !self.phase.allows_peeking() {
            return Err(GameError::CannotPeek);
        }
        let index = validate_card_index(card_index)?;
        let seat = self
            .seats
            .iter_mut()
            .find(|s| &s.player_id == player_id)
            .ok_or(GameError::PlayerNotFound)?;
        if seat.revealed.len() >= MAX_REVEALS {
            return Err(GameError::PeekLimitReached);
        }
        if seat.revealed.contains(&index) {
            return Err(GameError::AlreadyPeeked);
        }

        seat.revealed.push(index);
        seat.showing = true;

        if !self.all_peeked && self.seats.iter().all(|s| s.revealed.len() == MAX_REVEALS) {
            self.all_peeked = true;
            if self.phase == GamePhase::Playing {
                self.set_phase(GamePhase::Peeking);
            }
        }
        Ok(())
    }

    /// Takes every revealed card off screen. The reveal ledger is kept.
    pub fn hide_peeked_cards(&mut self) {
        for seat in &mut self.seats {
            seat.showing = false;
        }
        if self.phase == GamePhase::Peeking {
            self.set_phase(GamePhase::Playing);
        }
    }

    // -- Turn actions -----------------------------------------------------

    /// Checks that `player_id` may act right now and returns their seat.
    fn acting_seat(&self, player_id: &PlayerId) -> Result<usize, GameError> {
        let idx = self.seat_index(player_id).ok_or(GameError::PlayerNotFound)?;
        if !self.phase.allows_turns() {
            return Err(GameError::NotPlaying);
        }
        if idx != self.current {
            return Err(GameError::NotYourTurn);
        }
        Ok(idx)
    }

    /// Takes the top card of the draw pile into the held slot.
    pub fn draw(&mut self, player_id: &PlayerId) -> Result<Card, GameError> {
        self.acting_seat(player_id)?;
        if self.drawn.is_some() {
            return Err(GameError::AlreadyDrawn);
        }
        let card = self.deck.pop().ok_or(GameError::DeckEmpty)?;
        self.drawn = Some(card);
        Ok(card)
    }

    /// Takes the top card of the discard pile into the held slot.
    pub fn take_discard(&mut self, player_id: &PlayerId) -> Result<Card, GameError> {
        self.acting_seat(player_id)?;
        if self.drawn.is_some() {
            return Err(GameError::AlreadyDrawn);
        }
        let card = self.discard.pop().ok_or(GameError::DiscardEmpty)?;
        self.drawn = Some(card);
        Ok(card)
    }

    /// Puts the held card into hand slot `card_index` and discards the
    /// card it replaces. Ends the turn.
    pub fn swap(&mut self, player_id: &PlayerId, card_index: i64) -> Result<(), GameError> {
        let idx = self.acting_seat(player_id)?;
        let slot = validate_card_index(card_index)?;
        let card = self.drawn.take().ok_or(GameError::NothingToSwap)?;

        let replaced = std::mem::replace(&mut self.seats[idx].hand[slot], card);
        self.discard.push(replaced);
        self.end_turn(idx);
        Ok(())
    }

    /// Discards the held card without touching the hand. Ends the turn.
    pub fn discard_drawn(&mut self, player_id: &PlayerId) -> Result<(), GameError> {
        let idx = self.acting_seat(player_id)?;
        let card = self.drawn.take().ok_or(GameError::NothingToDiscard)?;
        self.discard.push(card);
        self.end_turn(idx);
        Ok(())
    }

    /// Declares the final round. Ends the turn.
    pub fn knock(&mut self, player_id: &PlayerId) -> Result<(), GameError> {
        let idx = self.acting_seat(player_id)?;
        if self.drawn.is_some() {
            return Err(GameError::KnockAfterDraw);
        }
        if self.knocker.is_some() {
            return Err(GameError::AlreadyKnocked);
        }

        self.knocker = Some(player_id.clone());
        self.set_phase(GamePhase::Knocked);
        tracing::info!(
            room_id = %self.room_id,
            game_id = %self.id,
            %player_id,
            "player knocked"
        );
        self.end_turn(idx);
        Ok(())
    }

    /// Passes the turn on from seat `actor`.
    fn end_turn(&mut self, actor: usize) {
        self.current = (self.current + 1) % self.seats.len();

        if self.phase == GamePhase::Knocked && self.knocker_seat() == Some(self.current) {
            self.finish();
            return;
        }

        if self.deck.is_empty() {
            // Whoever closed the game counts as the knocker.
            if self.knocker.is_none() {
                self.knocker = Some(self.seats[actor].player_id.clone());
            }
            self.finish();
        }
    }

    /// Turns every card face up, scores the hands, and records the result.
    fn finish(&mut self) {
        for seat in &mut self.seats {
            seat.score = Some(score_hand(&seat.hand));
            seat.showing = false;
        }
        self.set_phase(GamePhase::Ended);

        let scores: Vec<i32> = self.seats.iter().filter_map(|s| s.score).collect();
        let winner_names: Vec<String> = winners(&scores, self.knocker_seat())
            .into_iter()
            .map(|i| self.seats[i].name.clone())
            .collect();
        let final_scores = self
            .seats
            .iter()
            .map(|s| FinalScore {
                player_name: s.name.clone(),
                score: s.score.unwrap_or_default(),
            })
            .collect();

        let result = GameResult {
            game_id: self.id.clone(),
            room_id: self.room_id.clone(),
            winner: winner_names.first().cloned().unwrap_or_default(),
            winners: winner_names,
            final_scores,
            completed_at: unix_millis(SystemTime::now()),
        };

        tracing::info!(
            room_id = %self.room_id,
            game_id = %self.id,
            winner = %result.winner,
            "game ended"
        );
        self.result = Some(result);
    }

    // -- Results ----------------------------------------------------------

    /// The finished game's result.
    pub fn result(&self) -> Result<&GameResult, GameError> {
        self.result.as_ref().ok_or(GameError::NotCompleted)
    }

    /// Every winner's name; more than one only on a tie without the knocker.
    pub fn winners(&self) -> Result<&[String], GameError> {
        self.result().map(|r| r.winners.as_slice())
    }

    pub fn final_scores(&self) -> Result<&[FinalScore], GameError> {
        self.result().map(|r| r.final_scores.as_slice())
    }

    // -- Views ------------------------------------------------------------

    /// The game as `viewer` is allowed to see it.
    ///
    /// Card faces are hidden except for the viewer's own revealed cards
    /// while they are on screen, and every card once the game has ended.
    /// The held card is shown only to the player holding it.
    pub fn view_for(&self, viewer: &PlayerId) -> GameView {
        let ended = self.phase == GamePhase::Ended;
        let players = self
            .seats
            .iter()
            .map(|seat| {
                let own = &seat.player_id == viewer;
                let cards = seat
                    .hand
                    .iter()
                    .enumerate()
                    .map(|(slot, card)| {
                        let visible =
                            ended || (own && seat.showing && seat.revealed.contains(&slot));
                        visible.then_some(*card)
                    })
                    .collect();
                PlayerView {
                    id: seat.player_id.clone(),
                    name: seat.name.clone(),
                    cards,
                    revealed_cards: seat.revealed.clone(),
                    score: seat.score,
                    is_connected: seat.connected,
                }
            })
            .collect();

        let holder_is_viewer = self
            .current_seat()
            .is_some_and(|s| &s.player_id == viewer);

        GameView {
            id: self.id.clone(),
            room_id: self.room_id.clone(),
            players,
            current_player_index: self.current,
            draw_pile: self.deck.len(),
            discard_pile: self.discard.clone(),
            game_phase: self.phase,
            knocked_player_id: self.knocker.clone(),
            drawn_card: self.drawn.filter(|_| holder_is_viewer),
            all_players_peeked: self.all_peeked,
        }
    }
}
