//! Integration tests for rooms and games driven through whole rounds.

use fairway_protocol::{GameId, GamePhase, PlayerId, RoomId};
use fairway_room::{
    Game, GameError, GameStore, InMemoryGameStore, Room, RoomConfig,
    RoomError, StoredGame,
};
use fairway_rules::{Card, Rank, Suit};
use rand::rngs::StdRng;
use rand::SeedableRng;

// =========================================================================
// Helpers
// =========================================================================

fn pid(i: usize) -> PlayerId {
    PlayerId::new(format!("player-{i}"))
}

/// A room with `n` members, all seated in one fresh game.
fn room_with_game(n: usize, seed: u64) -> (Room, GameId, StdRng) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut room = Room::new(RoomId::new("ROOM01"), pid(0), RoomConfig::default());
    for i in 1..n {
        room.add_player(pid(i)).unwrap();
    }
    let game_id = room.create_game(&mut rng);
    let game = room.game_mut(&game_id).unwrap();
    for i in 0..n {
        game.add_player(pid(i), pid(i).to_string()).unwrap();
    }
    (room, game_id, rng)
}

fn cards_in_play(game: &Game) -> usize {
    game.draw_pile_len()
        + game.discard_pile().len()
        + game.seats().iter().map(|s| s.hand.len()).sum::<usize>()
        + usize::from(game.drawn_card().is_some())
}

/// Piles plus `4 × N` hands, as stated on the wire: the held card is
/// counted with the draw pile it came from.
fn pile_formula_holds(game: &Game) -> bool {
    let n = game.seats().len();
    let held = usize::from(game.drawn_card().is_some());
    game.draw_pile_len() == 52 - 4 * n - game.discard_pile().len() - held
}

// =========================================================================
// Card conservation
// =========================================================================

#[test]
fn test_full_round_every_seat_conserves_52_cards() {
    for n in 2..=4 {
        let (mut room, game_id, mut rng) = room_with_game(n, n as u64);
        let game = room.game_mut(&game_id).unwrap();
        game.start(&mut rng).unwrap();
        assert_eq!(cards_in_play(game), 52);
        assert!(pile_formula_holds(game));

        for seat in 0..n {
            let player = pid(seat);
            if seat % 2 == 0 {
                game.draw(&player).unwrap();
                assert!(pile_formula_holds(game));
                game.swap(&player, (seat % 4) as i64).unwrap();
            } else {
                game.draw(&player).unwrap();
                assert_eq!(cards_in_play(game), 52);
                game.discard_drawn(&player).unwrap();
            }
            assert_eq!(cards_in_play(game), 52, "n={n} seat={seat}");
            assert!(pile_formula_holds(game), "n={n} seat={seat}");
        }

        assert_eq!(game.current_index(), 0, "turn wraps back to seat 0");
    }
}

#[test]
fn test_player_leaving_mid_game_conserves_52_cards() {
    let (mut room, game_id, mut rng) = room_with_game(3, 9);
    room.game_mut(&game_id).unwrap().start(&mut rng).unwrap();
    room.game_mut(&game_id).unwrap().draw(&pid(0)).unwrap();

    room.remove_player(&pid(0)).unwrap();

    let game = room.game(&game_id).unwrap();
    assert_eq!(game.seats().len(), 2);
    assert_eq!(cards_in_play(game), 52);
    assert!(pile_formula_holds(game));
}

// =========================================================================
// Scenario: identical ranks cancel
// =========================================================================

#[test]
fn test_all_twos_hands_score_zero() {
    let two = |suit| Card::new(Rank::Two, suit);
    let mut deck = vec![Card::new(Rank::King, Suit::Clubs); 10];
    deck.push(Card::new(Rank::Nine, Suit::Hearts));
    for _ in 0..2 {
        deck.extend([two(Suit::Spades), two(Suit::Hearts), two(Suit::Diamonds), two(Suit::Clubs)]);
    }

    let (mut room, game_id, _) = room_with_game(2, 1);
    let game = room.game_mut(&game_id).unwrap();
    game.start_with_deck(deck).unwrap();
    game.knock(&pid(0)).unwrap();
    game.draw(&pid(1)).unwrap();
    game.discard_drawn(&pid(1)).unwrap();

    assert_eq!(game.phase(), GamePhase::Ended);
    let scores: Vec<i32> = game.final_scores().unwrap().iter().map(|s| s.score).collect();
    assert_eq!(scores, vec![0, 0]);
    // Tied at zero and seat 0 knocked, so seat 0 alone wins.
    assert_eq!(game.winners().unwrap(), &[pid(0).to_string()]);
}

// =========================================================================
// Scenario: duplicate joins
// =========================================================================

#[test]
fn test_join_same_game_twice_rejected_and_count_unchanged() {
    let (mut room, game_id, _) = room_with_game(2, 4);
    let game = room.game_mut(&game_id).unwrap();

    let err = game.add_player(pid(1), "again").unwrap_err();

    assert_eq!(err, GameError::PlayerAlreadyInGame);
    assert_eq!(err.to_string(), "player already in game");
    assert_eq!(game.seats().len(), 2);
}

#[test]
fn test_room_fifth_member_rejected() {
    let (mut room, _, _) = room_with_game(4, 2);
    assert_eq!(room.add_player(pid(9)), Err(RoomError::RoomFull));
}

// =========================================================================
// Room history and store
// =========================================================================

#[test]
fn test_consecutive_games_accumulate_history_and_store_records() {
    let (mut room, first, mut rng) = room_with_game(2, 11);
    let mut store = InMemoryGameStore::new();

    for round in 0..2 {
        let game_id = if round == 0 {
            first.clone()
        } else {
            let id = room.create_game(&mut rng);
            let game = room.game_mut(&id).unwrap();
            game.add_player(pid(0), pid(0).to_string()).unwrap();
            game.add_player(pid(1), pid(1).to_string()).unwrap();
            id
        };
        let game = room.game_mut(&game_id).unwrap();
        game.start(&mut rng).unwrap();
        game.knock(&pid(0)).unwrap();
        game.draw(&pid(1)).unwrap();
        game.discard_drawn(&pid(1)).unwrap();

        let result = room.complete_game(&game_id).unwrap();
        store.insert(StoredGame::from_result(result)).unwrap();
    }

    assert_eq!(room.history().len(), 2);
    assert_eq!(room.games().count(), 0);
    for member in room.members() {
        assert_eq!(member.games_played, 2);
    }
    let tag = format!("player:{}", pid(1));
    assert_eq!(store.find_by_tag(&tag).len(), 2);
    assert_eq!(store.find_by_tag("room:ROOM01").len(), 2);
}
