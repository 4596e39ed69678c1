//! Completed-game storage.
//!
//! Once a game ends and is folded into its room, the hub also hands the
//! result to a [`GameStore`]. The store is the only place a result survives
//! after its room is deleted, and it answers "which games did this player
//! finish?" through tags.
//!
//! The trait is object safe so the hub can hold a `Box<dyn GameStore>` and
//! a deployment can swap in a durable backend.

use std::collections::HashMap;

use fairway_protocol::GameResult;

use crate::StoreError;

/// A stored game result plus its bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredGame {
    /// `{roomId}/{gameId}`; game ids are only unique within one room.
    pub id: String,
    /// Starts at 1 on insert and goes up by one per update.
    pub version: u64,
    /// Lookup keys such as `room:K3Q9ZD` and `player:bouncy-coral-quokka-x7k2`.
    pub tags: Vec<String>,
    pub result: GameResult,
}

impl StoredGame {
    /// A fresh record for `result`, tagged with its room and every player.
    pub fn from_result(result: GameResult) -> Self {
        let mut tags = vec![format!("room:{}", result.room_id)];
        tags.extend(
            result
                .final_scores
                .iter()
                .map(|s| format!("player:{}", s.player_name)),
        );
        Self {
            id: format!("{}/{}", result.room_id, result.game_id),
            version: 1,
            tags,
            result,
        }
    }
}

/// Persistence collaborator for finished games.
///
/// Methods take `&mut self` because the store is owned by the hub task.
pub trait GameStore: Send + 'static {
    /// Stores a new record at version 1.
    fn insert(&mut self, record: StoredGame) -> Result<(), StoreError>;

    fn find_by_id(&self, id: &str) -> Option<StoredGame>;

    /// Every record carrying `tag`, oldest first.
    fn find_by_tag(&self, tag: &str) -> Vec<StoredGame>;

    /// Applies `mutate` to the record if it is still at
    /// `expected_version`, and returns the new version.
    ///
    /// `mutate` cannot change the record's id or version.
    fn update_with_version(
        &mut self,
        id: &str,
        expected_version: u64,
        mutate: &mut dyn FnMut(&mut StoredGame),
    ) -> Result<u64, StoreError>;
}

/// The default store: a vector in insertion order plus an id index.
#[derive(Debug, Default)]
pub struct InMemoryGameStore {
    records: Vec<StoredGame>,
    by_id: HashMap<String, usize>,
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl GameStore for InMemoryGameStore {
    fn insert(&mut self, mut record: StoredGame) -> Result<(), StoreError> {
        if self.by_id.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id));
        }
        record.version = 1;
        self.by_id.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Option<StoredGame> {
        self.by_id.get(id).map(|&i| self.records[i].clone())
    }

    fn find_by_tag(&self, tag: &str) -> Vec<StoredGame> {
        self.records
            .iter()
            .filter(|r| r.tags.iter().any(|t| t == tag))
            .cloned()
            .collect()
    }

    fn update_with_version(
        &mut self,
        id: &str,
        expected_version: u64,
        mutate: &mut dyn FnMut(&mut StoredGame),
    ) -> Result<u64, StoreError> {
        let &i = self
            .by_id
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))?;
        let record = &mut self.records[i];
        if record.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: record.version,
            });
        }

        let mut next = record.clone();
        mutate(&mut next);
        next.id = record.id.clone();
        next.version = expected_version + 1;
        *record = next;
        Ok(record.version)
    }
}

#[cfg(test)]
mod tests {
    use fairway_protocol::{FinalScore, GameId, RoomId};

    use super::*;

    fn result(game: &str, players: &[&str]) -> GameResult {
        GameResult {
            game_id: GameId::new(game),
            room_id: RoomId::new("R1"),
            winner: players[0].to_string(),
            winners: vec![players[0].to_string()],
            final_scores: players
                .iter()
                .map(|p| FinalScore {
                    player_name: p.to_string(),
                    score: 5,
                })
                .collect(),
            completed_at: 0,
        }
    }

    #[test]
    fn test_from_result_tags_room_and_players() {
        let record = StoredGame::from_result(result("G1", &["a", "b"]));
        assert_eq!(record.id, "R1/G1");
        assert_eq!(record.version, 1);
        assert_eq!(record.tags, vec!["room:R1", "player:a", "player:b"]);
    }

    #[test]
    fn test_insert_duplicate_returns_already_exists() {
        let mut store = InMemoryGameStore::new();
        store.insert(StoredGame::from_result(result("G1", &["a"]))).unwrap();

        let err = store
            .insert(StoredGame::from_result(result("G1", &["a"])))
            .unwrap_err();

        assert_eq!(err, StoreError::AlreadyExists("R1/G1".into()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_find_by_tag_returns_matches_in_insertion_order() {
        let mut store = InMemoryGameStore::new();
        store.insert(StoredGame::from_result(result("G1", &["a", "b"]))).unwrap();
        store.insert(StoredGame::from_result(result("G2", &["b", "c"]))).unwrap();
        store.insert(StoredGame::from_result(result("G3", &["a"]))).unwrap();

        let ids: Vec<String> = store
            .find_by_tag("player:a")
            .into_iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(ids, vec!["R1/G1", "R1/G3"]);
        assert_eq!(store.find_by_tag("room:R1").len(), 3);
        assert!(store.find_by_tag("player:zed").is_empty());
    }

    #[test]
    fn test_find_by_id_unknown_returns_none() {
        let store = InMemoryGameStore::new();
        assert!(store.find_by_id("R1/G1").is_none());
    }

    #[test]
    fn test_update_with_version_bumps_version() {
        let mut store = InMemoryGameStore::new();
        store.insert(StoredGame::from_result(result("G1", &["a"]))).unwrap();

        let version = store
            .update_with_version("R1/G1", 1, &mut |r| r.tags.push("archived".into()))
            .unwrap();

        assert_eq!(version, 2);
        let stored = store.find_by_id("R1/G1").unwrap();
        assert_eq!(stored.version, 2);
        assert!(stored.tags.contains(&"archived".to_string()));
    }

    #[test]
    fn test_update_with_version_stale_returns_conflict_and_keeps_record() {
        let mut store = InMemoryGameStore::new();
        store.insert(StoredGame::from_result(result("G1", &["a"]))).unwrap();
        store.update_with_version("R1/G1", 1, &mut |_| {}).unwrap();

        let err = store
            .update_with_version("R1/G1", 1, &mut |r| r.tags.clear())
            .unwrap_err();

        assert_eq!(err, StoreError::VersionConflict { expected: 1, actual: 2 });
        assert!(!store.find_by_id("R1/G1").unwrap().tags.is_empty());
    }

    #[test]
    fn test_update_with_version_unknown_returns_not_found() {
        let mut store = InMemoryGameStore::new();
        let err = store.update_with_version("nope", 1, &mut |_| {}).unwrap_err();
        assert_eq!(err, StoreError::NotFound("nope".into()));
    }
}
