//! Shared player registry.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::{
    error::ValidationError,
    models::{Player, PlayerId, MAX_RATING, MIN_RATING},
};

const DEFAULT_SQUAD: [(&str, f64, f64); 13] = [
    ("Rishu", 9.0, 9.0),
    ("Dev", 4.0, 8.0),
    ("Abhishek", 8.0, 5.0),
    ("Priyanshu", 8.0, 4.0),
    ("Shubham", 7.0, 7.0),
    ("Shikhar", 6.0, 7.0),
    ("Sir", 7.0, 6.0),
    ("Naveen", 9.0, 8.0),
    ("Shivansh", 7.0, 9.0),
    ("Sunil", 7.0, 4.0),
    ("Kanishk", 7.0, 7.0),
    ("Garv", 6.0, 7.0),
    ("Abhijeet", 6.0, 6.0),
];

/// The squad used when nothing has been saved yet. Ids start at 1.
pub fn default_roster() -> Vec<Player> {
    DEFAULT_SQUAD
        .iter()
        .zip(1..)
        .map(|(&(name, batting, bowling), id)| Player::new(id, name, batting, bowling))
        .collect()
}

/// Cloneable handle to the player list. Every clone sees the same players.
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    inner: Arc<RwLock<Vec<Player>>>,
}

impl PlayerRegistry {
    /// Registry holding `players`.
    pub fn new(players: Vec<Player>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(players)),
        }
    }

    /// Registry seeded with [`default_roster`].
    pub fn with_defaults() -> Self {
        Self::new(default_roster())
    }

    /// Snapshot of every player.
    pub fn players(&self) -> Vec<Player> {
        self.inner.read().clone()
    }

    /// Number of registered players.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether nobody is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Look up one player.
    pub fn get(&self, id: PlayerId) -> Option<Player> {
        self.inner.read().iter().find(|p| p.id == id).cloned()
    }

    /// Players for `ids`, in the order given.
    pub fn pool(&self, ids: &[PlayerId]) -> Result<Vec<Player>, ValidationError> {
        let players = self.inner.read();
        ids.iter()
            .map(|&id| {
                players
                    .iter()
                    .find(|p| p.id == id)
                    .cloned()
                    .ok_or(ValidationError::UnknownPlayer { id })
            })
            .collect()
    }

    /// Register a new player with the next free id.
    pub fn add_player(
        &self,
        name: &str,
        batting: f64,
        bowling: f64,
    ) -> Result<Player, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        check_rating("batting", batting)?;
        check_rating("bowling", bowling)?;

        let mut players = self.inner.write();
        let id = players.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let player = Player::new(id, name, batting, bowling);
        players.push(player.clone());
        info!(id, name, batting, bowling, "Player added");
        Ok(player)
    }

    /// Remove a player, returning them if they were registered.
    pub fn remove_player(&self, id: PlayerId) -> Option<Player> {
        let mut players = self.inner.write();
        let index = players.iter().position(|p| p.id == id)?;
        let removed = players.remove(index);
        info!(id, name = %removed.name, "Player removed");
        Some(removed)
    }

    /// Swap in a whole new list, as after a match.
    pub fn replace_all(&self, players: Vec<Player>) {
        *self.inner.write() = players;
    }
}

fn check_rating(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if (MIN_RATING..=MAX_RATING).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::RatingOutOfRange { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roster_has_the_full_squad() {
        let roster = default_roster();
        assert_eq!(roster.len(), 13);
        assert_eq!(roster[0], Player::new(1, "Rishu", 9.0, 9.0));
        assert_eq!(roster[12].name, "Abhijeet");
        assert_eq!(roster[12].id, 13);
        assert_eq!(roster[7].total_rating, 17.0);
    }

    #[test]
    fn add_trims_names_and_assigns_fresh_ids() {
        let registry = PlayerRegistry::with_defaults();
        let player = registry.add_player("  Arjun ", 6.5, 3.0).unwrap();
        assert_eq!(player.id, 14);
        assert_eq!(player.name, "Arjun");
        assert_eq!(player.total_rating, 9.5);
        assert_eq!(registry.get(14), Some(player));
        assert_eq!(registry.len(), 14);
    }

    #[test]
    fn add_rejects_bad_input() {
        let registry = PlayerRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(
            registry.add_player("   ", 5.0, 5.0),
            Err(ValidationError::EmptyName)
        );
        assert_eq!(
            registry.add_player("Zed", 0.5, 5.0),
            Err(ValidationError::RatingOutOfRange {
                field: "batting",
                value: 0.5
            })
        );
        assert_eq!(
            registry.add_player("Zed", 5.0, 11.0),
            Err(ValidationError::RatingOutOfRange {
                field: "bowling",
                value: 11.0
            })
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn pool_keeps_selection_order() {
        let registry = PlayerRegistry::with_defaults();
        let pool = registry.pool(&[8, 1, 3]).unwrap();
        let names: Vec<_> = pool.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Naveen", "Rishu", "Abhishek"]);
        assert_eq!(
            registry.pool(&[1, 99]),
            Err(ValidationError::UnknownPlayer { id: 99 })
        );
    }

    #[test]
    fn clones_share_updates() {
        let registry = PlayerRegistry::with_defaults();
        let handle = registry.clone();

        let removed = handle.remove_player(2).map(|p| p.name);
        assert_eq!(removed.as_deref(), Some("Dev"));
        assert!(registry.get(2).is_none());
        assert!(registry.remove_player(2).is_none());

        let updated: Vec<Player> = registry
            .players()
            .iter()
            .map(|p| p.with_ratings(5.0, 5.0))
            .collect();
        handle.replace_all(updated);
        assert!(registry.players().iter().all(|p| p.total_rating == 10.0));
        assert_eq!(registry.len(), 12);
    }
}
