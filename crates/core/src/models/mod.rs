//! Shared domain models.

use serde::{Deserialize, Serialize};

/// Stable identifier of a registered player.
pub type PlayerId = u64;

/// Lowest rating a player can hold in either discipline.
pub const MIN_RATING: f64 = 1.0;
/// Highest rating a player can hold in either discipline.
pub const MAX_RATING: f64 = 10.0;

/// A rated player from the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique, stable identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Batting skill in `[1, 10]`.
    pub batting_rating: f64,
    /// Bowling skill in `[1, 10]`.
    pub bowling_rating: f64,
    /// Sum of both ratings, kept in step with them.
    pub total_rating: f64,
}

impl Player {
    /// Build a player and derive its total rating.
    pub fn new(id: PlayerId, name: impl Into<String>, batting: f64, bowling: f64) -> Self {
        Self {
            id,
            name: name.into(),
            batting_rating: batting,
            bowling_rating: bowling,
            total_rating: batting + bowling,
        }
    }

    /// Return a copy with new ratings and a recomputed total.
    pub fn with_ratings(&self, batting: f64, bowling: f64) -> Self {
        Self::new(self.id, self.name.clone(), batting, bowling)
    }

    /// Short "Bat 7 · Bowl 6" style label used by frontends.
    pub fn rating_label(&self) -> String {
        format!(
            "Bat {} · Bowl {} · Total {}",
            format_rating(self.batting_rating),
            format_rating(self.bowling_rating),
            format_rating(self.total_rating)
        )
    }
}

/// Render a rating without a trailing `.0`.
pub fn format_rating(value: f64) -> String {
    if (value - value.round()).abs() < f64::EPSILON {
        format!("{}", value.round() as i64)
    } else {
        format!("{value:.1}")
    }
}

/// Which of the two sides a team is. Used as a stable handle instead of
/// matching teams by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamSide {
    /// First team, favoured on balancing ties.
    A,
    /// Second team.
    B,
}

impl TeamSide {
    /// The opposing side.
    pub fn other(self) -> Self {
        match self {
            TeamSide::A => TeamSide::B,
            TeamSide::B => TeamSide::A,
        }
    }
}

/// A squad with its aggregated ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Team display name.
    pub name: String,
    /// Roster in batting order, captain first.
    pub players: Vec<Player>,
    /// Sum of batting ratings over `players`.
    pub total_batting_rating: f64,
    /// Sum of bowling ratings over `players`.
    pub total_bowling_rating: f64,
    /// Sum of total ratings over `players`.
    pub total_rating: f64,
}

impl Team {
    /// Build a team and compute its totals from the roster.
    pub fn new(name: impl Into<String>, players: Vec<Player>) -> Self {
        let total_batting_rating = players.iter().map(|p| p.batting_rating).sum();
        let total_bowling_rating = players.iter().map(|p| p.bowling_rating).sum();
        let total_rating = players.iter().map(|p| p.total_rating).sum();
        Self {
            name: name.into(),
            players,
            total_batting_rating,
            total_bowling_rating,
            total_rating,
        }
    }

    /// Captain of the side, if the roster is not empty.
    pub fn captain(&self) -> Option<&Player> {
        self.players.first()
    }

    /// Whether the given player is on this roster.
    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    /// Look up a roster member.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_totals_follow_roster() {
        let team = Team::new(
            "Team A",
            vec![Player::new(1, "Rishu", 9.0, 9.0), Player::new(2, "Dev", 4.0, 8.0)],
        );
        assert_eq!(team.total_batting_rating, 13.0);
        assert_eq!(team.total_bowling_rating, 17.0);
        assert_eq!(team.total_rating, 30.0);
        assert_eq!(team.captain().map(|p| p.id), Some(1));
        assert!(team.contains(2));
        assert!(!team.contains(3));
    }

    #[test]
    fn rating_labels_drop_trailing_zero() {
        assert_eq!(format_rating(7.0), "7");
        assert_eq!(format_rating(6.5), "6.5");
        let player = Player::new(3, "Sir", 7.0, 6.5);
        assert_eq!(player.rating_label(), "Bat 7 · Bowl 6.5 · Total 13.5");
    }
}
