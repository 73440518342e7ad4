//! Team balancing.
//!
//! Captains seed their sides, then the rest of the pool is dealt out
//! greedily, strongest first, to whichever side currently has the lower
//! total rating. Squads are small, so the greedy pass is close enough to an
//! optimal partition.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::ValidationError,
    models::{Player, PlayerId, Team, TeamSide},
};

/// Captain picks for both sides. Either may still be unset while the
/// frontend is collecting them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captains {
    /// Captain of team A.
    pub a: Option<PlayerId>,
    /// Captain of team B.
    pub b: Option<PlayerId>,
}

impl Captains {
    /// Both captains chosen.
    pub fn new(a: PlayerId, b: PlayerId) -> Self {
        Self {
            a: Some(a),
            b: Some(b),
        }
    }
}

/// Output of [`balance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancedTeams {
    /// First side, led by captain A.
    pub team_a: Team,
    /// Second side, led by captain B.
    pub team_b: Team,
    /// Player shared by both sides when the pool left one over. Counted in
    /// neither team's totals.
    pub common_player: Option<Player>,
}

impl BalancedTeams {
    /// Borrow a side by handle.
    pub fn team(&self, side: TeamSide) -> &Team {
        match side {
            TeamSide::A => &self.team_a,
            TeamSide::B => &self.team_b,
        }
    }

    /// Absolute difference between the two sides' total ratings.
    pub fn rating_gap(&self) -> f64 {
        (self.team_a.total_rating - self.team_b.total_rating).abs()
    }
}

/// Split `pool` into two balanced teams led by the given captains.
///
/// All preconditions are checked before any assignment happens, so an error
/// never comes with a partial result.
pub fn balance(
    pool: &[Player],
    name_a: &str,
    name_b: &str,
    captains: Captains,
) -> Result<BalancedTeams, ValidationError> {
    if pool.len() < 2 {
        return Err(ValidationError::TooFewPlayers { found: pool.len() });
    }

    let mut seen = HashSet::with_capacity(pool.len());
    for player in pool {
        if !seen.insert(player.id) {
            return Err(ValidationError::DuplicatePlayer { id: player.id });
        }
    }

    let (Some(captain_a), Some(captain_b)) = (captains.a, captains.b) else {
        return Err(ValidationError::MissingCaptain);
    };
    if captain_a == captain_b {
        return Err(ValidationError::DuplicateCaptain);
    }
    let captain_a = find_captain(pool, captain_a)?;
    let captain_b = find_captain(pool, captain_b)?;

    let mut remaining: Vec<Player> = pool
        .iter()
        .filter(|player| player.id != captain_a.id && player.id != captain_b.id)
        .cloned()
        .collect();
    remaining.sort_by(|x, y| y.total_rating.total_cmp(&x.total_rating));

    // Odd remainder: the weakest player sits out of the greedy pass.
    let common_player = if remaining.len() % 2 == 1 {
        remaining.pop()
    } else {
        None
    };
    let per_side = remaining.len() / 2;

    let mut roster_a = vec![captain_a];
    let mut roster_b = vec![captain_b];
    let mut total_a = roster_a[0].total_rating;
    let mut total_b = roster_b[0].total_rating;

    for player in remaining {
        let assigned_a = roster_a.len() - 1;
        let assigned_b = roster_b.len() - 1;
        let to_a = if assigned_a == per_side {
            false
        } else if assigned_b == per_side {
            true
        } else {
            total_a <= total_b
        };

        if to_a {
            total_a += player.total_rating;
            roster_a.push(player);
        } else {
            total_b += player.total_rating;
            roster_b.push(player);
        }
    }

    let teams = BalancedTeams {
        team_a: Team::new(name_a, roster_a),
        team_b: Team::new(name_b, roster_b),
        common_player,
    };
    debug!(
        team_a = teams.team_a.total_rating,
        team_b = teams.team_b.total_rating,
        common = ?teams.common_player.as_ref().map(|p| p.name.as_str()),
        "Teams balanced"
    );
    Ok(teams)
}

fn find_captain(pool: &[Player], id: PlayerId) -> Result<Player, ValidationError> {
    pool.iter()
        .find(|player| player.id == id)
        .cloned()
        .ok_or(ValidationError::CaptainNotInPool { id })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: PlayerId, batting: f64, bowling: f64) -> Player {
        Player::new(id, format!("P{id}"), batting, bowling)
    }

    fn ids(team: &Team) -> Vec<PlayerId> {
        team.players.iter().map(|p| p.id).collect()
    }

    #[test]
    fn odd_remainder_withholds_weakest_as_common_player() {
        let pool = vec![
            player(1, 9.0, 9.0),
            player(2, 4.0, 8.0),
            player(3, 8.0, 5.0),
            player(4, 8.0, 4.0),
            player(5, 5.0, 5.0),
        ];
        let teams = balance(&pool, "Team A", "Team B", Captains::new(1, 2)).unwrap();

        assert_eq!(teams.common_player.as_ref().map(|p| p.id), Some(5));
        // P3 (13) goes to the weaker side B first, then P4 (12) to A.
        assert_eq!(ids(&teams.team_a), vec![1, 4]);
        assert_eq!(ids(&teams.team_b), vec![2, 3]);
        assert_eq!(teams.team_a.total_rating, 30.0);
        assert_eq!(teams.team_b.total_rating, 25.0);
        assert_eq!(teams.team_a.total_batting_rating, 17.0);
        assert_eq!(teams.team_b.total_bowling_rating, 13.0);
    }

    #[test]
    fn even_remainder_has_no_common_player() {
        let pool = vec![
            player(1, 5.0, 5.0),
            player(2, 5.0, 5.0),
            player(3, 9.0, 9.0),
            player(4, 7.0, 7.0),
            player(5, 6.0, 6.0),
            player(6, 2.0, 2.0),
        ];
        let teams = balance(&pool, "A", "B", Captains::new(1, 2)).unwrap();

        assert!(teams.common_player.is_none());
        assert_eq!(teams.team_a.players.len(), teams.team_b.players.len());
        // 18 -> A (tie), 14 -> B, 12 -> B, 4 -> A
        assert_eq!(ids(&teams.team_a), vec![1, 3, 6]);
        assert_eq!(ids(&teams.team_b), vec![2, 4, 5]);
        assert_eq!(teams.rating_gap(), 4.0);
    }

    #[test]
    fn captains_lead_their_rosters() {
        let pool = vec![player(7, 3.0, 3.0), player(8, 9.0, 9.0)];
        let teams = balance(&pool, "Reds", "Blues", Captains::new(8, 7)).unwrap();
        assert_eq!(ids(&teams.team_a), vec![8]);
        assert_eq!(ids(&teams.team_b), vec![7]);
        assert_eq!(teams.team(TeamSide::B).name, "Blues");
        assert!(teams.common_player.is_none());
    }

    #[test]
    fn headcounts_stay_equal_when_one_captain_is_much_weaker() {
        let pool = vec![
            player(1, 1.0, 1.0),
            player(2, 10.0, 10.0),
            player(3, 5.0, 5.0),
            player(4, 5.0, 5.0),
            player(5, 4.0, 4.0),
            player(6, 4.0, 4.0),
        ];
        let teams = balance(&pool, "A", "B", Captains::new(1, 2)).unwrap();
        assert_eq!(teams.team_a.players.len(), 3);
        assert_eq!(teams.team_b.players.len(), 3);
        assert!(teams.team_a.total_rating < teams.team_b.total_rating);
    }

    #[test]
    fn rejects_bad_preconditions() {
        let pool = vec![player(1, 5.0, 5.0), player(2, 5.0, 5.0)];

        assert_eq!(
            balance(&pool[..1], "A", "B", Captains::new(1, 2)),
            Err(ValidationError::TooFewPlayers { found: 1 })
        );
        assert_eq!(
            balance(&pool, "A", "B", Captains::default()),
            Err(ValidationError::MissingCaptain)
        );
        assert_eq!(
            balance(&pool, "A", "B", Captains::new(1, 1)),
            Err(ValidationError::DuplicateCaptain)
        );
        assert_eq!(
            balance(&pool, "A", "B", Captains::new(1, 9)),
            Err(ValidationError::CaptainNotInPool { id: 9 })
        );

        let duplicated = vec![player(1, 5.0, 5.0), player(1, 5.0, 5.0)];
        assert_eq!(
            balance(&duplicated, "A", "B", Captains::new(1, 2)),
            Err(ValidationError::DuplicatePlayer { id: 1 })
        );
    }
}
