//! Post-match rating adjustment.
//!
//! Each player is measured against what their current rating predicts:
//!
//! * batting: `2 × rating` runs is par, every 10 runs over or under moves
//!   the rating by 1.0, and the strike rate adds `(SR − 100) / 1000`;
//! * bowling: per over bowled, par is `rating / 20` wickets and
//!   `12 − rating` runs. Each wicket over par is worth 0.25, every 20 runs
//!   saved 1.0.
//!
//! A single innings moves a rating by at most [`MAX_INNINGS_DELTA`], so a
//! full match moves it by at most twice that.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    innings::BALLS_PER_OVER,
    models::{Player, PlayerId, MAX_RATING, MIN_RATING},
    summary::InningsSummary,
};

/// Largest swing one innings can cause in either discipline.
pub const MAX_INNINGS_DELTA: f64 = 0.5;

const PAR_RUNS_PER_RATING: f64 = 2.0;
const RUNS_PER_BATTING_POINT: f64 = 10.0;
const WICKET_WEIGHT: f64 = 0.25;
const RUNS_SAVED_PER_BOWLING_POINT: f64 = 20.0;

/// Rating change for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingDelta {
    /// Change to the batting rating.
    pub batting_delta: f64,
    /// Change to the bowling rating.
    pub bowling_delta: f64,
}

impl RatingDelta {
    fn add(&mut self, other: RatingDelta) {
        self.batting_delta += other.batting_delta;
        self.bowling_delta += other.bowling_delta;
    }
}

/// Deltas for everyone who batted or bowled in `summary`.
///
/// `players` supplies the current ratings used as the baseline; anybody not
/// found there is skipped.
pub fn adjust(summary: &InningsSummary, players: &[Player]) -> BTreeMap<PlayerId, RatingDelta> {
    let mut deltas: BTreeMap<PlayerId, RatingDelta> = BTreeMap::new();

    for batsman in summary.batsmen.iter().filter(|b| b.has_batted()) {
        let Some(player) = players.iter().find(|p| p.id == batsman.player_id) else {
            continue;
        };
        let par = PAR_RUNS_PER_RATING * player.batting_rating;
        let strike_bonus = if batsman.balls_faced == 0 {
            0.0
        } else {
            (batsman.strike_rate() - 100.0) / 1000.0
        };
        let delta = (f64::from(batsman.runs) - par) / RUNS_PER_BATTING_POINT + strike_bonus;
        deltas.entry(batsman.player_id).or_default().batting_delta += bound(delta);
    }

    for bowler in summary.bowlers.iter().filter(|b| b.balls_bowled > 0) {
        let Some(player) = players.iter().find(|p| p.id == bowler.player_id) else {
            continue;
        };
        let overs = f64::from(bowler.balls_bowled) / f64::from(BALLS_PER_OVER);
        let par_wickets = overs * player.bowling_rating / 20.0;
        let par_runs = overs * (12.0 - player.bowling_rating);
        let delta = WICKET_WEIGHT * (f64::from(bowler.wickets) - par_wickets)
            + (par_runs - f64::from(bowler.runs_conceded)) / RUNS_SAVED_PER_BOWLING_POINT;
        deltas.entry(bowler.player_id).or_default().bowling_delta += bound(delta);
    }

    deltas
}

/// Sum two delta maps.
pub fn combine(
    first: &BTreeMap<PlayerId, RatingDelta>,
    second: &BTreeMap<PlayerId, RatingDelta>,
) -> BTreeMap<PlayerId, RatingDelta> {
    let mut combined = first.clone();
    for (id, delta) in second {
        combined.entry(*id).or_default().add(*delta);
    }
    combined
}

/// Apply a delta and clamp both ratings back into range.
pub fn apply_to_player(player: &Player, delta: &RatingDelta) -> Player {
    player.with_ratings(
        clamp_rating(player.batting_rating + delta.batting_delta),
        clamp_rating(player.bowling_rating + delta.bowling_delta),
    )
}

/// Apply deltas across the registry; players without one are unchanged.
pub fn apply_all(players: &[Player], deltas: &BTreeMap<PlayerId, RatingDelta>) -> Vec<Player> {
    players
        .iter()
        .map(|player| match deltas.get(&player.id) {
            Some(delta) => apply_to_player(player, delta),
            None => player.clone(),
        })
        .collect()
}

/// Round to one decimal and clamp into `[1, 10]`.
pub fn clamp_rating(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    rounded.clamp(MIN_RATING, MAX_RATING)
}

fn bound(delta: f64) -> f64 {
    delta.clamp(-MAX_INNINGS_DELTA, MAX_INNINGS_DELTA)
}
