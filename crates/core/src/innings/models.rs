use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::ScoringError,
    models::{Player, PlayerId, Team},
};

/// Legal deliveries in a complete over.
pub const BALLS_PER_OVER: u32 = 6;
/// Most runs a single scored delivery can carry.
pub const MAX_RUNS_PER_BALL: u8 = 6;

/// What happened on one ball, as entered by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Runs off the bat, 0 through 6.
    Runs(u8),
    /// Striker dismissed.
    Wicket,
    /// Wide: one extra, not a legal delivery.
    Wide,
    /// No-ball: one extra, not a legal delivery.
    NoBall,
}

impl Outcome {
    /// Whether the ball counts toward the over.
    pub fn is_legal(self) -> bool {
        matches!(self, Outcome::Runs(_) | Outcome::Wicket)
    }

    /// Whether the ball is a wide or no-ball.
    pub fn is_extra(self) -> bool {
        !self.is_legal()
    }

    /// Runs this outcome adds to the batting total.
    pub fn runs(self) -> u32 {
        match self {
            Outcome::Runs(n) => u32::from(n),
            Outcome::Wicket => 0,
            Outcome::Wide | Outcome::NoBall => 1,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Runs(n) => write!(f, "{n}"),
            Outcome::Wicket => f.write_str("W"),
            Outcome::Wide => f.write_str("WD"),
            Outcome::NoBall => f.write_str("NB"),
        }
    }
}

impl FromStr for Outcome {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        match token.to_ascii_uppercase().as_str() {
            "W" => Ok(Outcome::Wicket),
            "WD" => Ok(Outcome::Wide),
            "NB" => Ok(Outcome::NoBall),
            other => match other.parse::<u8>() {
                Ok(n) if n <= MAX_RUNS_PER_BALL => Ok(Outcome::Runs(n)),
                _ => Err(ScoringError::InvalidOutcome(token.to_string())),
            },
        }
    }
}

/// Per-batsman figures for one innings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatsmanStat {
    pub player_id: PlayerId,
    pub name: String,
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    pub out: bool,
}

impl BatsmanStat {
    pub fn new(player: &Player) -> Self {
        Self {
            player_id: player.id,
            name: player.name.clone(),
            runs: 0,
            balls_faced: 0,
            fours: 0,
            sixes: 0,
            out: false,
        }
    }

    /// Runs per hundred balls, zero before the first ball.
    pub fn strike_rate(&self) -> f64 {
        if self.balls_faced == 0 {
            0.0
        } else {
            f64::from(self.runs) * 100.0 / f64::from(self.balls_faced)
        }
    }

    /// Whether the batsman took part at all.
    pub fn has_batted(&self) -> bool {
        self.balls_faced > 0 || self.out
    }
}

/// Per-bowler figures for one innings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BowlerStat {
    pub player_id: PlayerId,
    pub name: String,
    pub balls_bowled: u32,
    pub runs_conceded: u32,
    pub wickets: u32,
}

impl BowlerStat {
    pub fn new(player: &Player) -> Self {
        Self {
            player_id: player.id,
            name: player.name.clone(),
            balls_bowled: 0,
            runs_conceded: 0,
            wickets: 0,
        }
    }

    /// Overs bowled in `overs.balls` notation.
    pub fn overs_display(&self) -> String {
        format!(
            "{}.{}",
            self.balls_bowled / BALLS_PER_OVER,
            self.balls_bowled % BALLS_PER_OVER
        )
    }

    /// Runs conceded per six legal balls.
    pub fn economy(&self) -> f64 {
        if self.balls_bowled == 0 {
            0.0
        } else {
            f64::from(self.runs_conceded) * f64::from(BALLS_PER_OVER) / f64::from(self.balls_bowled)
        }
    }
}

/// Why an innings closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Only one batsman left not out.
    AllOut,
    /// The overs budget is used up.
    OversComplete,
    /// The chasing side passed the target.
    TargetReached,
    /// The scorer closed the innings.
    Declared,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EndReason::AllOut => "all out",
            EndReason::OversComplete => "overs complete",
            EndReason::TargetReached => "target reached",
            EndReason::Declared => "declared",
        };
        f.write_str(label)
    }
}

/// Lifecycle of an innings once started. An innings that has not started
/// yet has no state at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InningsStatus {
    InProgress,
    Ended(EndReason),
}

/// Running state of one innings.
///
/// Produced by [`super::start`] and advanced only through the engine
/// functions, each of which returns a fresh state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InningsState {
    pub batting_team: Team,
    pub bowling_team: Team,
    /// One entry per batting-team player, in roster order.
    pub batsmen: Vec<BatsmanStat>,
    pub bowlers: BTreeMap<PlayerId, BowlerStat>,
    /// Striker, or `None` while waiting for a new batsman.
    pub current_batsman_index: Option<usize>,
    pub non_striker_index: Option<usize>,
    pub total_runs: u32,
    /// Wides and no-balls.
    pub extras: u32,
    pub wickets: u32,
    pub overs: u32,
    /// Legal balls in the current over, always below [`BALLS_PER_OVER`].
    pub balls_in_over: u32,
    pub max_overs: u32,
    /// Runs needed to win, second innings only.
    pub target: Option<u32>,
    pub status: InningsStatus,
}

impl InningsState {
    pub fn is_ended(&self) -> bool {
        matches!(self.status, InningsStatus::Ended(_))
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        match self.status {
            InningsStatus::Ended(reason) => Some(reason),
            InningsStatus::InProgress => None,
        }
    }

    pub fn striker(&self) -> Option<&BatsmanStat> {
        self.current_batsman_index
            .and_then(|index| self.batsmen.get(index))
    }

    pub fn non_striker(&self) -> Option<&BatsmanStat> {
        self.non_striker_index.and_then(|index| self.batsmen.get(index))
    }

    /// Indices of not-out batsmen who are not at the crease.
    pub fn available_batsmen(&self) -> Vec<usize> {
        self.batsmen
            .iter()
            .enumerate()
            .filter(|(index, stat)| {
                !stat.out
                    && Some(*index) != self.current_batsman_index
                    && Some(*index) != self.non_striker_index
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Whether the scorer has to pick a batsman before the next ball.
    pub fn needs_batsman(&self) -> bool {
        if self.is_ended() {
            return false;
        }
        self.current_batsman_index.is_none()
            || (self.non_striker_index.is_none() && !self.available_batsmen().is_empty())
    }

    /// Wickets that end the innings for this batting side.
    pub fn all_out_wickets(&self) -> u32 {
        all_out_wickets(self.batsmen.len())
    }

    pub fn wickets_in_hand(&self) -> u32 {
        self.all_out_wickets().saturating_sub(self.wickets)
    }

    /// Legal balls bowled, counting any early-closed over as complete.
    pub fn legal_balls(&self) -> u32 {
        self.overs * BALLS_PER_OVER + self.balls_in_over
    }

    pub fn balls_remaining(&self) -> u32 {
        (self.max_overs * BALLS_PER_OVER).saturating_sub(self.legal_balls())
    }

    /// Score line overs in `overs.balls` notation.
    pub fn overs_display(&self) -> String {
        format!("{}.{}", self.overs, self.balls_in_over)
    }

    /// Runs still needed in a chase.
    pub fn runs_required(&self) -> Option<u32> {
        self.target
            .map(|target| target.saturating_sub(self.total_runs))
    }

    pub fn current_run_rate(&self) -> f64 {
        run_rate(self.total_runs, self.legal_balls())
    }

    pub fn required_run_rate(&self) -> Option<f64> {
        let required = self.runs_required()?;
        Some(run_rate(required, self.balls_remaining()))
    }

    pub(crate) fn rotate_strike(&mut self) {
        // A batsman with nobody at the other end keeps the strike.
        if self.current_batsman_index.is_some() && self.non_striker_index.is_none() {
            return;
        }
        std::mem::swap(&mut self.current_batsman_index, &mut self.non_striker_index);
    }
}

/// Wickets that bowl out a side of `batsmen` players. A one-player side
/// bats alone and is out after a single wicket.
pub fn all_out_wickets(batsmen: usize) -> u32 {
    u32::try_from(batsmen.saturating_sub(1))
        .unwrap_or(u32::MAX)
        .max(1)
}

fn run_rate(runs: u32, balls: u32) -> f64 {
    if balls == 0 {
        0.0
    } else {
        f64::from(runs) * f64::from(BALLS_PER_OVER) / f64::from(balls)
    }
}
