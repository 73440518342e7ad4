//! Innings summaries and match results.

use serde::{Deserialize, Serialize};

use crate::innings::{all_out_wickets, BatsmanStat, BowlerStat, InningsState};

/// Frozen reporting view of an innings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InningsSummary {
    /// Side that batted.
    pub batting_team_name: String,
    /// Side that bowled.
    pub bowling_team_name: String,
    /// Runs scored, extras included.
    pub total: u32,
    /// Wickets fallen.
    pub wickets: u32,
    /// Completed overs.
    pub overs: u32,
    /// Legal balls in the unfinished over.
    #[serde(default)]
    pub balls: u32,
    /// Wides and no-balls.
    #[serde(default)]
    pub extras: u32,
    /// Batting card in roster order.
    pub batsmen: Vec<BatsmanStat>,
    /// Bowling card ordered by player id.
    pub bowlers: Vec<BowlerStat>,
    /// Chase target, second innings only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
}

impl InningsSummary {
    /// `total/wickets (overs.balls)` score line.
    pub fn score_line(&self) -> String {
        format!(
            "{}/{} ({}.{} ov)",
            self.total, self.wickets, self.overs, self.balls
        )
    }

    /// Wickets the batting side still had when the innings closed.
    pub fn wickets_in_hand(&self) -> u32 {
        all_out_wickets(self.batsmen.len()).saturating_sub(self.wickets)
    }

    /// Highest individual score, if anybody batted.
    pub fn top_scorer(&self) -> Option<&BatsmanStat> {
        self.batsmen
            .iter()
            .filter(|b| b.has_batted())
            .max_by_key(|b| (b.runs, std::cmp::Reverse(b.balls_faced)))
    }

    /// Bowler with the most wickets, fewest runs breaking ties.
    pub fn best_bowler(&self) -> Option<&BowlerStat> {
        self.bowlers
            .iter()
            .max_by_key(|b| (b.wickets, std::cmp::Reverse(b.runs_conceded)))
    }
}

/// Outcome of a completed match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Winning side, `None` on a tie.
    pub winner_name: Option<String>,
    /// Human-readable result line.
    pub text: String,
    /// Target the chasing side was set.
    pub target: u32,
}

/// Reduce an innings to its summary. `target` falls back to the one the
/// innings was started with.
pub fn summarize(state: &InningsState, target: Option<u32>) -> InningsSummary {
    InningsSummary {
        batting_team_name: state.batting_team.name.clone(),
        bowling_team_name: state.bowling_team.name.clone(),
        total: state.total_runs,
        wickets: state.wickets,
        overs: state.overs,
        balls: state.balls_in_over,
        extras: state.extras,
        batsmen: state.batsmen.clone(),
        bowlers: state.bowlers.values().cloned().collect(),
        target: target.or(state.target),
    }
}

/// Runs the side batting second needs: one more than the first innings.
pub fn target_for(first_innings: &InningsSummary) -> u32 {
    first_innings.total + 1
}

/// Decide the match from both innings.
pub fn match_result(
    _first_innings: &InningsSummary,
    second_innings: &InningsSummary,
    target: u32,
) -> MatchResult {
    let total = second_innings.total;
    if total >= target {
        let winner = second_innings.batting_team_name.clone();
        let margin = second_innings.wickets_in_hand();
        MatchResult {
            text: format!("{winner} won by {}", plural(margin, "wicket")),
            winner_name: Some(winner),
            target,
        }
    } else if total + 1 == target {
        MatchResult {
            winner_name: None,
            text: "Match tied".to_string(),
            target,
        }
    } else {
        let winner = second_innings.bowling_team_name.clone();
        let margin = (target - 1) - total;
        MatchResult {
            text: format!("{winner} won by {}", plural(margin, "run")),
            winner_name: Some(winner),
            target,
        }
    }
}

fn plural(count: u32, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
