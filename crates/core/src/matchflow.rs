//! Two-innings match lifecycle.
//!
//! [`MatchFlow`] owns the balanced teams and whichever innings is live, and
//! walks the match through its stages. Each scoring call goes through the
//! pure innings engine and only replaces the held state when it succeeds.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    balance::BalancedTeams,
    error::MatchError,
    innings::{self, InningsState, Outcome},
    models::{Player, PlayerId, TeamSide},
    rating::{self, RatingDelta},
    save::{MatchRecord, MatchTeams},
    summary::{self, InningsSummary, MatchResult},
};

/// Where the match currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Teams picked, toss not yet decided.
    Setup,
    /// First innings under way.
    FirstInnings,
    /// Chase under way.
    SecondInnings,
    /// Both innings closed and the result known.
    Complete,
}

impl Stage {
    /// Lowercase label used in messages.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Setup => "in setup",
            Stage::FirstInnings => "in the first innings",
            Stage::SecondInnings => "in the second innings",
            Stage::Complete => "complete",
        }
    }
}

/// Everything produced when a completed match is finalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// First innings summary.
    pub innings1: InningsSummary,
    /// Second innings summary.
    pub innings2: InningsSummary,
    /// Who won and by how much.
    pub result: MatchResult,
    /// Combined rating changes from both innings.
    pub deltas: BTreeMap<PlayerId, RatingDelta>,
    /// The registry with the changes applied.
    pub updated_players: Vec<Player>,
    /// History entry ready to store.
    pub record: MatchRecord,
}

/// Match state machine.
#[derive(Debug, Clone)]
pub struct MatchFlow {
    teams: BalancedTeams,
    max_overs: u32,
    stage: Stage,
    batting_first: Option<TeamSide>,
    innings: Option<InningsState>,
    innings1: Option<InningsSummary>,
    innings2: Option<InningsSummary>,
    result: Option<MatchResult>,
}

impl MatchFlow {
    /// New match in [`Stage::Setup`].
    pub fn new(teams: BalancedTeams, max_overs: u32) -> Self {
        Self {
            teams,
            max_overs,
            stage: Stage::Setup,
            batting_first: None,
            innings: None,
            innings1: None,
            innings2: None,
            result: None,
        }
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Teams as balanced for this match.
    pub fn teams(&self) -> &BalancedTeams {
        &self.teams
    }

    /// Overs allowed per innings.
    pub fn max_overs(&self) -> u32 {
        self.max_overs
    }

    /// Side that batted first, once the match has started.
    pub fn batting_first(&self) -> Option<TeamSide> {
        self.batting_first
    }

    /// Live innings, if one is in play or awaiting closure.
    pub fn innings(&self) -> Option<&InningsState> {
        self.innings.as_ref()
    }

    /// First innings summary once it has closed.
    pub fn first_innings(&self) -> Option<&InningsSummary> {
        self.innings1.as_ref()
    }

    /// Second innings summary once the match is complete.
    pub fn second_innings(&self) -> Option<&InningsSummary> {
        self.innings2.as_ref()
    }

    /// Result once the match is complete.
    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    /// Start the first innings with `batting_first` at the crease.
    pub fn start(&mut self, batting_first: TeamSide) -> Result<(), MatchError> {
        self.expect_stage(&[Stage::Setup], "starting the match")?;
        let batting = self.teams.team(batting_first);
        let bowling = self.teams.team(batting_first.other());
        info!(
            batting = %batting.name,
            bowling = %bowling.name,
            overs = self.max_overs,
            "Match started"
        );
        self.innings = Some(innings::start(batting, bowling, self.max_overs, None));
        self.batting_first = Some(batting_first);
        self.stage = Stage::FirstInnings;
        Ok(())
    }

    /// Score one ball in the live innings.
    pub fn record_ball(&mut self, outcome: Outcome, bowler_id: PlayerId) -> Result<(), MatchError> {
        let current = self.live_innings("recording a ball")?;
        let next = innings::apply_outcome(current, outcome, bowler_id)?;
        self.innings = Some(next);
        Ok(())
    }

    /// Bring batsman `index` to the crease in the live innings.
    pub fn select_batsman(&mut self, index: usize) -> Result<(), MatchError> {
        let current = self.live_innings("selecting a batsman")?;
        let next = innings::select_batsman(current, index)?;
        self.innings = Some(next);
        Ok(())
    }

    /// Close a part-bowled over in the live innings.
    pub fn end_over(&mut self) -> Result<(), MatchError> {
        let current = self.live_innings("ending the over")?;
        let next = innings::end_over(current)?;
        self.innings = Some(next);
        Ok(())
    }

    /// Close the live innings, declaring it if still in progress, and move
    /// on to the chase or to the result.
    pub fn end_innings(&mut self) -> Result<(), MatchError> {
        let current = self.live_innings("ending the innings")?;
        let closed = innings::declare(current);

        match self.stage {
            Stage::FirstInnings => {
                let first = summary::summarize(&closed, None);
                let target = summary::target_for(&first);
                let chasing = self.batting_first.map(TeamSide::other).unwrap_or(TeamSide::B);
                let batting = self.teams.team(chasing);
                let bowling = self.teams.team(chasing.other());
                info!(
                    score = %first.score_line(),
                    runs_to_win = target,
                    chasing = %batting.name,
                    "First innings closed"
                );
                self.innings = Some(innings::start(batting, bowling, self.max_overs, Some(target)));
                self.innings1 = Some(first);
                self.stage = Stage::SecondInnings;
            }
            _ => {
                let Some(first) = self.innings1.as_ref() else {
                    return Err(self.wrong_stage("ending the innings"));
                };
                let target = summary::target_for(first);
                let second = summary::summarize(&closed, Some(target));
                let result = summary::match_result(first, &second, target);
                info!(score = %second.score_line(), result = %result.text, "Match complete");
                self.innings = Some(closed);
                self.innings2 = Some(second);
                self.result = Some(result);
                self.stage = Stage::Complete;
            }
        }
        Ok(())
    }

    /// Compute rating changes and the history record for a completed match.
    ///
    /// `players` is the full registry; players who did not take part come
    /// back unchanged in `updated_players`.
    pub fn finalize(&self, players: &[Player]) -> Result<MatchReport, MatchError> {
        self.expect_stage(&[Stage::Complete], "finalising")?;
        let (Some(innings1), Some(innings2), Some(result)) =
            (self.innings1.clone(), self.innings2.clone(), self.result.clone())
        else {
            return Err(self.wrong_stage("finalising"));
        };

        let deltas = rating::combine(
            &rating::adjust(&innings1, players),
            &rating::adjust(&innings2, players),
        );
        let updated_players = rating::apply_all(players, &deltas);
        let record = MatchRecord {
            timestamp: Utc::now(),
            teams: MatchTeams {
                team1_name: innings1.batting_team_name.clone(),
                team2_name: innings2.batting_team_name.clone(),
            },
            innings1: innings1.clone(),
            innings2: innings2.clone(),
            result: result.clone(),
        };
        info!(rated = deltas.len(), "Ratings adjusted");

        Ok(MatchReport {
            innings1,
            innings2,
            result,
            deltas,
            updated_players,
            record,
        })
    }

    fn live_innings(&self, action: &'static str) -> Result<&InningsState, MatchError> {
        self.expect_stage(&[Stage::FirstInnings, Stage::SecondInnings], action)?;
        self.innings.as_ref().ok_or_else(|| self.wrong_stage(action))
    }

    fn expect_stage(&self, allowed: &[Stage], action: &'static str) -> Result<(), MatchError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(self.wrong_stage(action))
        }
    }

    fn wrong_stage(&self, action: &'static str) -> MatchError {
        MatchError::WrongStage {
            action,
            stage: self.stage.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        balance::{balance, Captains},
        error::ScoringError,
        innings::EndReason,
    };

    fn roster() -> Vec<Player> {
        vec![
            Player::new(1, "Rishu", 9.0, 9.0),
            Player::new(2, "Naveen", 9.0, 8.0),
            Player::new(3, "Shubham", 7.0, 7.0),
            Player::new(4, "Kanishk", 7.0, 7.0),
            Player::new(5, "Abhijeet", 6.0, 6.0),
        ]
    }

    fn flow(max_overs: u32) -> MatchFlow {
        let teams = balance(&roster(), "Team A", "Team B", Captains::new(1, 2)).unwrap();
        MatchFlow::new(teams, max_overs)
    }

    fn bowl(flow: &mut MatchFlow, bowler: PlayerId, balls: &[&str]) {
        for token in balls {
            flow.record_ball(token.parse().unwrap(), bowler).unwrap();
        }
    }

    #[test]
    fn calls_out_of_order_are_rejected() {
        let mut flow = flow(1);
        assert!(matches!(
            flow.record_ball(Outcome::Runs(1), 2),
            Err(MatchError::WrongStage { .. })
        ));
        assert!(matches!(flow.end_innings(), Err(MatchError::WrongStage { .. })));
        assert!(matches!(flow.finalize(&roster()), Err(MatchError::WrongStage { .. })));

        flow.start(TeamSide::A).unwrap();
        assert!(matches!(flow.start(TeamSide::B), Err(MatchError::WrongStage { .. })));
        assert_eq!(flow.stage(), Stage::FirstInnings);
    }

    #[test]
    fn scoring_errors_leave_the_innings_untouched() {
        let mut flow = flow(1);
        flow.start(TeamSide::A).unwrap();
        let before = flow.innings().cloned();
        assert_eq!(
            flow.record_ball(Outcome::Runs(1), 1),
            Err(MatchError::Scoring(ScoringError::UnknownBowler(1)))
        );
        assert_eq!(flow.innings().cloned(), before);
    }

    #[test]
    fn full_match_produces_result_ratings_and_record() {
        let players = roster();
        let mut flow = flow(1);
        flow.start(TeamSide::A).unwrap();

        let team_a = flow.teams().team_a.clone();
        let team_b = flow.teams().team_b.clone();
        let bowler_b = team_b.players[0].id;
        let bowler_a = team_a.players[0].id;

        bowl(&mut flow, bowler_b, &["4", "1", "0", "WD", "2", "0", "6"]);
        let first = flow.innings().unwrap();
        assert_eq!(first.end_reason(), Some(EndReason::OversComplete));
        assert_eq!(first.total_runs, 14);

        flow.end_innings().unwrap();
        assert_eq!(flow.stage(), Stage::SecondInnings);
        assert_eq!(flow.first_innings().map(|s| s.total), Some(14));
        let chase = flow.innings().unwrap();
        assert_eq!(chase.target, Some(15));
        assert_eq!(chase.batting_team.name, team_b.name);
        assert_eq!(chase.bowling_team.name, team_a.name);

        bowl(&mut flow, bowler_a, &["1", "W"]);
        let chase = flow.innings().unwrap();
        assert!(chase.is_ended() || chase.needs_batsman());

        flow.end_innings().unwrap();
        assert_eq!(flow.stage(), Stage::Complete);
        let result = flow.result().cloned().unwrap();
        assert_eq!(result.winner_name.as_deref(), Some("Team A"));
        assert_eq!(result.text, "Team A won by 13 runs");
        assert!(matches!(flow.end_innings(), Err(MatchError::WrongStage { .. })));

        let report = flow.finalize(&players).unwrap();
        assert_eq!(report.result, result);
        assert_eq!(report.innings2.target, Some(15));
        assert_eq!(report.record.teams.team1_name, "Team A");
        assert_eq!(report.record.teams.team2_name, "Team B");
        assert_eq!(report.updated_players.len(), players.len());
        assert!(report.deltas.contains_key(&bowler_a));
        assert!(report.deltas.contains_key(&bowler_b));
        for player in &report.updated_players {
            assert!((1.0..=10.0).contains(&player.batting_rating));
            assert!((1.0..=10.0).contains(&player.bowling_rating));
            let sum = player.batting_rating + player.bowling_rating;
            assert!((player.total_rating - sum).abs() < 1e-9);
        }
    }

    #[test]
    fn chase_closes_itself_when_the_target_falls() {
        let mut flow = flow(2);
        flow.start(TeamSide::B).unwrap();
        let bowler_a = flow.teams().team_a.players[0].id;
        let bowler_b = flow.teams().team_b.players[0].id;

        bowl(&mut flow, bowler_a, &["2", "2"]);
        flow.end_innings().unwrap();
        assert_eq!(flow.first_innings().map(|s| s.batting_team_name.as_str()), Some("Team B"));

        bowl(&mut flow, bowler_b, &["6"]);
        assert_eq!(flow.innings().and_then(|s| s.end_reason()), Some(EndReason::TargetReached));
        flow.end_innings().unwrap();

        let result = flow.result().unwrap();
        assert_eq!(result.winner_name.as_deref(), Some("Team A"));
        assert_eq!(result.text, "Team A won by 1 wicket");
        assert_eq!(flow.second_innings().map(|s| s.wickets_in_hand()), Some(1));
    }

    #[test]
    fn early_declaration_still_sets_a_target() {
        let mut flow = flow(6);
        flow.start(TeamSide::A).unwrap();
        flow.end_innings().unwrap();
        assert_eq!(flow.innings().and_then(|s| s.target), Some(1));
        assert_eq!(flow.first_innings().map(|s| s.total), Some(0));
    }
}
