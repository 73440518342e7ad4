//! Pure innings transitions.
//!
//! Every operation borrows the current state and returns a new one. On error
//! nothing is produced and the caller keeps the state it already had.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::{
    error::ScoringError,
    models::{PlayerId, Team},
};

use super::models::{
    BatsmanStat, BowlerStat, EndReason, InningsState, InningsStatus, Outcome, BALLS_PER_OVER,
    MAX_RUNS_PER_BALL,
};

/// Open an innings: every batting player gets a blank line in roster order,
/// with the first two at the crease and the first on strike.
pub fn start(
    batting_team: &Team,
    bowling_team: &Team,
    max_overs: u32,
    target: Option<u32>,
) -> InningsState {
    let batsmen: Vec<BatsmanStat> = batting_team.players.iter().map(BatsmanStat::new).collect();
    let current_batsman_index = if batsmen.is_empty() { None } else { Some(0) };
    let non_striker_index = if batsmen.len() > 1 { Some(1) } else { None };

    info!(
        batting = %batting_team.name,
        bowling = %bowling_team.name,
        max_overs,
        target = ?target,
        "Innings started"
    );

    InningsState {
        batting_team: batting_team.clone(),
        bowling_team: bowling_team.clone(),
        batsmen,
        bowlers: BTreeMap::new(),
        current_batsman_index,
        non_striker_index,
        total_runs: 0,
        extras: 0,
        wickets: 0,
        overs: 0,
        balls_in_over: 0,
        max_overs,
        target,
        status: InningsStatus::InProgress,
    }
}

/// Apply one scored ball bowled by `bowler_id`.
pub fn apply_outcome(
    state: &InningsState,
    outcome: Outcome,
    bowler_id: PlayerId,
) -> Result<InningsState, ScoringError> {
    if state.is_ended() {
        return Err(ScoringError::InningsClosed);
    }
    if let Outcome::Runs(n) = outcome {
        if n > MAX_RUNS_PER_BALL {
            return Err(ScoringError::InvalidOutcome(n.to_string()));
        }
    }
    let bowler = state
        .bowling_team
        .player(bowler_id)
        .ok_or(ScoringError::UnknownBowler(bowler_id))?;
    if state.needs_batsman() {
        return Err(ScoringError::BatsmanRequired);
    }
    let striker = state
        .current_batsman_index
        .ok_or(ScoringError::BatsmanRequired)?;

    let mut next = state.clone();
    let mut figures = next
        .bowlers
        .remove(&bowler_id)
        .unwrap_or_else(|| BowlerStat::new(bowler));

    match outcome {
        Outcome::Runs(n) => {
            let runs = u32::from(n);
            let batsman = &mut next.batsmen[striker];
            batsman.runs += runs;
            batsman.balls_faced += 1;
            match n {
                4 => batsman.fours += 1,
                6 => batsman.sixes += 1,
                _ => {}
            }
            figures.runs_conceded += runs;
            figures.balls_bowled += 1;
            next.total_runs += runs;
            next.balls_in_over += 1;
            if runs % 2 == 1 {
                next.rotate_strike();
            }
        }
        Outcome::Wicket => {
            let batsman = &mut next.batsmen[striker];
            batsman.balls_faced += 1;
            batsman.out = true;
            figures.balls_bowled += 1;
            figures.wickets += 1;
            next.wickets += 1;
            next.current_batsman_index = None;
            next.balls_in_over += 1;
        }
        Outcome::Wide | Outcome::NoBall => {
            figures.runs_conceded += 1;
            next.total_runs += 1;
            next.extras += 1;
        }
    }
    next.bowlers.insert(bowler_id, figures);

    if next.balls_in_over == BALLS_PER_OVER {
        next.overs += 1;
        next.balls_in_over = 0;
        next.rotate_strike();
        debug!(overs = next.overs, total = next.total_runs, "Over complete");
    }

    next.status = evaluate_status(&next);
    debug!(
        %outcome,
        bowler = bowler_id,
        total = next.total_runs,
        wickets = next.wickets,
        overs = %next.overs_display(),
        "Ball recorded"
    );
    if let InningsStatus::Ended(reason) = next.status {
        info!(%reason, total = next.total_runs, wickets = next.wickets, "Innings ended");
    }
    Ok(next)
}

/// Put batsman `index` at the crease.
///
/// Fills a vacant end, striker's end first. With both ends occupied,
/// choosing the non-striker swaps strike and choosing the striker changes
/// nothing.
pub fn select_batsman(state: &InningsState, index: usize) -> Result<InningsState, ScoringError> {
    if state.is_ended() {
        return Err(ScoringError::InningsClosed);
    }
    match state.batsmen.get(index) {
        Some(stat) if !stat.out => {}
        _ => return Err(ScoringError::InvalidBatsman { index }),
    }

    let mut next = state.clone();
    match (state.current_batsman_index, state.non_striker_index) {
        (None, non_striker) => {
            if non_striker == Some(index) {
                next.non_striker_index = None;
            }
            next.current_batsman_index = Some(index);
        }
        (Some(striker), None) => {
            if striker != index {
                next.non_striker_index = Some(index);
            }
        }
        (Some(striker), Some(non_striker)) => {
            if index == non_striker {
                next.rotate_strike();
            } else if index != striker {
                return Err(ScoringError::InvalidBatsman { index });
            }
        }
    }
    debug!(
        striker = ?next.striker().map(|b| b.name.as_str()),
        non_striker = ?next.non_striker().map(|b| b.name.as_str()),
        "Batsman selected"
    );
    Ok(next)
}

/// Close a part-bowled over early. Does nothing at the start of an over.
pub fn end_over(state: &InningsState) -> Result<InningsState, ScoringError> {
    if state.is_ended() {
        return Err(ScoringError::InningsClosed);
    }
    if state.balls_in_over == 0 || state.balls_in_over >= BALLS_PER_OVER {
        return Ok(state.clone());
    }

    let mut next = state.clone();
    next.overs += 1;
    next.balls_in_over = 0;
    next.status = evaluate_status(&next);
    info!(
        overs = next.overs,
        balls_short = BALLS_PER_OVER - state.balls_in_over,
        "Over closed early"
    );
    Ok(next)
}

/// Close the innings at the scorer's request.
pub fn declare(state: &InningsState) -> InningsState {
    let mut next = state.clone();
    if !next.is_ended() {
        next.status = InningsStatus::Ended(EndReason::Declared);
        info!(total = next.total_runs, wickets = next.wickets, "Innings declared");
    }
    next
}

fn evaluate_status(state: &InningsState) -> InningsStatus {
    if let Some(target) = state.target {
        if state.total_runs >= target {
            return InningsStatus::Ended(EndReason::TargetReached);
        }
    }
    if state.wickets >= state.all_out_wickets() {
        return InningsStatus::Ended(EndReason::AllOut);
    }
    if state.overs >= state.max_overs {
        return InningsStatus::Ended(EndReason::OversComplete);
    }
    InningsStatus::InProgress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Player;

    fn team(name: &str, first_id: PlayerId, size: usize) -> Team {
        let players = (0..size as PlayerId)
            .map(|offset| {
                let id = first_id + offset;
                Player::new(id, format!("{name}{id}"), 5.0, 5.0)
            })
            .collect();
        Team::new(name, players)
    }

    fn fresh(max_overs: u32, target: Option<u32>) -> InningsState {
        start(&team("Bat", 1, 4), &team("Bowl", 100, 4), max_overs, target)
    }

    fn play(state: InningsState, balls: &[&str]) -> InningsState {
        balls.iter().fold(state, |current, token| {
            let outcome: Outcome = token.parse().unwrap();
            apply_outcome(&current, outcome, 100).unwrap()
        })
    }

    #[test]
    fn start_opens_with_blank_figures() {
        let state = fresh(6, None);
        assert_eq!(state.batsmen.len(), 4);
        assert!(state.batsmen.iter().all(|b| b.runs == 0 && !b.out));
        assert_eq!(state.current_batsman_index, Some(0));
        assert_eq!(state.non_striker_index, Some(1));
        assert!(state.bowlers.is_empty());
        assert_eq!(state.status, InningsStatus::InProgress);
        assert_eq!(state.target, None);
    }

    #[test]
    fn parses_scorer_tokens() {
        assert_eq!("4".parse::<Outcome>(), Ok(Outcome::Runs(4)));
        assert_eq!("w".parse::<Outcome>(), Ok(Outcome::Wicket));
        assert_eq!(" WD ".parse::<Outcome>(), Ok(Outcome::Wide));
        assert_eq!("nb".parse::<Outcome>(), Ok(Outcome::NoBall));
        assert_eq!(
            "7".parse::<Outcome>(),
            Err(ScoringError::InvalidOutcome("7".to_string()))
        );
        assert_eq!(
            "LB".parse::<Outcome>(),
            Err(ScoringError::InvalidOutcome("LB".to_string()))
        );
    }

    #[test]
    fn odd_runs_rotate_strike_and_boundaries_are_counted() {
        let state = play(fresh(6, None), &["1", "4", "6"]);
        assert_eq!(state.current_batsman_index, Some(1));
        assert_eq!(state.batsmen[0].runs, 1);
        assert_eq!(state.batsmen[1].runs, 10);
        assert_eq!(state.batsmen[1].fours, 1);
        assert_eq!(state.batsmen[1].sixes, 1);
        assert_eq!(state.total_runs, 11);
        assert_eq!(state.bowlers[&100].runs_conceded, 11);
        assert_eq!(state.bowlers[&100].balls_bowled, 3);
    }

    #[test]
    fn extras_do_not_use_a_legal_delivery() {
        let state = play(fresh(6, None), &["WD", "NB", "2"]);
        assert_eq!(state.total_runs, 4);
        assert_eq!(state.extras, 2);
        assert_eq!(state.balls_in_over, 1);
        assert_eq!(state.batsmen[0].balls_faced, 1);
        assert_eq!(state.bowlers[&100].runs_conceded, 4);
        assert_eq!(state.bowlers[&100].balls_bowled, 1);
        let from_bat: u32 = state.batsmen.iter().map(|b| b.runs).sum();
        assert_eq!(state.total_runs, from_bat + state.extras);
    }

    #[test]
    fn sixth_legal_ball_completes_the_over_and_changes_ends() {
        let state = play(fresh(6, None), &["0", "0", "WD", "0", "0", "0", "0"]);
        assert_eq!(state.overs, 1);
        assert_eq!(state.balls_in_over, 0);
        assert_eq!(state.current_batsman_index, Some(1));
        assert_eq!(state.non_striker_index, Some(0));
    }

    #[test]
    fn delivery_counts_follow_legal_balls() {
        let tokens = ["1", "WD", "0", "2", "NB", "3", "0", "0", "1", "4", "0", "6", "0", "2"];
        let mut state = fresh(20, None);
        let mut legal = 0;
        let mut expected_runs = 0;
        for token in tokens {
            let outcome: Outcome = token.parse().unwrap();
            if outcome.is_legal() {
                legal += 1;
            }
            expected_runs += outcome.runs();
            state = apply_outcome(&state, outcome, 101).unwrap();
            assert_eq!(state.balls_in_over, legal % 6);
            assert_eq!(state.overs, legal / 6);
        }
        assert_eq!(state.total_runs, expected_runs);
    }

    #[test]
    fn wicket_waits_for_the_next_batsman() {
        let state = play(fresh(6, None), &["W"]);
        assert!(state.batsmen[0].out);
        assert_eq!(state.wickets, 1);
        assert_eq!(state.bowlers[&100].wickets, 1);
        assert!(state.needs_batsman());
        assert_eq!(state.available_batsmen(), vec![2, 3]);

        assert_eq!(
            apply_outcome(&state, Outcome::Runs(1), 100),
            Err(ScoringError::BatsmanRequired)
        );
        assert_eq!(
            select_batsman(&state, 0),
            Err(ScoringError::InvalidBatsman { index: 0 })
        );

        let state = select_batsman(&state, 3).unwrap();
        assert_eq!(state.current_batsman_index, Some(3));
        assert!(!state.needs_batsman());
        let state = apply_outcome(&state, Outcome::Runs(2), 100).unwrap();
        assert_eq!(state.batsmen[3].runs, 2);
    }

    #[test]
    fn wicket_on_the_last_ball_leaves_the_vacancy_at_the_non_strikers_end() {
        let state = play(fresh(6, None), &["0", "0", "0", "0", "0", "W"]);
        assert_eq!(state.current_batsman_index, Some(1));
        assert_eq!(state.non_striker_index, None);
        assert!(state.needs_batsman());
        let state = select_batsman(&state, 2).unwrap();
        assert_eq!(state.non_striker_index, Some(2));
        assert_eq!(state.current_batsman_index, Some(1));
    }

    #[test]
    fn selecting_the_non_striker_swaps_strike() {
        let state = fresh(6, None);
        let swapped = select_batsman(&state, 1).unwrap();
        assert_eq!(swapped.current_batsman_index, Some(1));
        assert_eq!(swapped.non_striker_index, Some(0));
        assert_eq!(select_batsman(&state, 0).unwrap(), state);
        assert_eq!(
            select_batsman(&state, 2),
            Err(ScoringError::InvalidBatsman { index: 2 })
        );
        assert_eq!(
            select_batsman(&state, 9),
            Err(ScoringError::InvalidBatsman { index: 9 })
        );
    }

    #[test]
    fn all_out_closes_the_innings() {
        let mut state = fresh(6, None);
        for next_in in [2, 3] {
            state = play(state, &["W"]);
            state = select_batsman(&state, next_in).unwrap();
        }
        let state = play(state, &["W"]);
        assert_eq!(state.wickets, 3);
        assert_eq!(state.end_reason(), Some(EndReason::AllOut));
        assert!(!state.needs_batsman());
        assert_eq!(
            apply_outcome(&state, Outcome::Runs(1), 100),
            Err(ScoringError::InningsClosed)
        );
    }

    #[test]
    fn overs_budget_closes_the_innings() {
        let state = play(fresh(1, None), &["1", "1", "1", "1", "1"]);
        assert_eq!(state.status, InningsStatus::InProgress);
        let state = play(state, &["1"]);
        assert_eq!(state.end_reason(), Some(EndReason::OversComplete));
        assert_eq!(state.balls_remaining(), 0);
    }

    #[test]
    fn chase_ends_when_target_is_reached_even_on_an_extra() {
        let state = play(fresh(6, Some(5)), &["4"]);
        assert_eq!(state.runs_required(), Some(1));
        let state = play(state, &["WD"]);
        assert_eq!(state.total_runs, 5);
        assert_eq!(state.end_reason(), Some(EndReason::TargetReached));
        assert_eq!(state.runs_required(), Some(0));
    }

    #[test]
    fn rejects_unknown_bowlers_and_out_of_range_runs() {
        let state = fresh(6, None);
        assert_eq!(
            apply_outcome(&state, Outcome::Runs(1), 1),
            Err(ScoringError::UnknownBowler(1))
        );
        assert_eq!(
            apply_outcome(&state, Outcome::Runs(9), 100),
            Err(ScoringError::InvalidOutcome("9".to_string()))
        );
        assert_eq!(state.total_runs, 0);
    }

    #[test]
    fn apply_leaves_the_input_untouched() {
        let state = fresh(6, None);
        let before = state.clone();
        let after = apply_outcome(&state, Outcome::Runs(4), 100).unwrap();
        assert_eq!(state, before);
        assert_ne!(after, before);
    }

    #[test]
    fn end_over_only_closes_partial_overs() {
        let state = fresh(2, None);
        assert_eq!(end_over(&state).unwrap(), state);

        let partial = play(state, &["0", "2"]);
        let closed = end_over(&partial).unwrap();
        assert_eq!(closed.overs, 1);
        assert_eq!(closed.balls_in_over, 0);
        assert_eq!(closed.current_batsman_index, partial.current_batsman_index);
        assert_eq!(closed.status, InningsStatus::InProgress);

        let last = play(closed, &["1"]);
        let finished = end_over(&last).unwrap();
        assert_eq!(finished.end_reason(), Some(EndReason::OversComplete));
        assert_eq!(end_over(&finished), Err(ScoringError::InningsClosed));
    }

    #[test]
    fn declaring_is_idempotent() {
        let state = declare(&fresh(6, None));
        assert_eq!(state.end_reason(), Some(EndReason::Declared));
        assert_eq!(declare(&state), state);
        assert_eq!(select_batsman(&state, 2), Err(ScoringError::InningsClosed));
    }

    #[test]
    fn single_player_side_bats_alone_until_dismissed() {
        let state = start(&team("Solo", 1, 1), &team("Bowl", 100, 1), 6, None);
        assert_eq!(state.non_striker_index, None);
        assert!(!state.needs_batsman());
        let state = play(state, &["1", "0", "3", "0", "0", "1"]);
        assert_eq!(state.overs, 1);
        assert_eq!(state.current_batsman_index, Some(0));
        assert_eq!(state.batsmen[0].runs, 5);
        let state = play(state, &["W"]);
        assert_eq!(state.end_reason(), Some(EndReason::AllOut));
    }
}
