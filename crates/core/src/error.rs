#![allow(missing_docs)]

//! Typed errors surfaced by the scoring core.

use thiserror::Error;

use crate::models::PlayerId;

/// Rejected preconditions: bad pools, captains or player records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("need at least 2 players to create teams, got {found}")]
    TooFewPlayers { found: usize },

    #[error("both teams need a captain")]
    MissingCaptain,

    #[error("the same player cannot captain both teams")]
    DuplicateCaptain,

    #[error("captain {id} is not in the selected pool")]
    CaptainNotInPool { id: PlayerId },

    #[error("player {id} appears more than once in the pool")]
    DuplicatePlayer { id: PlayerId },

    #[error("player name cannot be empty")]
    EmptyName,

    #[error("{field} rating {value} is outside 1-10")]
    RatingOutOfRange { field: &'static str, value: f64 },

    #[error("unknown player {id}")]
    UnknownPlayer { id: PlayerId },
}

/// Refused innings mutations. The state passed in is never touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("innings is closed")]
    InningsClosed,

    #[error("unrecognised outcome '{0}'")]
    InvalidOutcome(String),

    #[error("bowler {0} is not in the bowling team")]
    UnknownBowler(PlayerId),

    #[error("a new batsman must be selected first")]
    BatsmanRequired,

    #[error("batsman {index} cannot come to the crease")]
    InvalidBatsman { index: usize },
}

/// Errors from the top-level match flow.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("{action} is not allowed while the match is {stage}")]
    WrongStage {
        action: &'static str,
        stage: &'static str,
    },

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
