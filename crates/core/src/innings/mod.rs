#![allow(missing_docs)]

//! Ball-by-ball innings engine.

pub mod engine;
mod models;

pub use engine::{apply_outcome, declare, end_over, select_batsman, start};
pub use models::{
    all_out_wickets, BatsmanStat, BowlerStat, EndReason, InningsState, InningsStatus, Outcome,
    BALLS_PER_OVER, MAX_RUNS_PER_BALL,
};
