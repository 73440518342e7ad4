#![warn(clippy::all, missing_docs)]

//! Core logic for the gully cricket scorer.
//!
//! This crate hosts the domain models, team balancing, the ball-by-ball
//! innings engine, result and rating calculation, configuration handling
//! and the JSON persistence layer used by the terminal UI and any future
//! frontends.

pub mod balance;
pub mod config;
pub mod error;
pub mod innings;
pub mod matchflow;
pub mod models;
pub mod rating;
pub mod roster;
pub mod save;
pub mod summary;

pub use balance::{balance, BalancedTeams, Captains};
pub use config::AppConfig;
pub use error::{MatchError, ScoringError, ValidationError};
pub use innings::{EndReason, InningsState, Outcome};
pub use matchflow::{MatchFlow, MatchReport, Stage};
pub use models::{Player, PlayerId, Team, TeamSide};
pub use rating::RatingDelta;
pub use roster::PlayerRegistry;
pub use save::{MatchRecord, Store};
pub use summary::{InningsSummary, MatchResult};
