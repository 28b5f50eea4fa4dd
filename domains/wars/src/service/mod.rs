//! Word war engine
//!
//! Stateless request-scoped service implementing the war lifecycle over the
//! store contract and the event/project gates.

pub mod wars;

pub use wars::{Scoreboard, ScoreboardEntry, WarService};
