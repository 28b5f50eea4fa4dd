//! Word wars domain: time-boxed multiplayer writing sprints
//!
//! A word war is a competitive writing sprint nested inside an event. Users
//! join with one of their projects while the war is waiting, the host starts
//! the round, participants checkpoint their word counts while it runs, and
//! the round ends with a persisted final standings snapshot. All mutations go
//! through single conditional writes against the store, reconciled on a
//! zero-effect result instead of taking locks.

pub mod api;
pub mod domain;
pub mod service;
pub mod store;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{FinalRank, Participant, WarStatus, WordWar};
pub use domain::state::{StateError, WarEvent, WarState, WarStateMachine};
pub use service::{Scoreboard, ScoreboardEntry, WarService};
pub use store::{InMemoryWarStore, PgWarStore, StoreError, WarStore};

pub use api::middleware::WarsState;
pub use api::routes::routes;
