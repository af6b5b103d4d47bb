//! Swiss-system tournament bookkeeping on top of SQLite.
//!
//! Players and match results live in a [`SqliteStore`]; standings are
//! derived from them on every read and [`swiss_pairings`] pairs adjacent
//! ranks for the next round.

pub mod data;
pub mod db;
pub mod error;
pub mod pairing;
pub mod sanitize;
pub mod store;

pub use data::{MatchRecord, MatchReport, Pairing, PlayerId, Standing};
pub use error::{Result, TournamentError};
pub use pairing::{pair_standings, swiss_pairings};
pub use store::{RecordStore, SqliteStore};
