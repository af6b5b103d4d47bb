use std::path::PathBuf;

use rusqlite::ffi;
use thiserror::Error;

use crate::data::PlayerId;

#[derive(Error, Debug)]
pub enum TournamentError {
	/// The database could not be opened or configured. Not recoverable.
	#[error("could not connect to tournament database {path:?}: {source}")]
	Connection {
		path: PathBuf,
		#[source]
		source: rusqlite::Error,
	},

	#[error("player {0} does not exist")]
	UnknownPlayer(PlayerId),

	/// A foreign key check failed inside the database itself.
	#[error("referential integrity violated: {0}")]
	Referential(rusqlite::Error),

	#[error("cannot pair an odd number of players ({count})")]
	OddPlayerCount { count: usize },

	#[error("database query failed: {0}")]
	Store(rusqlite::Error),

	#[error("could not read match reports: {0}")]
	Csv(#[from] csv::Error),

	#[error("stored timestamp is malformed: {0}")]
	Timestamp(#[from] chrono::ParseError),
}

impl TournamentError {
	/// True for both flavours of dangling player reference.
	pub fn is_referential(&self) -> bool {
		matches!(
			self,
			TournamentError::UnknownPlayer(_) | TournamentError::Referential(_)
		)
	}
}

pub type Result<T> = std::result::Result<T, TournamentError>;

impl From<rusqlite::Error> for TournamentError {
	fn from(err: rusqlite::Error) -> Self {
		match err {
			rusqlite::Error::SqliteFailure(
				ffi::Error {
					extended_code: ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
					..
				},
				_,
			) => TournamentError::Referential(err),
			err => TournamentError::Store(err),
		}
	}
}
