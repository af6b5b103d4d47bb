use std::path::Path;

use rusqlite::Connection;

use crate::error::{Result, TournamentError};

/// Opens `path` (or an in-memory database for `:memory:`) with foreign keys enforced
/// and the schema in place.
pub fn open_connection(path: &Path) -> Result<Connection> {
	let connection_error = |source| TournamentError::Connection {
		path: path.to_path_buf(),
		source,
	};

	let mut conn = Connection::open(path).map_err(connection_error)?;
	conn.pragma_update(None, "foreign_keys", true)
		.map_err(connection_error)?;
	create_schema(&mut conn).map_err(connection_error)?;

	Ok(conn)
}

pub fn create_schema(conn: &mut Connection) -> rusqlite::Result<()> {
	let tx = conn.transaction()?;

	tx.execute(
		"CREATE TABLE IF NOT EXISTS players (
			id     INTEGER PRIMARY KEY AUTOINCREMENT,
			name   TEXT    NOT NULL
		);",
		[],
	)?;

	tx.execute(
		"CREATE TABLE IF NOT EXISTS matches (
			id          INTEGER PRIMARY KEY AUTOINCREMENT,
			winner      INTEGER REFERENCES players (id) ON DELETE CASCADE
								NOT NULL,
			loser       INTEGER REFERENCES players (id) ON DELETE CASCADE
								NOT NULL,
			reported_at TEXT    NOT NULL
		);",
		[],
	)?;

	// A player who beat themselves counts once in `matches`.
	tx.execute(
		"CREATE VIEW IF NOT EXISTS standings AS
			SELECT p.id,
				   p.name,
				   (SELECT COUNT(*) FROM matches m WHERE m.winner = p.id) AS wins,
				   (SELECT COUNT(*) FROM matches m
					 WHERE m.winner = p.id OR m.loser = p.id)             AS matches
			  FROM players p;",
		[],
	)?;

	tx.commit()
}
