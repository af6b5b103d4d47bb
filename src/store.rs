//! Persistent storage for players and match results.
//!
//! Every write runs in its own transaction and is committed before the call
//! returns. Nothing is cached between calls: each read queries the database.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::{debug, info};

use crate::{
	data::{MatchRecord, MatchReport, PlayerId, Standing},
	db::open_connection,
	error::{Result, TournamentError},
	sanitize,
};

/// The operations a tournament needs from its backing store.
///
/// Pairing only ever goes through this trait, so it can run against any
/// implementation, not just SQLite.
pub trait RecordStore {
	/// Removes every match. Players are kept.
	fn clear_matches(&mut self) -> Result<()>;

	/// Removes every player, and with them every match.
	fn clear_players(&mut self) -> Result<()>;

	fn count_players(&self) -> Result<usize>;

	/// Cleans `name` and stores a new player under a fresh id.
	fn register_player(&mut self, name: &str) -> Result<PlayerId>;

	/// Records one match. `winner == loser` is not rejected.
	///
	/// # Errors
	///
	/// Returns [`TournamentError::UnknownPlayer`] if either id is not registered.
	fn report_match(&mut self, winner: PlayerId, loser: PlayerId) -> Result<()>;

	/// Every player's record, ordered by wins (descending), then matches
	/// played (ascending), then id (ascending).
	fn player_standings(&self) -> Result<Vec<Standing>>;
}

/// SQLite-backed [`RecordStore`].
///
/// The connection is closed when the store is dropped.
pub struct SqliteStore {
	conn: Connection,
}

impl SqliteStore {
	/// Opens or creates the database at `path`.
	///
	/// # Errors
	///
	/// Returns [`TournamentError::Connection`] if the file cannot be opened
	/// or the schema cannot be created.
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let conn = open_connection(path)?;
		debug!(path = %path.display(), "opened tournament database");

		Ok(Self { conn })
	}

	pub fn open_in_memory() -> Result<Self> {
		Self::open(":memory:")
	}

	/// Records a batch of matches atomically: either every report is stored
	/// or none is. Returns the number of matches stored.
	pub fn report_matches(&mut self, reports: &[MatchReport]) -> Result<usize> {
		let tx = self.conn.transaction()?;
		for report in reports {
			insert_match(&tx, report.winner, report.loser)?;
		}
		tx.commit()?;

		info!(count = reports.len(), "reported match batch");
		Ok(reports.len())
	}

	/// All stored matches in the order they were reported.
	pub fn matches(&self) -> Result<Vec<MatchRecord>> {
		let mut stmt = self
			.conn
			.prepare("SELECT id, winner, loser, reported_at FROM matches ORDER BY id;")?;

		let mut rows = stmt.query([])?;
		let mut records = Vec::new();

		while let Some(row) = rows.next()? {
			let reported_at: String = row.get(3)?;

			records.push(MatchRecord {
				id: row.get(0)?,
				winner: row.get(1)?,
				loser: row.get(2)?,
				reported_at: DateTime::parse_from_rfc3339(&reported_at)?.with_timezone(&Utc),
			});
		}

		debug!(count = records.len(), "read match history");
		Ok(records)
	}
}

fn player_exists(tx: &Transaction, id: PlayerId) -> Result<bool> {
	let found = tx
		.query_row("SELECT 1 FROM players WHERE id = ?1;", [id], |_| Ok(()))
		.optional()?;

	Ok(found.is_some())
}

fn insert_match(tx: &Transaction, winner: PlayerId, loser: PlayerId) -> Result<()> {
	for id in [winner, loser] {
		if !player_exists(tx, id)? {
			return Err(TournamentError::UnknownPlayer(id));
		}
	}

	tx.execute(
		"INSERT INTO matches (winner, loser, reported_at)
		 VALUES (?1, ?2, ?3);",
		params![winner, loser, Utc::now().to_rfc3339()],
	)?;

	Ok(())
}

impl RecordStore for SqliteStore {
	fn clear_matches(&mut self) -> Result<()> {
		let tx = self.conn.transaction()?;
		let removed = tx.execute("DELETE FROM matches;", [])?;
		tx.commit()?;

		info!(removed, "cleared matches");
		Ok(())
	}

	fn clear_players(&mut self) -> Result<()> {
		let tx = self.conn.transaction()?;
		// Matches go through ON DELETE CASCADE.
		let removed = tx.execute("DELETE FROM players;", [])?;
		tx.commit()?;

		info!(removed, "cleared players");
		Ok(())
	}

	fn count_players(&self) -> Result<usize> {
		let count: i64 = self
			.conn
			.query_row("SELECT COUNT(*) FROM players;", [], |row| row.get(0))?;

		Ok(count as usize)
	}

	fn register_player(&mut self, name: &str) -> Result<PlayerId> {
		let name = sanitize::clean(name);

		let tx = self.conn.transaction()?;
		tx.execute("INSERT INTO players (name) VALUES (?1);", [&name])?;
		let id = tx.last_insert_rowid();
		tx.commit()?;

		info!(id, %name, "registered player");
		Ok(id)
	}

	fn report_match(&mut self, winner: PlayerId, loser: PlayerId) -> Result<()> {
		let tx = self.conn.transaction()?;
		insert_match(&tx, winner, loser)?;
		tx.commit()?;

		info!(winner, loser, "reported match");
		Ok(())
	}

	fn player_standings(&self) -> Result<Vec<Standing>> {
		let mut stmt = self.conn.prepare(
			"SELECT id, name, wins, matches FROM standings
			 ORDER BY wins DESC, matches ASC, id ASC;",
		)?;

		let standings = stmt
			.query_map([], |row| {
				Ok(Standing {
					id: row.get(0)?,
					name: row.get(1)?,
					wins: row.get(2)?,
					matches: row.get(3)?,
				})
			})?
			.collect::<rusqlite::Result<Vec<_>>>()?;

		debug!(players = standings.len(), "read standings");
		Ok(standings)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn create_test_store() -> SqliteStore {
		SqliteStore::open_in_memory().expect("Failed to create in-memory store")
	}

	fn standing_of(store: &SqliteStore, id: PlayerId) -> Standing {
		store
			.player_standings()
			.unwrap()
			.into_iter()
			.find(|s| s.id == id)
			.expect("player should have a standing")
	}

	fn match_count(store: &SqliteStore) -> i64 {
		store
			.conn
			.query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))
			.unwrap()
	}

	#[test]
	fn empty_store_has_no_players() {
		let store = create_test_store();

		assert_eq!(store.count_players().unwrap(), 0);
		assert!(store.player_standings().unwrap().is_empty());
	}

	#[test]
	fn register_assigns_distinct_increasing_ids() {
		let mut store = create_test_store();

		let first = store.register_player("Ada").unwrap();
		let second = store.register_player("Ada").unwrap();

		assert!(second > first);
		assert_eq!(store.count_players().unwrap(), 2);
	}

	#[test]
	fn register_stores_cleaned_name() {
		let mut store = create_test_store();

		let id = store.register_player("<script>x</script>Eve").unwrap();

		assert_eq!(
			standing_of(&store, id).name,
			"&lt;script&gt;x&lt;/script&gt;Eve"
		);
	}

	#[test]
	fn new_player_has_empty_record() {
		let mut store = create_test_store();
		let id = store.register_player("Newcomer").unwrap();

		assert_eq!(
			standing_of(&store, id),
			Standing {
				id,
				name: "Newcomer".to_string(),
				wins: 0,
				matches: 0,
			}
		);
	}

	#[test]
	fn report_match_updates_both_players() {
		let mut store = create_test_store();
		let winner = store.register_player("W").unwrap();
		let loser = store.register_player("L").unwrap();
		let bystander = store.register_player("B").unwrap();

		store.report_match(winner, loser).unwrap();

		let w = standing_of(&store, winner);
		let l = standing_of(&store, loser);
		let b = standing_of(&store, bystander);
		assert_eq!((w.wins, w.matches), (1, 1));
		assert_eq!((l.wins, l.matches), (0, 1));
		assert_eq!((b.wins, b.matches), (0, 0));
	}

	#[test]
	fn report_match_with_unknown_player_fails_without_writing() {
		let mut store = create_test_store();
		let known = store.register_player("Known").unwrap();

		let err = store.report_match(known, known + 100).unwrap_err();

		assert!(matches!(err, TournamentError::UnknownPlayer(id) if id == known + 100));
		assert_eq!(match_count(&store), 0);
	}

	#[test]
	fn self_match_is_accepted() {
		let mut store = create_test_store();
		let id = store.register_player("Solo").unwrap();

		store.report_match(id, id).unwrap();

		let s = standing_of(&store, id);
		assert_eq!((s.wins, s.matches), (1, 1));
	}

	#[test]
	fn duplicate_reports_are_each_counted() {
		let mut store = create_test_store();
		let a = store.register_player("A").unwrap();
		let b = store.register_player("B").unwrap();

		store.report_match(a, b).unwrap();
		store.report_match(a, b).unwrap();

		assert_eq!(standing_of(&store, a).wins, 2);
		assert_eq!(standing_of(&store, b).matches, 2);
	}

	#[test]
	fn standings_order_by_wins_then_matches_then_id() {
		let mut store = create_test_store();
		let a = store.register_player("A").unwrap();
		let b = store.register_player("B").unwrap();
		let c = store.register_player("C").unwrap();
		let d = store.register_player("D").unwrap();

		store.report_match(a, c).unwrap();
		store.report_match(b, a).unwrap();
		store.report_match(a, b).unwrap();
		store.report_match(b, a).unwrap();
		// wins/matches: a 2/4, b 2/3, c 0/1, d 0/0

		let order: Vec<PlayerId> = store
			.player_standings()
			.unwrap()
			.iter()
			.map(|s| s.id)
			.collect();
		assert_eq!(order, vec![b, a, d, c]);
	}

	#[test]
	fn clear_matches_keeps_players() {
		let mut store = create_test_store();
		let a = store.register_player("A").unwrap();
		let b = store.register_player("B").unwrap();
		store.report_match(a, b).unwrap();

		store.clear_matches().unwrap();

		assert_eq!(store.count_players().unwrap(), 2);
		assert_eq!(match_count(&store), 0);
		assert_eq!(standing_of(&store, a).matches, 0);
	}

	#[test]
	fn clear_players_cascades_to_matches() {
		let mut store = create_test_store();
		let a = store.register_player("A").unwrap();
		let b = store.register_player("B").unwrap();
		store.report_match(a, b).unwrap();

		store.clear_players().unwrap();

		assert_eq!(store.count_players().unwrap(), 0);
		assert_eq!(match_count(&store), 0);
	}

	#[test]
	fn clearing_empty_tables_is_a_no_op() {
		let mut store = create_test_store();

		store.clear_matches().unwrap();
		store.clear_players().unwrap();
		store.clear_matches().unwrap();
		store.clear_players().unwrap();

		assert_eq!(store.count_players().unwrap(), 0);
	}

	#[test]
	fn ids_are_not_reused_after_clear() {
		let mut store = create_test_store();
		let before = store.register_player("A").unwrap();

		store.clear_players().unwrap();
		let after = store.register_player("A").unwrap();

		assert!(after > before);
	}

	#[test]
	fn report_matches_is_all_or_nothing() {
		let mut store = create_test_store();
		let a = store.register_player("A").unwrap();
		let b = store.register_player("B").unwrap();

		let err = store
			.report_matches(&[
				MatchReport { winner: a, loser: b },
				MatchReport { winner: b, loser: 999 },
			])
			.unwrap_err();

		assert!(err.is_referential());
		assert_eq!(match_count(&store), 0);

		let stored = store
			.report_matches(&[
				MatchReport { winner: a, loser: b },
				MatchReport { winner: b, loser: a },
			])
			.unwrap();
		assert_eq!(stored, 2);
		assert_eq!(match_count(&store), 2);
	}

	#[test]
	fn match_history_is_in_report_order() {
		let mut store = create_test_store();
		let a = store.register_player("A").unwrap();
		let b = store.register_player("B").unwrap();
		let before = Utc::now();

		store.report_match(a, b).unwrap();
		store.report_match(b, a).unwrap();

		let history = store.matches().unwrap();
		assert_eq!(history.len(), 2);
		assert_eq!((history[0].winner, history[0].loser), (a, b));
		assert_eq!((history[1].winner, history[1].loser), (b, a));
		assert!(history[0].id < history[1].id);
		assert!(history[0].reported_at >= before);
	}

	#[test]
	fn schema_rejects_dangling_match_rows() {
		let store = create_test_store();

		let err: TournamentError = store
			.conn
			.execute(
				"INSERT INTO matches (winner, loser, reported_at) VALUES (1, 2, 'x')",
				[],
			)
			.unwrap_err()
			.into();

		assert!(matches!(err, TournamentError::Referential(_)));
	}
}
