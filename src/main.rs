mod cli;

use std::{
	error::Error,
	fs::File,
	io::{self, Write},
};

use clap::Parser;
use cli::{Cli, Commands};
use swiss_tournament::{
	data::read_match_reports, swiss_pairings, RecordStore, Result, SqliteStore,
};
use tracing_subscriber::EnvFilter;

fn main() -> std::result::Result<(), Box<dyn Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
		)
		.with_writer(io::stderr)
		.init();

	let cli = Cli::parse();

	let mut store = SqliteStore::open(&cli.database)?;

	let mut out = match cli.output.as_deref() {
		Some(path) => Box::new(File::create(path)?) as Box<dyn Write>,
		None => Box::new(io::stdout()) as Box<dyn Write>,
	};

	let string = match cli.command {
		Commands::Register { name } => {
			let id = store.register_player(&name)?;
			format!("Registered player {id}\n")
		}
		Commands::Report { winner, loser } => {
			store.report_match(winner, loser)?;
			format!("Reported {winner} over {loser}\n")
		}
		Commands::Count => format!("{}\n", store.count_players()?),
		Commands::Standings => standings_string(&store)?,
		Commands::Pairings => pairings_string(&store)?,
		Commands::History => history_string(&store)?,
		Commands::Load { matches } => {
			let reports = read_match_reports(&matches)?;
			let count = store.report_matches(&reports)?;
			format!("Reported {count} matches\n")
		}
		Commands::Clear { players } => {
			if players {
				store.clear_players()?;
				"Cleared all players and matches\n".to_string()
			} else {
				store.clear_matches()?;
				"Cleared all matches\n".to_string()
			}
		}
	};

	out.write_all(string.as_bytes())?;

	Ok(())
}

fn standings_string(store: &SqliteStore) -> Result<String> {
	let mut string = String::from("# Standings\n```");

	for (rank, standing) in store.player_standings()?.iter().enumerate() {
		string.push_str(&format!(
			"\n{}: {} ({}): {} wins in {} matches",
			rank + 1,
			standing.name,
			standing.id,
			standing.wins,
			standing.matches
		));
	}

	string.push_str("\n```\n");

	Ok(string)
}

fn pairings_string(store: &SqliteStore) -> Result<String> {
	let mut string = String::from("# Next round\n```");

	for (table, pairing) in swiss_pairings(store)?.iter().enumerate() {
		string.push_str(&format!("\n{}: {pairing}", table + 1));
	}

	string.push_str("\n```\n");

	Ok(string)
}

fn history_string(store: &SqliteStore) -> Result<String> {
	let mut string = String::from("# Matches\n```");

	for record in store.matches()? {
		string.push_str(&format!(
			"\n{}: {} beat {} at {}",
			record.id,
			record.winner,
			record.loser,
			record.reported_at.format("%Y-%m-%d %H:%M:%S")
		));
	}

	string.push_str("\n```\n");

	Ok(string)
}
