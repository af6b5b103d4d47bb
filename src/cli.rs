use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Swiss-system tournament bookkeeping", long_about = None)]
pub struct Cli {
	/// SQLite database holding players and matches
	#[arg(
		long,
		value_name = "FILE",
		env = "TOURNAMENT_DB",
		default_value = "tournament.db"
	)]
	pub database: PathBuf,

	#[arg(short, long, value_name = "FILE")]
	pub output: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Register a new player
	Register { name: String },
	/// Record the outcome of one match
	Report { winner: i64, loser: i64 },
	/// Print the number of registered players
	Count,
	/// Print the current standings
	Standings,
	/// Print next-round pairings
	Pairings,
	/// Print every reported match
	History,
	/// Report every match listed in a `winner,loser` CSV file
	Load {
		#[arg(value_name = "FILE")]
		matches: PathBuf,
	},
	/// Remove all matches, or all players with --players
	Clear {
		#[arg(long)]
		players: bool,
	},
}
