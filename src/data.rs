use std::{fmt, path::Path};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::Result;

pub type PlayerId = i64;

/// A player's record at the moment the standings were read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
	pub id: PlayerId,
	pub name: String,
	pub wins: u32,
	pub matches: u32,
}

/// One proposed matchup for the next round. The higher-ranked player is on the left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
	pub id_a: PlayerId,
	pub name_a: String,
	pub id_b: PlayerId,
	pub name_b: String,
}

impl Pairing {
	pub fn new(a: &Standing, b: &Standing) -> Self {
		Self {
			id_a: a.id,
			name_a: a.name.clone(),
			id_b: b.id,
			name_b: b.name.clone(),
		}
	}
}

impl fmt::Display for Pairing {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} ({}) vs {} ({})",
			self.name_a, self.id_a, self.name_b, self.id_b
		)
	}
}

/// A match outcome as submitted by a caller, before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MatchReport {
	pub winner: PlayerId,
	pub loser: PlayerId,
}

/// A stored match row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
	pub id: i64,
	pub winner: PlayerId,
	pub loser: PlayerId,
	pub reported_at: DateTime<Utc>,
}

/// Reads `winner,loser` rows from a CSV file with a header line.
pub fn read_match_reports(path: &Path) -> Result<Vec<MatchReport>> {
	let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;

	let mut reports = Vec::new();
	for row in reader.deserialize() {
		reports.push(row?);
	}

	Ok(reports)
}
