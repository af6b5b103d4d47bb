use tracing::debug;

use crate::{
	data::{Pairing, Standing},
	error::{Result, TournamentError},
	store::RecordStore,
};

/// Pairs adjacent ranks: (0, 1), (2, 3), ... with the higher-ranked player on
/// the left. Rematches are not avoided.
pub fn pair_standings(standings: &[Standing]) -> Result<Vec<Pairing>> {
	if standings.len() % 2 != 0 {
		return Err(TournamentError::OddPlayerCount {
			count: standings.len(),
		});
	}

	Ok(standings
		.chunks_exact(2)
		.map(|pair| Pairing::new(&pair[0], &pair[1]))
		.collect())
}

/// Next-round pairings from the store's current standings.
pub fn swiss_pairings<S: RecordStore + ?Sized>(store: &S) -> Result<Vec<Pairing>> {
	let standings = store.player_standings()?;
	let pairings = pair_standings(&standings)?;

	debug!(pairings = pairings.len(), "paired next round");
	Ok(pairings)
}
