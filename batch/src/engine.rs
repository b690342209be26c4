//! One rating period: every player appearing in the rating snapshot or the
//! game records gets exactly one update against the immutable pre-period
//! snapshot.

use fideglicko2::{Encounter, Rating, RatingSystem};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::player::PlayerId;
use crate::record::Game;
use crate::store::RatingTable;

/// Counters describing one period update, for progress reporting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSummary {
    /// Players updated (rated or decayed).
    pub players: u64,
    /// Games that entered an update.
    pub rated_games: u64,
    /// Games dropped because their opponent was unknown.
    pub skipped_games: u64,
    /// Malformed input lines dropped before rating (filled by the caller
    /// that read the record file).
    pub malformed_records: u64,
    /// Players whose volatility solve failed and kept the prior volatility.
    pub volatility_fallbacks: u64,
}

#[derive(Default)]
struct PlayerCounters {
    rated: u64,
    skipped: u64,
    fallback: bool,
}

/// Computes the next period's rating table from the current snapshot and one
/// period's games.
///
/// The player set is the union of the snapshot and the keys of `games`;
/// participants without a prior rating start from the system default. All
/// opponent lookups go against the same pre-update snapshot, so updates are
/// simultaneous and order-independent: players are rated in parallel into a
/// fresh table.
pub fn update_period(
    system: &RatingSystem,
    ratings: &RatingTable,
    games: &FxHashMap<PlayerId, Vec<Game>>,
) -> (RatingTable, PeriodSummary) {
    let mut players: Vec<PlayerId> = ratings.keys().copied().collect();
    players.extend(games.keys().copied().filter(|id| !ratings.contains_key(id)));
    players.sort_unstable();

    // Pre-update state of any participant, defaults included. Opponents must
    // resolve against this same snapshot, never against already-updated
    // state.
    let snapshot = |player: PlayerId| -> Option<Rating> {
        ratings
            .get(&player)
            .cloned()
            .or_else(|| games.contains_key(&player).then(|| system.new_rating()))
    };

    let rated: Vec<(PlayerId, Rating, PlayerCounters)> = players
        .par_iter()
        .map(|&player| {
            let current = snapshot(player).unwrap_or_else(|| system.new_rating());
            let mut counters = PlayerCounters::default();

            let period_games: &[Game] = games.get(&player).map_or(&[], Vec::as_slice);
            let mut encounters = Vec::with_capacity(period_games.len());
            for game in period_games {
                match game {
                    Game::Real { opponent, score } => match snapshot(*opponent) {
                        Some(opponent_state) => encounters.push(Encounter {
                            opponent_rating: opponent_state.rating,
                            opponent_deviation: opponent_state.deviation,
                            score: *score,
                        }),
                        None => {
                            warn!(
                                player = %player,
                                opponent = %opponent,
                                "skipping game against unknown opponent"
                            );
                            counters.skipped += 1;
                        }
                    },
                    Game::Synthetic {
                        opponent_rating,
                        opponent_deviation,
                        score,
                    } => encounters.push(Encounter {
                        opponent_rating: *opponent_rating,
                        opponent_deviation: *opponent_deviation,
                        score: *score,
                    }),
                }
            }
            counters.rated = encounters.len() as u64;

            let next = match system.update_rating(&current, &encounters) {
                Ok(next) => next,
                Err(err) => {
                    warn!(
                        player = %player,
                        %err,
                        "volatility solve failed, keeping prior volatility"
                    );
                    counters.fallback = true;
                    system.update_rating_with_volatility(&current, &encounters, current.volatility)
                }
            };

            (player, next, counters)
        })
        .collect();

    let mut summary = PeriodSummary {
        players: rated.len() as u64,
        ..PeriodSummary::default()
    };
    let mut next = RatingTable::default();
    next.reserve(rated.len());
    for (player, rating, counters) in rated {
        summary.rated_games += counters.rated;
        summary.skipped_games += counters.skipped;
        summary.volatility_fallbacks += u64::from(counters.fallback);
        next.insert(player, rating);
    }

    (next, summary)
}
