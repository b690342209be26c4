//! Game record files: one block per player, a `<player_id> <game_count>`
//! header followed by one line per game. Two-field game lines reference a
//! tracked opponent, three-field lines carry an estimated opponent's rating
//! and deviation inline (used for tournaments whose crosstable could not be
//! recovered).
//!
//! Records are decoded into [`Game`] here, at the file boundary; nothing
//! downstream ever re-parses text. Malformed lines are skipped with a
//! warning so one bad record never discards a whole period.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use fideglicko2::{RatingDifference, RatingScalar, Score};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::warn;

use crate::player::PlayerId;

/// One game from the updated player's perspective.
#[derive(Debug, Clone, PartialEq)]
pub enum Game {
    /// A game against a player tracked in the rating store. The opponent's
    /// parameters are resolved against the pre-update snapshot at rating
    /// time.
    Real { opponent: PlayerId, score: Score },
    /// A reconstructed game against an estimated average opponent. The
    /// opponent's parameters travel inline and reference no tracked player.
    Synthetic {
        opponent_rating: RatingScalar,
        opponent_deviation: RatingDifference,
        score: Score,
    },
}

#[derive(Debug, Error)]
pub enum InvalidRecord {
    #[error("expected 2 or 3 whitespace-separated fields, got {0}")]
    Fields(usize),
    #[error("unparseable numeric field {0:?}")]
    Number(String),
    #[error("score {0} outside 0..=1")]
    Score(f64),
    #[error("opponent parameters out of range")]
    Opponent,
}

fn parse_f64(field: &str) -> Result<f64, InvalidRecord> {
    field
        .parse()
        .map_err(|_| InvalidRecord::Number(field.to_owned()))
}

fn parse_score(field: &str) -> Result<Score, InvalidRecord> {
    let score = parse_f64(field)?;
    if !(0.0..=1.0).contains(&score) {
        return Err(InvalidRecord::Score(score));
    }
    Ok(Score(score))
}

impl FromStr for Game {
    type Err = InvalidRecord;

    fn from_str(line: &str) -> Result<Game, InvalidRecord> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [opponent, score] => Ok(Game::Real {
                opponent: opponent
                    .parse()
                    .map_err(|_| InvalidRecord::Number((*opponent).to_owned()))?,
                score: parse_score(score)?,
            }),
            [rating, deviation, score] => {
                let rating = parse_f64(rating)?;
                let deviation = parse_f64(deviation)?;
                if !rating.is_finite() || !deviation.is_finite() || deviation <= 0.0 {
                    return Err(InvalidRecord::Opponent);
                }
                Ok(Game::Synthetic {
                    opponent_rating: RatingScalar(rating),
                    opponent_deviation: RatingDifference(deviation),
                    score: parse_score(score)?,
                })
            }
            fields => Err(InvalidRecord::Fields(fields.len())),
        }
    }
}

fn parse_header(line: &str) -> Result<(PlayerId, u64), InvalidRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        [player, count] => Ok((
            player
                .parse()
                .map_err(|_| InvalidRecord::Number((*player).to_owned()))?,
            count
                .parse()
                .map_err(|_| InvalidRecord::Number((*count).to_owned()))?,
        )),
        fields => Err(InvalidRecord::Fields(fields.len())),
    }
}

/// The decoded contents of one period's game record file.
#[derive(Debug, Default)]
pub struct GameRecords {
    /// Games keyed by the player they update. A player listed with zero
    /// games still gets an (empty) entry and thereby participates in the
    /// period.
    pub by_player: FxHashMap<PlayerId, Vec<Game>>,
    /// Successfully decoded games.
    pub games: u64,
    /// Malformed lines skipped with a warning.
    pub skipped: u64,
}

/// Reads a game record file, skipping malformed lines. A malformed block
/// header resynchronizes on the next parseable header line.
pub fn read_games(path: &Path) -> io::Result<GameRecords> {
    read_games_from(BufReader::new(File::open(path)?))
}

pub fn read_games_from<R: BufRead>(reader: R) -> io::Result<GameRecords> {
    let mut records = GameRecords::default();
    let mut current = PlayerId(0);
    let mut remaining = 0u64;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if remaining == 0 {
            match parse_header(line) {
                Ok((player, count)) => {
                    current = player;
                    remaining = count;
                    records.by_player.entry(player).or_default();
                }
                Err(err) => {
                    warn!(line = number + 1, %err, "skipping malformed record header");
                    records.skipped += 1;
                }
            }
        } else {
            remaining -= 1;
            match line.parse::<Game>() {
                Ok(game) => {
                    records.by_player.entry(current).or_default().push(game);
                    records.games += 1;
                }
                Err(err) => {
                    warn!(line = number + 1, %err, "skipping malformed game record");
                    records.skipped += 1;
                }
            }
        }
    }

    if remaining > 0 {
        warn!(
            player = %current,
            missing = remaining,
            "game record file ended before the last block was complete"
        );
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(input: &str) -> GameRecords {
        read_games_from(Cursor::new(input)).expect("in-memory read")
    }

    #[test]
    fn decodes_real_and_synthetic_games() {
        let records = read(
            "1001 3\n\
             1002 1.0\n\
             1003 0.5\n\
             1950.5 180.25 0.0\n\
             1002 1\n\
             1001 0.0\n",
        );

        assert_eq!(records.games, 4);
        assert_eq!(records.skipped, 0);
        assert_eq!(records.by_player.len(), 2);

        let games = &records.by_player[&PlayerId(1001)];
        assert_eq!(
            games[0],
            Game::Real {
                opponent: PlayerId(1002),
                score: Score::WIN,
            }
        );
        assert_eq!(
            games[2],
            Game::Synthetic {
                opponent_rating: RatingScalar(1950.5),
                opponent_deviation: RatingDifference(180.25),
                score: Score::LOSS,
            }
        );
    }

    #[test]
    fn zero_game_blocks_still_participate() {
        let records = read("1001 0\n1002 1\n1001 0.5\n");
        assert!(records.by_player[&PlayerId(1001)].is_empty());
        assert_eq!(records.by_player[&PlayerId(1002)].len(), 1);
    }

    #[test]
    fn malformed_game_lines_are_skipped() {
        let records = read(
            "1001 2\n\
             1002 one\n\
             1003 0.5\n",
        );

        assert_eq!(records.games, 1);
        assert_eq!(records.skipped, 1);
        assert_eq!(records.by_player[&PlayerId(1001)].len(), 1);
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        assert!(matches!(
            "1002 1.5".parse::<Game>(),
            Err(InvalidRecord::Score(_))
        ));
        assert!(matches!(
            "1002 nan".parse::<Game>(),
            Err(InvalidRecord::Score(_)) | Err(InvalidRecord::Number(_))
        ));
    }

    #[test]
    fn synthetic_games_require_sane_opponents() {
        assert!(matches!(
            "inf 100.0 0.5".parse::<Game>(),
            Err(InvalidRecord::Opponent)
        ));
        assert!(matches!(
            "1900.0 0.0 0.5".parse::<Game>(),
            Err(InvalidRecord::Opponent)
        ));
    }

    #[test]
    fn malformed_header_resynchronizes() {
        let records = read(
            "not a header\n\
             1001 1\n\
             1002 1.0\n",
        );

        assert_eq!(records.skipped, 1);
        assert_eq!(records.games, 1);
        assert_eq!(records.by_player.len(), 1);
    }
}
