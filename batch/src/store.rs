//! Rating store files: one `<player_id> <rating> <rd> <volatility>` line per
//! player, carried from one rating period to the next.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use fideglicko2::{Rating, RatingDifference, RatingScalar, Volatility};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::warn;

use crate::player::PlayerId;

/// Every tracked player's rating state at one period boundary.
pub type RatingTable = FxHashMap<PlayerId, Rating>;

#[derive(Debug, Error)]
pub enum InvalidRatingLine {
    #[error("expected 4 whitespace-separated fields, got {0}")]
    Fields(usize),
    #[error("unparseable numeric field {0:?}")]
    Number(String),
    #[error("rating state out of range")]
    OutOfRange,
}

fn parse_line(line: &str) -> Result<(PlayerId, Rating), InvalidRatingLine> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [player, rating, deviation, volatility] = fields.as_slice() else {
        return Err(InvalidRatingLine::Fields(fields.len()));
    };

    let player = player
        .parse()
        .map_err(|_| InvalidRatingLine::Number((*player).to_owned()))?;
    let numeric = |field: &str| -> Result<f64, InvalidRatingLine> {
        field
            .parse()
            .map_err(|_| InvalidRatingLine::Number(field.to_owned()))
    };

    let rating = numeric(rating)?;
    let deviation = numeric(deviation)?;
    let volatility = numeric(volatility)?;
    if !rating.is_finite() || !deviation.is_finite() || !volatility.is_finite() {
        return Err(InvalidRatingLine::OutOfRange);
    }
    if deviation <= 0.0 || volatility <= 0.0 {
        return Err(InvalidRatingLine::OutOfRange);
    }

    Ok((
        player,
        Rating {
            rating: RatingScalar(rating),
            deviation: RatingDifference(deviation),
            volatility: Volatility(volatility),
        },
    ))
}

/// Reads a rating store, skipping malformed lines with a warning.
pub fn read_ratings(path: &Path) -> io::Result<RatingTable> {
    read_ratings_from(BufReader::new(File::open(path)?))
}

pub fn read_ratings_from<R: BufRead>(reader: R) -> io::Result<RatingTable> {
    let mut ratings = RatingTable::default();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Ok((player, rating)) => {
                ratings.insert(player, rating);
            }
            Err(err) => warn!(line = number + 1, %err, "skipping malformed rating line"),
        }
    }

    Ok(ratings)
}

/// Writes a rating store sorted by player id, 7 decimal digits per float.
///
/// The data goes to a sibling temporary file first and is renamed into place
/// afterwards, so a crash mid-write never leaves a truncated store behind as
/// valid input for the next period.
pub fn write_ratings(path: &Path, ratings: &RatingTable) -> io::Result<()> {
    let mut players: Vec<PlayerId> = ratings.keys().copied().collect();
    players.sort_unstable();

    let staging = path.with_extension("tmp");
    {
        let mut writer = BufWriter::new(File::create(&staging)?);
        for player in players {
            let rating = &ratings[&player];
            writeln!(
                writer,
                "{} {:.7} {:.7} {:.7}",
                player,
                f64::from(rating.rating),
                f64::from(rating.deviation),
                f64::from(rating.volatility),
            )?;
        }
        writer.flush()?;
    }
    fs::rename(&staging, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_valid_lines_and_skips_junk() {
        let ratings = read_ratings_from(Cursor::new(
            "1001 1523.4567890 214.0000000 0.0900000\n\
             bogus line\n\
             1002 inf 350.0000000 0.0900000\n\
             1003 1500.0000000 350.0000000 0.0900000\n",
        ))
        .expect("in-memory read");

        assert_eq!(ratings.len(), 2);
        let rating = &ratings[&PlayerId(1001)];
        assert!((f64::from(rating.rating) - 1523.456789).abs() < 1e-6);
        assert!((f64::from(rating.deviation) - 214.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_wrong_field_counts() {
        assert!(matches!(
            parse_line("1001 1500.0 350.0"),
            Err(InvalidRatingLine::Fields(3))
        ));
    }

    #[test]
    fn non_positive_uncertainties_are_rejected() {
        assert!(matches!(
            parse_line("1001 1500.0 0.0 0.09"),
            Err(InvalidRatingLine::OutOfRange)
        ));
        assert!(matches!(
            parse_line("1001 1500.0 350.0 -0.01"),
            Err(InvalidRatingLine::OutOfRange)
        ));
    }
}
