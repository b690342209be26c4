//! Sequencing of rating periods: each period's output rating store is the
//! next period's input. Chains are strictly sequential per category; the
//! three time-control categories are independent pools that never interact
//! after their one-time branch seeding.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use fideglicko2::RatingSystem;
use thiserror::Error;
use tracing::{info, warn};

use crate::engine::{update_period, PeriodSummary};
use crate::record::{read_games, GameRecords};
use crate::store::{read_ratings, write_ratings, RatingTable};

/// A monthly rating period, labelled `YYYY-MM`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Period {
    year: u16,
    month: u8,
}

#[derive(Debug, Error)]
pub enum InvalidPeriod {
    #[error("expected a YYYY-MM period label")]
    Format,
    #[error("month {0} out of range")]
    Month(u8),
}

impl Period {
    pub fn new(year: u16, month: u8) -> Result<Period, InvalidPeriod> {
        if (1..=12).contains(&month) {
            Ok(Period { year, month })
        } else {
            Err(InvalidPeriod::Month(month))
        }
    }

    pub fn year(self) -> u16 {
        self.year
    }

    pub fn month(self) -> u8 {
        self.month
    }

    /// The following period; December rolls over into January.
    #[must_use]
    pub fn succ(self) -> Period {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Iterates from `self` through `end`, inclusive. Empty if `end` lies
    /// before `self`.
    pub fn through(self, end: Period) -> Periods {
        Periods {
            next: (self <= end).then_some(self),
            end,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = InvalidPeriod;

    fn from_str(s: &str) -> Result<Period, InvalidPeriod> {
        let (year, month) = s.split_once('-').ok_or(InvalidPeriod::Format)?;
        Period::new(
            year.parse().map_err(|_| InvalidPeriod::Format)?,
            month.parse().map_err(|_| InvalidPeriod::Format)?,
        )
    }
}

/// Inclusive iterator over consecutive periods.
#[derive(Debug, Clone)]
pub struct Periods {
    next: Option<Period>,
    end: Period,
}

impl Iterator for Periods {
    type Item = Period;

    fn next(&mut self) -> Option<Period> {
        let current = self.next?;
        self.next = (current < self.end).then(|| current.succ());
        Some(current)
    }
}

/// Independent rating pool per time control.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Category {
    Standard,
    Rapid,
    Blitz,
}

#[derive(Debug, Error)]
#[error("unknown category {0:?}")]
pub struct InvalidCategory(String);

impl Category {
    pub const ALL: [Category; 3] = [Category::Standard, Category::Rapid, Category::Blitz];

    /// Directory name of the category in the data layout.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Standard => "Standard",
            Category::Rapid => "Rapid",
            Category::Blitz => "Blitz",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = InvalidCategory;

    fn from_str(s: &str) -> Result<Category, InvalidCategory> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Category::Standard),
            "rapid" => Ok(Category::Rapid),
            "blitz" => Ok(Category::Blitz),
            _ => Err(InvalidCategory(s.to_owned())),
        }
    }
}

/// On-disk layout of one data directory: rating stores at
/// `rating_lists/<category>/<period>.txt`, game records at
/// `clean_numerical/<period>/<category>/games.txt`.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> DataLayout {
        DataLayout { root: root.into() }
    }

    pub fn ratings_path(&self, category: Category, period: Period) -> PathBuf {
        self.root
            .join("rating_lists")
            .join(category.as_str())
            .join(format!("{period}.txt"))
    }

    pub fn games_path(&self, category: Category, period: Period) -> PathBuf {
        self.root
            .join("clean_numerical")
            .join(period.to_string())
            .join(category.as_str())
            .join("games.txt")
    }
}

#[derive(Debug, Error)]
pub enum ChainError {
    /// The chain has no input rating store for a period; continuing would
    /// fabricate ratings from partial data.
    #[error("missing rating store {}", .path.display())]
    MissingRatings { path: PathBuf },
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Holds one period's output rating table keyed by the path it was written
/// to, so the next period of the same chain skips re-reading the store it
/// just produced. Replaced at every period boundary and owned by a single
/// chain run; categories never share a cache.
#[derive(Debug, Default)]
pub struct PeriodCache {
    entry: Option<(PathBuf, RatingTable)>,
}

impl PeriodCache {
    pub fn new() -> PeriodCache {
        PeriodCache::default()
    }

    /// Takes the cached table if it was written to exactly `path`.
    pub fn take(&mut self, path: &Path) -> Option<RatingTable> {
        match self.entry.take() {
            Some((cached, table)) if cached.as_path() == path => Some(table),
            _ => None,
        }
    }

    pub fn put(&mut self, path: PathBuf, table: RatingTable) {
        self.entry = Some((path, table));
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

fn load_games(games_in: &Path) -> Result<GameRecords, ChainError> {
    if games_in.exists() {
        read_games(games_in).map_err(|source| ChainError::Read {
            path: games_in.to_path_buf(),
            source,
        })
    } else {
        warn!(
            path = %games_in.display(),
            "no game records, applying deviation decay only"
        );
        Ok(GameRecords::default())
    }
}

fn apply_period(
    system: &RatingSystem,
    ratings: &RatingTable,
    games_in: &Path,
    ratings_out: &Path,
) -> Result<(RatingTable, PeriodSummary), ChainError> {
    let records = load_games(games_in)?;

    let (next, mut summary) = update_period(system, ratings, &records.by_player);
    summary.malformed_records = records.skipped;

    if let Some(parent) = ratings_out.parent() {
        fs::create_dir_all(parent).map_err(|source| ChainError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    write_ratings(ratings_out, &next).map_err(|source| ChainError::Write {
        path: ratings_out.to_path_buf(),
        source,
    })?;

    Ok((next, summary))
}

/// Applies one rating period with explicit file paths: reads the input
/// rating store and the period's game records, updates every player, writes
/// the next period's rating store.
///
/// A missing game record file is a valid decay-only pass; a missing input
/// rating store is fatal.
pub fn run_single(
    system: &RatingSystem,
    ratings_in: &Path,
    games_in: &Path,
    ratings_out: &Path,
) -> Result<PeriodSummary, ChainError> {
    if !ratings_in.exists() {
        return Err(ChainError::MissingRatings {
            path: ratings_in.to_path_buf(),
        });
    }
    let ratings = read_ratings(ratings_in).map_err(|source| ChainError::Read {
        path: ratings_in.to_path_buf(),
        source,
    })?;

    apply_period(system, &ratings, games_in, ratings_out).map(|(_, summary)| summary)
}

/// Drives one category's chain of rating periods over a [`DataLayout`].
#[derive(Debug)]
pub struct Chain<'a> {
    system: &'a RatingSystem,
    layout: DataLayout,
}

impl<'a> Chain<'a> {
    pub fn new(system: &'a RatingSystem, layout: DataLayout) -> Chain<'a> {
        Chain { system, layout }
    }

    /// One-time branch initialization: copies `from`'s rating store at
    /// `period` into `to`'s chain, so `to` can be run from `period` onward.
    pub fn seed_category(
        &self,
        from: Category,
        to: Category,
        period: Period,
    ) -> Result<(), ChainError> {
        let src = self.layout.ratings_path(from, period);
        if !src.exists() {
            return Err(ChainError::MissingRatings { path: src });
        }

        let dst = self.layout.ratings_path(to, period);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|source| ChainError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::copy(&src, &dst).map_err(|source| ChainError::Write {
            path: dst.clone(),
            source,
        })?;

        info!(%from, %to, %period, "seeded category chain");
        Ok(())
    }

    /// Processes periods `start..=end` in order, feeding each period's
    /// output ratings to the next period. The input rating store for
    /// `start` must already exist; every later input is produced by the
    /// preceding period.
    pub fn run(&self, category: Category, start: Period, end: Period) -> Result<(), ChainError> {
        let mut cache = PeriodCache::new();
        self.run_cached(category, start, end, &mut cache)
    }

    /// Like [`Chain::run`], with the period-boundary cache supplied by the
    /// caller (e.g. to resume a chain without re-reading the last store).
    pub fn run_cached(
        &self,
        category: Category,
        start: Period,
        end: Period,
        cache: &mut PeriodCache,
    ) -> Result<(), ChainError> {
        for period in start.through(end) {
            let summary = self.run_period(category, period, cache)?;
            info!(
                %category,
                %period,
                players = summary.players,
                games = summary.rated_games,
                skipped_games = summary.skipped_games,
                malformed = summary.malformed_records,
                fallbacks = summary.volatility_fallbacks,
                "period complete"
            );
        }
        Ok(())
    }

    fn run_period(
        &self,
        category: Category,
        period: Period,
        cache: &mut PeriodCache,
    ) -> Result<PeriodSummary, ChainError> {
        let ratings_in = self.layout.ratings_path(category, period);
        let ratings = match cache.take(&ratings_in) {
            Some(table) => table,
            None => {
                if !ratings_in.exists() {
                    return Err(ChainError::MissingRatings { path: ratings_in });
                }
                read_ratings(&ratings_in).map_err(|source| ChainError::Read {
                    path: ratings_in.clone(),
                    source,
                })?
            }
        };

        let ratings_out = self.layout.ratings_path(category, period.succ());
        let (next, summary) = apply_period(
            self.system,
            &ratings,
            &self.layout.games_path(category, period),
            &ratings_out,
        )?;
        cache.put(ratings_out, next);

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(s: &str) -> Period {
        s.parse().expect("valid period")
    }

    #[test]
    fn period_labels_round_trip() {
        let parsed = period("2007-10");
        assert_eq!(parsed.year(), 2007);
        assert_eq!(parsed.month(), 10);
        assert_eq!(parsed.to_string(), "2007-10");
        assert_eq!(period("2011-01").to_string(), "2011-01");
    }

    #[test]
    fn invalid_period_labels_are_rejected() {
        assert!("2007".parse::<Period>().is_err());
        assert!("2007-13".parse::<Period>().is_err());
        assert!("2007-00".parse::<Period>().is_err());
        assert!("year-01".parse::<Period>().is_err());
    }

    #[test]
    fn december_rolls_into_january() {
        assert_eq!(period("2011-12").succ(), period("2012-01"));
        assert_eq!(period("2012-01").succ(), period("2012-02"));
    }

    #[test]
    fn through_is_inclusive_and_ordered() {
        let labels: Vec<String> = period("2007-11")
            .through(period("2008-02"))
            .map(|p| p.to_string())
            .collect();
        assert_eq!(labels, ["2007-11", "2007-12", "2008-01", "2008-02"]);

        assert_eq!(period("2008-01").through(period("2007-12")).count(), 0);
    }

    #[test]
    fn category_names_match_the_layout() {
        assert_eq!("standard".parse::<Category>().ok(), Some(Category::Standard));
        assert_eq!("Blitz".parse::<Category>().ok(), Some(Category::Blitz));
        assert!("bullet".parse::<Category>().is_err());

        let layout = DataLayout::new("/data");
        assert_eq!(
            layout.ratings_path(Category::Rapid, period("2011-12")),
            PathBuf::from("/data/rating_lists/Rapid/2011-12.txt")
        );
        assert_eq!(
            layout.games_path(Category::Rapid, period("2011-12")),
            PathBuf::from("/data/clean_numerical/2011-12/Rapid/games.txt")
        );
    }

    #[test]
    fn cache_only_serves_the_exact_path() {
        let mut cache = PeriodCache::new();
        cache.put(PathBuf::from("/data/a.txt"), RatingTable::default());
        assert!(cache.take(Path::new("/data/b.txt")).is_none());
        // A mismatched take drops the stale entry.
        assert!(cache.take(Path::new("/data/a.txt")).is_none());

        cache.put(PathBuf::from("/data/a.txt"), RatingTable::default());
        assert!(cache.take(Path::new("/data/a.txt")).is_some());

        cache.put(PathBuf::from("/data/a.txt"), RatingTable::default());
        cache.clear();
        assert!(cache.take(Path::new("/data/a.txt")).is_none());
    }
}
