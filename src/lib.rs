//! Glicko-2 rating engine for reconstructing historical chess ratings.
//!
//! Ratings move once per *rating period*: all of a player's games in the
//! period are applied in a single simultaneous update against the pre-period
//! snapshot of every opponent. Players without games keep their rating and
//! volatility while their deviation decays upward.
//!
//! The update algorithm, the volatility solver and every numeric policy knob
//! (defaults for unseen players, deviation and volatility ceilings, the
//! per-period step clamp) live behind [`RatingSystem`] and its builder.
//!
//! ```
//! use fideglicko2::{Encounter, RatingSystem, Score};
//!
//! let system = RatingSystem::new();
//! let player = system.new_rating();
//! let opponent = system.new_rating();
//!
//! let encounters = [Encounter {
//!     opponent_rating: opponent.rating,
//!     opponent_deviation: opponent.deviation,
//!     score: Score::WIN,
//! }];
//!
//! let updated = system.update_rating(&player, &encounters)?;
//! assert!(updated.rating > player.rating);
//! # Ok::<_, fideglicko2::ConvergenceError>(())
//! ```

mod internal_rating;
mod rating;
mod rating_system;
mod score;
mod volatility;

pub use internal_rating::INTERNAL_RATING_SCALE;
pub use rating::{Rating, RatingDifference, RatingScalar, Volatility};
pub use rating_system::{Encounter, RatingSystem, RatingSystemBuilder};
pub use score::Score;
pub use volatility::ConvergenceError;
