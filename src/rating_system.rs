use crate::internal_rating::{expectation, g, InternalRating, INTERNAL_RATING_SCALE};
use crate::rating::{Rating, RatingDifference, RatingScalar, Volatility};
use crate::score::Score;
use crate::volatility::{solve_volatility, ConvergenceError};

/// A single rated game from the perspective of the player being updated:
/// the opponent's public-scale parameters and the achieved score.
///
/// Opponent parameters are carried as plain numbers rather than a player
/// reference, so live opponents (resolved against the pre-update snapshot)
/// and estimated opponents from reconstructed tournaments go through the
/// same update.
#[derive(Debug, Clone, PartialEq)]
pub struct Encounter {
    pub opponent_rating: RatingScalar,
    pub opponent_deviation: RatingDifference,
    pub score: Score,
}

#[derive(Debug, Clone)]
pub struct RatingSystemBuilder {
    min_rating: RatingScalar,
    max_rating: RatingScalar,

    default_rating: RatingScalar,
    default_deviation: RatingDifference,
    default_volatility: Volatility,

    max_deviation: RatingDifference,
    max_volatility: Volatility,
    max_rating_step: RatingDifference,

    tau: f64,
    convergence_tolerance: f64,
    max_iterations: u32,
}

impl Default for RatingSystemBuilder {
    fn default() -> RatingSystemBuilder {
        RatingSystemBuilder::new()
    }
}

impl RatingSystemBuilder {
    pub fn new() -> RatingSystemBuilder {
        RatingSystemBuilder {
            min_rating: RatingScalar(f64::NEG_INFINITY),
            max_rating: RatingScalar(f64::INFINITY),

            default_rating: RatingScalar(1500.0),
            default_deviation: RatingDifference(350.0),
            default_volatility: Volatility(0.09),

            max_deviation: RatingDifference(500.0),
            max_volatility: Volatility(0.1),
            max_rating_step: RatingDifference(1000.0),

            tau: 0.2,
            convergence_tolerance: 1e-6,
            max_iterations: 1000,
        }
    }

    pub fn min_rating(&mut self, min_rating: RatingScalar) -> &mut Self {
        assert!(!f64::from(min_rating).is_nan());
        self.min_rating = min_rating;
        self
    }

    pub fn max_rating(&mut self, max_rating: RatingScalar) -> &mut Self {
        assert!(!f64::from(max_rating).is_nan());
        self.max_rating = max_rating;
        self
    }

    /// Rating assigned to previously unseen players. Also the center of the
    /// internal scale.
    pub fn default_rating(&mut self, default_rating: RatingScalar) -> &mut Self {
        assert!(f64::from(default_rating).is_finite());
        self.default_rating = default_rating;
        self
    }

    pub fn default_deviation(&mut self, default_deviation: RatingDifference) -> &mut Self {
        assert!(f64::from(default_deviation) > 0.0);
        self.default_deviation = default_deviation;
        self
    }

    pub fn default_volatility(&mut self, default_volatility: Volatility) -> &mut Self {
        assert!(f64::from(default_volatility) > 0.0);
        self.default_volatility = default_volatility;
        self
    }

    pub fn max_deviation(&mut self, max_deviation: RatingDifference) -> &mut Self {
        assert!(f64::from(max_deviation) > 0.0);
        self.max_deviation = max_deviation;
        self
    }

    pub fn max_volatility(&mut self, max_volatility: Volatility) -> &mut Self {
        assert!(f64::from(max_volatility) > 0.0);
        self.max_volatility = max_volatility;
        self
    }

    /// Bound on the rating movement a single period may apply, on the public
    /// scale. The step itself is clamped, not just the resulting rating.
    pub fn max_rating_step(&mut self, max_rating_step: RatingDifference) -> &mut Self {
        assert!(f64::from(max_rating_step) > 0.0);
        self.max_rating_step = max_rating_step;
        self
    }

    /// Damping constant of the volatility update. Smaller values change
    /// volatility more slowly; sensible values lie around `0.2` to `1.2`.
    pub fn tau(&mut self, tau: f64) -> &mut Self {
        assert!(tau > 0.0);
        self.tau = tau;
        self
    }

    pub fn convergence_tolerance(&mut self, convergence_tolerance: f64) -> &mut Self {
        assert!(convergence_tolerance > 0.0);
        self.convergence_tolerance = convergence_tolerance;
        self
    }

    pub fn max_iterations(&mut self, max_iterations: u32) -> &mut Self {
        assert!(max_iterations > 0);
        self.max_iterations = max_iterations;
        self
    }

    pub fn build(&self) -> RatingSystem {
        assert!(self.min_rating <= self.max_rating);
        assert!(self.default_volatility <= self.max_volatility);

        RatingSystem {
            min_rating: self.min_rating,
            max_rating: self.max_rating,

            default_rating: self.default_rating,
            default_deviation: self.default_deviation,
            default_volatility: self.default_volatility,

            max_deviation: self.max_deviation,
            max_volatility: self.max_volatility,
            max_rating_step: self.max_rating_step,

            tau: self.tau,
            convergence_tolerance: self.convergence_tolerance,
            max_iterations: self.max_iterations,
        }
    }
}

/// The rating system parameterization and the update algorithm itself.
///
/// All numeric policy knobs (defaults for unseen players, deviation and
/// volatility ceilings, the per-period step clamp, the solver constants) are
/// configuration of this struct rather than hard-coded literals.
#[derive(Debug, Clone)]
pub struct RatingSystem {
    min_rating: RatingScalar,
    max_rating: RatingScalar,

    default_rating: RatingScalar,
    default_deviation: RatingDifference,
    default_volatility: Volatility,

    max_deviation: RatingDifference,
    max_volatility: Volatility,
    max_rating_step: RatingDifference,

    tau: f64,
    convergence_tolerance: f64,
    max_iterations: u32,
}

impl Default for RatingSystem {
    fn default() -> RatingSystem {
        RatingSystem::new()
    }
}

/// Accumulated game terms of one update: the estimated variance `v` and the
/// estimated improvement `delta`, both on the internal scale.
struct GameTerms {
    v: f64,
    delta: f64,
    delta_sum: f64,
}

impl RatingSystem {
    pub fn builder() -> RatingSystemBuilder {
        RatingSystemBuilder::new()
    }

    pub fn new() -> RatingSystem {
        RatingSystem::builder().build()
    }

    pub fn min_rating(&self) -> RatingScalar {
        self.min_rating
    }

    pub fn max_rating(&self) -> RatingScalar {
        self.max_rating
    }

    pub fn default_rating(&self) -> RatingScalar {
        self.default_rating
    }

    pub fn default_deviation(&self) -> RatingDifference {
        self.default_deviation
    }

    pub fn default_volatility(&self) -> Volatility {
        self.default_volatility
    }

    pub fn max_deviation(&self) -> RatingDifference {
        self.max_deviation
    }

    pub fn max_volatility(&self) -> Volatility {
        self.max_volatility
    }

    pub fn max_rating_step(&self) -> RatingDifference {
        self.max_rating_step
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    pub fn convergence_tolerance(&self) -> f64 {
        self.convergence_tolerance
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// The state assigned to a player on first appearance.
    pub fn new_rating(&self) -> Rating {
        Rating {
            rating: self.default_rating,
            deviation: self.default_deviation,
            volatility: self.default_volatility,
        }
    }

    /// Expected score of `player` in a game against `opponent`.
    pub fn expected_score(&self, player: &Rating, opponent: &Rating) -> Score {
        let player = self.to_internal(player);
        let opponent = self.to_internal(opponent);
        Score(expectation(g(opponent.phi), player.mu - opponent.mu))
    }

    /// Applies one rating period worth of games to `rating`.
    ///
    /// An empty `encounters` slice performs the no-games update: the rating
    /// and volatility stay put while the deviation decays upward. Errors
    /// signal that the volatility solver failed to converge to a finite
    /// value; callers decide the fallback, typically
    /// [`RatingSystem::update_rating_with_volatility`] with the prior
    /// volatility.
    pub fn update_rating(
        &self,
        rating: &Rating,
        encounters: &[Encounter],
    ) -> Result<Rating, ConvergenceError> {
        if encounters.is_empty() {
            return Ok(self.decay_rating(rating));
        }

        let internal = self.to_internal(rating);
        let terms = self.accumulate(&internal, encounters);
        let volatility = solve_volatility(
            terms.delta * terms.delta,
            internal.phi * internal.phi,
            terms.v,
            rating.volatility,
            self.tau,
            self.convergence_tolerance,
            self.max_iterations,
        )?;
        Ok(self.apply(&internal, &terms, volatility))
    }

    /// The same update as [`RatingSystem::update_rating`], with the
    /// post-period volatility supplied instead of solved. Used to retain a
    /// player's prior volatility when the solver fails.
    pub fn update_rating_with_volatility(
        &self,
        rating: &Rating,
        encounters: &[Encounter],
        volatility: Volatility,
    ) -> Rating {
        if encounters.is_empty() {
            return self.decay_rating(rating);
        }

        let internal = self.to_internal(rating);
        let terms = self.accumulate(&internal, encounters);
        self.apply(&internal, &terms, volatility)
    }

    /// No-games update: uncertainty grows, rating and volatility stay.
    pub fn decay_rating(&self, rating: &Rating) -> Rating {
        let phi = f64::from(rating.deviation.to_internal());
        let phi_star = (phi * phi + rating.volatility.sq()).sqrt();
        Rating {
            rating: rating.rating,
            deviation: self.external_deviation(phi_star),
            volatility: rating.volatility,
        }
    }

    fn accumulate(&self, player: &InternalRating, encounters: &[Encounter]) -> GameTerms {
        let mut v_inv = 0.0;
        let mut delta_sum = 0.0;

        for encounter in encounters {
            let opponent =
                self.internal_parts(encounter.opponent_rating, encounter.opponent_deviation);
            let g = g(opponent.phi);
            let e = expectation(g, player.mu - opponent.mu);
            v_inv += g * g * e * (1.0 - e);
            delta_sum += g * (f64::from(encounter.score) - e);
        }

        let v = 1.0 / v_inv;
        GameTerms {
            v,
            delta: v * delta_sum,
            delta_sum,
        }
    }

    fn apply(&self, internal: &InternalRating, terms: &GameTerms, volatility: Volatility) -> Rating {
        let phi_star = (internal.phi * internal.phi + volatility.sq()).sqrt();
        let new_phi = 1.0 / (1.0 / (phi_star * phi_star) + 1.0 / terms.v).sqrt();

        let max_step = f64::from(self.max_rating_step.to_internal());
        let step = (new_phi * new_phi * terms.delta_sum).clamp(-max_step, max_step);
        let new_mu = internal.mu + step;

        Rating {
            rating: self
                .external_rating(new_mu)
                .clamp(self.min_rating, self.max_rating),
            deviation: self.external_deviation(new_phi),
            volatility: volatility.clamp(Volatility(0.0), self.max_volatility),
        }
    }

    fn to_internal(&self, rating: &Rating) -> InternalRating {
        self.internal_parts(rating.rating, rating.deviation)
    }

    fn internal_parts(&self, rating: RatingScalar, deviation: RatingDifference) -> InternalRating {
        InternalRating {
            mu: f64::from((rating - self.default_rating).to_internal()),
            phi: f64::from(deviation.to_internal()),
        }
    }

    fn external_rating(&self, mu: f64) -> RatingScalar {
        self.default_rating + RatingDifference(mu * INTERNAL_RATING_SCALE)
    }

    fn external_deviation(&self, phi: f64) -> RatingDifference {
        RatingDifference(phi * INTERNAL_RATING_SCALE)
            .clamp(RatingDifference(0.0), self.max_deviation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(rating: f64, deviation: f64, volatility: f64) -> Rating {
        Rating {
            rating: RatingScalar(rating),
            deviation: RatingDifference(deviation),
            volatility: Volatility(volatility),
        }
    }

    fn encounter(opponent_rating: f64, opponent_deviation: f64, score: Score) -> Encounter {
        Encounter {
            opponent_rating: RatingScalar(opponent_rating),
            opponent_deviation: RatingDifference(opponent_deviation),
            score,
        }
    }

    #[test]
    fn no_games_decays_deviation_only() {
        let system = RatingSystem::new();
        let before = system.new_rating();
        let after = system.update_rating(&before, &[]).expect("no solver involved");

        assert_eq!(after.rating, before.rating);
        assert_eq!(after.volatility, before.volatility);
        assert!(after.deviation > before.deviation);
        assert!(after.deviation <= system.max_deviation());
    }

    #[test]
    fn decayed_deviation_stays_below_ceiling() {
        let system = RatingSystem::new();
        let after = system.decay_rating(&rating(1500.0, 499.9, 0.09));
        assert_eq!(after.deviation, system.max_deviation());
    }

    #[test]
    fn draw_between_equals_changes_nothing() {
        let system = RatingSystem::new();
        let player = system.new_rating();
        let after = system
            .update_rating(&player, &[encounter(1500.0, 350.0, Score::DRAW)])
            .expect("solver converges");

        assert_eq!(f64::from(after.rating), 1500.0);
        assert!(after.deviation < player.deviation);
    }

    #[test]
    fn win_raises_and_loss_lowers() {
        let system = RatingSystem::new();
        let player = system.new_rating();

        let winner = system
            .update_rating(&player, &[encounter(1500.0, 350.0, Score::WIN)])
            .expect("solver converges");
        let loser = system
            .update_rating(&player, &[encounter(1500.0, 350.0, Score::LOSS)])
            .expect("solver converges");

        assert!(f64::from(winner.rating) > 1500.0);
        assert!(f64::from(loser.rating) < 1500.0);
        // Mirrored scores move mirrored distances.
        assert!(
            (f64::from(winner.rating) - 1500.0 + (f64::from(loser.rating) - 1500.0)).abs() < 1e-9
        );
    }

    #[test]
    fn glickman_worked_example() {
        // Example from the Glicko-2 paper: a 1500/200/0.06 player beats a
        // 1400/30 opponent and loses to 1550/100 and 1700/300, tau = 0.5.
        let system = RatingSystem::builder()
            .default_volatility(Volatility(0.06))
            .tau(0.5)
            .build();
        let player = rating(1500.0, 200.0, 0.06);
        let encounters = [
            encounter(1400.0, 30.0, Score::WIN),
            encounter(1550.0, 100.0, Score::LOSS),
            encounter(1700.0, 300.0, Score::LOSS),
        ];

        let after = system
            .update_rating(&player, &encounters)
            .expect("solver converges");

        assert!((f64::from(after.rating) - 1464.06).abs() < 0.05);
        assert!((f64::from(after.deviation) - 151.52).abs() < 0.05);
        assert!((f64::from(after.volatility) - 0.05999).abs() < 2e-4);
    }

    #[test]
    fn runaway_updates_are_step_clamped() {
        let system = RatingSystem::new();
        let player = system.new_rating();
        let encounters: Vec<Encounter> = (0..50)
            .map(|_| encounter(3000.0, 350.0, Score::WIN))
            .collect();

        let after = match system.update_rating(&player, &encounters) {
            Ok(after) => after,
            Err(_) => system.update_rating_with_volatility(&player, &encounters, player.volatility),
        };

        assert!((f64::from(after.rating) - 2500.0).abs() < 1e-6);
        assert!(after.volatility <= system.max_volatility());
        assert!(after.deviation <= system.max_deviation());
    }

    #[test]
    fn outputs_stay_within_bounds() {
        let system = RatingSystem::new();
        let extremes = [
            rating(100.0, 500.0, 0.1),
            rating(3200.0, 30.0, 0.01),
            rating(1500.0, 350.0, 0.09),
        ];
        let encounters = [
            encounter(1500.0, 350.0, Score::WIN),
            encounter(2800.0, 60.0, Score::LOSS),
            encounter(900.0, 500.0, Score::DRAW),
        ];

        for player in &extremes {
            let after = match system.update_rating(player, &encounters) {
                Ok(after) => after,
                Err(_) => {
                    system.update_rating_with_volatility(player, &encounters, player.volatility)
                }
            };
            assert!(f64::from(after.rating).is_finite());
            assert!(f64::from(after.deviation) > 0.0);
            assert!(after.deviation <= system.max_deviation());
            assert!(f64::from(after.volatility) > 0.0);
            assert!(after.volatility <= system.max_volatility());
        }
    }

    #[test]
    fn expected_scores_are_complementary() {
        let system = RatingSystem::new();
        let strong = rating(1900.0, 80.0, 0.06);
        let weak = rating(1500.0, 150.0, 0.06);

        let forward = f64::from(system.expected_score(&strong, &weak));
        assert!(forward > 0.5);

        // Complementary only against the same opponent uncertainty; check
        // with equal deviations.
        let even = rating(1700.0, 100.0, 0.06);
        let other = rating(1600.0, 100.0, 0.06);
        let e1 = f64::from(system.expected_score(&even, &other));
        let e2 = f64::from(system.expected_score(&other, &even));
        assert!((e1 + e2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn update_is_deterministic() {
        let system = RatingSystem::new();
        let player = rating(1623.5, 117.2, 0.071);
        let encounters = [
            encounter(1498.0, 203.4, Score::WIN),
            encounter(1701.9, 88.1, Score::LOSS),
            encounter(2100.0, 150.0, Score(0.5)),
        ];

        let first = system.update_rating(&player, &encounters).expect("converges");
        let second = system.update_rating(&player, &encounters).expect("converges");

        assert_eq!(
            f64::from(first.rating).to_bits(),
            f64::from(second.rating).to_bits()
        );
        assert_eq!(
            f64::from(first.deviation).to_bits(),
            f64::from(second.deviation).to_bits()
        );
        assert_eq!(
            f64::from(first.volatility).to_bits(),
            f64::from(second.volatility).to_bits()
        );
    }
}
