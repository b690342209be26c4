use std::f64::consts::PI;

use crate::rating::RatingDifference;

/// Fixed linear factor between the public rating scale and the dimensionless
/// internal scale of the algorithm.
pub const INTERNAL_RATING_SCALE: f64 = 173.7178;

/// Rating difference on the internal scale.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InternalRatingDifference(pub f64);

impl From<InternalRatingDifference> for f64 {
    #[inline]
    fn from(InternalRatingDifference(difference): InternalRatingDifference) -> f64 {
        difference
    }
}

impl From<RatingDifference> for InternalRatingDifference {
    #[inline]
    fn from(RatingDifference(difference): RatingDifference) -> InternalRatingDifference {
        InternalRatingDifference(difference / INTERNAL_RATING_SCALE)
    }
}

impl From<InternalRatingDifference> for RatingDifference {
    #[inline]
    fn from(InternalRatingDifference(difference): InternalRatingDifference) -> RatingDifference {
        RatingDifference(difference * INTERNAL_RATING_SCALE)
    }
}

/// A rating projected onto the internal scale: `mu` for strength and `phi`
/// for deviation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InternalRating {
    pub mu: f64,
    pub phi: f64,
}

/// Weighting factor `g(phi)` that discounts games against uncertain
/// opponents.
pub(crate) fn g(phi: f64) -> f64 {
    1.0 / (1.0 + 3.0 * phi * phi / (PI * PI)).sqrt()
}

/// Expected score against an opponent whose strength differs by
/// `mu_difference`, discounted by the opponent weighting `g`.
pub(crate) fn expectation(g: f64, mu_difference: f64) -> f64 {
    1.0 / (1.0 + (-g * mu_difference).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certain_opponents_carry_full_weight() {
        assert!((g(0.0) - 1.0).abs() < f64::EPSILON);
        assert!(g(350.0 / INTERNAL_RATING_SCALE) < g(50.0 / INTERNAL_RATING_SCALE));
    }

    #[test]
    fn expectation_is_half_between_equals() {
        let e = expectation(g(1.0), 0.0);
        assert!((e - 0.5).abs() < f64::EPSILON);
    }
}
