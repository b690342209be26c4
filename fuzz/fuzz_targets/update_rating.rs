#![no_main]

use arbitrary::Arbitrary;
use fideglicko2::{
    Encounter, Rating, RatingDifference, RatingScalar, RatingSystem, Score, Volatility,
};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct ArbitraryRating {
    rating: f64,
    deviation: f64,
    volatility: f64,
}

impl ArbitraryRating {
    fn into_clamped(self) -> Option<Rating> {
        if self.rating.is_nan() || self.deviation.is_nan() || self.volatility.is_nan() {
            None
        } else {
            Some(Rating {
                rating: RatingScalar(self.rating.clamp(-10000.0, 10000.0)),
                deviation: RatingDifference(self.deviation.abs().clamp(1.0, 500.0)),
                volatility: Volatility(self.volatility.abs().clamp(1e-4, 0.1)),
            })
        }
    }
}

#[derive(Arbitrary, Debug)]
struct ArbitraryEncounter {
    opponent: ArbitraryRating,
    score: f64,
}

#[derive(Arbitrary, Debug)]
struct Input {
    player: ArbitraryRating,
    encounters: Vec<ArbitraryEncounter>,
}

fn assert_rating(rating: &Rating) {
    assert!(f64::from(rating.rating).is_finite());
    assert!(f64::from(rating.deviation).is_finite());
    assert!(f64::from(rating.volatility).is_finite());
}

fuzz_target!(|input: Input| {
    let Some(player) = input.player.into_clamped() else {
        return;
    };

    let mut encounters = Vec::with_capacity(input.encounters.len());
    for encounter in input.encounters {
        let Some(opponent) = encounter.opponent.into_clamped() else {
            return;
        };
        if encounter.score.is_nan() {
            return;
        }
        encounters.push(Encounter {
            opponent_rating: opponent.rating,
            opponent_deviation: opponent.deviation,
            score: Score(encounter.score.clamp(0.0, 1.0)),
        });
    }

    let system = RatingSystem::new();
    let updated = match system.update_rating(&player, &encounters) {
        Ok(updated) => updated,
        Err(_) => system.update_rating_with_volatility(&player, &encounters, player.volatility),
    };
    assert_rating(&updated);
});
