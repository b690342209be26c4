//! TOML-backed configuration of the rating system parameters. Every knob
//! falls back to the reference parameterization, so a missing file or an
//! empty table is a valid configuration.

use std::fs;
use std::path::Path;

use fideglicko2::{RatingDifference, RatingScalar, RatingSystem, Volatility};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RatingConfig {
    pub default_rating: f64,
    pub default_deviation: f64,
    pub default_volatility: f64,
    pub tau: f64,
    pub max_deviation: f64,
    pub max_volatility: f64,
    pub max_rating_step: f64,
    pub min_rating: f64,
    pub max_rating: f64,
    pub convergence_tolerance: f64,
    pub max_iterations: u32,
}

impl Default for RatingConfig {
    fn default() -> RatingConfig {
        RatingConfig {
            default_rating: 1500.0,
            default_deviation: 350.0,
            default_volatility: 0.09,
            tau: 0.2,
            max_deviation: 500.0,
            max_volatility: 0.1,
            max_rating_step: 1000.0,
            min_rating: f64::NEG_INFINITY,
            max_rating: f64::INFINITY,
            convergence_tolerance: 1e-6,
            max_iterations: 1000,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl RatingConfig {
    pub fn load(path: &Path) -> Result<RatingConfig, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn to_system(&self) -> RatingSystem {
        RatingSystem::builder()
            .min_rating(RatingScalar(self.min_rating))
            .max_rating(RatingScalar(self.max_rating))
            .default_rating(RatingScalar(self.default_rating))
            .default_deviation(RatingDifference(self.default_deviation))
            .default_volatility(Volatility(self.default_volatility))
            .max_deviation(RatingDifference(self.max_deviation))
            .max_volatility(Volatility(self.max_volatility))
            .max_rating_step(RatingDifference(self.max_rating_step))
            .tau(self.tau)
            .convergence_tolerance(self.convergence_tolerance)
            .max_iterations(self.max_iterations)
            .build()
    }
}
