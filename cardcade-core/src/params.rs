use serde::{Deserialize, Serialize};

use crate::{CoreError, Rating};

pub const WEIGHT_COUNT: usize = 17;

pub const DEFAULT_WEIGHTS: [f64; WEIGHT_COUNT] = [
    0.4, 0.6, 2.4, 5.8, 4.93, 0.94, 0.86, 0.01, 1.49, 0.14, 0.94, 2.18, 0.05, 0.34, 1.26, 0.29,
    2.61,
];
pub const DEFAULT_REQUEST_RETENTION: f64 = 0.9;
pub const DEFAULT_MAXIMUM_INTERVAL: u32 = 36500;
pub const DEFAULT_EASY_BONUS: f64 = 1.3;
pub const DEFAULT_HARD_INTERVAL: f64 = 1.2;

/// Model weights and interval policy for a [`crate::Scheduler`].
///
/// Weight roles:
/// - `w[0..4]`: initial stability for Again, Hard, Good, Easy
/// - `w[4]`, `w[5]`: initial difficulty base and per-grade slope
/// - `w[6]`: difficulty step per grade on later reviews
/// - `w[8..11]`: stability growth after a successful recall
/// - `w[11..15]`: stability after a lapse
/// - `w[15]`, `w[16]`: Hard penalty and Easy bonus on stability growth
///
/// `w[7]` is carried for parameter-set compatibility and unused by the update rules.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerParams {
    pub w: [f64; WEIGHT_COUNT],
    pub request_retention: f64,
    pub maximum_interval: u32,
    pub easy_bonus: f64,
    pub hard_interval: f64,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            w: DEFAULT_WEIGHTS,
            request_retention: DEFAULT_REQUEST_RETENTION,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            easy_bonus: DEFAULT_EASY_BONUS,
            hard_interval: DEFAULT_HARD_INTERVAL,
        }
    }
}

impl SchedulerParams {
    /// Parses a (possibly partial) JSON parameter set and validates it.
    pub fn from_json(s: &str) -> Result<Self, CoreError> {
        let params: SchedulerParams =
            serde_json::from_str(s).map_err(|_| CoreError::InvalidInput("malformed parameters"))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.w.iter().any(|w| !w.is_finite()) {
            return Err(CoreError::InvalidInput("weights must be finite"));
        }
        if !(self.request_retention > 0.0 && self.request_retention < 1.0) {
            return Err(CoreError::InvalidInput("request_retention must be in (0, 1)"));
        }
        if self.maximum_interval < 1 {
            return Err(CoreError::InvalidInput("maximum_interval must be at least 1"));
        }
        if !(self.easy_bonus.is_finite() && self.easy_bonus > 1.0) {
            return Err(CoreError::InvalidInput("easy_bonus must be greater than 1"));
        }
        if !(self.hard_interval.is_finite() && self.hard_interval > 1.0) {
            return Err(CoreError::InvalidInput("hard_interval must be greater than 1"));
        }
        Ok(())
    }

    /// Stability assigned on a card's first review.
    pub fn initial_stability_weight(&self, rating: Rating) -> f64 {
        match rating {
            Rating::Again => self.w[0],
            Rating::Hard => self.w[1],
            Rating::Good => self.w[2],
            Rating::Easy => self.w[3],
        }
    }
}
