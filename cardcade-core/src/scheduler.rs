use crate::{
    Card, CardState, CoreError, Rating, SchedulerParams, SchedulingPatch, DIFFICULTY_MAX,
    DIFFICULTY_MIN, STABILITY_MIN,
};
use chrono::{DateTime, Duration, Utc};

/// Decay factor of the forgetting curve.
const DECAY_FACTOR: f64 = 9.0;

/// Review processor for a fixed parameter set.
///
/// Every method is a pure function of its arguments; the caller supplies `now`.
#[derive(Clone, Debug)]
pub struct Scheduler {
    params: SchedulerParams,
}

impl Scheduler {
    pub fn new(params: SchedulerParams) -> Result<Self, CoreError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &SchedulerParams {
        &self.params
    }

    /// Computes the scheduling fields `card` takes after being rated `rating` at `now`.
    ///
    /// New cards are initialized from the per-rating constants, Learning and Relearning
    /// cards keep their stability and difficulty, and Review cards run the lapse or
    /// growth update depending on the rating.
    pub fn process(
        &self,
        card: &Card,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<SchedulingPatch, CoreError> {
        validate_card(card)?;
        let elapsed_days = elapsed_days(card.last_review_at, now)?;

        let (state, stability, difficulty) = match card.state {
            CardState::New => (
                after_transitional(rating),
                self.init_stability(rating),
                self.init_difficulty(rating),
            ),
            CardState::Learning | CardState::Relearning => {
                (after_transitional(rating), card.stability, card.difficulty)
            }
            CardState::Review => {
                let r = retrievability(elapsed_days as f64, card.stability);
                let difficulty = self.next_difficulty(card.difficulty, rating);
                if rating.is_lapse() {
                    let stability = self.lapse_stability(difficulty, card.stability, r);
                    (CardState::Relearning, stability, difficulty)
                } else {
                    let stability = self.recall_stability(difficulty, card.stability, r, rating);
                    (CardState::Review, stability, difficulty)
                }
            }
        };

        let stability = stability.max(STABILITY_MIN);
        let difficulty = clamp_difficulty(difficulty);
        let scheduled_days = self.next_interval(stability, rating);
        let next_review_at = now
            .checked_add_signed(Duration::days(i64::from(scheduled_days)))
            .ok_or(CoreError::InvalidInput("review time out of range"))?;

        Ok(SchedulingPatch {
            state,
            stability,
            difficulty,
            reps: card.reps + 1,
            lapses: card.lapses + u32::from(rating.is_lapse()),
            elapsed_days,
            scheduled_days,
            last_review_at: now,
            next_review_at,
        })
    }

    /// The patch each rating would produce, in Again, Hard, Good, Easy order.
    pub fn preview(
        &self,
        card: &Card,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Rating, SchedulingPatch)>, CoreError> {
        Rating::ALL
            .iter()
            .map(|&rating| Ok((rating, self.process(card, rating, now)?)))
            .collect()
    }

    /// Estimated probability of recalling `card` at `now`. New cards report 1.
    pub fn retrievability(&self, card: &Card, now: DateTime<Utc>) -> Result<f64, CoreError> {
        if card.is_new() {
            return Ok(1.0);
        }
        validate_card(card)?;
        let elapsed = elapsed_days(card.last_review_at, now)?;
        Ok(retrievability(elapsed as f64, card.stability))
    }

    fn init_stability(&self, rating: Rating) -> f64 {
        self.params.initial_stability_weight(rating).max(STABILITY_MIN)
    }

    fn init_difficulty(&self, rating: Rating) -> f64 {
        let w = &self.params.w;
        clamp_difficulty(w[4] - (rating.grade() - 3.0) * w[5])
    }

    fn next_difficulty(&self, difficulty: f64, rating: Rating) -> f64 {
        let w = &self.params.w;
        clamp_difficulty(difficulty - w[6] * (rating.grade() - 3.0))
    }

    fn lapse_stability(&self, difficulty: f64, stability: f64, r: f64) -> f64 {
        let w = &self.params.w;
        w[11]
            * difficulty.powf(-w[12])
            * ((stability + 1.0).powf(-w[13]) - 1.0)
            * f64::exp(w[14] * (1.0 - r))
    }

    fn recall_stability(&self, difficulty: f64, stability: f64, r: f64, rating: Rating) -> f64 {
        let w = &self.params.w;
        let hard_factor = if rating == Rating::Hard { w[15] } else { 1.0 };
        let easy_factor = if rating == Rating::Easy { w[16] } else { 1.0 };
        stability
            * (1.0
                + f64::exp(w[8])
                    * (11.0 - difficulty)
                    * stability.powf(-w[9])
                    * (f64::exp(w[10] * (1.0 - r)) - 1.0)
                    * hard_factor
                    * easy_factor)
    }

    fn next_interval(&self, stability: f64, rating: Rating) -> u32 {
        let p = &self.params;
        let base = stability * (1.0 / p.request_retention - 1.0);
        let adjusted = match rating {
            Rating::Easy => base * p.easy_bonus,
            Rating::Hard => base * p.hard_interval,
            Rating::Again | Rating::Good => base,
        };
        adjusted.round().max(1.0).min(f64::from(p.maximum_interval)) as u32
    }
}

/// Recall probability after `elapsed_days` for a memory of the given stability.
pub fn retrievability(elapsed_days: f64, stability: f64) -> f64 {
    (1.0 + elapsed_days / (DECAY_FACTOR * stability)).powi(-1)
}

fn after_transitional(rating: Rating) -> CardState {
    if rating.is_lapse() {
        CardState::Learning
    } else {
        CardState::Review
    }
}

fn clamp_difficulty(d: f64) -> f64 {
    d.clamp(DIFFICULTY_MIN, DIFFICULTY_MAX)
}

fn validate_card(card: &Card) -> Result<(), CoreError> {
    if card.is_new() {
        return Ok(());
    }
    if !(card.stability.is_finite() && card.stability > 0.0) {
        return Err(CoreError::InvalidInput("stability must be a positive number"));
    }
    if !(card.difficulty.is_finite()
        && (DIFFICULTY_MIN..=DIFFICULTY_MAX).contains(&card.difficulty))
    {
        return Err(CoreError::InvalidInput("difficulty must be within [1, 10]"));
    }
    if card.state == CardState::Review && card.last_review_at.is_none() {
        return Err(CoreError::InvalidInput("review card has no last review time"));
    }
    Ok(())
}

fn elapsed_days(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<u32, CoreError> {
    let Some(last) = last else {
        return Ok(0);
    };
    if now < last {
        return Err(CoreError::InvalidInput("review time precedes last review"));
    }
    u32::try_from((now - last).num_days())
        .map_err(|_| CoreError::InvalidInput("elapsed time out of range"))
}
