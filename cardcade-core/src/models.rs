use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::CoreError;

pub type CardId = Uuid;
pub type ReviewId = Uuid;

pub const DIFFICULTY_MIN: f64 = 1.0;
pub const DIFFICULTY_MAX: f64 = 10.0;
pub const STABILITY_MIN: f64 = 0.1;

/// Four-point recall rating supplied by the learner.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Numeric grade used by the difficulty formulas (Again = 1 .. Easy = 4).
    pub fn grade(&self) -> f64 {
        match self {
            Rating::Again => 1.0,
            Rating::Hard => 2.0,
            Rating::Good => 3.0,
            Rating::Easy => 4.0,
        }
    }

    pub fn is_lapse(&self) -> bool {
        matches!(self, Rating::Again)
    }
}

impl TryFrom<u8> for Rating {
    type Error = CoreError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Rating::Again),
            2 => Ok(Rating::Hard),
            3 => Ok(Rating::Good),
            4 => Ok(Rating::Easy),
            _ => Err(CoreError::InvalidInput("rating must be 1-4")),
        }
    }
}

impl FromStr for Rating {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "a" | "again" => Ok(Rating::Again),
            "2" | "h" | "hard" => Ok(Rating::Hard),
            "3" | "g" | "good" => Ok(Rating::Good),
            "4" | "e" | "easy" => Ok(Rating::Easy),
            _ => Err(CoreError::InvalidInput("unknown rating")),
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CardState {
    #[default]
    New,
    Learning,
    Review,
    Relearning,
}

impl FromStr for CardState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(CardState::New),
            "learning" => Ok(CardState::Learning),
            "review" => Ok(CardState::Review),
            "relearning" => Ok(CardState::Relearning),
            _ => Err(CoreError::InvalidInput("unknown card state")),
        }
    }
}

impl fmt::Display for CardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Review => "review",
            CardState::Relearning => "relearning",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub id: CardId,
    pub front: String,
    pub back: String,

    pub state: CardState,
    pub stability: f64,
    pub difficulty: f64,
    pub reps: u32,
    pub lapses: u32,
    pub elapsed_days: u32,
    pub scheduled_days: u32,
    pub last_review_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            front: front.into(),
            back: back.into(),
            state: CardState::New,
            stability: 0.0,
            difficulty: 0.0,
            reps: 0,
            lapses: 0,
            elapsed_days: 0,
            scheduled_days: 0,
            last_review_at: None,
            next_review_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.state == CardState::New
    }

    /// New cards and cards without a due timestamp are always due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match (self.state, self.next_review_at) {
            (CardState::New, _) => true,
            (_, None) => true,
            (_, Some(next)) => next <= now,
        }
    }

    /// Writes every scheduling field of `patch` into the card.
    pub fn apply(&mut self, patch: &SchedulingPatch) {
        self.state = patch.state;
        self.stability = patch.stability;
        self.difficulty = patch.difficulty;
        self.reps = patch.reps;
        self.lapses = patch.lapses;
        self.elapsed_days = patch.elapsed_days;
        self.scheduled_days = patch.scheduled_days;
        self.last_review_at = Some(patch.last_review_at);
        self.next_review_at = Some(patch.next_review_at);
    }
}

/// The complete set of scheduling fields produced by one review.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SchedulingPatch {
    pub state: CardState,
    pub stability: f64,
    pub difficulty: f64,
    pub reps: u32,
    pub lapses: u32,
    pub elapsed_days: u32,
    pub scheduled_days: u32,
    pub last_review_at: DateTime<Utc>,
    pub next_review_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReviewLog {
    pub id: ReviewId,
    pub card_id: CardId,
    pub rating: Rating,
    pub state: CardState,
    pub elapsed_days: u32,
    pub scheduled_days: u32,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewLog {
    pub fn new(card_id: CardId, rating: Rating, patch: &SchedulingPatch) -> Self {
        Self {
            id: Uuid::new_v4(),
            card_id,
            rating,
            state: patch.state,
            elapsed_days: patch.elapsed_days,
            scheduled_days: patch.scheduled_days,
            reviewed_at: patch.last_review_at,
        }
    }
}
