use crate::{Card, CardId, CoreError, Rating, ReviewLog, Scheduler};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod memory;

pub use memory::MemoryRepo;

/// Authoritative store for cards and the append-only review log.
#[async_trait]
pub trait Repository: Send + Sync {
    // Cards
    async fn add_card(&self, front: &str, back: &str) -> Result<Card, CoreError>;
    async fn get_card(&self, id: CardId) -> Result<Card, CoreError>;
    async fn list_cards(&self) -> Result<Vec<Card>, CoreError>;
    async fn delete_card(&self, id: CardId) -> Result<(), CoreError>;

    // Reviews
    /// Stores `card` and appends `log` as a single step.
    async fn record_review(&self, card: &Card, log: &ReviewLog) -> Result<(), CoreError>;
    async fn list_reviews(&self) -> Result<Vec<ReviewLog>, CoreError>;
    async fn list_reviews_for_card(&self, card_id: CardId) -> Result<Vec<ReviewLog>, CoreError>;
}

pub struct SubmittedReview {
    pub card: Card,
    pub log: ReviewLog,
}

/// Loads a card, schedules it and persists the result together with its log entry.
///
/// Nothing is written when the scheduler rejects the input.
pub async fn submit_review<R: Repository + ?Sized>(
    repo: &R,
    scheduler: &Scheduler,
    card_id: CardId,
    rating: Rating,
    now: DateTime<Utc>,
) -> Result<SubmittedReview, CoreError> {
    let mut card = repo.get_card(card_id).await?;
    let patch = scheduler.process(&card, rating, now)?;
    card.apply(&patch);
    let log = ReviewLog::new(card.id, rating, &patch);
    repo.record_review(&card, &log).await?;
    Ok(SubmittedReview { card, log })
}
