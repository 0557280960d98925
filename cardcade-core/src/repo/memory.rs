use crate::{Card, CardId, CoreError, ReviewLog};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryRepo {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    cards: HashMap<CardId, Card>,
    reviews: Vec<ReviewLog>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with existing cards, replacing any with the same id.
    pub fn with_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let repo = Self::new();
        {
            let mut s = repo.inner.write();
            for c in cards {
                s.cards.insert(c.id, c);
            }
        }
        repo
    }
}

#[async_trait]
impl crate::repo::Repository for MemoryRepo {
    async fn add_card(&self, front: &str, back: &str) -> Result<Card, CoreError> {
        let card = Card::new(front, back);
        self.inner.write().cards.insert(card.id, card.clone());
        Ok(card)
    }

    async fn get_card(&self, id: CardId) -> Result<Card, CoreError> {
        self.inner
            .read()
            .cards
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("card"))
    }

    async fn list_cards(&self) -> Result<Vec<Card>, CoreError> {
        Ok(self.inner.read().cards.values().cloned().collect())
    }

    async fn delete_card(&self, id: CardId) -> Result<(), CoreError> {
        let mut s = self.inner.write();
        s.cards.remove(&id).ok_or(CoreError::NotFound("card"))?;
        s.reviews.retain(|r| r.card_id != id);
        Ok(())
    }

    async fn record_review(&self, card: &Card, log: &ReviewLog) -> Result<(), CoreError> {
        if card.id != log.card_id {
            return Err(CoreError::Conflict("log belongs to another card"));
        }
        let mut s = self.inner.write();
        if !s.cards.contains_key(&card.id) {
            return Err(CoreError::NotFound("card"));
        }
        s.cards.insert(card.id, card.clone());
        s.reviews.push(log.clone());
        Ok(())
    }

    async fn list_reviews(&self) -> Result<Vec<ReviewLog>, CoreError> {
        Ok(self.inner.read().reviews.clone())
    }

    async fn list_reviews_for_card(&self, card_id: CardId) -> Result<Vec<ReviewLog>, CoreError> {
        Ok(self
            .inner
            .read()
            .reviews
            .iter()
            .filter(|r| r.card_id == card_id)
            .cloned()
            .collect())
    }
}
