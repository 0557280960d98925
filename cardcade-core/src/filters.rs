use crate::{Card, CardId, ReviewLog};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// How many failure-ranked cards are considered for boss review.
pub const BOSS_CANDIDATE_LIMIT: usize = 10;

/// Cards eligible for review at `now`, in input order.
pub fn due_cards(cards: &[Card], now: DateTime<Utc>) -> Vec<Card> {
    cards.iter().filter(|c| c.is_due(now)).cloned().collect()
}

/// Presentation order: New cards first, then the most overdue.
///
/// Non-New cards without a due timestamp count as maximally overdue. Remaining ties
/// are broken by card id so the order is total.
pub fn sort_by_priority(cards: &[Card], now: DateTime<Utc>) -> Vec<Card> {
    let mut v = cards.to_vec();
    v.sort_by_key(|c| priority_key(c, now));
    v
}

fn priority_key(card: &Card, now: DateTime<Utc>) -> (bool, Option<Reverse<i64>>, CardId) {
    if card.is_new() {
        return (false, None, card.id);
    }
    let overdue = card
        .next_review_at
        .map(|next| Reverse((now - next).num_milliseconds()));
    (true, overdue, card.id)
}

/// Number of Again ratings logged per card.
pub fn failure_counts(logs: &[ReviewLog]) -> HashMap<CardId, u32> {
    let mut map: HashMap<CardId, u32> = HashMap::new();
    for log in logs.iter().filter(|l| l.rating.is_lapse()) {
        *map.entry(log.card_id).or_default() += 1;
    }
    map
}

/// Due cards among the `limit` most-failed cards, highest failure count first.
///
/// Cards with no logged failures never qualify. Equal counts order by card id.
pub fn rank_failure_candidates(
    logs: &[ReviewLog],
    cards: &[Card],
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<Card> {
    let mut ranked: Vec<(CardId, u32)> = failure_counts(logs).into_iter().collect();
    ranked.sort_by_key(|&(id, n)| (Reverse(n), id));
    ranked.truncate(limit);

    let due: HashSet<CardId> = due_cards(cards, now).iter().map(|c| c.id).collect();
    let by_id: HashMap<CardId, &Card> = cards.iter().map(|c| (c.id, c)).collect();

    ranked
        .into_iter()
        .filter(|(id, _)| due.contains(id))
        .filter_map(|(id, _)| by_id.get(&id).map(|c| (*c).clone()))
        .collect()
}
