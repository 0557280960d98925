use cardcade_core::{
    due_cards, failure_counts, rank_failure_candidates, sort_by_priority, Card, CardState,
    Rating, ReviewLog, SchedulingPatch, BOSS_CANDIDATE_LIMIT,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn scheduled(front: &str, next: Option<DateTime<Utc>>) -> Card {
    let mut c = Card::new(front, "-");
    c.state = CardState::Review;
    c.stability = 3.0;
    c.difficulty = 5.0;
    c.reps = 2;
    c.last_review_at = Some(t0() - Duration::days(10));
    c.next_review_at = next;
    c
}

fn log(card: &Card, rating: Rating) -> ReviewLog {
    let patch = SchedulingPatch {
        state: CardState::Review,
        stability: 1.0,
        difficulty: 5.0,
        reps: 1,
        lapses: 0,
        elapsed_days: 0,
        scheduled_days: 1,
        last_review_at: t0() - Duration::days(20),
        next_review_at: t0() - Duration::days(19),
    };
    ReviewLog::new(card.id, rating, &patch)
}

fn ids(cards: &[Card]) -> Vec<String> {
    cards.iter().map(|c| c.front.clone()).collect()
}

#[test]
fn new_cards_are_always_due() {
    let now = t0();
    let mut fresh = Card::new("fresh", "-");
    fresh.next_review_at = Some(now + Duration::days(300));

    let due = due_cards(&[fresh], now);
    assert_eq!(ids(&due), vec!["fresh"]);
}

#[test]
fn due_set_uses_next_review() {
    let now = t0();
    let cards = vec![
        scheduled("past", Some(now - Duration::days(2))),
        scheduled("exact", Some(now)),
        scheduled("future", Some(now + Duration::seconds(1))),
        scheduled("undated", None),
    ];
    let mut due = ids(&due_cards(&cards, now));
    due.sort();
    assert_eq!(due, vec!["exact", "past", "undated"]);
}

#[test]
fn new_card_sorts_before_overdue() {
    let now = t0();
    let cards = vec![
        scheduled("ancient", Some(now - Duration::days(3000))),
        Card::new("fresh", "-"),
    ];
    let sorted = sort_by_priority(&cards, now);
    assert_eq!(ids(&sorted), vec!["fresh", "ancient"]);
}

#[test]
fn more_overdue_sorts_first() {
    let now = t0();
    let cards = vec![
        scheduled("one", Some(now - Duration::days(1))),
        scheduled("soon", Some(now + Duration::days(2))),
        scheduled("nine", Some(now - Duration::days(9))),
        scheduled("undated", None),
    ];
    let sorted = sort_by_priority(&cards, now);
    assert_eq!(ids(&sorted), vec!["undated", "nine", "one", "soon"]);
}

#[test]
fn priority_ties_break_by_id() {
    let now = t0();
    let a = scheduled("a", None);
    let b = scheduled("b", None);
    let forward = sort_by_priority(&[a.clone(), b.clone()], now);
    let backward = sort_by_priority(&[b, a], now);
    assert_eq!(ids(&forward), ids(&backward));
    assert!(forward[0].id < forward[1].id);
}

#[test]
fn failure_counts_only_again() {
    let a = scheduled("a", None);
    let logs = vec![
        log(&a, Rating::Again),
        log(&a, Rating::Good),
        log(&a, Rating::Again),
        log(&a, Rating::Hard),
    ];
    let counts = failure_counts(&logs);
    assert_eq!(counts.get(&a.id), Some(&2));
    assert_eq!(counts.len(), 1);
}

#[test]
fn most_failed_ranks_first() {
    let now = t0();
    let mut cards: Vec<Card> = (0..10)
        .map(|i| scheduled(&format!("c{i}"), Some(now - Duration::days(1))))
        .collect();
    cards[0].front = "A".into();
    cards[1].front = "B".into();

    let mut logs = Vec::new();
    for _ in 0..5 {
        logs.push(log(&cards[0], Rating::Again));
    }
    logs.push(log(&cards[1], Rating::Good));
    for _ in 0..2 {
        logs.push(log(&cards[2], Rating::Again));
    }

    let ranked = rank_failure_candidates(&logs, &cards, now, BOSS_CANDIDATE_LIMIT);
    assert_eq!(ids(&ranked), vec!["A", "c2"]);
    assert!(!ranked.iter().any(|c| c.front == "B"));
}

#[test]
fn candidates_must_be_due() {
    let now = t0();
    let due = scheduled("due", Some(now - Duration::days(1)));
    let waiting = scheduled("waiting", Some(now + Duration::days(4)));
    let logs = vec![
        log(&waiting, Rating::Again),
        log(&waiting, Rating::Again),
        log(&due, Rating::Again),
    ];
    let ranked = rank_failure_candidates(&logs, &[due, waiting], now, BOSS_CANDIDATE_LIMIT);
    assert_eq!(ids(&ranked), vec!["due"]);
}

#[test]
fn candidate_limit_applies_before_due_filter() {
    let now = t0();
    let waiting = scheduled("waiting", Some(now + Duration::days(4)));
    let due = scheduled("due", Some(now - Duration::days(1)));
    let logs = vec![
        log(&waiting, Rating::Again),
        log(&waiting, Rating::Again),
        log(&due, Rating::Again),
    ];
    let ranked = rank_failure_candidates(&logs, &[due, waiting], now, 1);
    assert!(ranked.is_empty());
}

#[test]
fn logs_for_unknown_cards_are_ignored() {
    let now = t0();
    let gone = scheduled("gone", None);
    let kept = scheduled("kept", None);
    let logs = vec![log(&gone, Rating::Again), log(&kept, Rating::Again)];
    let ranked = rank_failure_candidates(&logs, &[kept], now, BOSS_CANDIDATE_LIMIT);
    assert_eq!(ids(&ranked), vec!["kept"]);
}
