//! End-to-end tests for the daily quiz generation flow.

use chrono::{DateTime, Duration, TimeZone, Utc};
use dailyquiz::config::QuizConfig;
use dailyquiz::db::Store;
use dailyquiz::services::DailyQuizGenerator;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{HashMap, HashSet};

async fn temp_store() -> Store {
    let db_path = std::env::temp_dir().join(format!("dailyquiz-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to create test store")
}

/// 2026-08-02 is a Sunday; the default table maps Sunday to Physics.
fn sunday_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 2, 12, 0, 0).unwrap()
}

/// Seeds one subject with the given (topic, question count) layout and
/// returns the question ids grouped per topic, in insertion order.
async fn seed_subject(store: &Store, subject: &str, topics: &[(&str, usize)]) -> Vec<Vec<i32>> {
    let subject_id = store.get_or_create_subject(subject).await.unwrap();

    let mut per_topic = Vec::new();
    for (topic_name, count) in topics {
        let topic_id = store
            .get_or_create_topic(subject_id, topic_name)
            .await
            .unwrap();

        let mut ids = Vec::new();
        for i in 0..*count {
            let question_id = store
                .add_question(
                    topic_id,
                    &format!("{topic_name} question {i}"),
                    &[("right", true), ("wrong a", false), ("wrong b", false)],
                )
                .await
                .unwrap();
            ids.push(question_id);
        }
        per_topic.push(ids);
    }
    per_topic
}

fn topic_of(per_topic: &[Vec<i32>], question_id: i32) -> usize {
    per_topic
        .iter()
        .position(|ids| ids.contains(&question_id))
        .expect("selected question id was never seeded")
}

#[tokio::test]
async fn sunday_selects_ten_diverse_physics_questions() {
    let store = temp_store().await;
    let per_topic = seed_subject(
        &store,
        "Physics",
        &[("Optics", 3), ("Mechanics", 3), ("Waves", 3), ("Units", 3)],
    )
    .await;

    let generator = DailyQuizGenerator::new(store.clone(), QuizConfig::default());
    let mut rng = StdRng::seed_from_u64(42);
    let selection = generator.generate_at(sunday_noon(), &mut rng).await.unwrap();

    assert_eq!(selection.len(), 10);

    let mut topic_counts: HashMap<usize, usize> = HashMap::new();
    for &id in &selection {
        *topic_counts.entry(topic_of(&per_topic, id)).or_default() += 1;
    }
    assert!(topic_counts.values().all(|&n| n <= 5));
    assert_eq!(topic_counts.values().sum::<usize>(), 10);

    let today = sunday_noon().date_naive();
    assert_eq!(store.daily_quiz_count(today).await.unwrap(), 1);

    let quiz = store.quiz_for_date(today).await.unwrap().unwrap();
    let stored: HashSet<i32> = quiz.questions.iter().map(|q| q.id).collect();
    let selected: HashSet<i32> = selection.iter().copied().collect();
    assert_eq!(stored, selected);
}

#[tokio::test]
async fn only_selected_questions_are_marked_as_shown() {
    let store = temp_store().await;
    let per_topic = seed_subject(
        &store,
        "Physics",
        &[("Optics", 3), ("Mechanics", 3), ("Waves", 3), ("Units", 3)],
    )
    .await;

    let generator = DailyQuizGenerator::new(store.clone(), QuizConfig::default());
    let now = sunday_noon();
    let mut rng = StdRng::seed_from_u64(7);
    let selection = generator.generate_at(now, &mut rng).await.unwrap();

    let selected: HashSet<i32> = selection.iter().copied().collect();
    for ids in &per_topic {
        for &id in ids {
            let question = store.get_question(id).await.unwrap().unwrap();
            if selected.contains(&id) {
                assert_eq!(question.last_appeared, Some(now));
            } else {
                assert_eq!(question.last_appeared, None);
            }
        }
    }
}

#[tokio::test]
async fn scarce_supply_selects_everything_in_round_robin_order() {
    let store = temp_store().await;
    let per_topic = seed_subject(
        &store,
        "Physics",
        &[("Optics", 2), ("Mechanics", 2), ("Waves", 1)],
    )
    .await;

    let generator = DailyQuizGenerator::new(store.clone(), QuizConfig::default());
    let mut rng = StdRng::seed_from_u64(3);
    let selection = generator.generate_at(sunday_noon(), &mut rng).await.unwrap();

    // All five questions fit under the caps, so all five are selected.
    assert_eq!(selection.len(), 5);
    let selected: HashSet<i32> = selection.iter().copied().collect();
    let seeded: HashSet<i32> = per_topic.iter().flatten().copied().collect();
    assert_eq!(selected, seeded);

    // Round robin: the first sweep takes one question from each topic.
    let first_sweep: HashSet<usize> = selection[..3]
        .iter()
        .map(|&id| topic_of(&per_topic, id))
        .collect();
    assert_eq!(first_sweep.len(), 3);

    // FIFO within a topic: a topic's first question precedes its second.
    for ids in &per_topic {
        if let [first, second] = ids[..] {
            let a = selection.iter().position(|&id| id == first).unwrap();
            let b = selection.iter().position(|&id| id == second).unwrap();
            assert!(a < b);
        }
    }
}

#[tokio::test]
async fn same_seed_produces_the_same_selection_order() {
    let layout: &[(&str, usize)] = &[("Optics", 3), ("Mechanics", 3), ("Waves", 2)];

    let store_a = temp_store().await;
    seed_subject(&store_a, "Physics", layout).await;
    let store_b = temp_store().await;
    seed_subject(&store_b, "Physics", layout).await;

    let gen_a = DailyQuizGenerator::new(store_a, QuizConfig::default());
    let gen_b = DailyQuizGenerator::new(store_b, QuizConfig::default());

    let mut rng_a = StdRng::seed_from_u64(99);
    let mut rng_b = StdRng::seed_from_u64(99);

    let selection_a = gen_a.generate_at(sunday_noon(), &mut rng_a).await.unwrap();
    let selection_b = gen_b.generate_at(sunday_noon(), &mut rng_b).await.unwrap();

    assert_eq!(selection_a, selection_b);
}

#[tokio::test]
async fn a_single_topic_is_capped() {
    let store = temp_store().await;
    seed_subject(&store, "Physics", &[("Optics", 8)]).await;

    let generator = DailyQuizGenerator::new(store.clone(), QuizConfig::default());
    let mut rng = StdRng::seed_from_u64(1);
    let selection = generator.generate_at(sunday_noon(), &mut rng).await.unwrap();

    assert_eq!(selection.len(), 5);

    let today = sunday_noon().date_naive();
    let quiz = store.quiz_for_date(today).await.unwrap().unwrap();
    assert_eq!(quiz.questions.len(), 5);
}

#[tokio::test]
async fn cooldown_window_filters_recently_shown_questions() {
    let store = temp_store().await;
    let per_topic = seed_subject(&store, "Physics", &[("Optics", 3)]).await;
    let [recent, old, never] = per_topic[0][..] else {
        panic!("expected three questions");
    };

    let now = sunday_noon();
    store
        .set_last_appeared(recent, Some(now - Duration::days(10)))
        .await
        .unwrap();
    store
        .set_last_appeared(old, Some(now - Duration::days(200)))
        .await
        .unwrap();

    let generator = DailyQuizGenerator::new(store.clone(), QuizConfig::default());
    let mut rng = StdRng::seed_from_u64(5);
    let selection = generator.generate_at(now, &mut rng).await.unwrap();

    let selected: HashSet<i32> = selection.iter().copied().collect();
    assert_eq!(selected, HashSet::from([old, never]));
}

#[tokio::test]
async fn inactive_questions_are_never_selected() {
    let store = temp_store().await;
    let per_topic = seed_subject(&store, "Physics", &[("Optics", 3)]).await;
    let disabled = per_topic[0][0];
    store.set_question_active(disabled, false).await.unwrap();

    let generator = DailyQuizGenerator::new(store.clone(), QuizConfig::default());
    let mut rng = StdRng::seed_from_u64(5);
    let selection = generator.generate_at(sunday_noon(), &mut rng).await.unwrap();

    assert_eq!(selection.len(), 2);
    assert!(!selection.contains(&disabled));
}

#[tokio::test]
async fn unmapped_subject_yields_empty_result_without_writes() {
    let store = temp_store().await;
    // Sunday maps to Physics, which is absent; only Chemistry is seeded.
    let per_topic = seed_subject(&store, "Chemistry", &[("Acids", 3)]).await;

    let generator = DailyQuizGenerator::new(store.clone(), QuizConfig::default());
    let mut rng = StdRng::seed_from_u64(5);
    let selection = generator.generate_at(sunday_noon(), &mut rng).await.unwrap();

    assert!(selection.is_empty());

    let today = sunday_noon().date_naive();
    assert_eq!(store.daily_quiz_count(today).await.unwrap(), 0);

    for &id in &per_topic[0] {
        let question = store.get_question(id).await.unwrap().unwrap();
        assert_eq!(question.last_appeared, None);
    }
}

#[tokio::test]
async fn empty_pool_leaves_the_store_untouched() {
    let store = temp_store().await;
    // Subject exists but has no questions at all.
    store.get_or_create_subject("Physics").await.unwrap();

    let generator = DailyQuizGenerator::new(store.clone(), QuizConfig::default());
    let mut rng = StdRng::seed_from_u64(5);
    let selection = generator.generate_at(sunday_noon(), &mut rng).await.unwrap();

    assert!(selection.is_empty());
    let today = sunday_noon().date_naive();
    assert_eq!(store.daily_quiz_count(today).await.unwrap(), 0);
    assert!(store.quiz_for_date(today).await.unwrap().is_none());
}

#[tokio::test]
async fn reinvocation_on_the_same_date_does_not_rerun_selection() {
    let store = temp_store().await;
    let per_topic = seed_subject(
        &store,
        "Physics",
        &[("Optics", 3), ("Mechanics", 3), ("Waves", 3), ("Units", 3)],
    )
    .await;

    let generator = DailyQuizGenerator::new(store.clone(), QuizConfig::default());
    let now = sunday_noon();

    let mut rng = StdRng::seed_from_u64(11);
    let first = generator.generate_at(now, &mut rng).await.unwrap();

    // A different rng and a later clock must not change anything.
    let mut other_rng = StdRng::seed_from_u64(999);
    let second = generator
        .generate_at(now + Duration::hours(6), &mut other_rng)
        .await
        .unwrap();

    let first_set: HashSet<i32> = first.iter().copied().collect();
    let second_set: HashSet<i32> = second.iter().copied().collect();
    assert_eq!(first_set, second_set);

    assert_eq!(store.daily_quiz_count(now.date_naive()).await.unwrap(), 1);

    // The two questions left out of the first run must stay untouched:
    // the losing invocation performs no writes.
    for ids in &per_topic {
        for &id in ids {
            let question = store.get_question(id).await.unwrap().unwrap();
            if first_set.contains(&id) {
                assert_eq!(question.last_appeared, Some(now));
            } else {
                assert_eq!(question.last_appeared, None);
            }
        }
    }
}

#[tokio::test]
async fn weekday_table_picks_the_subject() {
    let store = temp_store().await;
    seed_subject(&store, "Physics", &[("Optics", 3)]).await;

    let generator = DailyQuizGenerator::new(store.clone(), QuizConfig::default());

    // 2026-08-03 is a Monday and maps to Chemistry, which is absent.
    let monday = Utc.with_ymd_and_hms(2026, 8, 3, 12, 0, 0).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let monday_selection = generator.generate_at(monday, &mut rng).await.unwrap();
    assert!(monday_selection.is_empty());

    let sunday_selection = generator
        .generate_at(sunday_noon(), &mut rng)
        .await
        .unwrap();
    assert_eq!(sunday_selection.len(), 3);
}

#[tokio::test]
async fn custom_limits_are_honored() {
    let store = temp_store().await;
    let per_topic = seed_subject(&store, "Physics", &[("Optics", 5), ("Mechanics", 5)]).await;

    let config = QuizConfig {
        questions_per_quiz: 4,
        per_topic_cap: 2,
        ..QuizConfig::default()
    };
    let generator = DailyQuizGenerator::new(store.clone(), config);

    let mut rng = StdRng::seed_from_u64(21);
    let selection = generator.generate_at(sunday_noon(), &mut rng).await.unwrap();

    assert_eq!(selection.len(), 4);
    for ids in &per_topic {
        let from_topic = selection.iter().filter(|id| ids.contains(id)).count();
        assert_eq!(from_topic, 2);
    }
}

#[tokio::test]
async fn reset_cooldown_restores_eligibility() {
    let store = temp_store().await;
    let per_topic = seed_subject(&store, "Physics", &[("Optics", 3)]).await;

    let generator = DailyQuizGenerator::new(store.clone(), QuizConfig::default());
    let mut rng = StdRng::seed_from_u64(13);
    let selection = generator.generate_at(sunday_noon(), &mut rng).await.unwrap();
    assert_eq!(selection.len(), 3);

    // Scoped to an unknown subject: nothing to touch.
    assert_eq!(store.reset_cooldown(Some("Chemistry")).await.unwrap(), 0);

    let cleared = store.reset_cooldown(Some("Physics")).await.unwrap();
    assert_eq!(cleared, 3);

    for &id in &per_topic[0] {
        let question = store.get_question(id).await.unwrap().unwrap();
        assert_eq!(question.last_appeared, None);
    }
}
