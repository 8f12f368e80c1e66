//! Daily quiz selection engine.
//!
//! Once per calendar date: map the weekday to a subject, pick a bounded,
//! topic-diverse set of questions from that subject's eligible pool, and
//! persist the result. All writes happen in one transaction, and only the
//! invocation that creates the date's quiz row runs the selection.

use crate::config::QuizConfig;
use crate::db::Store;
use crate::db::repositories::question::QuestionRepository;
use crate::db::repositories::quiz::QuizRepository;
use crate::db::repositories::subject::SubjectRepository;
use chrono::{DateTime, Datelike, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use sea_orm::{DbErr, TransactionTrait};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The weekday mapped to a subject that does not exist in the store.
    /// Handled inside [`DailyQuizGenerator::generate_at`]: logged, empty
    /// selection returned.
    #[error("Subject '{0}' is not present in the question store")]
    UnknownSubject(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbErr> for GeneratorError {
    fn from(err: DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for GeneratorError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Clone)]
pub struct DailyQuizGenerator {
    store: Store,
    config: QuizConfig,
}

impl DailyQuizGenerator {
    #[must_use]
    pub const fn new(store: Store, config: QuizConfig) -> Self {
        Self { store, config }
    }

    /// Generates (or returns) today's quiz using the ambient clock and OS
    /// randomness. Returns the selected question ids in selection order;
    /// an empty list means nothing was generated.
    pub async fn generate(&self) -> Result<Vec<i32>, GeneratorError> {
        self.generate_at(Utc::now(), &mut rand::rng()).await
    }

    /// Same as [`Self::generate`] with the clock and random source injected,
    /// so callers can fix the date and seed the topic shuffle.
    pub async fn generate_at<R: Rng>(
        &self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Vec<i32>, GeneratorError> {
        match self.try_generate(now, rng).await {
            Ok(selection) => Ok(selection),
            Err(GeneratorError::UnknownSubject(name)) => {
                warn!(
                    "No quiz generated: subject '{}' missing from the question store",
                    name
                );
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn try_generate<R: Rng>(
        &self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Vec<i32>, GeneratorError> {
        let today = now.date_naive();
        let cutoff = now - Duration::days(self.config.cooldown_days);
        let subject_name = self.config.subject_for(today.weekday());

        let txn = self.store.conn.begin().await?;

        let Some(subject) = SubjectRepository::find_by_name_in(&txn, subject_name).await? else {
            return Err(GeneratorError::UnknownSubject(subject_name.to_string()));
        };

        let (quiz, created) = QuizRepository::get_or_create_in(&txn, today).await?;
        if !created {
            // The row predates this invocation (earlier run, or a concurrent
            // winner). Selection must not re-run; hand back what is stored.
            let ids = QuizRepository::question_ids_in(&txn, quiz.id).await?;
            txn.commit().await?;
            info!(
                "Quiz for {} already exists ({} questions)",
                today,
                ids.len()
            );
            return Ok(ids);
        }

        let eligible =
            QuestionRepository::eligible_for_subject_in(&txn, subject.id, cutoff).await?;

        let mut by_topic: HashMap<i32, VecDeque<i32>> = HashMap::new();
        for question in &eligible {
            by_topic
                .entry(question.topic_id)
                .or_default()
                .push_back(question.id);
        }

        // The shuffle is the only randomness that steers selection. Sorting
        // first makes the order a pure function of the rng seed.
        let mut topic_order: Vec<i32> = by_topic.keys().copied().collect();
        topic_order.sort_unstable();
        topic_order.shuffle(rng);

        let selected = select_round_robin(
            &mut by_topic,
            &topic_order,
            self.config.per_topic_cap,
            self.config.questions_per_quiz,
        );

        if selected.is_empty() {
            // Discard the provisional quiz row so an empty run leaves the
            // store untouched.
            txn.rollback().await?;
            info!(
                "No eligible questions for subject '{}'; quiz for {} not generated",
                subject_name, today
            );
            return Ok(Vec::new());
        }

        QuizRepository::set_questions_in(&txn, quiz.id, &selected).await?;
        QuestionRepository::mark_appeared_in(&txn, &selected, now).await?;

        txn.commit().await?;

        info!(
            "Generated quiz for {} ({}): {} questions from a pool of {}",
            today,
            subject_name,
            selected.len(),
            eligible.len()
        );

        Ok(selected)
    }
}

/// Round-robin selection with a per-topic cap: sweep the topic order,
/// popping one question (FIFO) from each topic still under its cap, until
/// `max_total` questions are selected or a full sweep adds none.
///
/// No topic can contribute more than `per_topic_cap` questions, and scarce
/// days still fill the quiz from whichever topics have capacity left.
fn select_round_robin(
    by_topic: &mut HashMap<i32, VecDeque<i32>>,
    topic_order: &[i32],
    per_topic_cap: usize,
    max_total: usize,
) -> Vec<i32> {
    let mut selected = Vec::new();
    let mut taken: HashMap<i32, usize> = HashMap::new();

    loop {
        let mut progressed = false;

        for &topic_id in topic_order {
            if selected.len() >= max_total {
                return selected;
            }

            let taken_count = taken.entry(topic_id).or_insert(0);
            if *taken_count >= per_topic_cap {
                continue;
            }

            if let Some(question_id) = by_topic.get_mut(&topic_id).and_then(VecDeque::pop_front) {
                selected.push(question_id);
                *taken_count += 1;
                progressed = true;
            }
        }

        if !progressed {
            return selected;
        }
    }
}
