use crate::entities::{prelude::*, choices, daily_quiz_questions, daily_quizzes, questions, topics};
use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;

/// Repository for the one-row-per-date quiz store.
pub struct QuizRepository {
    conn: DatabaseConnection,
}

impl QuizRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Fetches or inserts the quiz row for `date`. The boolean is true only
    /// for the invocation that inserted the row; the unique index on the
    /// date column collapses concurrent creators to a single winner.
    pub(crate) async fn get_or_create_in<C: ConnectionTrait>(
        conn: &C,
        date: chrono::NaiveDate,
    ) -> Result<(daily_quizzes::Model, bool)> {
        if let Some(existing) = Self::find_by_date_in(conn, date).await? {
            return Ok((existing, false));
        }

        let insert = DailyQuizzes::insert(daily_quizzes::ActiveModel {
            date: Set(date),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(daily_quizzes::Column::Date)
                .do_nothing()
                .to_owned(),
        )
        .exec(conn)
        .await;

        match insert {
            Ok(res) => {
                let quiz = DailyQuizzes::find_by_id(res.last_insert_id)
                    .one(conn)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("Quiz row for {} vanished after insert", date))?;
                Ok((quiz, true))
            }
            // Lost the insert race: another writer owns the row.
            Err(DbErr::RecordNotInserted) => {
                let quiz = Self::find_by_date_in(conn, date).await?.ok_or_else(|| {
                    anyhow::anyhow!("Quiz row for {} neither inserted nor found", date)
                })?;
                Ok((quiz, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_date_in<C: ConnectionTrait>(
        conn: &C,
        date: chrono::NaiveDate,
    ) -> Result<Option<daily_quizzes::Model>> {
        let quiz = DailyQuizzes::find()
            .filter(daily_quizzes::Column::Date.eq(date))
            .one(conn)
            .await?;
        Ok(quiz)
    }

    pub(crate) async fn set_questions_in<C: ConnectionTrait>(
        conn: &C,
        quiz_id: i32,
        question_ids: &[i32],
    ) -> Result<()> {
        let rows = question_ids.iter().map(|&id| daily_quiz_questions::ActiveModel {
            quiz_id: Set(quiz_id),
            question_id: Set(id),
        });

        DailyQuizQuestions::insert_many(rows).exec(conn).await?;
        Ok(())
    }

    pub(crate) async fn question_ids_in<C: ConnectionTrait>(
        conn: &C,
        quiz_id: i32,
    ) -> Result<Vec<i32>> {
        let rows = DailyQuizQuestions::find()
            .filter(daily_quiz_questions::Column::QuizId.eq(quiz_id))
            .order_by_asc(daily_quiz_questions::Column::QuestionId)
            .all(conn)
            .await?;
        Ok(rows.into_iter().map(|r| r.question_id).collect())
    }

    pub async fn count_for_date(&self, date: chrono::NaiveDate) -> Result<u64> {
        let count = DailyQuizzes::find()
            .filter(daily_quizzes::Column::Date.eq(date))
            .count(&self.conn)
            .await?;
        Ok(count)
    }

    /// Today's quiz hydrated for display: question text, topic name and
    /// choice count per question. None if no quiz exists for the date.
    pub async fn get_for_date(&self, date: chrono::NaiveDate) -> Result<Option<DailyQuizView>> {
        let Some(quiz) = Self::find_by_date_in(&self.conn, date).await? else {
            return Ok(None);
        };

        let question_rows: Vec<questions::Model> =
            quiz.find_related(Questions).all(&self.conn).await?;

        let topic_ids: Vec<i32> = question_rows.iter().map(|q| q.topic_id).collect();
        let topic_names: HashMap<i32, String> = Topics::find()
            .filter(topics::Column::Id.is_in(topic_ids))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        let question_ids: Vec<i32> = question_rows.iter().map(|q| q.id).collect();
        let mut choice_counts: HashMap<i32, usize> = HashMap::new();
        for choice in Choices::find()
            .filter(choices::Column::QuestionId.is_in(question_ids))
            .all(&self.conn)
            .await?
        {
            *choice_counts.entry(choice.question_id).or_default() += 1;
        }

        let question_views = question_rows
            .into_iter()
            .map(|q| QuizQuestionView {
                topic: topic_names.get(&q.topic_id).cloned().unwrap_or_default(),
                choice_count: choice_counts.get(&q.id).copied().unwrap_or(0),
                id: q.id,
                text: q.text,
            })
            .collect();

        Ok(Some(DailyQuizView {
            date: quiz.date,
            questions: question_views,
        }))
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct DailyQuizView {
    pub date: chrono::NaiveDate,
    pub questions: Vec<QuizQuestionView>,
}

#[derive(Debug, Clone)]
pub struct QuizQuestionView {
    pub id: i32,
    pub text: String,
    pub topic: String,
    pub choice_count: usize,
}
