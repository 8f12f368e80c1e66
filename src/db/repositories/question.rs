use crate::entities::{prelude::*, choices, questions, subjects, topics};
use anyhow::Result;
use sea_orm::prelude::DateTimeUtc;
use sea_orm::sea_query::JoinType;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use tracing::info;

/// Repository for question pool operations.
///
/// Owns the eligibility query used by the daily generator and the
/// `last_appeared` bookkeeping that backs the cooldown window.
pub struct QuestionRepository {
    conn: DatabaseConnection,
}

impl QuestionRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(
        &self,
        topic_id: i32,
        text: &str,
        choices: &[(&str, bool)],
    ) -> Result<i32> {
        let txn = self.conn.begin().await?;

        let res = Questions::insert(questions::ActiveModel {
            topic_id: Set(topic_id),
            text: Set(text.to_string()),
            is_active: Set(true),
            last_appeared: Set(None),
            ..Default::default()
        })
        .exec(&txn)
        .await?;
        let question_id = res.last_insert_id;

        for (choice_text, is_correct) in choices {
            Choices::insert(choices::ActiveModel {
                question_id: Set(question_id),
                text: Set((*choice_text).to_string()),
                is_correct: Set(*is_correct),
                ..Default::default()
            })
            .exec(&txn)
            .await?;
        }

        txn.commit().await?;
        Ok(question_id)
    }

    pub async fn get(&self, id: i32) -> Result<Option<questions::Model>> {
        let question = Questions::find_by_id(id).one(&self.conn).await?;
        Ok(question)
    }

    fn eligibility_filter(subject_id: i32, cutoff: DateTimeUtc) -> Condition {
        Condition::all()
            .add(topics::Column::SubjectId.eq(subject_id))
            .add(questions::Column::IsActive.eq(true))
            .add(
                Condition::any()
                    .add(questions::Column::LastAppeared.lt(cutoff))
                    .add(questions::Column::LastAppeared.is_null()),
            )
    }

    pub async fn eligible_for_subject(
        &self,
        subject_id: i32,
        cutoff: DateTimeUtc,
    ) -> Result<Vec<questions::Model>> {
        Self::eligible_for_subject_in(&self.conn, subject_id, cutoff).await
    }

    /// Eligible pool for one subject: active, and either never shown or
    /// last shown before the cooldown cutoff. Relative order is whatever
    /// the store returns; only the topic shuffle is meaningful.
    pub(crate) async fn eligible_for_subject_in<C: ConnectionTrait>(
        conn: &C,
        subject_id: i32,
        cutoff: DateTimeUtc,
    ) -> Result<Vec<questions::Model>> {
        let rows = Questions::find()
            .join(JoinType::InnerJoin, questions::Relation::Topics.def())
            .filter(Self::eligibility_filter(subject_id, cutoff))
            .all(conn)
            .await?;
        Ok(rows)
    }

    pub(crate) async fn mark_appeared_in<C: ConnectionTrait>(
        conn: &C,
        ids: &[i32],
        at: DateTimeUtc,
    ) -> Result<u64> {
        let result = Questions::update_many()
            .set(questions::ActiveModel {
                last_appeared: Set(Some(at)),
                ..Default::default()
            })
            .filter(questions::Column::Id.is_in(ids.to_vec()))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn set_active(&self, id: i32, active: bool) -> Result<()> {
        Questions::update_many()
            .set(questions::ActiveModel {
                is_active: Set(active),
                ..Default::default()
            })
            .filter(questions::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn set_last_appeared(&self, id: i32, at: Option<DateTimeUtc>) -> Result<()> {
        Questions::update_many()
            .set(questions::ActiveModel {
                last_appeared: Set(at),
                ..Default::default()
            })
            .filter(questions::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    /// Clears `last_appeared`, making every touched question immediately
    /// eligible again. Scoped to one subject when a name is given.
    pub async fn reset_cooldown(&self, subject: Option<&str>) -> Result<u64> {
        let mut update = Questions::update_many().set(questions::ActiveModel {
            last_appeared: Set(None),
            ..Default::default()
        });

        if let Some(name) = subject {
            let topic_ids: Vec<i32> = Topics::find()
                .join(JoinType::InnerJoin, topics::Relation::Subjects.def())
                .filter(subjects::Column::Name.eq(name))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect();

            if topic_ids.is_empty() {
                return Ok(0);
            }

            update = update.filter(questions::Column::TopicId.is_in(topic_ids));
        }

        let result = update.exec(&self.conn).await?;
        info!("Reset cooldown for {} questions", result.rows_affected);
        Ok(result.rows_affected)
    }

    pub async fn count_for_subject(&self, subject_id: i32) -> Result<u64> {
        let count = Questions::find()
            .join(JoinType::InnerJoin, questions::Relation::Topics.def())
            .filter(topics::Column::SubjectId.eq(subject_id))
            .count(&self.conn)
            .await?;
        Ok(count)
    }

    pub async fn count_eligible_for_subject(
        &self,
        subject_id: i32,
        cutoff: DateTimeUtc,
    ) -> Result<u64> {
        let count = Questions::find()
            .join(JoinType::InnerJoin, questions::Relation::Topics.def())
            .filter(Self::eligibility_filter(subject_id, cutoff))
            .count(&self.conn)
            .await?;
        Ok(count)
    }
}
