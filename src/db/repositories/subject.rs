use crate::entities::{prelude::*, subjects, topics};
use anyhow::Result;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

/// Repository for subject and topic lookup/creation.
///
/// Subjects and topics are normally populated by import tooling; the
/// creation paths here exist for seeding and operational fixes.
pub struct SubjectRepository {
    conn: DatabaseConnection,
}

impl SubjectRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<subjects::Model>> {
        Self::find_by_name_in(&self.conn, name).await
    }

    pub(crate) async fn find_by_name_in<C: ConnectionTrait>(
        conn: &C,
        name: &str,
    ) -> Result<Option<subjects::Model>> {
        let subject = Subjects::find()
            .filter(subjects::Column::Name.eq(name))
            .one(conn)
            .await?;
        Ok(subject)
    }

    pub async fn list(&self) -> Result<Vec<subjects::Model>> {
        let rows = Subjects::find()
            .order_by_asc(subjects::Column::Name)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn get_or_create(&self, name: &str) -> Result<i32> {
        if let Some(existing) = self.find_by_name(name).await? {
            return Ok(existing.id);
        }

        let res = Subjects::insert(subjects::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        })
        .exec(&self.conn)
        .await?;

        info!("Created subject '{}'", name);
        Ok(res.last_insert_id)
    }

    pub async fn get_or_create_topic(&self, subject_id: i32, name: &str) -> Result<i32> {
        let existing = Topics::find()
            .filter(topics::Column::SubjectId.eq(subject_id))
            .filter(topics::Column::Name.eq(name))
            .one(&self.conn)
            .await?;

        if let Some(topic) = existing {
            return Ok(topic.id);
        }

        let res = Topics::insert(topics::ActiveModel {
            name: Set(name.to_string()),
            subject_id: Set(subject_id),
            ..Default::default()
        })
        .exec(&self.conn)
        .await?;

        Ok(res.last_insert_id)
    }
}
