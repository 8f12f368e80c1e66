use crate::entities::{questions, subjects};
use anyhow::Result;
use sea_orm::prelude::DateTimeUtc;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::quiz::{DailyQuizView, QuizQuestionView};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn subject_repo(&self) -> repositories::subject::SubjectRepository {
        repositories::subject::SubjectRepository::new(self.conn.clone())
    }

    fn question_repo(&self) -> repositories::question::QuestionRepository {
        repositories::question::QuestionRepository::new(self.conn.clone())
    }

    fn quiz_repo(&self) -> repositories::quiz::QuizRepository {
        repositories::quiz::QuizRepository::new(self.conn.clone())
    }

    pub async fn find_subject(&self, name: &str) -> Result<Option<subjects::Model>> {
        self.subject_repo().find_by_name(name).await
    }

    pub async fn list_subjects(&self) -> Result<Vec<subjects::Model>> {
        self.subject_repo().list().await
    }

    pub async fn get_or_create_subject(&self, name: &str) -> Result<i32> {
        self.subject_repo().get_or_create(name).await
    }

    pub async fn get_or_create_topic(&self, subject_id: i32, name: &str) -> Result<i32> {
        self.subject_repo().get_or_create_topic(subject_id, name).await
    }

    pub async fn add_question(
        &self,
        topic_id: i32,
        text: &str,
        choices: &[(&str, bool)],
    ) -> Result<i32> {
        self.question_repo().add(topic_id, text, choices).await
    }

    pub async fn get_question(&self, id: i32) -> Result<Option<questions::Model>> {
        self.question_repo().get(id).await
    }

    pub async fn eligible_questions(
        &self,
        subject_id: i32,
        cutoff: DateTimeUtc,
    ) -> Result<Vec<questions::Model>> {
        self.question_repo()
            .eligible_for_subject(subject_id, cutoff)
            .await
    }

    pub async fn set_question_active(&self, id: i32, active: bool) -> Result<()> {
        self.question_repo().set_active(id, active).await
    }

    pub async fn set_last_appeared(&self, id: i32, at: Option<DateTimeUtc>) -> Result<()> {
        self.question_repo().set_last_appeared(id, at).await
    }

    pub async fn reset_cooldown(&self, subject: Option<&str>) -> Result<u64> {
        self.question_repo().reset_cooldown(subject).await
    }

    pub async fn question_count_for_subject(&self, subject_id: i32) -> Result<u64> {
        self.question_repo().count_for_subject(subject_id).await
    }

    pub async fn eligible_count_for_subject(
        &self,
        subject_id: i32,
        cutoff: DateTimeUtc,
    ) -> Result<u64> {
        self.question_repo()
            .count_eligible_for_subject(subject_id, cutoff)
            .await
    }

    pub async fn quiz_for_date(&self, date: chrono::NaiveDate) -> Result<Option<DailyQuizView>> {
        self.quiz_repo().get_for_date(date).await
    }

    pub async fn daily_quiz_count(&self, date: chrono::NaiveDate) -> Result<u64> {
        self.quiz_repo().count_for_date(date).await
    }
}
