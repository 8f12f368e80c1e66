use sea_orm_migration::prelude::*;

/// Covers the eligibility scan: active questions for a topic, filtered on
/// the cooldown timestamp.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_questions_eligibility")
                    .table(Questions::Table)
                    .col(Questions::TopicId)
                    .col(Questions::IsActive)
                    .col(Questions::LastAppeared)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_questions_eligibility")
                    .table(Questions::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    TopicId,
    IsActive,
    LastAppeared,
}
