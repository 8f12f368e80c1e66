use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub topic_id: i32,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub is_active: bool,
    /// Null until the question first appears in a daily quiz.
    pub last_appeared: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::topics::Entity",
        from = "Column::TopicId",
        to = "super::topics::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Topics,
    #[sea_orm(has_many = "super::choices::Entity")]
    Choices,
    #[sea_orm(has_many = "super::daily_quiz_questions::Entity")]
    DailyQuizQuestions,
}

impl Related<super::topics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topics.def()
    }
}

impl Related<super::choices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Choices.def()
    }
}

impl Related<super::daily_quizzes::Entity> for Entity {
    fn to() -> RelationDef {
        super::daily_quiz_questions::Relation::DailyQuizzes.def()
    }
    fn via() -> Option<RelationDef> {
        Some(
            super::daily_quiz_questions::Relation::Questions
                .def()
                .rev(),
        )
    }
}

impl ActiveModelBehavior for ActiveModel {}
