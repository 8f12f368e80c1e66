use sea_orm::entity::prelude::*;

/// One row per calendar date; the unique index is what collapses
/// concurrent generators to a single winner.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "daily_quizzes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub date: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::daily_quiz_questions::Entity")]
    DailyQuizQuestions,
}

impl Related<super::daily_quiz_questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DailyQuizQuestions.def()
    }
}

impl Related<super::questions::Entity> for Entity {
    fn to() -> RelationDef {
        super::daily_quiz_questions::Relation::Questions.def()
    }
    fn via() -> Option<RelationDef> {
        Some(
            super::daily_quiz_questions::Relation::DailyQuizzes
                .def()
                .rev(),
        )
    }
}

impl ActiveModelBehavior for ActiveModel {}
