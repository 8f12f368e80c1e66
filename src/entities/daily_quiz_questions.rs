use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "daily_quiz_questions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub quiz_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub question_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::daily_quizzes::Entity",
        from = "Column::QuizId",
        to = "super::daily_quizzes::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    DailyQuizzes,
    #[sea_orm(
        belongs_to = "super::questions::Entity",
        from = "Column::QuestionId",
        to = "super::questions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Questions,
}

impl Related<super::daily_quizzes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DailyQuizzes.def()
    }
}

impl Related<super::questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
