pub use super::choices::Entity as Choices;
pub use super::daily_quiz_questions::Entity as DailyQuizQuestions;
pub use super::daily_quizzes::Entity as DailyQuizzes;
pub use super::questions::Entity as Questions;
pub use super::subjects::Entity as Subjects;
pub use super::topics::Entity as Topics;
