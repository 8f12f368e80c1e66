pub mod prelude;

pub mod choices;
pub mod daily_quiz_questions;
pub mod daily_quizzes;
pub mod questions;
pub mod subjects;
pub mod topics;
