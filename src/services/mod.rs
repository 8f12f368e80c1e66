pub mod generator;
pub use generator::{DailyQuizGenerator, GeneratorError};
