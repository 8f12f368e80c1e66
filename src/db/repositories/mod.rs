pub mod question;
pub mod quiz;
pub mod subject;
