pub mod question;
pub mod score;
pub mod survey;
pub mod survey_response;
pub mod user;
