pub mod submission_dto;
pub mod survey_dto;
pub mod user_dto;
