pub mod response_validator;
pub mod scoring_service;
pub mod submission_service;
pub mod survey_service;
pub mod user_service;
