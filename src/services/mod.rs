pub mod ordering;
pub mod question_service;
pub mod question_validator;
pub mod stats;
pub mod test_service;
