pub mod actor;
pub mod question;
