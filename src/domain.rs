pub mod entities;
pub mod ranking;
pub mod use_cases;
