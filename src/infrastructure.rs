pub mod auth;
pub mod cache;
pub mod db;
pub mod mail;
pub mod recaptcha;
pub mod store;
pub mod utils;
