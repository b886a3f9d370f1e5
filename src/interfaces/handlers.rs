pub mod action;
pub mod auth;
pub mod blog_posts;
pub mod contact;
pub mod home;
pub mod json_error;
pub mod projects;
pub mod revalidate;
pub mod system;
