pub mod blog_post;
pub mod contact;
pub mod project;
pub mod store_repo;
pub mod token;
