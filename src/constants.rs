use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

pub mod collections {
    pub const PROJECTS: &str = "projects";
    pub const BLOG: &str = "blog";
    pub const CONTACT_SUBMISSIONS: &str = "contactSubmissions";
}

pub mod cache_tags {
    pub const PROJECTS: &str = "projects";
    pub const FEATURED_PROJECTS: &str = "featured-projects";
    pub const BLOG: &str = "blog";
    pub const FEATURED_BLOG: &str = "featured-blog";

    pub const ALL: [&str; 4] = [PROJECTS, FEATURED_PROJECTS, BLOG, FEATURED_BLOG];
}

pub const OWNER_NAME: &str = "Dev ND";
pub const OWNER_EMAIL: &str = "iamdevnd@gmail.com";
pub const DEFAULT_BLOG_CATEGORY: &str = "General";
pub const DEFAULT_READ_TIME: u32 = 5;
pub const WORDS_PER_MINUTE: usize = 200;

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";
