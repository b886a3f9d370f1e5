use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use slug::slugify;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    constants::{collections, DEFAULT_BLOG_CATEGORY, DEFAULT_READ_TIME, OWNER_EMAIL, OWNER_NAME},
    entities::{
        option_fields::{write_if_some, OptionField},
        validation::{new_validation_error, non_empty, validate_image_urls, validate_slug, validate_url},
    },
    errors::DecodeError,
    infrastructure::{
        store::{timestamp::iso_millis, Document, DocumentData, StoreTimestamp},
        utils::markdown::{estimate_read_time, table_of_contents},
    },
};

// ───── Constants ──────────────────────────────────────────────────────
const MIN_TITLE_LENGTH: u64 = 3;
const MAX_TITLE_LENGTH: u64 = 120;
const MIN_SLUG_LENGTH: u64 = 3;
const MAX_SLUG_LENGTH: u64 = 80;
const MIN_EXCERPT_LENGTH: u64 = 10;
const MAX_EXCERPT_LENGTH: u64 = 300;
const MAX_TAGS: usize = 10;
const MAX_TAG_LENGTH: usize = 30;
const MAX_READ_TIME: u32 = 120;
const MAX_META_TITLE_LENGTH: u64 = 60;
const MAX_META_DESCRIPTION_LENGTH: u64 = 160;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Author {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Default for Author {
    fn default() -> Self {
        Author {
            name: OWNER_NAME.to_string(),
            email: OWNER_EMAIL.to_string(),
            avatar: None,
        }
    }
}

impl From<Author> for Value {
    fn from(author: Author) -> Self {
        let mut obj = json!({ "name": author.name, "email": author.email });
        if let Some(avatar) = author.avatar {
            obj["avatar"] = Value::from(avatar);
        }
        obj
    }
}

/// One heading of a post, used for the in-page navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocEntry {
    pub id: String,
    pub text: String,
    pub level: u8,
}

impl From<TocEntry> for Value {
    fn from(entry: TocEntry) -> Self {
        json!({ "id": entry.id, "text": entry.text, "level": entry.level })
    }
}

// ───── Read model ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author: Author,
    pub category: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    pub images: Vec<String>,
    pub published: bool,
    pub featured: bool,
    pub views: u64,
    pub likes: u64,
    pub read_time: u32,
    pub table_of_contents: Vec<TocEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_order: Option<u32>,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(serialize_with = "iso_millis::option::serialize", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BlogPostDocument {
    slug: String,
    title: String,
    excerpt: String,
    content: String,
    author: Option<Author>,
    category: Option<String>,
    tags: Vec<String>,
    featured_image: Option<String>,
    images: Vec<String>,
    published: bool,
    featured: bool,
    views: u64,
    likes: u64,
    read_time: Option<u32>,
    table_of_contents: Vec<TocEntry>,
    series: Option<String>,
    series_order: Option<u32>,
    created_at: Option<StoreTimestamp>,
    updated_at: Option<StoreTimestamp>,
    published_at: Option<StoreTimestamp>,
    meta_title: Option<String>,
    meta_description: Option<String>,
}

impl BlogPost {
    pub fn from_document(doc: Document) -> Result<Self, DecodeError> {
        let Document { id, data } = doc;
        let fail = |reason: String| DecodeError {
            collection: collections::BLOG,
            id: id.clone(),
            reason,
        };

        let raw: BlogPostDocument =
            serde_json::from_value(Value::Object(data)).map_err(|e| fail(e.to_string()))?;
        let created_at = raw
            .created_at
            .ok_or_else(|| fail("missing createdAt".into()))?
            .to_datetime()
            .ok_or_else(|| fail("createdAt out of range".into()))?;
        let updated_at = raw
            .updated_at
            .ok_or_else(|| fail("missing updatedAt".into()))?
            .to_datetime()
            .ok_or_else(|| fail("updatedAt out of range".into()))?;
        let published_at = raw
            .published_at
            .map(|ts| ts.to_datetime().ok_or_else(|| fail("publishedAt out of range".into())))
            .transpose()?;

        Ok(BlogPost {
            id,
            slug: raw.slug,
            title: raw.title,
            excerpt: raw.excerpt,
            content: raw.content,
            author: raw.author.unwrap_or_default(),
            category: raw
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_BLOG_CATEGORY.to_string()),
            tags: raw.tags,
            featured_image: raw.featured_image,
            images: raw.images,
            published: raw.published,
            featured: raw.featured,
            views: raw.views,
            likes: raw.likes,
            read_time: raw.read_time.filter(|t| *t > 0).unwrap_or(DEFAULT_READ_TIME),
            table_of_contents: raw.table_of_contents,
            series: raw.series,
            series_order: raw.series_order,
            created_at,
            updated_at,
            published_at,
            meta_title: raw.meta_title,
            meta_description: raw.meta_description,
        })
    }
}

// ───── Input & Validation Requests ──────────────────────────────────

fn default_category() -> String {
    DEFAULT_BLOG_CATEGORY.to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBlogPostRequest {
    #[validate(
        length(min = MIN_TITLE_LENGTH, max = MAX_TITLE_LENGTH),
        custom(function = "validate_title")
    )]
    pub title: String,

    /// Derived from the title when omitted.
    #[validate(
        length(min = MIN_SLUG_LENGTH, max = MAX_SLUG_LENGTH),
        custom(function = "validate_slug")
    )]
    pub slug: Option<String>,

    #[validate(length(min = MIN_EXCERPT_LENGTH, max = MAX_EXCERPT_LENGTH))]
    pub excerpt: String,

    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: String,

    #[validate(nested)]
    pub author: Option<Author>,

    #[serde(default = "default_category")]
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,

    #[validate(custom(function = "validate_url"))]
    pub featured_image: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_image_urls"))]
    pub images: Vec<String>,

    #[serde(default)]
    pub published: bool,

    #[serde(default)]
    pub featured: bool,

    /// Estimated from the content when omitted.
    #[validate(range(min = 1, max = MAX_READ_TIME))]
    pub read_time: Option<u32>,

    /// Built from the content's headings when omitted.
    pub table_of_contents: Option<Vec<TocEntry>>,

    pub series: Option<String>,

    pub series_order: Option<u32>,

    #[validate(length(max = MAX_META_TITLE_LENGTH))]
    pub meta_title: Option<String>,

    #[validate(length(max = MAX_META_DESCRIPTION_LENGTH))]
    pub meta_description: Option<String>,
}

/// Persisted form of a new post.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostInsert {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author: Author,
    pub category: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    pub images: Vec<String>,
    pub published: bool,
    pub featured: bool,
    pub views: u64,
    pub likes: u64,
    pub read_time: u32,
    pub table_of_contents: Vec<TocEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_order: Option<u32>,
    pub created_at: StoreTimestamp,
    pub updated_at: StoreTimestamp,
    pub published_at: Option<StoreTimestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
}

impl NewBlogPostRequest {
    pub fn resolved_slug(&self) -> String {
        match self.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => slugify(&self.title),
        }
    }

    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        if self.slug.is_none() && self.resolved_slug().len() < MIN_SLUG_LENGTH as usize {
            errors.add(
                "slug",
                new_validation_error("slug_too_short", "Generated slug is too short; please provide a custom slug"),
            );
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Counters start at zero; `publishedAt` is stamped only for posts
    /// created as published.
    pub fn into_insert(self, now: StoreTimestamp) -> BlogPostInsert {
        let slug = self.resolved_slug();
        let read_time = self.read_time.unwrap_or_else(|| estimate_read_time(&self.content));
        let table_of_contents = self
            .table_of_contents
            .unwrap_or_else(|| table_of_contents(&self.content));

        BlogPostInsert {
            slug,
            title: self.title,
            excerpt: self.excerpt,
            content: self.content,
            author: self.author.unwrap_or_default(),
            category: self.category,
            tags: self.tags,
            featured_image: non_empty(self.featured_image),
            images: self.images,
            published: self.published,
            featured: self.featured,
            views: 0,
            likes: 0,
            read_time,
            table_of_contents,
            series: non_empty(self.series),
            series_order: self.series_order,
            created_at: now,
            updated_at: now,
            published_at: self.published.then_some(now),
            meta_title: non_empty(self.meta_title),
            meta_description: non_empty(self.meta_description),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateBlogPostRequest {
    #[validate(
        length(min = MIN_TITLE_LENGTH, max = MAX_TITLE_LENGTH),
        custom(function = "validate_title")
    )]
    pub title: Option<String>,

    #[validate(
        length(min = MIN_SLUG_LENGTH, max = MAX_SLUG_LENGTH),
        custom(function = "validate_slug")
    )]
    pub slug: Option<String>,

    #[validate(length(min = MIN_EXCERPT_LENGTH, max = MAX_EXCERPT_LENGTH))]
    pub excerpt: Option<String>,

    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: Option<String>,

    #[validate(nested)]
    pub author: Option<Author>,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: Option<String>,

    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,

    #[validate(custom(function = "validate_optional_url_field"))]
    pub featured_image: OptionField<String>,

    #[validate(custom(function = "validate_image_urls"))]
    pub images: Option<Vec<String>>,

    pub published: Option<bool>,

    pub featured: Option<bool>,

    #[validate(range(min = 1, max = MAX_READ_TIME))]
    pub read_time: Option<u32>,

    pub table_of_contents: Option<Vec<TocEntry>>,

    pub series: OptionField<String>,

    pub series_order: OptionField<u32>,

    #[validate(length(max = MAX_META_TITLE_LENGTH))]
    pub meta_title: OptionField<String>,

    #[validate(length(max = MAX_META_DESCRIPTION_LENGTH))]
    pub meta_description: OptionField<String>,
}

impl UpdateBlogPostRequest {
    /// Store patch for this edit. A content change re-derives the read
    /// time and table of contents unless they were supplied too.
    /// `publishedAt` is left to the caller, which knows the stored state.
    pub fn into_patch(self, now: StoreTimestamp) -> DocumentData {
        let mut patch = DocumentData::new();

        if let Some(content) = &self.content {
            if self.read_time.is_none() {
                patch.insert("readTime".into(), estimate_read_time(content).into());
            }
            if self.table_of_contents.is_none() {
                patch.insert("tableOfContents".into(), table_of_contents(content).into());
            }
        }

        write_if_some(self.title, &mut patch, "title");
        write_if_some(self.slug, &mut patch, "slug");
        write_if_some(self.excerpt, &mut patch, "excerpt");
        write_if_some(self.content, &mut patch, "content");
        write_if_some(self.author, &mut patch, "author");
        write_if_some(self.category, &mut patch, "category");
        write_if_some(self.tags, &mut patch, "tags");
        self.featured_image.write_to(&mut patch, "featuredImage");
        write_if_some(self.images, &mut patch, "images");
        write_if_some(self.published, &mut patch, "published");
        write_if_some(self.featured, &mut patch, "featured");
        write_if_some(self.read_time, &mut patch, "readTime");
        write_if_some(self.table_of_contents, &mut patch, "tableOfContents");
        self.series.write_to(&mut patch, "series");
        self.series_order.write_to(&mut patch, "seriesOrder");
        self.meta_title.write_to(&mut patch, "metaTitle");
        self.meta_description.write_to(&mut patch, "metaDescription");
        patch.insert("updatedAt".into(), now.into());

        patch
    }
}

// ───── Validation Helpers ───────────────────────────────────────────

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().len() != title.len() {
        return Err(new_validation_error("title_whitespace", "Title must not have leading or trailing whitespace"));
    }
    Ok(())
}

pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(new_validation_error("too_many_tags", "A post can have at most 10 tags"));
    }
    for tag in tags {
        let len = tag.chars().count();
        if len == 0 || len > MAX_TAG_LENGTH {
            return Err(new_validation_error("invalid_tag_length", "Tags must be 1 to 30 characters long"));
        }
    }
    Ok(())
}

pub fn validate_optional_url_field(value: &OptionField<String>) -> Result<(), ValidationError> {
    if let OptionField::SetToValue(url) = value {
        validate_url(url)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(value: Value) -> Document {
        Document {
            id: "b1".into(),
            data: value.as_object().cloned().unwrap(),
        }
    }

    fn new_request(published: bool) -> NewBlogPostRequest {
        serde_json::from_value(json!({
            "title": "Caching by tag",
            "excerpt": "How tag invalidation keeps reads fresh.",
            "content": "# Caching\n\nSome words here.\n\n## Tags\n\nMore words.",
            "tags": ["rust", "cache"],
            "published": published
        }))
        .unwrap()
    }

    #[test]
    fn decodes_with_blog_defaults() {
        let post = BlogPost::from_document(stored(json!({
            "title": "Hello",
            "category": "",
            "createdAt": {"_seconds": 1, "_nanoseconds": 0},
            "updatedAt": {"_seconds": 2, "_nanoseconds": 0}
        })))
        .unwrap();

        assert_eq!(post.author.name, "Dev ND");
        assert_eq!(post.category, "General");
        assert_eq!(post.read_time, 5);
        assert_eq!(post.views, 0);
        assert!(post.published_at.is_none());
        assert!(post.table_of_contents.is_empty());
    }

    #[test]
    fn out_of_range_timestamps_fail_decoding() {
        let err = BlogPost::from_document(stored(json!({
            "createdAt": {"_seconds": 1, "_nanoseconds": 0},
            "updatedAt": {"_seconds": i64::MAX, "_nanoseconds": 0}
        })))
        .unwrap_err();
        assert!(err.reason.contains("updatedAt"));

        let err = BlogPost::from_document(stored(json!({
            "published": true,
            "createdAt": {"_seconds": 1, "_nanoseconds": 0},
            "updatedAt": {"_seconds": 1, "_nanoseconds": 0},
            "publishedAt": {"_seconds": i64::MIN, "_nanoseconds": 0}
        })))
        .unwrap_err();
        assert_eq!(err.collection, "blog");
        assert!(err.reason.contains("publishedAt"));
    }

    #[test]
    fn serialized_post_omits_unset_published_at() {
        let post = BlogPost::from_document(stored(json!({
            "createdAt": {"_seconds": 1, "_nanoseconds": 0},
            "updatedAt": {"_seconds": 1, "_nanoseconds": 0}
        })))
        .unwrap();
        let json = serde_json::to_value(&post).unwrap();

        assert!(json.get("publishedAt").is_none());
        assert_eq!(json["readTime"], 5);
        assert_eq!(json["createdAt"], "1970-01-01T00:00:01.000Z");
    }

    #[test]
    fn new_published_post_gets_counters_toc_and_publish_stamp() {
        let now = StoreTimestamp { seconds: 500, nanos: 0 };
        let insert = new_request(true).into_insert(now);

        assert_eq!(insert.slug, "caching-by-tag");
        assert_eq!(insert.views, 0);
        assert_eq!(insert.likes, 0);
        assert_eq!(insert.read_time, 1);
        assert_eq!(insert.published_at, Some(now));
        assert_eq!(insert.table_of_contents.len(), 2);
        assert_eq!(insert.category, "General");
    }

    #[test]
    fn drafts_have_no_publish_stamp() {
        let insert = new_request(false).into_insert(StoreTimestamp { seconds: 1, nanos: 0 });
        assert!(insert.published_at.is_none());
    }

    #[test]
    fn rejects_too_many_or_too_long_tags() {
        let mut request = new_request(true);
        request.tags = (0..11).map(|i| format!("t{i}")).collect();
        assert!(request.check().is_err());

        request.tags = vec!["x".repeat(31)];
        assert!(request.check().is_err());
    }

    #[test]
    fn content_update_re_derives_read_time_and_toc() {
        let request: UpdateBlogPostRequest = serde_json::from_value(json!({
            "content": "## Only heading\n\nbody"
        }))
        .unwrap();

        let patch = request.into_patch(StoreTimestamp { seconds: 3, nanos: 0 });
        assert_eq!(patch["readTime"], json!(1));
        assert_eq!(patch["tableOfContents"][0]["id"], json!("only-heading"));
        assert!(!patch.contains_key("publishedAt"));
    }

    #[test]
    fn explicit_read_time_wins_over_estimate() {
        let request: UpdateBlogPostRequest = serde_json::from_value(json!({
            "content": "short",
            "readTime": 12
        }))
        .unwrap();

        let patch = request.into_patch(StoreTimestamp { seconds: 3, nanos: 0 });
        assert_eq!(patch["readTime"], json!(12));
    }
}
