use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use slug::slugify;
use validator::{Validate, ValidationErrors};

use crate::{
    constants::collections,
    entities::{
        option_fields::{write_if_some, OptionField},
        validation::{
            new_validation_error, non_empty, validate_image_urls, validate_link_field,
            validate_optional_link, validate_slug, validate_url, SLUG_PATTERN,
        },
    },
    errors::DecodeError,
    infrastructure::store::{timestamp::iso_millis, Document, DocumentData, StoreTimestamp},
};

const MIN_TITLE_LENGTH: u64 = 2;
const MAX_TITLE_LENGTH: u64 = 100;
const MIN_DESCRIPTION_LENGTH: u64 = 10;
const MAX_DESCRIPTION_LENGTH: u64 = 500;
const MIN_EXCERPT_LENGTH: u64 = 10;
const MAX_EXCERPT_LENGTH: u64 = 200;
const MIN_LONG_DESCRIPTION_LENGTH: u64 = 50;
const MAX_LONG_DESCRIPTION_LENGTH: u64 = 5000;
const MAX_NOTES_LENGTH: u64 = 2000;
const MAX_META_TITLE_LENGTH: u64 = 60;
const MAX_META_DESCRIPTION_LENGTH: u64 = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Completed,
    InProgress,
    #[default]
    Planning,
}

impl From<ProjectStatus> for Value {
    fn from(status: ProjectStatus) -> Self {
        let name = match status {
            ProjectStatus::Completed => "completed",
            ProjectStatus::InProgress => "in-progress",
            ProjectStatus::Planning => "planning",
        };
        Value::from(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProjectMetric {
    #[validate(length(min = 1, message = "Metric title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Metric value is required"))]
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<ProjectMetric> for Value {
    fn from(metric: ProjectMetric) -> Self {
        let mut obj = json!({ "title": metric.title, "value": metric.value });
        if let Some(description) = metric.description {
            obj["description"] = Value::from(description);
        }
        obj
    }
}

// ───── Read model ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    pub category: String,
    pub technologies: Vec<String>,
    pub featured_image: String,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_url: Option<String>,
    pub published: bool,
    pub featured: bool,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenges: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solutions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learnings: Option<String>,
    pub metrics: Vec<ProjectMetric>,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
}

/// Stored shape. Missing fields fall back to empty values; timestamps are
/// required and checked in [`Project::from_document`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProjectDocument {
    slug: String,
    title: String,
    description: String,
    excerpt: String,
    long_description: Option<String>,
    category: String,
    technologies: Vec<String>,
    featured_image: String,
    images: Vec<String>,
    github_url: Option<String>,
    live_url: Option<String>,
    demo_url: Option<String>,
    published: bool,
    featured: bool,
    status: ProjectStatus,
    challenges: Option<String>,
    solutions: Option<String>,
    learnings: Option<String>,
    metrics: Vec<ProjectMetric>,
    created_at: Option<StoreTimestamp>,
    updated_at: Option<StoreTimestamp>,
    meta_title: Option<String>,
    meta_description: Option<String>,
}

impl Project {
    pub fn from_document(doc: Document) -> Result<Self, DecodeError> {
        let Document { id, data } = doc;
        let fail = |reason: String| DecodeError {
            collection: collections::PROJECTS,
            id: id.clone(),
            reason,
        };

        let raw: ProjectDocument =
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

        Ok(Project {
            id,
            slug: raw.slug,
            title: raw.title,
            description: raw.description,
            excerpt: raw.excerpt,
            long_description: raw.long_description,
            category: raw.category,
            technologies: raw.technologies,
            featured_image: raw.featured_image,
            images: raw.images,
            github_url: raw.github_url,
            live_url: raw.live_url,
            demo_url: raw.demo_url,
            published: raw.published,
            featured: raw.featured,
            status: raw.status,
            challenges: raw.challenges,
            solutions: raw.solutions,
            learnings: raw.learnings,
            metrics: raw.metrics,
            created_at,
            updated_at,
            meta_title: raw.meta_title,
            meta_description: raw.meta_description,
        })
    }
}

// ───── Write models ─────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectRequest {
    #[validate(length(min = MIN_TITLE_LENGTH, max = MAX_TITLE_LENGTH))]
    pub title: String,

    #[validate(length(min = MIN_DESCRIPTION_LENGTH, max = MAX_DESCRIPTION_LENGTH))]
    pub description: String,

    #[validate(length(min = MIN_EXCERPT_LENGTH, max = MAX_EXCERPT_LENGTH))]
    pub excerpt: String,

    #[validate(length(min = MIN_LONG_DESCRIPTION_LENGTH, max = MAX_LONG_DESCRIPTION_LENGTH))]
    pub long_description: Option<String>,

    /// Derived from the title when omitted.
    #[validate(
        length(min = MIN_TITLE_LENGTH, max = MAX_TITLE_LENGTH),
        regex(path = *SLUG_PATTERN, message = "Slug can only contain lowercase letters, numbers, and hyphens")
    )]
    pub slug: Option<String>,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[serde(default)]
    pub status: ProjectStatus,

    #[validate(length(min = 1, message = "At least one technology is required"))]
    pub technologies: Vec<String>,

    #[validate(custom(function = "validate_url"))]
    pub featured_image: String,

    #[serde(default)]
    #[validate(custom(function = "validate_image_urls"))]
    pub images: Vec<String>,

    #[validate(custom(function = "validate_optional_link"))]
    pub github_url: Option<String>,

    #[validate(custom(function = "validate_optional_link"))]
    pub live_url: Option<String>,

    #[validate(custom(function = "validate_optional_link"))]
    pub demo_url: Option<String>,

    #[validate(length(max = MAX_NOTES_LENGTH))]
    pub challenges: Option<String>,

    #[validate(length(max = MAX_NOTES_LENGTH))]
    pub solutions: Option<String>,

    #[validate(length(max = MAX_NOTES_LENGTH))]
    pub learnings: Option<String>,

    #[validate(length(max = MAX_META_TITLE_LENGTH))]
    pub meta_title: Option<String>,

    #[validate(length(max = MAX_META_DESCRIPTION_LENGTH))]
    pub meta_description: Option<String>,

    #[serde(default)]
    pub featured: bool,

    #[serde(default)]
    pub published: bool,

    #[serde(default)]
    #[validate(nested)]
    pub metrics: Vec<ProjectMetric>,
}

/// Persisted form of a new project.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInsert {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    pub category: String,
    pub technologies: Vec<String>,
    pub featured_image: String,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_url: Option<String>,
    pub published: bool,
    pub featured: bool,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenges: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solutions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learnings: Option<String>,
    pub metrics: Vec<ProjectMetric>,
    pub created_at: StoreTimestamp,
    pub updated_at: StoreTimestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
}

impl NewProjectRequest {
    pub fn resolved_slug(&self) -> String {
        match self.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => slugify(&self.title),
        }
    }

    /// Field validation plus the check that a usable slug exists.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        if self.slug.is_none() && self.resolved_slug().is_empty() {
            errors.add(
                "slug",
                new_validation_error("slug_empty", "Could not derive a slug from the title; please provide one"),
            );
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn into_insert(self, now: StoreTimestamp) -> ProjectInsert {
        let slug = self.resolved_slug();
        ProjectInsert {
            slug,
            title: self.title,
            description: self.description,
            excerpt: self.excerpt,
            long_description: non_empty(self.long_description),
            category: self.category,
            technologies: self.technologies,
            featured_image: self.featured_image,
            images: self.images,
            github_url: non_empty(self.github_url),
            live_url: non_empty(self.live_url),
            demo_url: non_empty(self.demo_url),
            published: self.published,
            featured: self.featured,
            status: self.status,
            challenges: non_empty(self.challenges),
            solutions: non_empty(self.solutions),
            learnings: non_empty(self.learnings),
            metrics: self.metrics,
            created_at: now,
            updated_at: now,
            meta_title: non_empty(self.meta_title),
            meta_description: non_empty(self.meta_description),
        }
    }
}

/// Partial project edit. Required fields are `Option` (absent or `null`
/// leaves them untouched); optional fields use [`OptionField`] so `null`
/// clears them.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProjectRequest {
    #[validate(length(min = MIN_TITLE_LENGTH, max = MAX_TITLE_LENGTH))]
    pub title: Option<String>,

    #[validate(length(min = MIN_DESCRIPTION_LENGTH, max = MAX_DESCRIPTION_LENGTH))]
    pub description: Option<String>,

    #[validate(length(min = MIN_EXCERPT_LENGTH, max = MAX_EXCERPT_LENGTH))]
    pub excerpt: Option<String>,

    #[validate(length(min = MIN_LONG_DESCRIPTION_LENGTH, max = MAX_LONG_DESCRIPTION_LENGTH))]
    pub long_description: OptionField<String>,

    #[validate(length(min = MIN_TITLE_LENGTH, max = MAX_TITLE_LENGTH), custom(function = "validate_slug"))]
    pub slug: Option<String>,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: Option<String>,

    pub status: Option<ProjectStatus>,

    #[validate(length(min = 1, message = "At least one technology is required"))]
    pub technologies: Option<Vec<String>>,

    #[validate(custom(function = "validate_url"))]
    pub featured_image: Option<String>,

    #[validate(custom(function = "validate_image_urls"))]
    pub images: Option<Vec<String>>,

    #[validate(custom(function = "validate_link_field"))]
    pub github_url: OptionField<String>,

    #[validate(custom(function = "validate_link_field"))]
    pub live_url: OptionField<String>,

    #[validate(custom(function = "validate_link_field"))]
    pub demo_url: OptionField<String>,

    #[validate(length(max = MAX_NOTES_LENGTH))]
    pub challenges: OptionField<String>,

    #[validate(length(max = MAX_NOTES_LENGTH))]
    pub solutions: OptionField<String>,

    #[validate(length(max = MAX_NOTES_LENGTH))]
    pub learnings: OptionField<String>,

    #[validate(length(max = MAX_META_TITLE_LENGTH))]
    pub meta_title: OptionField<String>,

    #[validate(length(max = MAX_META_DESCRIPTION_LENGTH))]
    pub meta_description: OptionField<String>,

    pub featured: Option<bool>,

    pub published: Option<bool>,

    #[validate(nested)]
    pub metrics: Option<Vec<ProjectMetric>>,
}

/// Empty link strings clear the link, like `null`.
fn link_patch(value: OptionField<String>) -> OptionField<String> {
    match value {
        OptionField::SetToValue(url) if url.trim().is_empty() => OptionField::SetToNull,
        other => other,
    }
}

impl UpdateProjectRequest {
    pub fn into_patch(self, now: StoreTimestamp) -> DocumentData {
        let mut patch = DocumentData::new();

        write_if_some(self.title, &mut patch, "title");
        write_if_some(self.description, &mut patch, "description");
        write_if_some(self.excerpt, &mut patch, "excerpt");
        self.long_description.write_to(&mut patch, "longDescription");
        write_if_some(self.slug, &mut patch, "slug");
        write_if_some(self.category, &mut patch, "category");
        write_if_some(self.status, &mut patch, "status");
        write_if_some(self.technologies, &mut patch, "technologies");
        write_if_some(self.featured_image, &mut patch, "featuredImage");
        write_if_some(self.images, &mut patch, "images");
        link_patch(self.github_url).write_to(&mut patch, "githubUrl");
        link_patch(self.live_url).write_to(&mut patch, "liveUrl");
        link_patch(self.demo_url).write_to(&mut patch, "demoUrl");
        self.challenges.write_to(&mut patch, "challenges");
        self.solutions.write_to(&mut patch, "solutions");
        self.learnings.write_to(&mut patch, "learnings");
        self.meta_title.write_to(&mut patch, "metaTitle");
        self.meta_description.write_to(&mut patch, "metaDescription");
        write_if_some(self.featured, &mut patch, "featured");
        write_if_some(self.published, &mut patch, "published");
        write_if_some(self.metrics, &mut patch, "metrics");
        patch.insert("updatedAt".into(), now.into());

        patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored(value: Value) -> Document {
        Document {
            id: "p1".into(),
            data: value.as_object().cloned().unwrap(),
        }
    }

    fn new_request() -> NewProjectRequest {
        serde_json::from_value(json!({
            "title": "Tagged Cache",
            "description": "An in-process cache with tag invalidation.",
            "excerpt": "Cache with tags and TTLs.",
            "category": "Backend",
            "status": "in-progress",
            "technologies": ["Rust", "Tokio"],
            "featuredImage": "https://example.com/cover.png",
            "githubUrl": "",
            "published": true
        }))
        .unwrap()
    }

    #[test]
    fn decodes_with_defaults_for_missing_fields() {
        let project = Project::from_document(stored(json!({
            "title": "Minimal",
            "createdAt": {"_seconds": 1_700_000_000, "_nanoseconds": 0},
            "updatedAt": {"_seconds": 1_700_000_100, "_nanoseconds": 0}
        })))
        .unwrap();

        assert_eq!(project.id, "p1");
        assert_eq!(project.title, "Minimal");
        assert_eq!(project.description, "");
        assert!(project.technologies.is_empty());
        assert!(!project.published);
        assert_eq!(project.status, ProjectStatus::Planning);
        assert!(project.github_url.is_none());
    }

    #[test]
    fn missing_timestamps_fail_decoding() {
        let err = Project::from_document(stored(json!({"title": "No dates"}))).unwrap_err();
        assert_eq!(err.id, "p1");
        assert!(err.reason.contains("createdAt"));
    }

    #[test]
    fn out_of_range_timestamps_fail_decoding() {
        let err = Project::from_document(stored(json!({
            "title": "Far future",
            "createdAt": {"_seconds": i64::MAX, "_nanoseconds": 0},
            "updatedAt": {"_seconds": 1, "_nanoseconds": 0}
        })))
        .unwrap_err();
        assert!(err.reason.contains("createdAt"));
    }

    #[test]
    fn wrong_typed_fields_fail_decoding() {
        let err = Project::from_document(stored(json!({
            "technologies": "Rust",
            "createdAt": {"_seconds": 1, "_nanoseconds": 0},
            "updatedAt": {"_seconds": 1, "_nanoseconds": 0}
        })))
        .unwrap_err();
        assert_eq!(err.collection, "projects");
    }

    #[test]
    fn serializes_camel_case_with_iso_timestamps() {
        let project = Project::from_document(stored(json!({
            "slug": "x",
            "status": "in-progress",
            "featuredImage": "https://example.com/a.png",
            "createdAt": {"_seconds": 1_700_000_000, "_nanoseconds": 123_000_000},
            "updatedAt": {"_seconds": 1_700_000_000, "_nanoseconds": 123_000_000}
        })))
        .unwrap();

        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["featuredImage"], "https://example.com/a.png");
        assert_eq!(json["status"], "in-progress");
        assert_eq!(json["createdAt"], "2023-11-14T22:13:20.123Z");
        assert!(json.get("githubUrl").is_none());
    }

    #[test]
    fn new_request_derives_slug_and_drops_empty_links() {
        let request = new_request();
        assert!(request.check().is_ok());

        let insert = request.into_insert(StoreTimestamp { seconds: 10, nanos: 0 });
        assert_eq!(insert.slug, "tagged-cache");
        assert!(insert.github_url.is_none());
        assert_eq!(insert.created_at, insert.updated_at);
    }

    #[test]
    fn invalid_new_request_reports_each_field() {
        let mut request = new_request();
        request.title = "x".into();
        request.technologies.clear();
        request.slug = Some("Not A Slug".into());

        let errors = request.check().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("technologies"));
        assert!(fields.contains_key("slug"));
    }

    #[test]
    fn update_patch_touches_only_supplied_fields() {
        let request: UpdateProjectRequest = serde_json::from_value(json!({
            "featured": true,
            "liveUrl": "",
            "challenges": null,
            "status": "completed"
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let patch = request.into_patch(StoreTimestamp { seconds: 99, nanos: 0 });
        assert_eq!(patch["featured"], json!(true));
        assert_eq!(patch["liveUrl"], Value::Null);
        assert_eq!(patch["challenges"], Value::Null);
        assert_eq!(patch["status"], json!("completed"));
        assert_eq!(patch["updatedAt"], json!({"_seconds": 99, "_nanoseconds": 0}));
        assert!(!patch.contains_key("title"));
    }

    #[test]
    fn update_rejects_out_of_bounds_optional_text() {
        let request: UpdateProjectRequest = serde_json::from_value(json!({
            "longDescription": "Too short."
        }))
        .unwrap();

        let errors = request.validate().unwrap_err();
        let field = &errors.field_errors()["long_description"][0];
        assert_eq!(field.code, "length");
        assert_eq!(field.params["value"], json!("Too short."));
    }
}
