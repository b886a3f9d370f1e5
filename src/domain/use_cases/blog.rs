use std::{sync::Arc, time::Duration};

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

use crate::{
    cache::{CacheKey, TagInvalidator, TaggedCache},
    constants::{cache_tags, ALL_CATEGORIES},
    entities::{
        action::ActionResponse,
        blog_post::{BlogPost, NewBlogPostRequest, UpdateBlogPostRequest},
    },
    errors::AppError,
    ranking::{rank_related, ZeroScorePolicy},
    repositories::blog_post::{BlogPostRepository, Counter},
    settings::CacheTtls,
    store::{Direction, DocumentData, Query, StoreTimestamp},
};

const BLOG_TAGS: &[&str] = &[cache_tags::BLOG];
const FEATURED_TAGS: &[&str] = &[cache_tags::BLOG, cache_tags::FEATURED_BLOG];
pub const DEFAULT_FEATURED_LIMIT: usize = 3;
pub const DEFAULT_RELATED_LIMIT: usize = 3;
pub const DEFAULT_POPULAR_LIMIT: usize = 5;
pub const DEFAULT_RECENT_LIMIT: usize = 5;

pub struct BlogPostHandler<R>
where
    R: BlogPostRepository,
{
    pub blog_post_repo: R,
    cache: Arc<TaggedCache>,
    invalidator: Arc<dyn TagInvalidator>,
    ttls: CacheTtls,
}

impl<R> BlogPostHandler<R>
where
    R: BlogPostRepository,
{
    pub fn new(
        blog_post_repo: R,
        cache: Arc<TaggedCache>,
        invalidator: Arc<dyn TagInvalidator>,
        ttls: CacheTtls,
    ) -> Self {
        BlogPostHandler { blog_post_repo, cache, invalidator, ttls }
    }

    fn latest_first() -> Query {
        Query::published().order_by("publishedAt", Direction::Desc)
    }

    async fn cached_list(&self, key: CacheKey, tags: &[&'static str], ttl: Duration, query: Query) -> Vec<BlogPost> {
        let function = key.function();
        self.cache
            .get_or_load(key, tags, ttl, || self.blog_post_repo.find_blog_posts(query))
            .await
            .unwrap_or_else(|e| {
                error!(function, error = %e, "Failed to load blog posts");
                Vec::new()
            })
    }

    #[instrument(skip(self))]
    pub async fn all_blog_posts(&self) -> Vec<BlogPost> {
        let key = CacheKey::new("all_blog_posts", ());
        self.cached_list(key, BLOG_TAGS, self.ttls.list, Self::latest_first()).await
    }

    #[instrument(skip(self))]
    pub async fn featured_blog_posts(&self, limit: usize) -> Vec<BlogPost> {
        let key = CacheKey::new("featured_blog_posts", limit);
        let query = Self::latest_first().eq("featured", true).limit(limit);
        self.cached_list(key, FEATURED_TAGS, self.ttls.list, query).await
    }

    #[instrument(skip(self))]
    pub async fn blog_posts_by_category(&self, category: &str) -> Vec<BlogPost> {
        let key = CacheKey::new("blog_posts_by_category", category);
        let mut query = Self::latest_first();
        if category != ALL_CATEGORIES {
            query = query.eq("category", category);
        }
        self.cached_list(key, BLOG_TAGS, self.ttls.list, query).await
    }

    #[instrument(skip(self))]
    pub async fn blog_posts_by_tag(&self, tag: &str) -> Vec<BlogPost> {
        let key = CacheKey::new("blog_posts_by_tag", tag);
        let query = Self::latest_first().array_contains("tags", tag);
        self.cached_list(key, BLOG_TAGS, self.ttls.list, query).await
    }

    #[instrument(skip(self))]
    pub async fn popular_blog_posts(&self, limit: usize) -> Vec<BlogPost> {
        let key = CacheKey::new("popular_blog_posts", limit);
        let query = Query::published().order_by("views", Direction::Desc).limit(limit);
        self.cached_list(key, BLOG_TAGS, self.ttls.detail, query).await
    }

    #[instrument(skip(self))]
    pub async fn recent_blog_posts(&self, limit: usize) -> Vec<BlogPost> {
        let key = CacheKey::new("recent_blog_posts", limit);
        let query = Self::latest_first().limit(limit);
        self.cached_list(key, BLOG_TAGS, self.ttls.list, query).await
    }

    #[instrument(skip(self))]
    pub async fn blog_post_by_slug(&self, slug: &str) -> Option<BlogPost> {
        let key = CacheKey::new("blog_post_by_slug", slug);
        let query = Query::published().eq("slug", slug);

        self.cache
            .get_or_load(key, BLOG_TAGS, self.ttls.detail, || async {
                Ok::<_, AppError>(self.blog_post_repo.find_blog_posts(query).await?.into_iter().next())
            })
            .await
            .unwrap_or_else(|e| {
                error!(slug, error = %e, "Failed to load blog post by slug");
                None
            })
    }

    /// Same-category posts sharing at least one tag, most shared first.
    #[instrument(skip(self, tags))]
    pub async fn related_blog_posts(&self, post_id: &str, tags: &[String], category: &str, limit: usize) -> Vec<BlogPost> {
        let key = CacheKey::new("related_blog_posts", (post_id, tags, category, limit));
        let query = Self::latest_first().eq("category", category);

        self.cache
            .get_or_load(key, BLOG_TAGS, self.ttls.detail, || async {
                let pool = self.blog_post_repo.find_blog_posts(query).await?;
                Ok::<_, AppError>(rank_related(pool, post_id, tags, limit, ZeroScorePolicy::Drop))
            })
            .await
            .unwrap_or_else(|e| {
                error!(post_id, error = %e, "Failed to load related blog posts");
                Vec::new()
            })
    }

    #[instrument(skip(self))]
    pub async fn blog_post_slugs(&self) -> Vec<String> {
        let key = CacheKey::new("blog_post_slugs", ());

        self.cache
            .get_or_load(key, BLOG_TAGS, self.ttls.detail, || async {
                let posts = self.blog_post_repo.find_blog_posts(Query::published()).await?;
                Ok::<_, AppError>(posts.into_iter().map(|p| p.slug).collect::<Vec<_>>())
            })
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to load blog post slugs");
                Vec::new()
            })
    }

    /// Published posts whose title, excerpt or tags contain any of the
    /// whitespace-separated terms, case-insensitively. A blank query
    /// matches everything. Never cached.
    #[instrument(skip(self))]
    pub async fn search_blog_posts(&self, query: &str) -> Vec<BlogPost> {
        let posts = match self.blog_post_repo.find_blog_posts(Self::latest_first()).await {
            Ok(posts) => posts,
            Err(e) => {
                error!(error = %e, "Failed to search blog posts");
                return Vec::new();
            }
        };

        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return posts;
        }

        posts
            .into_iter()
            .filter(|post| {
                let searchable = format!("{} {} {}", post.title, post.excerpt, post.tags.join(" ")).to_lowercase();
                terms.iter().any(|term| searchable.contains(term.as_str()))
            })
            .collect()
    }

    #[instrument(skip(self))]
    pub async fn all_blog_posts_admin(&self) -> Vec<BlogPost> {
        let query = Query::new().order_by("updatedAt", Direction::Desc);
        self.blog_post_repo.find_blog_posts(query).await.unwrap_or_else(|e| {
            error!(error = %e, "[admin] Failed to load blog posts");
            Vec::new()
        })
    }

    #[instrument(skip(self))]
    pub async fn blog_post_by_id_admin(&self, id: &str) -> Option<BlogPost> {
        self.blog_post_repo.get_blog_post_by_id(id).await.unwrap_or_else(|e| {
            error!(id, error = %e, "[admin] Failed to load blog post");
            None
        })
    }

    /// Bumps a reader counter. Failures are logged and reported as `false`;
    /// the cache is left alone.
    #[instrument(skip(self))]
    pub async fn record(&self, id: &str, counter: Counter) -> bool {
        match self.blog_post_repo.increment_counter(id, counter).await {
            Ok(()) => {
                debug!(id, counter = counter.field(), "Counter incremented");
                true
            }
            Err(e) => {
                warn!(id, counter = counter.field(), error = %e, "Failed to increment counter");
                false
            }
        }
    }

    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn create_blog_post(&self, request: NewBlogPostRequest) -> ActionResponse {
        if let Err(errors) = request.check() {
            return ActionResponse::invalid(&errors);
        }

        let insert = request.into_insert(StoreTimestamp::now());
        match self.blog_post_repo.create_blog_post(&insert).await {
            Ok(id) => {
                info!(id = %id, "[admin] Blog post created");
                self.invalidate().await;
                ActionResponse::created("Blog post created successfully!", id)
            }
            Err(e) => {
                error!(error = %e, "[admin] Error creating blog post");
                ActionResponse::failed("Failed to create blog post. Please try again.")
            }
        }
    }

    /// Applies the patch; stamps `publishedAt` if this is the post's first
    /// time being published.
    #[instrument(skip(self, request))]
    pub async fn update_blog_post(&self, id: &str, request: UpdateBlogPostRequest) -> ActionResponse {
        if let Err(errors) = request.validate() {
            return ActionResponse::invalid(&errors);
        }

        let outcome = async {
            let current = self
                .blog_post_repo
                .get_blog_post_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("blog post {id}")))?;

            let now = StoreTimestamp::now();
            let will_be_published = request.published.unwrap_or(current.published);
            let mut patch = request.into_patch(now);
            if will_be_published && current.published_at.is_none() {
                patch.insert("publishedAt".into(), now.into());
            }

            self.blog_post_repo.update_blog_post(id, patch).await
        }
        .await;

        match outcome {
            Ok(()) => {
                info!(id, "[admin] Blog post updated");
                self.invalidate().await;
                ActionResponse { id: Some(id.to_string()), ..ActionResponse::ok("Blog post updated successfully!") }
            }
            Err(AppError::NotFound(_)) => ActionResponse::not_found("Blog post not found."),
            Err(e) => {
                error!(id, error = %e, "[admin] Error updating blog post");
                ActionResponse::failed("Failed to update blog post. Please try again.")
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_blog_post(&self, id: &str) -> ActionResponse {
        match self.blog_post_repo.delete_blog_post(id).await {
            Ok(()) => {
                info!(id, "[admin] Blog post deleted");
                self.invalidate().await;
                ActionResponse::ok("Blog post deleted successfully!")
            }
            Err(AppError::NotFound(_)) => ActionResponse::not_found("Blog post not found."),
            Err(e) => {
                error!(id, error = %e, "[admin] Error deleting blog post");
                ActionResponse::failed("Failed to delete blog post. Please try again.")
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn toggle_published(&self, id: &str) -> ActionResponse {
        match self.toggle_flag(id, Flag::Published).await {
            Ok(_) => ActionResponse::ok("Blog post status updated successfully!"),
            Err(AppError::NotFound(_)) => ActionResponse::not_found("Blog post not found."),
            Err(e) => {
                error!(id, error = %e, "[admin] Error toggling blog post status");
                ActionResponse::failed("Failed to update blog post status. Please try again.")
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn toggle_featured(&self, id: &str) -> ActionResponse {
        match self.toggle_flag(id, Flag::Featured).await {
            Ok(_) => ActionResponse::ok("Blog post featured status updated successfully!"),
            Err(AppError::NotFound(_)) => ActionResponse::not_found("Blog post not found."),
            Err(e) => {
                error!(id, error = %e, "[admin] Error toggling blog post featured status");
                ActionResponse::failed("Failed to update blog post featured status. Please try again.")
            }
        }
    }

    async fn toggle_flag(&self, id: &str, flag: Flag) -> Result<bool, AppError> {
        let post = self
            .blog_post_repo
            .get_blog_post_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("blog post {id}")))?;

        let now = StoreTimestamp::now();
        let mut patch = DocumentData::new();
        let flipped = match flag {
            Flag::Published => {
                let flipped = !post.published;
                if flipped && post.published_at.is_none() {
                    patch.insert("publishedAt".into(), now.into());
                }
                flipped
            }
            Flag::Featured => !post.featured,
        };
        patch.insert(flag.field().into(), Value::Bool(flipped));
        patch.insert("updatedAt".into(), now.into());

        self.blog_post_repo.update_blog_post(id, patch).await?;
        info!(id, field = flag.field(), value = flipped, "[admin] Blog post flag toggled");
        self.invalidate().await;
        Ok(flipped)
    }

    async fn invalidate(&self) {
        if let Err(e) = self.invalidator.invalidate_tag(cache_tags::BLOG).await {
            warn!(error = %e, "Blog cache invalidation failed; reads may be stale until expiry");
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Flag {
    Published,
    Featured,
}

impl Flag {
    fn field(self) -> &'static str {
        match self {
            Flag::Published => "published",
            Flag::Featured => "featured",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::LocalInvalidator,
        constants::collections::BLOG,
        repositories::{blog_post::MockBlogPostRepository, store_repo::StoreBlogPostRepo},
        store::MemoryStore,
    };
    use serde_json::json;

    fn post(slug: &str, category: &str, tags: &[&str], published: bool, at: i64, views: u64) -> serde_json::Value {
        let mut doc = json!({
            "slug": slug,
            "title": format!("Post {slug}"),
            "excerpt": format!("About {slug}"),
            "content": "body",
            "category": category,
            "tags": tags,
            "published": published,
            "views": views,
            "createdAt": {"_seconds": at, "_nanoseconds": 0},
            "updatedAt": {"_seconds": at, "_nanoseconds": 0}
        });
        if published {
            doc["publishedAt"] = json!({"_seconds": at, "_nanoseconds": 0});
        }
        doc
    }

    fn handler_with(docs: Vec<(&str, serde_json::Value)>) -> BlogPostHandler<StoreBlogPostRepo> {
        let store = MemoryStore::new();
        for (id, doc) in docs {
            store.seed(BLOG, id, doc.as_object().cloned().unwrap());
        }
        let cache = Arc::new(TaggedCache::new());
        let invalidator = Arc::new(LocalInvalidator::new(Arc::clone(&cache)));
        BlogPostHandler::new(StoreBlogPostRepo::new(Arc::new(store)), cache, invalidator, CacheTtls::default())
    }

    fn seeded() -> BlogPostHandler<StoreBlogPostRepo> {
        handler_with(vec![
            ("r", post("ref", "eng", &["React", "Next.js", "AI"], true, 50, 3)),
            ("a", post("a", "eng", &["React", "Go"], true, 40, 10)),
            ("b", post("b", "eng", &["React", "Next.js", "AI", "Docker"], true, 30, 1)),
            ("c", post("c", "eng", &[], true, 20, 7)),
            ("draft", post("draft", "eng", &["React"], false, 60, 0)),
            ("life", post("life", "life", &["travel"], true, 10, 2)),
        ])
    }

    fn slugs(posts: &[BlogPost]) -> Vec<&str> {
        posts.iter().map(|p| p.slug.as_str()).collect()
    }

    #[tokio::test]
    async fn lists_are_published_and_latest_first() {
        let handler = seeded();

        assert_eq!(slugs(&handler.all_blog_posts().await), vec!["ref", "a", "b", "c", "life"]);
        assert_eq!(slugs(&handler.recent_blog_posts(2).await), vec!["ref", "a"]);
        assert_eq!(slugs(&handler.popular_blog_posts(2).await), vec!["a", "c"]);
        assert_eq!(slugs(&handler.blog_posts_by_tag("React").await), vec!["ref", "a", "b"]);
        assert_eq!(handler.all_blog_posts_admin().await.len(), 6);
    }

    #[tokio::test]
    async fn related_posts_drop_unrelated_candidates() {
        let handler = seeded();
        let tags: Vec<String> = ["React", "Next.js", "AI"].iter().map(|t| t.to_string()).collect();

        let related = handler.related_blog_posts("r", &tags, "eng", 3).await;
        assert_eq!(slugs(&related), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn search_matches_any_term_case_insensitively() {
        let handler = seeded();

        assert_eq!(slugs(&handler.search_blog_posts("docker TRAVEL").await), vec!["b", "life"]);
        assert!(handler.search_blog_posts("draft").await.is_empty());
        assert_eq!(handler.search_blog_posts("   ").await.len(), 5);
    }

    #[tokio::test]
    async fn published_at_is_stamped_once_and_never_moves() {
        let handler = seeded();

        assert!(handler.toggle_published("draft").await.success);
        let first = handler.blog_post_by_id_admin("draft").await.unwrap().published_at.unwrap();

        assert!(handler.toggle_published("draft").await.success);
        let unpublished = handler.blog_post_by_id_admin("draft").await.unwrap();
        assert!(!unpublished.published);
        assert_eq!(unpublished.published_at, Some(first));

        let request: UpdateBlogPostRequest = serde_json::from_value(json!({ "published": true })).unwrap();
        assert!(handler.update_blog_post("draft", request).await.success);
        let republished = handler.blog_post_by_id_admin("draft").await.unwrap();
        assert!(republished.published);
        assert_eq!(republished.published_at, Some(first));
    }

    #[tokio::test]
    async fn existing_publish_stamp_survives_updates() {
        let handler = seeded();
        let before = handler.blog_post_by_id_admin("a").await.unwrap().published_at;

        let request: UpdateBlogPostRequest = serde_json::from_value(json!({ "title": "Edited title" })).unwrap();
        assert!(handler.update_blog_post("a", request).await.success);

        let after = handler.blog_post_by_id_admin("a").await.unwrap();
        assert_eq!(after.published_at, before);
        assert_eq!(handler.blog_post_by_slug("a").await.unwrap().title, "Edited title");
    }

    #[tokio::test]
    async fn counters_do_not_touch_the_cache() {
        let handler = seeded();
        assert_eq!(handler.blog_post_by_slug("c").await.unwrap().views, 7);

        assert!(handler.record("c", Counter::Views).await);
        assert_eq!(handler.blog_post_by_slug("c").await.unwrap().views, 7);
        assert_eq!(handler.blog_post_by_id_admin("c").await.unwrap().views, 8);

        assert!(!handler.record("missing", Counter::Likes).await);
    }

    #[tokio::test]
    async fn store_failures_fail_open() {
        let mut repo = MockBlogPostRepository::new();
        repo.expect_find_blog_posts()
            .returning(|_| Err(AppError::InternalError("store offline".into())));
        let cache = Arc::new(TaggedCache::new());
        let invalidator = Arc::new(LocalInvalidator::new(Arc::clone(&cache)));
        let handler = BlogPostHandler::new(repo, cache, invalidator, CacheTtls::default());

        assert!(handler.all_blog_posts().await.is_empty());
        assert!(handler.search_blog_posts("rust").await.is_empty());
        assert!(handler.blog_post_by_slug("x").await.is_none());
        assert!(handler.related_blog_posts("x", &[], "eng", 3).await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_slugs_resolve_to_the_first_stored() {
        let mut first = post("dup", "eng", &[], true, 10, 0);
        first["title"] = json!("first");
        let mut second = post("dup", "eng", &[], true, 20, 0);
        second["title"] = json!("second");
        let handler = handler_with(vec![("one", first), ("two", second)]);

        let found = handler.blog_post_by_slug("dup").await.unwrap();
        assert_eq!(found.title, "first");
    }

    #[tokio::test]
    async fn undecodable_duplicate_does_not_hide_a_valid_one() {
        let mut broken = post("dup", "eng", &[], true, 10, 0);
        broken["publishedAt"] = json!({"_seconds": i64::MAX, "_nanoseconds": 0});
        let handler = handler_with(vec![("broken", broken), ("ok", post("dup", "eng", &[], true, 20, 0))]);

        let found = handler.blog_post_by_slug("dup").await.unwrap();
        assert_eq!(found.id, "ok");
    }
}
