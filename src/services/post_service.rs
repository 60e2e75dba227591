//! Post service: cached reads, write-invalidating mutations.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::info;

use crate::cache::{read_through_json, write_invalidate, CacheManager, CacheRegion};
use crate::config::{POST_CACHE, POST_LIST_CACHE, POST_SEARCH_CACHE};
use crate::error::CacheError;
use crate::services::keys::post as keys;
use crate::services::{
    NewPost, Page, PageRequest, Post, PostRepository, PostUpdate, ServiceError, ServiceResult,
    UserRepository,
};

pub struct PostService<P, U> {
    posts: Arc<P>,
    users: Arc<U>,
    cache: Arc<CacheManager<Value>>,
    by_id: Arc<CacheRegion<Value>>,
    lists: Arc<CacheRegion<Value>>,
    searches: Arc<CacheRegion<Value>>,
}

impl<P: PostRepository, U: UserRepository> PostService<P, U> {
    /// Resolves every region the service uses; fails if one is not configured.
    pub fn new(
        posts: Arc<P>,
        users: Arc<U>,
        cache: Arc<CacheManager<Value>>,
    ) -> Result<Self, CacheError> {
        Ok(Self {
            by_id: cache.region(POST_CACHE)?,
            lists: cache.region(POST_LIST_CACHE)?,
            searches: cache.region(POST_SEARCH_CACHE)?,
            posts,
            users,
            cache,
        })
    }

    // == Reads ==

    pub async fn get(&self, id: u64) -> ServiceResult<Post> {
        read_through_json(&self.by_id, &keys::by_id(id), || self.load(id)).await
    }

    pub async fn list_page(&self, request: &PageRequest) -> ServiceResult<Page<Post>> {
        let key = keys::page(request)?;
        read_through_json(&self.lists, &key, || self.posts.find_page(request)).await
    }

    pub async fn by_author(&self, author_id: u64) -> ServiceResult<Vec<Post>> {
        read_through_json(&self.lists, &keys::by_author(author_id), || {
            self.posts.find_by_author(author_id)
        })
        .await
    }

    pub async fn search(
        &self,
        keyword: Option<&str>,
        category: Option<&str>,
        author_id: Option<u64>,
    ) -> ServiceResult<Vec<Post>> {
        let key = keys::search(keyword, category, author_id);
        read_through_json(&self.searches, &key, || {
            self.posts.search(keyword, category, author_id)
        })
        .await
    }

    // == Writes ==

    pub async fn create(&self, author_id: u64, new_post: NewPost) -> ServiceResult<Post> {
        new_post.validate()?;
        let plan = self
            .cache
            .invalidation()
            .clear_all(&[POST_LIST_CACHE, POST_SEARCH_CACHE])?;

        let post = write_invalidate(self.insert(author_id, new_post), &plan).await?;
        info!(post_id = post.id, author_id, "post created");
        Ok(post)
    }

    /// Updates a post. Only its author may do so.
    pub async fn update(&self, id: u64, author_id: u64, update: PostUpdate) -> ServiceResult<Post> {
        let plan = self
            .cache
            .invalidation()
            .key(POST_CACHE, keys::by_id(id))?
            .clear_all(&[POST_LIST_CACHE, POST_SEARCH_CACHE])?;

        let post = write_invalidate(self.apply_update(id, author_id, update), &plan).await?;
        info!(post_id = id, "post updated");
        Ok(post)
    }

    /// Deletes a post. Only its author may do so.
    pub async fn delete(&self, id: u64, author_id: u64) -> ServiceResult<()> {
        let plan = self
            .cache
            .invalidation()
            .key(POST_CACHE, keys::by_id(id))?
            .clear_all(&[POST_LIST_CACHE, POST_SEARCH_CACHE])?;

        write_invalidate(self.remove(id, author_id), &plan).await?;
        info!(post_id = id, "post deleted");
        Ok(())
    }

    // == Store Access ==

    async fn load(&self, id: u64) -> ServiceResult<Post> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("post {id}")))
    }

    async fn load_owned(&self, id: u64, author_id: u64) -> ServiceResult<Post> {
        let post = self.load(id).await?;
        if post.author_id != author_id {
            return Err(ServiceError::Forbidden(format!(
                "user {author_id} is not the author of post {id}"
            )));
        }
        Ok(post)
    }

    async fn insert(&self, author_id: u64, new_post: NewPost) -> ServiceResult<Post> {
        if self.users.find_by_id(author_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("user {author_id}")));
        }
        self.posts.insert(author_id, new_post).await
    }

    async fn apply_update(
        &self,
        id: u64,
        author_id: u64,
        update: PostUpdate,
    ) -> ServiceResult<Post> {
        let mut post = self.load_owned(id, author_id).await?;

        if let Some(title) = update.title {
            post.title = title;
        }
        if let Some(content) = update.content {
            post.content = content;
        }
        if let Some(category) = update.category {
            post.category = Some(category);
        }
        post.updated_at = Utc::now();

        self.posts.save(post).await
    }

    async fn remove(&self, id: u64, author_id: u64) -> ServiceResult<()> {
        self.load_owned(id, author_id).await?;
        if self.posts.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!("post {id}")))
        }
    }
}
