//! User service: cached reads, write-invalidating mutations.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::{read_through_json, write_invalidate, CacheManager, CacheRegion};
use crate::config::{
    ALL_USERS_CACHE, USER_BY_EMAIL_CACHE, USER_BY_USERNAME_CACHE, USER_PROFILE_CACHE,
    USER_SEARCH_CACHE,
};
use crate::error::CacheError;
use crate::services::keys::user as keys;
use crate::services::{
    NewUser, Page, PageRequest, ServiceError, ServiceResult, User, UserRepository, UserUpdate,
};

/// Regions whose content is derived from more than one user and so
/// cannot be patched per id.
const USER_DERIVED_REGIONS: [&str; 4] = [
    USER_BY_USERNAME_CACHE,
    USER_BY_EMAIL_CACHE,
    ALL_USERS_CACHE,
    USER_SEARCH_CACHE,
];

pub struct UserService<R> {
    repo: Arc<R>,
    cache: Arc<CacheManager<Value>>,
    profiles: Arc<CacheRegion<Value>>,
    by_username: Arc<CacheRegion<Value>>,
    by_email: Arc<CacheRegion<Value>>,
    all_users: Arc<CacheRegion<Value>>,
    searches: Arc<CacheRegion<Value>>,
}

impl<R: UserRepository> UserService<R> {
    /// Resolves every region the service uses; fails if one is not configured.
    pub fn new(repo: Arc<R>, cache: Arc<CacheManager<Value>>) -> Result<Self, CacheError> {
        Ok(Self {
            profiles: cache.region(USER_PROFILE_CACHE)?,
            by_username: cache.region(USER_BY_USERNAME_CACHE)?,
            by_email: cache.region(USER_BY_EMAIL_CACHE)?,
            all_users: cache.region(ALL_USERS_CACHE)?,
            searches: cache.region(USER_SEARCH_CACHE)?,
            repo,
            cache,
        })
    }

    // == Reads ==

    pub async fn get_profile(&self, id: u64) -> ServiceResult<User> {
        read_through_json(&self.profiles, &keys::profile(id), || self.load_by_id(id)).await
    }

    pub async fn get_by_username(&self, username: &str) -> ServiceResult<User> {
        read_through_json(&self.by_username, &keys::by_username(username), || {
            self.load_by_username(username)
        })
        .await
    }

    pub async fn get_by_email(&self, email: &str) -> ServiceResult<User> {
        read_through_json(&self.by_email, &keys::by_email(email), || {
            self.load_by_email(email)
        })
        .await
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<User>> {
        read_through_json(&self.all_users, &keys::all(), || self.repo.find_all()).await
    }

    pub async fn list_page(&self, request: &PageRequest) -> ServiceResult<Page<User>> {
        let key = keys::page(request)?;
        read_through_json(&self.all_users, &key, || self.repo.find_page(request)).await
    }

    pub async fn search(&self, keyword: &str) -> ServiceResult<Vec<User>> {
        if keyword.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Search keyword cannot be empty".to_string()));
        }
        read_through_json(&self.searches, &keys::search(keyword), || {
            self.repo.search(keyword)
        })
        .await
    }

    // == Writes ==

    /// Creates a user. Lists and searches are cleared; per-user lookups are
    /// untouched since misses are never cached.
    pub async fn create(&self, new_user: NewUser) -> ServiceResult<User> {
        new_user.validate()?;
        let plan = self
            .cache
            .invalidation()
            .clear_all(&[ALL_USERS_CACHE, USER_SEARCH_CACHE])?;

        let user = write_invalidate(self.repo.insert(new_user), &plan).await?;
        info!(user_id = user.id, "user created");
        Ok(user)
    }

    pub async fn update(&self, id: u64, update: UserUpdate) -> ServiceResult<User> {
        let plan = self
            .cache
            .invalidation()
            .key(USER_PROFILE_CACHE, keys::profile(id))?
            .clear_all(&USER_DERIVED_REGIONS)?;

        let user = write_invalidate(self.apply_update(id, update), &plan).await?;
        info!(user_id = id, "user updated");
        Ok(user)
    }

    pub async fn delete(&self, id: u64) -> ServiceResult<()> {
        let plan = self
            .cache
            .invalidation()
            .key(USER_PROFILE_CACHE, keys::profile(id))?
            .clear_all(&USER_DERIVED_REGIONS)?;

        write_invalidate(self.remove(id), &plan).await?;
        info!(user_id = id, "user deleted");
        Ok(())
    }

    // == Store Access ==

    async fn load_by_id(&self, id: u64) -> ServiceResult<User> {
        debug!(user_id = id, "loading user from store");
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {id}")))
    }

    async fn load_by_username(&self, username: &str) -> ServiceResult<User> {
        self.repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {username}")))
    }

    async fn load_by_email(&self, email: &str) -> ServiceResult<User> {
        self.repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user with email {email}")))
    }

    async fn apply_update(&self, id: u64, update: UserUpdate) -> ServiceResult<User> {
        let mut user = self.load_by_id(id).await?;

        if let Some(email) = update.email {
            if email != user.email {
                if self.repo.find_by_email(&email).await?.is_some() {
                    return Err(ServiceError::Duplicate(format!("email {email}")));
                }
                user.email = email;
            }
        }
        if let Some(full_name) = update.full_name {
            user.full_name = Some(full_name);
        }
        user.updated_at = Utc::now();

        self.repo.save(user).await
    }

    async fn remove(&self, id: u64) -> ServiceResult<()> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!("user {id}")))
        }
    }
}
