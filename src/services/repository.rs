//! Persistence boundary used by the services.
//!
//! The traits describe the store the cache sits in front of. The in-memory
//! implementations back the binary's tests and keep a count of the read
//! queries they served, which is how callers can tell a cache hit from a
//! load.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::services::{
    NewPost, NewUser, Page, PageRequest, Post, ServiceError, ServiceResult, User,
};

// == User Repository ==
pub trait UserRepository: Send + Sync {
    fn find_by_id(&self, id: u64) -> impl Future<Output = ServiceResult<Option<User>>> + Send;

    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = ServiceResult<Option<User>>> + Send;

    fn find_by_email(&self, email: &str)
        -> impl Future<Output = ServiceResult<Option<User>>> + Send;

    fn find_all(&self) -> impl Future<Output = ServiceResult<Vec<User>>> + Send;

    fn find_page(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = ServiceResult<Page<User>>> + Send;

    /// Users whose username, email or full name contains `keyword`, case-insensitively.
    fn search(&self, keyword: &str) -> impl Future<Output = ServiceResult<Vec<User>>> + Send;

    fn insert(&self, user: NewUser) -> impl Future<Output = ServiceResult<User>> + Send;

    fn save(&self, user: User) -> impl Future<Output = ServiceResult<User>> + Send;

    /// Returns whether a user was removed.
    fn delete(&self, id: u64) -> impl Future<Output = ServiceResult<bool>> + Send;
}

// == Post Repository ==
pub trait PostRepository: Send + Sync {
    fn find_by_id(&self, id: u64) -> impl Future<Output = ServiceResult<Option<Post>>> + Send;

    fn find_page(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = ServiceResult<Page<Post>>> + Send;

    fn find_by_author(&self, author_id: u64)
        -> impl Future<Output = ServiceResult<Vec<Post>>> + Send;

    /// Posts matching every given filter; `keyword` matches title or content.
    fn search(
        &self,
        keyword: Option<&str>,
        category: Option<&str>,
        author_id: Option<u64>,
    ) -> impl Future<Output = ServiceResult<Vec<Post>>> + Send;

    fn insert(
        &self,
        author_id: u64,
        post: NewPost,
    ) -> impl Future<Output = ServiceResult<Post>> + Send;

    fn save(&self, post: Post) -> impl Future<Output = ServiceResult<Post>> + Send;

    /// Returns whether a post was removed.
    fn delete(&self, id: u64) -> impl Future<Output = ServiceResult<bool>> + Send;
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn ordered<T>(mut items: Vec<T>, descending: bool) -> Vec<T> {
    if descending {
        items.reverse();
    }
    items
}

// == In-Memory User Repository ==
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<BTreeMap<u64, User>>,
    next_id: AtomicU64,
    queries: AtomicUsize,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read queries served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: u64) -> ServiceResult<Option<User>> {
        self.record_query();
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        self.record_query();
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        self.record_query();
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_all(&self) -> ServiceResult<Vec<User>> {
        self.record_query();
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn find_page(&self, request: &PageRequest) -> ServiceResult<Page<User>> {
        self.record_query();
        let all: Vec<User> = self.users.read().await.values().cloned().collect();
        Ok(Page::slice(&ordered(all, request.descending()), request))
    }

    async fn search(&self, keyword: &str) -> ServiceResult<Vec<User>> {
        self.record_query();
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| {
                contains_ignore_case(&u.username, keyword)
                    || contains_ignore_case(&u.email, keyword)
                    || u
                        .full_name
                        .as_deref()
                        .is_some_and(|name| contains_ignore_case(name, keyword))
            })
            .cloned()
            .collect())
    }

    async fn insert(&self, user: NewUser) -> ServiceResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(ServiceError::Duplicate(format!("username {}", user.username)));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(ServiceError::Duplicate(format!("email {}", user.email)));
        }

        let now = Utc::now();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = User {
            id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            created_at: now,
            updated_at: now,
        };
        users.insert(id, created.clone());
        Ok(created)
    }

    async fn save(&self, user: User) -> ServiceResult<User> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(ServiceError::NotFound(format!("user {}", user.id)));
        }
        if users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(ServiceError::Duplicate(format!("email {}", user.email)));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: u64) -> ServiceResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}

// == In-Memory Post Repository ==
#[derive(Debug, Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<BTreeMap<u64, Post>>,
    next_id: AtomicU64,
    queries: AtomicUsize,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read queries served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }
}

impl PostRepository for InMemoryPostRepository {
    async fn find_by_id(&self, id: u64) -> ServiceResult<Option<Post>> {
        self.record_query();
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn find_page(&self, request: &PageRequest) -> ServiceResult<Page<Post>> {
        self.record_query();
        let all: Vec<Post> = self.posts.read().await.values().cloned().collect();
        Ok(Page::slice(&ordered(all, request.descending()), request))
    }

    async fn find_by_author(&self, author_id: u64) -> ServiceResult<Vec<Post>> {
        self.record_query();
        let posts = self.posts.read().await;
        Ok(posts
            .values()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect())
    }

    async fn search(
        &self,
        keyword: Option<&str>,
        category: Option<&str>,
        author_id: Option<u64>,
    ) -> ServiceResult<Vec<Post>> {
        self.record_query();
        let posts = self.posts.read().await;
        Ok(posts
            .values()
            .filter(|p| {
                keyword.map_or(true, |k| {
                    contains_ignore_case(&p.title, k) || contains_ignore_case(&p.content, k)
                })
            })
            .filter(|p| category.map_or(true, |c| p.category.as_deref() == Some(c)))
            .filter(|p| author_id.map_or(true, |a| p.author_id == a))
            .cloned()
            .collect())
    }

    async fn insert(&self, author_id: u64, post: NewPost) -> ServiceResult<Post> {
        let now = Utc::now();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Post {
            id,
            title: post.title,
            content: post.content,
            category: post.category,
            author_id,
            created_at: now,
            updated_at: now,
        };
        self.posts.write().await.insert(id, created.clone());
        Ok(created)
    }

    async fn save(&self, post: Post) -> ServiceResult<Post> {
        let mut posts = self.posts.write().await;
        if !posts.contains_key(&post.id) {
            return Err(ServiceError::NotFound(format!("post {}", post.id)));
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: u64) -> ServiceResult<bool> {
        Ok(self.posts.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_insert_assigns_ids_and_rejects_duplicates() {
        let repo = InMemoryUserRepository::new();

        let alice = repo.insert(NewUser::new("alice", "alice@example.com")).await.unwrap();
        let bob = repo.insert(NewUser::new("bob", "bob@example.com")).await.unwrap();
        assert_eq!((alice.id, bob.id), (1, 2));

        let dup = repo.insert(NewUser::new("alice", "other@example.com")).await;
        assert!(matches!(dup, Err(ServiceError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_user_search_and_page() {
        let repo = InMemoryUserRepository::new();
        for name in ["alice", "alan", "bob"] {
            repo.insert(NewUser::new(name, format!("{name}@example.com")))
                .await
                .unwrap();
        }

        let found = repo.search("AL").await.unwrap();
        assert_eq!(found.len(), 2);

        let page = repo.find_page(&PageRequest::new(0, 2, "id,desc")).await.unwrap();
        assert_eq!(page.items[0].username, "bob");
        assert_eq!(page.total, 3);
        assert_eq!(repo.query_count(), 2);
    }

    #[tokio::test]
    async fn test_post_search_filters() {
        let repo = InMemoryPostRepository::new();
        repo.insert(1, NewPost::new("Spring tips", "beans").with_category("java"))
            .await
            .unwrap();
        repo.insert(2, NewPost::new("Rust ownership", "borrowing").with_category("rust"))
            .await
            .unwrap();
        repo.insert(1, NewPost::new("Spring boot", "starters")).await.unwrap();

        assert_eq!(repo.search(Some("spring"), None, None).await.unwrap().len(), 2);
        assert_eq!(repo.search(Some("spring"), Some("java"), None).await.unwrap().len(), 1);
        assert_eq!(repo.search(None, None, Some(2)).await.unwrap().len(), 1);
        assert_eq!(repo.find_by_author(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_post_save_missing() {
        let repo = InMemoryPostRepository::new();
        let created = repo.insert(1, NewPost::new("t", "c")).await.unwrap();
        repo.delete(created.id).await.unwrap();

        let result = repo.save(created).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
