//! Cache keys for users and posts.

use crate::cache::CacheKeyBuilder;
use crate::error::Result;
use crate::services::PageRequest;

const USER: &str = "user";
const POST: &str = "post";

pub mod user {
    use super::*;

    pub fn profile(id: u64) -> String {
        CacheKeyBuilder::tagged(USER, "profile", id)
    }

    pub fn by_username(username: &str) -> String {
        CacheKeyBuilder::tagged(USER, "username", username)
    }

    pub fn by_email(email: &str) -> String {
        CacheKeyBuilder::tagged(USER, "email", email)
    }

    pub fn all() -> String {
        CacheKeyBuilder::simple(USER, "all")
    }

    pub fn search(keyword: &str) -> String {
        CacheKeyBuilder::tagged(USER, "search", keyword)
    }

    pub fn page(request: &PageRequest) -> Result<String> {
        CacheKeyBuilder::page(USER, request.page, request.size, &request.sort)
    }
}

pub mod post {
    use super::*;

    pub fn by_id(id: u64) -> String {
        CacheKeyBuilder::tagged(POST, "id", id)
    }

    pub fn by_author(author_id: u64) -> String {
        CacheKeyBuilder::tagged(POST, "author", author_id)
    }

    pub fn search(keyword: Option<&str>, category: Option<&str>, author_id: Option<u64>) -> String {
        CacheKeyBuilder::search(POST, keyword, category, author_id)
    }

    pub fn page(request: &PageRequest) -> Result<String> {
        CacheKeyBuilder::page(POST, request.page, request.size, &request.sort)
    }
}
