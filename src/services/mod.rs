//! Services Module
//!
//! User and post operations wired through the cache: every read goes
//! through a region, every mutation evicts what it invalidates before it
//! returns.
//!
//! # Regions
//! - `userProfile`, `userByUsername`, `userByEmail`: single users
//! - `allUsers`, `userSearch`: user lists, pages and searches
//! - `post`: single posts
//! - `postList`, `postSearch`: post pages, per-author lists and searches

mod error;
pub mod keys;
mod models;
mod post_service;
mod repository;
mod user_service;

pub use error::{ServiceError, ServiceResult};
pub use models::{NewPost, NewUser, Page, PageRequest, Post, PostUpdate, User, UserUpdate};
pub use post_service::PostService;
pub use repository::{
    InMemoryPostRepository, InMemoryUserRepository, PostRepository, UserRepository,
};
pub use user_service::UserService;
