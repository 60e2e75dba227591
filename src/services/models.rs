//! Domain records handled by the services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::{ServiceError, ServiceResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
}

impl NewUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            full_name: None,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if self.username.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Username cannot be empty".to_string()));
        }
        validate_email(&self.email)
    }
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub author_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if self.title.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Title cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
}

// == Paging ==
/// Page request as received from callers.
///
/// Values are signed so that negative input reaches key construction and
/// is rejected there instead of wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
    /// `field` or `field,asc|desc`; only the direction is honoured
    pub sort: String,
}

impl PageRequest {
    pub fn new(page: i64, size: i64, sort: impl Into<String>) -> Self {
        Self {
            page,
            size,
            sort: sort.into(),
        }
    }

    pub fn descending(&self) -> bool {
        self.sort
            .rsplit(',')
            .next()
            .is_some_and(|dir| dir.trim().eq_ignore_ascii_case("desc"))
    }

    pub fn offset(&self) -> usize {
        self.page_index().saturating_mul(self.page_size())
    }

    pub fn page_index(&self) -> usize {
        usize::try_from(self.page).unwrap_or(0)
    }

    pub fn page_size(&self) -> usize {
        usize::try_from(self.size).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total: usize,
}

impl<T: Clone> Page<T> {
    /// Cuts the requested page out of an already ordered list.
    pub fn slice(all: &[T], request: &PageRequest) -> Self {
        let items = all
            .iter()
            .skip(request.offset())
            .take(request.page_size())
            .cloned()
            .collect();
        Self {
            items,
            page: request.page_index(),
            size: request.page_size(),
            total: all.len(),
        }
    }
}

fn validate_email(email: &str) -> ServiceResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ServiceError::InvalidInput(format!("Invalid email: {email}"))),
    }
}
