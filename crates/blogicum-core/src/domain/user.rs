use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Id, UNSAVED_ID};

/// User entity - an account that can author posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Create a new, unsaved user.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: UNSAVED_ID,
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            password_hash,
            date_joined: Utc::now(),
        }
    }

    /// Display name, falling back to the username when no name is set.
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    pub fn as_author(&self) -> Author {
        Author {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// The public face of a user attached to posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Id,
    pub username: String,
}
