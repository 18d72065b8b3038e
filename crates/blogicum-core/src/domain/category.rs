use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Id, UNSAVED_ID};

/// Category - a publishable grouping of posts.
///
/// Hiding a category hides every post in it from the public, independently
/// of the posts' own publish flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(title: String, description: String, slug: String) -> Self {
        Self {
            id: UNSAVED_ID,
            title,
            description,
            slug,
            is_published: true,
            created_at: Utc::now(),
        }
    }
}
