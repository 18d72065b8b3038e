use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Author, Category, Id, Location, UNSAVED_ID};

/// Post entity - a blog publication.
///
/// A `pub_date` in the future makes the post scheduled: it stays hidden from
/// everyone but its author until that moment passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Id,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author_id: Id,
    pub category_id: Option<Id>,
    pub location_id: Option<Id>,
    pub image: Option<String>,
}

impl Post {
    /// Create a new, unsaved and published post.
    pub fn new(author_id: Id, title: String, text: String, pub_date: DateTime<Utc>) -> Self {
        Self {
            id: UNSAVED_ID,
            title,
            text,
            pub_date,
            is_published: true,
            created_at: Utc::now(),
            author_id,
            category_id: None,
            location_id: None,
            image: None,
        }
    }

    /// Whether the publication date has been reached at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.pub_date <= now
    }
}

/// A post together with everything a listing or detail page shows about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub post: Post,
    pub author: Author,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: u64,
}
