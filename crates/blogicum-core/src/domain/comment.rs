use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Author, Id, UNSAVED_ID};

/// Comment left on a post. Removed together with its post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Id,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Id,
    pub post_id: Id,
}

impl Comment {
    /// Create a new, unsaved comment stamped with the current time.
    pub fn new(post_id: Id, author_id: Id, text: String) -> Self {
        Self {
            id: UNSAVED_ID,
            text,
            created_at: Utc::now(),
            author_id,
            post_id,
        }
    }
}

/// A comment with its author resolved, as shown under a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub comment: Comment,
    pub author: Author,
}
