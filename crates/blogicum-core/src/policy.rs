//! Visibility and permission rules for posts and comments.
//!
//! Handlers fetch the object once and hand it to these predicates; nothing
//! here touches storage.

use chrono::{DateTime, Utc};

use crate::domain::{Category, Comment, Id, Post};

/// Whether anyone may read `post` at `now`.
///
/// A post without a category is never public.
pub fn is_publicly_visible(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published && category.is_some_and(|c| c.is_published) && post.is_due(now)
}

/// Whether `viewer` may read `post` at `now`. Authors always see their own posts.
pub fn can_view(
    post: &Post,
    category: Option<&Category>,
    viewer: Option<Id>,
    now: DateTime<Utc>,
) -> bool {
    viewer == Some(post.author_id) || is_publicly_visible(post, category, now)
}

/// Entities owned by a single author.
pub trait Authored {
    fn author_id(&self) -> Id;
}

impl Authored for Post {
    fn author_id(&self) -> Id {
        self.author_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> Id {
        self.author_id
    }
}

/// Whether `viewer` may edit or delete `entity`. Only the author may.
pub fn can_modify<T: Authored + ?Sized>(entity: &T, viewer: Id) -> bool {
    entity.author_id() == viewer
}
