//! Post listing assembly for the feed, category and profile pages.
//!
//! A [`PostQuery`] describes which posts a page shows. Repositories translate
//! it into SQL or evaluate it in memory with [`PostQuery::matches`]; both
//! paths order results with [`listing_order`].

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::domain::{Category, Id, Post};
use crate::policy;

/// Which posts a listing draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Category(Id),
    Author(Id),
}

/// A listing: a scope plus the visibility rule applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuery {
    pub scope: PostScope,
    /// `Some(now)` keeps only posts publicly visible at `now`;
    /// `None` keeps hidden and scheduled posts too.
    pub visible_at: Option<DateTime<Utc>>,
}

impl PostQuery {
    /// The global feed: every publicly visible post.
    pub fn feed(now: DateTime<Utc>) -> Self {
        Self {
            scope: PostScope::All,
            visible_at: Some(now),
        }
    }

    /// Publicly visible posts of one category.
    pub fn category(category_id: Id, now: DateTime<Utc>) -> Self {
        Self {
            scope: PostScope::Category(category_id),
            visible_at: Some(now),
        }
    }

    /// Posts of one author. The author browsing their own profile also gets
    /// unpublished and scheduled posts.
    pub fn profile(author_id: Id, viewer: Option<Id>, now: DateTime<Utc>) -> Self {
        let visible_at = if viewer == Some(author_id) {
            None
        } else {
            Some(now)
        };
        Self {
            scope: PostScope::Author(author_id),
            visible_at,
        }
    }

    /// Whether the listing includes hidden posts.
    pub fn includes_hidden(&self) -> bool {
        self.visible_at.is_none()
    }

    /// Evaluate the query against one post and its category.
    pub fn matches(&self, post: &Post, category: Option<&Category>) -> bool {
        let in_scope = match self.scope {
            PostScope::All => true,
            PostScope::Category(id) => post.category_id == Some(id),
            PostScope::Author(id) => post.author_id == id,
        };
        in_scope
            && self
                .visible_at
                .is_none_or(|now| policy::is_publicly_visible(post, category, now))
    }
}

/// Listing order: newest publication date first, then highest id first.
pub fn listing_order(a: &Post, b: &Post) -> Ordering {
    b.pub_date.cmp(&a.pub_date).then_with(|| b.id.cmp(&a.id))
}
