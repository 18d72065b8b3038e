//! In-memory implementation of every repository.
//!
//! Used when no database is configured and by the HTTP tests. Enforces the
//! same unique, foreign-key and cascade rules as the PostgreSQL schema.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use blogicum_core::domain::{
    Author, Category, Comment, CommentView, Id, Location, Post, PostSummary, UNSAVED_ID, User,
};
use blogicum_core::error::RepoError;
use blogicum_core::listing::{PostQuery, listing_order};
use blogicum_core::pagination::{Page, PageRequest};
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};

/// Rows of one table plus its id sequence.
struct Table<T> {
    rows: BTreeMap<Id, T>,
    last_id: Id,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: UNSAVED_ID,
        }
    }
}

impl<T: Clone> Table<T> {
    fn get(&self, id: Id) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn contains(&self, id: Id) -> bool {
        self.rows.contains_key(&id)
    }

    /// Insert under a fresh id, or replace the row with `id`.
    fn save(&mut self, id: Id, mut row: T, set_id: fn(&mut T, Id)) -> Result<T, RepoError> {
        let id = if id == UNSAVED_ID {
            self.last_id += 1;
            set_id(&mut row, self.last_id);
            self.last_id
        } else if self.rows.contains_key(&id) {
            id
        } else {
            return Err(RepoError::NotFound);
        };
        self.rows.insert(id, row.clone());
        Ok(row)
    }

    fn remove(&mut self, id: Id) -> Result<T, RepoError> {
        self.rows.remove(&id).ok_or(RepoError::NotFound)
    }
}

#[derive(Default)]
struct Tables {
    users: Table<User>,
    categories: Table<Category>,
    locations: Table<Location>,
    posts: Table<Post>,
    comments: Table<Comment>,
}

impl Tables {
    fn author(&self, id: Id) -> Result<Author, RepoError> {
        self.users
            .rows
            .get(&id)
            .map(User::as_author)
            .ok_or_else(|| RepoError::Query(format!("user {id} does not exist")))
    }

    fn category_of(&self, post: &Post) -> Option<&Category> {
        post.category_id.and_then(|id| self.categories.rows.get(&id))
    }

    fn comment_count(&self, post_id: Id) -> u64 {
        self.comments
            .rows
            .values()
            .filter(|c| c.post_id == post_id)
            .count() as u64
    }

    fn summary(&self, post: &Post) -> Result<PostSummary, RepoError> {
        Ok(PostSummary {
            post: post.clone(),
            author: self.author(post.author_id)?,
            category: self.category_of(post).cloned(),
            location: post
                .location_id
                .and_then(|id| self.locations.rows.get(&id).cloned()),
            comment_count: self.comment_count(post.id),
        })
    }

    fn delete_post_cascade(&mut self, post_id: Id) {
        self.comments.rows.retain(|_, c| c.post_id != post_id);
        self.posts.rows.remove(&post_id);
    }
}

/// Thread-safe in-memory store; clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn foreign_key(table: &str, id: Id) -> RepoError {
    RepoError::Constraint(format!("{table} {id} does not exist"))
}

#[async_trait]
impl BaseRepository<User, Id> for InMemoryStore {
    async fn find_by_id(&self, id: Id) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(id))
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .users
            .rows
            .values()
            .any(|u| u.username == user.username && u.id != user.id);
        if taken {
            return Err(RepoError::Constraint(format!(
                "username {} already exists",
                user.username
            )));
        }
        tables.users.save(user.id, user, |u, id| u.id = id)
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.users.remove(id)?;

        let owned: Vec<Id> = tables
            .posts
            .rows
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            tables.delete_post_cascade(post_id);
        }
        tables.comments.rows.retain(|_, c| c.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl BaseRepository<Category, Id> for InMemoryStore {
    async fn find_by_id(&self, id: Id) -> Result<Option<Category>, RepoError> {
        Ok(self.tables.read().await.categories.get(id))
    }

    async fn save(&self, category: Category) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .categories
            .rows
            .values()
            .any(|c| c.slug == category.slug && c.id != category.id);
        if taken {
            return Err(RepoError::Constraint(format!(
                "slug {} already exists",
                category.slug
            )));
        }
        tables.categories.save(category.id, category, |c, id| c.id = id)
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.categories.remove(id)?;
        for post in tables.posts.rows.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .rows
            .values()
            .find(|c| c.slug == slug && c.is_published)
            .cloned())
    }

    async fn list_published(&self) -> Result<Vec<Category>, RepoError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables
            .categories
            .rows
            .values()
            .filter(|c| c.is_published)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }
}

#[async_trait]
impl BaseRepository<Location, Id> for InMemoryStore {
    async fn find_by_id(&self, id: Id) -> Result<Option<Location>, RepoError> {
        Ok(self.tables.read().await.locations.get(id))
    }

    async fn save(&self, location: Location) -> Result<Location, RepoError> {
        let mut tables = self.tables.write().await;
        tables.locations.save(location.id, location, |l, id| l.id = id)
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.locations.remove(id)?;
        for post in tables.posts.rows.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn list_published(&self) -> Result<Vec<Location>, RepoError> {
        let tables = self.tables.read().await;
        let mut locations: Vec<Location> = tables
            .locations
            .rows
            .values()
            .filter(|l| l.is_published)
            .cloned()
            .collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }
}

#[async_trait]
impl BaseRepository<Post, Id> for InMemoryStore {
    async fn find_by_id(&self, id: Id) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(id))
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains(post.author_id) {
            return Err(foreign_key("user", post.author_id));
        }
        if let Some(id) = post.category_id.filter(|id| !tables.categories.contains(*id)) {
            return Err(foreign_key("category", id));
        }
        if let Some(id) = post.location_id.filter(|id| !tables.locations.contains(*id)) {
            return Err(foreign_key("location", id));
        }
        tables.posts.save(post.id, post, |p, id| p.id = id)
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains(id) {
            return Err(RepoError::NotFound);
        }
        tables.delete_post_cascade(id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_summary(&self, id: Id) -> Result<Option<PostSummary>, RepoError> {
        let tables = self.tables.read().await;
        tables
            .posts
            .rows
            .get(&id)
            .map(|post| tables.summary(post))
            .transpose()
    }

    async fn list(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        let tables = self.tables.read().await;

        let mut matching: Vec<&Post> = tables
            .posts
            .rows
            .values()
            .filter(|post| query.matches(post, tables.category_of(post)))
            .collect();
        matching.sort_by(|a, b| listing_order(a, b));

        let page = Page::from_vec(matching, page).ok_or(RepoError::NotFound)?;
        let items = page
            .items
            .iter()
            .map(|post| tables.summary(post))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, page.number, page.size, page.total_items))
    }
}

#[async_trait]
impl BaseRepository<Comment, Id> for InMemoryStore {
    async fn find_by_id(&self, id: Id) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(id))
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains(comment.post_id) {
            return Err(foreign_key("post", comment.post_id));
        }
        if !tables.users.contains(comment.author_id) {
            return Err(foreign_key("user", comment.author_id));
        }
        tables.comments.save(comment.id, comment, |c, id| c.id = id)
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.comments.remove(id).map(|_| ())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_for_post(
        &self,
        post_id: Id,
        page: PageRequest,
    ) -> Result<Page<CommentView>, RepoError> {
        let tables = self.tables.read().await;

        let mut comments: Vec<&Comment> = tables
            .comments
            .rows
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));

        let page = Page::from_vec(comments, page).ok_or(RepoError::NotFound)?;
        let items = page
            .items
            .iter()
            .map(|comment| {
                Ok(CommentView {
                    comment: (*comment).clone(),
                    author: tables.author(comment.author_id)?,
                })
            })
            .collect::<Result<Vec<_>, RepoError>>()?;

        Ok(Page::new(items, page.number, page.size, page.total_items))
    }
}
