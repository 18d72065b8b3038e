use async_trait::async_trait;

use crate::domain::{Category, Comment, CommentView, Id, Location, Post, PostSummary, User};
use crate::error::RepoError;
use crate::listing::PostQuery;
use crate::pagination::{Page, PageRequest};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity: insert it when its id is unassigned, update it otherwise.
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, cascading to whatever it owns.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Id> {
    /// Find a user by their unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Category repository.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Id> {
    /// Find a category by slug, only if it is published.
    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    /// All published categories, by title.
    async fn list_published(&self) -> Result<Vec<Category>, RepoError>;
}

/// Location repository.
#[async_trait]
pub trait LocationRepository: BaseRepository<Location, Id> {
    /// All published locations, by name.
    async fn list_published(&self) -> Result<Vec<Location>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Id> {
    /// Load a post with its author, category, location and comment count.
    /// No visibility rule is applied.
    async fn find_summary(&self, id: Id) -> Result<Option<PostSummary>, RepoError>;

    /// One page of a listing, in listing order.
    ///
    /// Fails with [`RepoError::NotFound`] when the page lies past the end.
    async fn list(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Id> {
    /// One page of a post's comments, oldest first.
    async fn list_for_post(
        &self,
        post_id: Id,
        page: PageRequest,
    ) -> Result<Page<CommentView>, RepoError>;
}
