//! PostgreSQL repository implementations.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DbConn, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select,
};

use blogicum_core::domain::{
    Author, Category, CommentView, Id, Location, Post, PostSummary, User,
};
use blogicum_core::error::RepoError;
use blogicum_core::listing::{PostQuery, PostScope};
use blogicum_core::pagination::{Page, PageRequest};
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};

use super::entity::{category, comment, location, post, user};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<user::Entity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<category::Entity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<location::Entity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<post::Entity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<comment::Entity>;

/// Every repository over one shared connection pool.
pub struct PostgresRepositories {
    pub users: PostgresUserRepository,
    pub categories: PostgresCategoryRepository,
    pub locations: PostgresLocationRepository,
    pub posts: PostgresPostRepository,
    pub comments: PostgresCommentRepository,
}

impl PostgresRepositories {
    pub fn new(db: DbConn) -> Self {
        Self {
            users: PostgresBaseRepository::new(db.clone()),
            categories: PostgresBaseRepository::new(db.clone()),
            locations: PostgresBaseRepository::new(db.clone()),
            posts: PostgresBaseRepository::new(db.clone()),
            comments: PostgresBaseRepository::new(db),
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(%username, "Finding user by username");

        let result = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .filter(category::Column::IsPublished.eq(true))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_published(&self) -> Result<Vec<Category>, RepoError> {
        let result = category::Entity::find()
            .filter(category::Column::IsPublished.eq(true))
            .order_by_asc(category::Column::Title)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn list_published(&self) -> Result<Vec<Location>, RepoError> {
        let result = location::Entity::find()
            .filter(location::Column::IsPublished.eq(true))
            .order_by_asc(location::Column::Name)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// A post row annotated with its comment count.
#[derive(Debug, Clone, FromQueryResult)]
struct PostRow {
    id: i32,
    title: String,
    text: String,
    pub_date: sea_orm::prelude::DateTimeWithTimeZone,
    is_published: bool,
    created_at: sea_orm::prelude::DateTimeWithTimeZone,
    author_id: i32,
    category_id: Option<i32>,
    location_id: Option<i32>,
    image: Option<String>,
    comment_count: i64,
}

impl PostRow {
    fn into_parts(self) -> (Post, u64) {
        let count = u64::try_from(self.comment_count).unwrap_or_default();
        let post = Post {
            id: self.id,
            title: self.title,
            text: self.text,
            pub_date: self.pub_date.into(),
            is_published: self.is_published,
            created_at: self.created_at.into(),
            author_id: self.author_id,
            category_id: self.category_id,
            location_id: self.location_id,
            image: self.image,
        };
        (post, count)
    }
}

/// Posts with their comment counts, without any filtering.
fn annotated_posts() -> Select<post::Entity> {
    post::Entity::find()
        .column_as(comment::Column::Id.count(), "comment_count")
        .join(JoinType::LeftJoin, post::Relation::Comment.def())
        .group_by(post::Column::Id)
}

/// Apply a listing query: scope, visibility at a moment, and listing order.
fn apply_query(select: Select<post::Entity>, query: &PostQuery) -> Select<post::Entity> {
    let select = match query.scope {
        PostScope::All => select,
        PostScope::Category(id) => select.filter(post::Column::CategoryId.eq(id)),
        PostScope::Author(id) => select.filter(post::Column::AuthorId.eq(id)),
    };

    let select = match query.visible_at {
        Some(now) => publicly_visible(select, now),
        None => select,
    };

    select
        .order_by_desc(post::Column::PubDate)
        .order_by_desc(post::Column::Id)
}

/// The inner join drops posts without a category.
fn publicly_visible(select: Select<post::Entity>, now: DateTime<Utc>) -> Select<post::Entity> {
    select
        .join(JoinType::InnerJoin, post::Relation::Category.def())
        .filter(post::Column::IsPublished.eq(true))
        .filter(category::Column::IsPublished.eq(true))
        .filter(post::Column::PubDate.lte(now))
}

impl PostgresPostRepository {
    /// Attach authors, categories and locations with one query per table.
    async fn hydrate(&self, rows: Vec<PostRow>) -> Result<Vec<PostSummary>, RepoError> {
        let parts: Vec<(Post, u64)> = rows.into_iter().map(PostRow::into_parts).collect();

        let author_ids: HashSet<Id> = parts.iter().map(|(p, _)| p.author_id).collect();
        let category_ids: HashSet<Id> = parts.iter().filter_map(|(p, _)| p.category_id).collect();
        let location_ids: HashSet<Id> = parts.iter().filter_map(|(p, _)| p.location_id).collect();

        let authors = load_authors(&self.db, author_ids).await?;

        let categories: HashMap<Id, Category> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            category::Entity::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(&self.db)
                .await
                .map_err(map_db_err)?
                .into_iter()
                .map(|m| (m.id, m.into()))
                .collect()
        };

        let locations: HashMap<Id, Location> = if location_ids.is_empty() {
            HashMap::new()
        } else {
            location::Entity::find()
                .filter(location::Column::Id.is_in(location_ids))
                .all(&self.db)
                .await
                .map_err(map_db_err)?
                .into_iter()
                .map(|m| (m.id, m.into()))
                .collect()
        };

        parts
            .into_iter()
            .map(|(post, comment_count)| {
                let author = authors.get(&post.author_id).cloned().ok_or_else(|| {
                    RepoError::Query(format!("post {} has no author row", post.id))
                })?;
                Ok(PostSummary {
                    category: post.category_id.and_then(|id| categories.get(&id).cloned()),
                    location: post.location_id.and_then(|id| locations.get(&id).cloned()),
                    author,
                    comment_count,
                    post,
                })
            })
            .collect()
    }
}

async fn load_authors(db: &DbConn, ids: HashSet<Id>) -> Result<HashMap<Id, Author>, RepoError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(map_db_err)?;

    Ok(users
        .into_iter()
        .map(|m| {
            (
                m.id,
                Author {
                    id: m.id,
                    username: m.username,
                },
            )
        })
        .collect())
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_summary(&self, id: Id) -> Result<Option<PostSummary>, RepoError> {
        let row = annotated_posts()
            .filter(post::Column::Id.eq(id))
            .into_model::<PostRow>()
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        let paginator = apply_query(annotated_posts(), query)
            .into_model::<PostRow>()
            .paginate(&self.db, page.size);

        let total = paginator.num_items().await.map_err(map_db_err)?;
        let number = page.resolve(total).ok_or(RepoError::NotFound)?;
        tracing::debug!(?query, total, number, "Listing posts");

        let rows = paginator
            .fetch_page(number - 1)
            .await
            .map_err(map_db_err)?;
        let items = self.hydrate(rows).await?;

        Ok(Page::new(items, number, page.size, total))
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(
        &self,
        post_id: Id,
        page: PageRequest,
    ) -> Result<Page<CommentView>, RepoError> {
        let paginator = comment::Entity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .paginate(&self.db, page.size);

        let total = paginator.num_items().await.map_err(map_db_err)?;
        let number = page.resolve(total).ok_or(RepoError::NotFound)?;

        let models = paginator
            .fetch_page(number - 1)
            .await
            .map_err(map_db_err)?;
        let authors = load_authors(&self.db, models.iter().map(|m| m.author_id).collect()).await?;

        let items = models
            .into_iter()
            .map(|model| {
                let author = authors.get(&model.author_id).cloned().ok_or_else(|| {
                    RepoError::Query(format!("comment {} has no author row", model.id))
                })?;
                Ok(CommentView {
                    comment: model.into(),
                    author,
                })
            })
            .collect::<Result<Vec<_>, RepoError>>()?;

        Ok(Page::new(items, number, page.size, total))
    }
}
