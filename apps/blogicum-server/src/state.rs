//! Application state - shared across all handlers.

use std::sync::Arc;

use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use blogicum_infra::{DatabaseConfig, InMemoryStore};

#[cfg(feature = "postgres")]
use blogicum_infra::PostgresRepositories;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    /// Posts (and comments) per listing page.
    pub page_size: u64,
}

impl AppState {
    /// State backed by one in-memory store.
    pub fn in_memory(store: InMemoryStore, page_size: u64) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            categories: store.clone(),
            locations: store.clone(),
            posts: store.clone(),
            comments: store,
            page_size,
        }
    }

    #[cfg(feature = "postgres")]
    fn postgres(repos: PostgresRepositories, page_size: u64) -> Self {
        Self {
            users: Arc::new(repos.users),
            categories: Arc::new(repos.categories),
            locations: Arc::new(repos.locations),
            posts: Arc::new(repos.posts),
            comments: Arc::new(repos.comments),
            page_size,
        }
    }

    /// Build the application state with appropriate implementations.
    pub async fn new(db_config: Option<&DatabaseConfig>, page_size: u64) -> Self {
        #[cfg(feature = "postgres")]
        if let Some(config) = db_config {
            match blogicum_infra::database::connect(config).await {
                Ok(conn) => {
                    tracing::info!("Application state initialized (postgres)");
                    return Self::postgres(PostgresRepositories::new(conn), page_size);
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "Failed to connect to database. Using in-memory fallback."
                    );
                }
            }
        } else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }

        #[cfg(not(feature = "postgres"))]
        if db_config.is_some() {
            tracing::warn!("Built without postgres feature - ignoring DATABASE_URL");
        }

        tracing::info!("Application state initialized (in-memory)");
        Self::in_memory(InMemoryStore::new(), page_size)
    }
}
