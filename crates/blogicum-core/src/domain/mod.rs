//! Domain entities - the core business objects.

mod category;
mod comment;
mod location;
mod post;
mod user;

pub use category::Category;
pub use comment::{Comment, CommentView};
pub use location::Location;
pub use post::{Post, PostSummary};
pub use user::{Author, User};

/// Identifier of a persisted entity; `0` until the repository assigns one.
pub type Id = i32;

/// Placeholder id carried by entities that have not been saved yet.
pub const UNSAVED_ID: Id = 0;
