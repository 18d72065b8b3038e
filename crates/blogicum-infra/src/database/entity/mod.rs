//! SeaORM entities for the blog tables.

pub mod category;
pub mod comment;
pub mod location;
pub mod post;
pub mod user;

use sea_orm::ActiveValue::{self, NotSet, Unchanged};

use blogicum_core::domain::{Id, UNSAVED_ID};

/// Primary key value for an active model: left to the sequence on insert,
/// kept as the lookup key on update.
pub(crate) fn primary_key(id: Id) -> ActiveValue<Id> {
    if id == UNSAVED_ID { NotSet } else { Unchanged(id) }
}
