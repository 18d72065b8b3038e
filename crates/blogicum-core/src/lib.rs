//! # Blogicum Core
//!
//! The domain layer of the blog.
//! Entities, the visibility and permission rules, listing assembly and
//! pagination live here with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod listing;
pub mod pagination;
pub mod policy;
pub mod ports;

pub use error::{DomainError, RepoError};
