//! # Blogicum Shared
//!
//! Wire types shared between the server and its clients: submitted forms,
//! page contexts and error documents.
//! Kept free of server dependencies so a frontend can compile it too.

pub mod dto;
pub mod forms;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
