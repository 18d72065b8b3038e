//! Data Transfer Objects - the page contexts the server renders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::forms::{CommentForm, PostForm, ProfileForm};

/// Public reference to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    pub id: i32,
    pub name: String,
}

/// A post as shown in listings and on its detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i32,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author: AuthorResponse,
    pub category: Option<CategoryResponse>,
    pub location: Option<LocationResponse>,
    pub image: Option<String>,
    pub comment_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i32,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorResponse,
    pub post_id: i32,
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub num_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// `GET /posts/{id}/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub comments: PageResponse<CommentResponse>,
    pub form: CommentForm,
}

/// `GET /category/{slug}/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPageResponse {
    pub category: CategoryResponse,
    pub posts: PageResponse<PostResponse>,
}

/// Public profile information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub date_joined: DateTime<Utc>,
}

/// `GET /profile/{username}/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePageResponse {
    pub profile: ProfileResponse,
    pub posts: PageResponse<PostResponse>,
}

/// Context of the create/edit post form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormContext {
    pub form: PostForm,
    pub categories: Vec<CategoryResponse>,
    pub locations: Vec<LocationResponse>,
}

/// Context of the edit comment form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentFormContext {
    pub comment: CommentResponse,
    pub form: CommentForm,
}

/// Context of the edit profile form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileFormContext {
    pub form: ProfileForm,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// The authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
}
