//! Domain objects to page contexts.

use blogicum_core::domain::{Author, Category, CommentView, Location, Post, PostSummary, User};
use blogicum_core::pagination::Page;
use blogicum_shared::dto::{
    AuthorResponse, CategoryResponse, CommentResponse, LocationResponse, PageResponse,
    PostResponse, ProfileResponse,
};
use blogicum_shared::forms::{DATETIME_LOCAL_FORMAT, PostForm, ProfileForm};

pub fn author(author: Author) -> AuthorResponse {
    AuthorResponse {
        id: author.id,
        username: author.username,
    }
}

pub fn category(category: Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        title: category.title,
        description: category.description,
        slug: category.slug,
    }
}

pub fn location(location: Location) -> LocationResponse {
    LocationResponse {
        id: location.id,
        name: location.name,
    }
}

pub fn post(summary: PostSummary) -> PostResponse {
    let PostSummary {
        post,
        author: post_author,
        category: post_category,
        location: post_location,
        comment_count,
    } = summary;

    PostResponse {
        id: post.id,
        title: post.title,
        text: post.text,
        pub_date: post.pub_date,
        is_published: post.is_published,
        created_at: post.created_at,
        author: author(post_author),
        category: post_category.map(category),
        location: post_location.map(location),
        image: post.image,
        comment_count,
    }
}

pub fn comment(view: CommentView) -> CommentResponse {
    CommentResponse {
        id: view.comment.id,
        text: view.comment.text,
        created_at: view.comment.created_at,
        author: author(view.author),
        post_id: view.comment.post_id,
    }
}

pub fn page<T, U>(page: Page<T>, f: impl FnMut(T) -> U) -> PageResponse<U> {
    let has_next = page.has_next();
    let has_previous = page.has_previous();
    let page = page.map(f);

    PageResponse {
        items: page.items,
        page: page.number,
        num_pages: page.num_pages,
        total_items: page.total_items,
        has_next,
        has_previous,
    }
}

pub fn profile(user: &User) -> ProfileResponse {
    ProfileResponse {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        full_name: user.full_name(),
        date_joined: user.date_joined,
    }
}

/// The post form pre-filled with a stored post.
pub fn post_form(post: &Post) -> PostForm {
    let id_field = |id: Option<i32>| id.map(|id| id.to_string()).unwrap_or_default();

    PostForm {
        title: post.title.clone(),
        text: post.text.clone(),
        pub_date: post.pub_date.format(DATETIME_LOCAL_FORMAT).to_string(),
        category: id_field(post.category_id),
        location: id_field(post.location_id),
        image: post.image.clone().unwrap_or_default(),
    }
}

pub fn profile_form(user: &User) -> ProfileForm {
    ProfileForm {
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}
