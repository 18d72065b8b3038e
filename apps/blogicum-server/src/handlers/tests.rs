use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;

use blogicum_core::domain::{Category, Comment, Id, Post, User};
use blogicum_core::pagination::{PAGE_SIZE, PageRequest};
use blogicum_core::ports::{
    BaseRepository, CommentRepository, PasswordService, RateLimiter, TokenService,
    UserRepository,
};
use blogicum_infra::{
    Argon2PasswordService, InMemoryRateLimiter, InMemoryStore, JwtConfig, JwtTokenService,
    RateLimitConfig,
};

use super::{configure_routes, not_found};
use crate::state::AppState;

struct Fixture {
    store: InMemoryStore,
    tokens: Arc<dyn TokenService>,
    limiter: Arc<dyn RateLimiter>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_rate_limit(100)
    }

    fn with_rate_limit(max_requests: u32) -> Self {
        let tokens = JwtTokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
            issuer: "blogicum-test".to_string(),
        });
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
        })
        .unwrap();

        Self {
            store: InMemoryStore::new(),
            tokens: Arc::new(tokens),
            limiter: Arc::new(limiter),
        }
    }

    /// A stored user and a bearer header for them.
    async fn user(&self, username: &str) -> (User, String) {
        let user = self
            .store
            .save(User::new(
                username.to_string(),
                format!("{username}@example.com"),
                "unused".to_string(),
            ))
            .await
            .unwrap();
        let token = self.tokens.generate_token(user.id, &user.username).unwrap();
        (user, format!("Bearer {token}"))
    }

    async fn category(&self, slug: &str, is_published: bool) -> Category {
        let mut category = Category::new(slug.to_string(), String::new(), slug.to_string());
        category.is_published = is_published;
        self.store.save(category).await.unwrap()
    }

    async fn post(&self, author: &User, category: &Category, pub_date: DateTime<Utc>) -> Post {
        let mut post = Post::new(author.id, "Title".into(), "Text".into(), pub_date);
        post.category_id = Some(category.id);
        self.store.save(post).await.unwrap()
    }

    async fn stored_post(&self, id: Id) -> Option<Post> {
        BaseRepository::<Post, Id>::find_by_id(&self.store, id)
            .await
            .unwrap()
    }

    async fn stored_comment(&self, id: Id) -> Option<Comment> {
        BaseRepository::<Comment, Id>::find_by_id(&self.store, id)
            .await
            .unwrap()
    }
}

macro_rules! app {
    ($fixture:expr) => {{
        let password_service: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::in_memory(
                    $fixture.store.clone(),
                    PAGE_SIZE,
                )))
                .app_data(web::Data::new($fixture.tokens.clone()))
                .app_data(web::Data::new(password_service))
                .app_data(web::Data::new($fixture.limiter.clone()))
                .configure(configure_routes)
                .default_service(web::to(not_found)),
        )
        .await
    }};
}

fn location(resp: &actix_web::dev::ServiceResponse) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn hour() -> TimeDelta {
    TimeDelta::hours(1)
}

#[actix_web::test]
async fn test_scheduled_post_hidden_from_anonymous_but_not_author() {
    let fx = Fixture::new();
    let (alice, alice_auth) = fx.user("alice").await;
    let travel = fx.category("travel", true).await;
    let post = fx.post(&alice, &travel, Utc::now() + hour()).await;
    let app = app!(fx);

    let uri = format!("/posts/{}/", post.id);
    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, alice_auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["post"]["id"], post.id);
}

#[actix_web::test]
async fn test_hidden_category_page_and_feed() {
    let fx = Fixture::new();
    let (alice, _) = fx.user("alice").await;
    let hidden = fx.category("hidden", false).await;
    let open = fx.category("open", true).await;
    fx.post(&alice, &hidden, Utc::now() - hour()).await;
    let visible = fx.post(&alice, &open, Utc::now() - hour()).await;
    let app = app!(fx);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/category/hidden/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], visible.id);
}

#[actix_web::test]
async fn test_category_page_lists_its_posts() {
    let fx = Fixture::new();
    let (alice, _) = fx.user("alice").await;
    let travel = fx.category("travel", true).await;
    let food = fx.category("food", true).await;
    let trip = fx.post(&alice, &travel, Utc::now() - hour()).await;
    fx.post(&alice, &food, Utc::now() - hour()).await;
    let app = app!(fx);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/category/travel/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["category"]["slug"], "travel");
    let items = body["data"]["posts"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], trip.id);
}

#[actix_web::test]
async fn test_feed_second_page_holds_remainder() {
    let fx = Fixture::new();
    let (alice, _) = fx.user("alice").await;
    let travel = fx.category("travel", true).await;
    for minutes in 1..=15 {
        fx.post(&alice, &travel, Utc::now() - TimeDelta::minutes(minutes))
            .await;
    }
    let app = app!(fx);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/?page=2").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["num_pages"], 2);
    assert_eq!(body["data"]["has_previous"], true);
    assert_eq!(body["data"]["has_next"], false);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/?page=last").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["page"], 2);

    for uri in ["/?page=3", "/?page=0", "/?page=abc"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_web::test]
async fn test_comment_records_author_post_and_time() {
    let fx = Fixture::new();
    let (bob, _) = fx.user("bob").await;
    let (_, alice_auth) = fx.user("alice").await;
    let travel = fx.category("travel", true).await;
    let post = fx.post(&bob, &travel, Utc::now() - hour()).await;
    let app = app!(fx);

    let before = Utc::now();
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header((header::AUTHORIZATION, alice_auth))
        .set_form([("text", "Lovely trip")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let comments = fx
        .store
        .list_for_post(post.id, PageRequest::first(PAGE_SIZE))
        .await
        .unwrap();
    assert_eq!(comments.items.len(), 1);
    let view = &comments.items[0];
    assert_eq!(view.author.username, "alice");
    assert_eq!(view.comment.post_id, post.id);
    assert_eq!(view.comment.text, "Lovely trip");
    assert!(view.comment.created_at >= before && view.comment.created_at <= Utc::now());
}

#[actix_web::test]
async fn test_comment_on_invisible_post_is_not_found() {
    let fx = Fixture::new();
    let (bob, _) = fx.user("bob").await;
    let (_, alice_auth) = fx.user("alice").await;
    let travel = fx.category("travel", true).await;
    let post = fx.post(&bob, &travel, Utc::now() + hour()).await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header((header::AUTHORIZATION, alice_auth))
        .set_form([("text", "First!")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_anonymous_cannot_create_post() {
    let fx = Fixture::new();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .set_form([("title", "T")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_create_post_redirects_to_profile() {
    let fx = Fixture::new();
    let (alice, alice_auth) = fx.user("alice").await;
    let travel = fx.category("travel", true).await;
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri("/posts/create/")
        .insert_header((header::AUTHORIZATION, alice_auth.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["categories"][0]["slug"], "travel");
    assert!(!body["data"]["form"]["pub_date"].as_str().unwrap().is_empty());

    let category_id = travel.id.to_string();
    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header((header::AUTHORIZATION, alice_auth))
        .set_form([
            ("title", "Sea"),
            ("text", "Went to the sea"),
            ("pub_date", "2024-05-01T12:30"),
            ("category", category_id.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/profile/alice/");

    let post = fx.stored_post(1).await.unwrap();
    assert_eq!(post.author_id, alice.id);
    assert_eq!(post.title, "Sea");
    assert!(post.is_published);
    assert_eq!(post.category_id, Some(travel.id));
}

#[actix_web::test]
async fn test_invalid_post_form_is_unprocessable() {
    let fx = Fixture::new();
    let (_, alice_auth) = fx.user("alice").await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header((header::AUTHORIZATION, alice_auth))
        .set_form([
            ("title", "Sea"),
            ("text", "Went to the sea"),
            ("pub_date", "2024-05-01T12:30"),
            ("category", "999"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"][0].as_str().unwrap().starts_with("category:"));
}

#[actix_web::test]
async fn test_non_author_edit_and_delete_redirect_without_changes() {
    let fx = Fixture::new();
    let (alice, _) = fx.user("alice").await;
    let (_, bob_auth) = fx.user("bob").await;
    let travel = fx.category("travel", true).await;
    let post = fx.post(&alice, &travel, Utc::now() - hour()).await;
    let app = app!(fx);
    let detail = format!("/posts/{}/", post.id);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header((header::AUTHORIZATION, bob_auth.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), detail);

    let category_id = travel.id.to_string();
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header((header::AUTHORIZATION, bob_auth.clone()))
        .set_form([
            ("title", "Hijacked"),
            ("text", "Hijacked"),
            ("pub_date", "2024-05-01T12:30"),
            ("category", category_id.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), detail);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete/", post.id))
        .insert_header((header::AUTHORIZATION, bob_auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), detail);

    let stored = fx.stored_post(post.id).await.unwrap();
    assert_eq!(stored.title, "Title");
}

#[actix_web::test]
async fn test_anonymous_edit_and_delete_redirect_to_post() {
    let fx = Fixture::new();
    let (alice, _) = fx.user("alice").await;
    let travel = fx.category("travel", true).await;
    let post = fx.post(&alice, &travel, Utc::now() - hour()).await;
    let app = app!(fx);
    let detail = format!("/posts/{}/", post.id);

    for uri in [
        format!("/posts/{}/edit/", post.id),
        format!("/posts/{}/delete/", post.id),
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "GET {uri}");
        assert_eq!(location(&resp), detail);

        let req = test::TestRequest::post()
            .uri(&uri)
            .set_form([("title", "Hijacked"), ("text", "Hijacked")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "POST {uri}");
        assert_eq!(location(&resp), detail);
    }

    let stored = fx.stored_post(post.id).await.unwrap();
    assert_eq!(stored.title, "Title");
}

#[actix_web::test]
async fn test_anonymous_comment_edit_requires_login() {
    let fx = Fixture::new();
    let (alice, _) = fx.user("alice").await;
    let travel = fx.category("travel", true).await;
    let post = fx.post(&alice, &travel, Utc::now() - hour()).await;
    let comment = fx
        .store
        .save(Comment::new(post.id, alice.id, "Mine".into()))
        .await
        .unwrap();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit_comment/{}/", post.id, comment.id))
        .set_form([("text", "Changed")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(fx.stored_comment(comment.id).await.unwrap().text, "Mine");
}

#[actix_web::test]
async fn test_author_edits_post() {
    let fx = Fixture::new();
    let (alice, alice_auth) = fx.user("alice").await;
    let travel = fx.category("travel", true).await;
    let post = fx.post(&alice, &travel, Utc::now() - hour()).await;
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header((header::AUTHORIZATION, alice_auth.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["form"]["title"], "Title");

    let category_id = travel.id.to_string();
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header((header::AUTHORIZATION, alice_auth))
        .set_form([
            ("title", "Edited"),
            ("text", "New text"),
            ("pub_date", "2024-05-01T12:30"),
            ("category", category_id.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let stored = fx.stored_post(post.id).await.unwrap();
    assert_eq!(stored.title, "Edited");
    assert_eq!(stored.text, "New text");
}

#[actix_web::test]
async fn test_deleting_post_removes_comments() {
    let fx = Fixture::new();
    let (alice, alice_auth) = fx.user("alice").await;
    let travel = fx.category("travel", true).await;
    let post = fx.post(&alice, &travel, Utc::now() - hour()).await;
    let comment = fx
        .store
        .save(Comment::new(post.id, alice.id, "Mine".into()))
        .await
        .unwrap();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete/", post.id))
        .insert_header((header::AUTHORIZATION, alice_auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/profile/alice/");

    assert!(fx.stored_post(post.id).await.is_none());
    assert!(fx.stored_comment(comment.id).await.is_none());
}

#[actix_web::test]
async fn test_comment_edit_and_delete_are_author_only() {
    let fx = Fixture::new();
    let (alice, alice_auth) = fx.user("alice").await;
    let (bob, bob_auth) = fx.user("bob").await;
    let travel = fx.category("travel", true).await;
    let post = fx.post(&alice, &travel, Utc::now() - hour()).await;
    let comment = fx
        .store
        .save(Comment::new(post.id, bob.id, "Original".into()))
        .await
        .unwrap();
    let app = app!(fx);
    let detail = format!("/posts/{}/", post.id);
    let edit_uri = format!("/posts/{}/edit_comment/{}/", post.id, comment.id);
    let delete_uri = format!("/posts/{}/delete_comment/{}/", post.id, comment.id);

    // The post's author is not the comment's author.
    let req = test::TestRequest::post()
        .uri(&edit_uri)
        .insert_header((header::AUTHORIZATION, alice_auth.clone()))
        .set_form([("text", "Changed")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), detail);

    let req = test::TestRequest::post()
        .uri(&delete_uri)
        .insert_header((header::AUTHORIZATION, alice_auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(fx.stored_comment(comment.id).await.unwrap().text, "Original");

    let req = test::TestRequest::get()
        .uri(&edit_uri)
        .insert_header((header::AUTHORIZATION, bob_auth.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["form"]["text"], "Original");
    assert_eq!(body["data"]["comment"]["author"]["username"], "bob");

    let req = test::TestRequest::post()
        .uri(&edit_uri)
        .insert_header((header::AUTHORIZATION, bob_auth.clone()))
        .set_form([("text", "Changed")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), detail);
    assert_eq!(fx.stored_comment(comment.id).await.unwrap().text, "Changed");

    let req = test::TestRequest::post()
        .uri(&delete_uri)
        .insert_header((header::AUTHORIZATION, bob_auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(fx.stored_comment(comment.id).await.is_none());
}

#[actix_web::test]
async fn test_comment_under_wrong_post_is_not_found() {
    let fx = Fixture::new();
    let (alice, alice_auth) = fx.user("alice").await;
    let travel = fx.category("travel", true).await;
    let first = fx.post(&alice, &travel, Utc::now() - hour()).await;
    let second = fx.post(&alice, &travel, Utc::now() - hour()).await;
    let comment = fx
        .store
        .save(Comment::new(first.id, alice.id, "Here".into()))
        .await
        .unwrap();
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit_comment/{}/", second.id, comment.id))
        .insert_header((header::AUTHORIZATION, alice_auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_profile_shows_hidden_posts_only_to_owner() {
    let fx = Fixture::new();
    let (alice, alice_auth) = fx.user("alice").await;
    let (_, bob_auth) = fx.user("bob").await;
    let travel = fx.category("travel", true).await;
    fx.post(&alice, &travel, Utc::now() - hour()).await;
    fx.post(&alice, &travel, Utc::now() + hour()).await;
    let app = app!(fx);

    let count = |body: &Value| body["data"]["posts"]["items"].as_array().unwrap().len();

    let req = test::TestRequest::get()
        .uri("/profile/alice/")
        .insert_header((header::AUTHORIZATION, alice_auth))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(count(&body), 2);
    assert_eq!(body["data"]["profile"]["username"], "alice");

    let req = test::TestRequest::get()
        .uri("/profile/alice/")
        .insert_header((header::AUTHORIZATION, bob_auth))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(count(&body), 1);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/profile/nobody/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_profile_edit() {
    let fx = Fixture::new();
    let (alice, alice_auth) = fx.user("alice").await;
    let (_, bob_auth) = fx.user("bob").await;
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri("/profile/alice/edit/")
        .insert_header((header::AUTHORIZATION, bob_auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/profile/alice/");

    let req = test::TestRequest::post()
        .uri("/profile/alice/edit/")
        .insert_header((header::AUTHORIZATION, alice_auth.clone()))
        .set_form([
            ("username", "bob"),
            ("email", "alice@example.com"),
            ("first_name", ""),
            ("last_name", ""),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/profile/alice/edit/")
        .insert_header((header::AUTHORIZATION, alice_auth))
        .set_form([
            ("username", "alice_l"),
            ("email", "alice@example.com"),
            ("first_name", "Alice"),
            ("last_name", "Liddell"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/profile/alice_l/");

    let renamed = fx.store.find_by_username("alice_l").await.unwrap().unwrap();
    assert_eq!(renamed.id, alice.id);
    assert_eq!(renamed.full_name(), "Alice Liddell");
}

#[actix_web::test]
async fn test_register_login_and_me() {
    let fx = Fixture::new();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/auth/registration/")
        .set_form([
            ("username", "carol"),
            ("email", "carol@example.com"),
            ("password1", "correct-horse"),
            ("password2", "correct-horse"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/profile/carol/");

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "carol"), ("password", "wrong-password")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "carol"), ("password", "correct-horse")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/auth/me/")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["username"], "carol");
}

#[actix_web::test]
async fn test_duplicate_registration_is_unprocessable() {
    let fx = Fixture::new();
    fx.user("carol").await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/auth/registration/")
        .set_form([
            ("username", "carol"),
            ("email", "carol@example.com"),
            ("password1", "correct-horse"),
            ("password2", "correct-horse"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_auth_routes_are_rate_limited() {
    let fx = Fixture::with_rate_limit(1);
    let app = app!(fx);

    let login = || {
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_form([("username", "nobody"), ("password", "whatever")])
            .to_request()
    };

    let resp = test::call_service(&app, login()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(&app, login()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));
}

#[actix_web::test]
async fn test_forwarded_for_does_not_reset_rate_limit() {
    let fx = Fixture::with_rate_limit(1);
    let app = app!(fx);
    let peer: SocketAddr = "192.0.2.7:40000".parse().unwrap();

    let mut statuses = Vec::new();
    for i in 0..5 {
        let req = test::TestRequest::post()
            .uri("/auth/login/")
            .peer_addr(peer)
            .insert_header(("X-Forwarded-For", format!("10.9.9.{i}")))
            .set_form([("username", "nobody"), ("password", "whatever")])
            .to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }

    assert_eq!(statuses[0], StatusCode::UNAUTHORIZED);
    assert!(
        statuses[1..]
            .iter()
            .all(|status| *status == StatusCode::TOO_MANY_REQUESTS)
    );
}

#[actix_web::test]
async fn test_clients_are_limited_by_peer_address() {
    let fx = Fixture::with_rate_limit(1);
    let app = app!(fx);

    for peer in ["192.0.2.7:40000", "192.0.2.8:40000"] {
        let req = test::TestRequest::post()
            .uri("/auth/login/")
            .peer_addr(peer.parse().unwrap())
            .set_form([("username", "nobody"), ("password", "whatever")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{peer}");
    }
}

#[actix_web::test]
async fn test_unknown_route_and_bad_ids_are_not_found() {
    let fx = Fixture::new();
    let app = app!(fx);

    for uri in ["/nowhere/", "/posts/abc/", "/posts/42/"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], 404);
    }
}

#[actix_web::test]
async fn test_health() {
    let fx = Fixture::new();
    let app = app!(fx);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
