//! End-to-end flow against a real PostgreSQL. Skipped unless `TEST_DATABASE_URL` is set.

mod common;

use axum::{
    http::{Method, StatusCode},
    Router,
};
use common::{send, settings};
use serde_json::json;
use std::sync::Arc;
use yamdb_api::{
    apply_migrations, build_router, connect, ensure_database_exists, service::UserService, AppState,
    MemoryMailer,
};

struct Harness {
    app: Router,
    mailer: MemoryMailer,
    pool: sqlx::PgPool,
    suffix: String,
}

async fn harness() -> Option<Harness> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let settings = settings(&url);
    ensure_database_exists(&url).await.unwrap();
    let pool = connect(&settings).await.unwrap();
    apply_migrations(&pool).await.unwrap();
    let mailer = MemoryMailer::new();
    let state = AppState::new(pool.clone(), settings).with_mailer(Arc::new(mailer.clone()));
    Some(Harness {
        app: build_router(state),
        mailer,
        pool,
        suffix: uuid::Uuid::new_v4().simple().to_string()[..8].to_string(),
    })
}

impl Harness {
    /// Sign up (or re-request a code) and trade the mailed code for a token.
    async fn login(&self, username: &str, email: &str) -> String {
        let (status, body) = send(
            &self.app,
            Method::POST,
            "/api/v1/auth/signup/",
            None,
            Some(json!({"username": username, "email": email})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body, json!({"username": username, "email": email}));

        let code = self.mailer.last_to(email).unwrap().body;
        let (status, body) = send(
            &self.app,
            Method::POST,
            "/api/v1/auth/token/",
            None,
            Some(json!({"username": username, "confirmation_code": code})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    fn name(&self, base: &str) -> String {
        format!("{}_{}", base, self.suffix)
    }

    async fn admin(&self) -> String {
        let username = self.name("admin");
        let email = format!("{}@example.com", username);
        UserService::create_superuser(&self.pool, &username, &email).await.unwrap();
        self.login(&username, &email).await
    }

    async fn create(&self, token: &str, uri: &str, body: serde_json::Value) -> serde_json::Value {
        let (status, body) = send(&self.app, Method::POST, uri, Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{uri}: {body}");
        body
    }
}

#[tokio::test]
async fn signup_code_is_single_use() {
    let Some(h) = harness().await else { return };
    let username = h.name("once");
    let email = format!("{}@example.com", username);
    h.login(&username, &email).await;

    let stale = h.mailer.last_to(&email).unwrap().body;
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/v1/auth/token/",
        None,
        Some(json!({"username": username, "confirmation_code": stale})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["confirmation_code"].is_array());

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/v1/auth/token/",
        None,
        Some(json!({"username": h.name("ghost"), "confirmation_code": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn signup_rejects_mismatched_email() {
    let Some(h) = harness().await else { return };
    let username = h.name("owner");
    let email = format!("{}@example.com", username);
    h.login(&username, &email).await;

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/v1/auth/signup/",
        None,
        Some(json!({"username": username, "email": "someone-else@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/v1/auth/signup/",
        None,
        Some(json!({"username": h.name("thief"), "email": email})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn users_me_keeps_role() {
    let Some(h) = harness().await else { return };
    let username = h.name("plain");
    let token = h.login(&username, &format!("{}@example.com", username)).await;

    let (status, body) = send(
        &h.app,
        Method::PATCH,
        "/api/v1/users/me/",
        Some(&token),
        Some(json!({"role": "admin", "bio": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["role"], "user");
    assert_eq!(body["bio"], "hello");

    let (status, _) = send(&h.app, Method::GET, "/api/v1/users/", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn catalog_titles_reviews_and_comments() {
    let Some(h) = harness().await else { return };

    let admin_name = h.name("admin");
    let admin_email = format!("{}@example.com", admin_name);
    UserService::create_superuser(&h.pool, &admin_name, &admin_email).await.unwrap();
    let admin = h.login(&admin_name, &admin_email).await;

    let category = h.name("films");
    let genre = h.name("drama");
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/v1/categories/",
        Some(&admin),
        Some(json!({"name": "Films", "slug": category})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body, json!({"name": "Films", "slug": category}));

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/v1/categories/",
        Some(&admin),
        Some(json!({"name": "Films again", "slug": category})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/v1/genres/",
        Some(&admin),
        Some(json!({"name": "Drama", "slug": genre})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, title) = send(
        &h.app,
        Method::POST,
        "/api/v1/titles/",
        Some(&admin),
        Some(json!({"name": "Solaris", "year": 1972, "category": category, "genre": [genre]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{title}");
    assert_eq!(title["category"], json!(category));
    assert_eq!(title["genre"], json!([genre]));
    let title_id = title["id"].as_i64().unwrap();

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/v1/titles/",
        Some(&admin),
        Some(json!({"name": "Future", "year": 9999, "category": category})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let alice_name = h.name("alice");
    let alice = h.login(&alice_name, &format!("{}@example.com", alice_name)).await;
    let bob_name = h.name("bob");
    let bob = h.login(&bob_name, &format!("{}@example.com", bob_name)).await;

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/v1/titles/",
        Some(&alice),
        Some(json!({"name": "Nope", "year": 2000, "category": category})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let reviews = format!("/api/v1/titles/{}/reviews/", title_id);
    let (status, review) = send(&h.app, Method::POST, &reviews, Some(&alice), Some(json!({"text": "Deep", "score": 8}))).await;
    assert_eq!(status, StatusCode::CREATED, "{review}");
    assert_eq!(review["author"], json!(alice_name));
    let review_id = review["id"].as_i64().unwrap();

    let (status, body) = send(&h.app, Method::POST, &reviews, Some(&alice), Some(json!({"text": "Again", "score": 2}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["non_field_errors"].is_array());

    let (status, _) = send(&h.app, Method::POST, &reviews, Some(&bob), Some(json!({"text": "Slow", "score": 11}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&h.app, Method::POST, &reviews, Some(&bob), Some(json!({"text": "Slow", "score": 5}))).await;
    assert_eq!(status, StatusCode::CREATED);

    // (8 + 5) / 2 truncated
    let (status, body) = send(&h.app, Method::GET, &format!("/api/v1/titles/{}/", title_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], 6);
    assert_eq!(body["category"]["slug"], json!(category));
    assert_eq!(body["genre"][0]["slug"], json!(genre));

    let (status, body) = send(&h.app, Method::GET, &format!("/api/v1/titles/?genre={}", genre), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert!(body["next"].is_null());

    let review_url = format!("{}{}/", reviews, review_id);
    let (status, _) = send(&h.app, Method::PATCH, &review_url, Some(&bob), Some(json!({"score": 1}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(&h.app, Method::PATCH, &review_url, Some(&alice), Some(json!({"score": 10}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Deep");
    assert_eq!(body["score"], 10);

    let comments = format!("{}comments/", review_url);
    let (status, comment) = send(&h.app, Method::POST, &comments, Some(&bob), Some(json!({"text": "Disagree"}))).await;
    assert_eq!(status, StatusCode::CREATED, "{comment}");
    let comment_url = format!("{}{}/", comments, comment["id"]);

    let (status, body) = send(&h.app, Method::GET, &comments, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["author"], json!(bob_name));

    let (status, _) = send(&h.app, Method::DELETE, &comment_url, Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&h.app, Method::DELETE, &comment_url, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Comments are reached only through the title that owns the review.
    let wrong = format!("/api/v1/titles/{}/reviews/{}/comments/", title_id + 100_000, review_id);
    let (status, _) = send(&h.app, Method::GET, &wrong, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&h.app, Method::DELETE, &format!("/api/v1/categories/{}/", category), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&h.app, Method::GET, &format!("/api/v1/titles/{}/", title_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["category"].is_null());

    let (status, _) = send(&h.app, Method::DELETE, &format!("/api/v1/titles/{}/", title_id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&h.app, Method::GET, &review_url, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_manages_users() {
    let Some(h) = harness().await else { return };
    let admin = h.admin().await;

    let carol = h.name("carol");
    let carol_email = format!("{}@example.com", carol);
    let body = h
        .create(
            &admin,
            "/api/v1/users/",
            json!({"username": carol, "email": carol_email, "role": "moderator", "bio": "films"}),
        )
        .await;
    assert_eq!(
        body,
        json!({"username": carol, "email": carol_email, "first_name": "", "last_name": "", "bio": "films", "role": "moderator"})
    );

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/v1/users/",
        Some(&admin),
        Some(json!({"username": carol, "email": format!("other_{}", carol_email)})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["username"].is_array());

    let dave = h.name("dave");
    h.create(&admin, "/api/v1/users/", json!({"username": dave, "email": format!("{}@example.com", dave)}))
        .await;

    let (status, body) = send(&h.app, Method::GET, &format!("/api/v1/users/?search={}", h.suffix), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    let names: Vec<&str> = body["results"].as_array().unwrap().iter().map(|u| u["username"].as_str().unwrap()).collect();
    assert_eq!(names, vec![h.name("admin"), carol.clone(), dave.clone()]);

    let carol_url = format!("/api/v1/users/{}/", carol);
    let (status, body) = send(&h.app, Method::GET, &carol_url, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "moderator");

    // Repeating the user's own username and email is not a conflict.
    let (status, body) = send(
        &h.app,
        Method::PATCH,
        &carol_url,
        Some(&admin),
        Some(json!({"username": carol, "email": carol_email, "first_name": "Carol"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["first_name"], "Carol");

    let (status, body) = send(
        &h.app,
        Method::PATCH,
        &carol_url,
        Some(&admin),
        Some(json!({"email": format!("{}@example.com", dave)})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["email"].is_array());

    let (status, body) = send(&h.app, Method::PATCH, &carol_url, Some(&admin), Some(json!({"role": "admin"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let (status, _) = send(&h.app, Method::DELETE, &carol_url, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&h.app, Method::GET, &carol_url, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn titles_update_filter_and_lose_genres() {
    let Some(h) = harness().await else { return };
    let admin = h.admin().await;
    let books = h.name("books");
    let films = h.name("movies");
    let scifi = h.name("scifi");
    let drama = h.name("dramas");
    h.create(&admin, "/api/v1/categories/", json!({"name": "Books", "slug": books})).await;
    h.create(&admin, "/api/v1/categories/", json!({"name": "Movies", "slug": films})).await;
    h.create(&admin, "/api/v1/genres/", json!({"name": "Sci-fi", "slug": scifi})).await;
    h.create(&admin, "/api/v1/genres/", json!({"name": "Drama", "slug": drama})).await;

    let solaris = h.name("Solaris");
    let title = h
        .create(
            &admin,
            "/api/v1/titles/",
            json!({"name": solaris, "year": 1961, "description": "Lem", "category": books, "genre": [scifi, drama]}),
        )
        .await;
    let title_url = format!("/api/v1/titles/{}/", title["id"]);
    h.create(
        &admin,
        "/api/v1/titles/",
        json!({"name": h.name("Stalker"), "year": 1979, "category": films, "genre": [scifi]}),
    )
    .await;

    let (status, body) = send(&h.app, Method::PATCH, &title_url, Some(&admin), Some(json!({"description": "Stanislaw Lem"}))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], json!(solaris));
    assert_eq!(body["year"], 1961);
    assert_eq!(body["category"], json!(books));
    assert_eq!(body["genre"].as_array().unwrap().len(), 2);
    assert_eq!(body["description"], "Stanislaw Lem");

    let (status, body) = send(&h.app, Method::PUT, &title_url, Some(&admin), Some(json!({"name": solaris}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["year", "category", "genre"] {
        assert!(body["error"]["details"][field].is_array(), "{field} should be required");
    }

    let (status, body) = send(
        &h.app,
        Method::PUT,
        &title_url,
        Some(&admin),
        Some(json!({"name": solaris, "year": 1972, "category": films, "genre": [drama]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["category"], json!(films));
    assert_eq!(body["genre"], json!([drama]));

    let count = |query: String| {
        let app = h.app.clone();
        async move {
            let (status, body) = send(&app, Method::GET, &format!("/api/v1/titles/?{}", query), None, None).await;
            assert_eq!(status, StatusCode::OK, "{query}: {body}");
            body["count"].as_u64().unwrap()
        }
    };
    assert_eq!(count(format!("category={}", films)).await, 2);
    assert_eq!(count(format!("category={}", books)).await, 0);
    assert_eq!(count(format!("name={}", solaris)).await, 1);
    assert_eq!(count(format!("category={}&year=1972", films)).await, 1);
    assert_eq!(count(format!("category={}&year=1979", films)).await, 1);
    assert_eq!(count(format!("genre={}", scifi)).await, 1);
    assert_eq!(count(format!("name={}&category=&genre=", solaris)).await, 1);

    let (status, body) = send(&h.app, Method::GET, "/api/v1/titles/?year=abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["year"].is_array());

    let (status, _) = send(&h.app, Method::DELETE, &format!("/api/v1/genres/{}/", drama), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&h.app, Method::GET, &title_url, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["genre"], json!([]));
}

#[tokio::test]
async fn lists_page_through_real_rows() {
    let Some(h) = harness().await else { return };
    let admin = h.admin().await;
    for i in 0..7 {
        h.create(
            &admin,
            "/api/v1/genres/",
            json!({"name": format!("g{}_{}", i, h.suffix), "slug": format!("g{}_{}", i, h.suffix)}),
        )
        .await;
    }

    let first = format!("/api/v1/genres/?search={}", h.suffix);
    let (status, body) = send(&h.app, Method::GET, &first, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 7);
    assert_eq!(body["results"].as_array().unwrap().len(), 5);
    assert!(body["previous"].is_null());
    let next = body["next"].as_str().unwrap().to_string();
    assert_eq!(next, format!("/api/v1/genres/?search={}&page=2", h.suffix));

    let (status, body) = send(&h.app, Method::GET, &next, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["results"][1]["slug"], json!(format!("g6_{}", h.suffix)));
    assert!(body["next"].is_null());
    assert_eq!(body["previous"], json!(first));

    for page in ["3", "0", "abc"] {
        let (status, _) = send(&h.app, Method::GET, &format!("{}&page={}", first, page), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "page={page}");
    }
    let (status, body) = send(&h.app, Method::GET, &format!("{}&page=last", first), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn permission_denials_come_before_body_errors() {
    let Some(h) = harness().await else { return };
    let admin = h.admin().await;
    let erin = h.name("erin");
    let erin_token = h.login(&erin, &format!("{}@example.com", erin)).await;
    let frank = h.name("frank");
    let frank_token = h.login(&frank, &format!("{}@example.com", frank)).await;

    let (status, _) = send(&h.app, Method::POST, "/api/v1/titles/", Some(&erin_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&h.app, Method::POST, "/api/v1/categories/", Some(&erin_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let category = h.name("shows");
    let genre = h.name("comedy");
    h.create(&admin, "/api/v1/categories/", json!({"name": "Shows", "slug": category})).await;
    h.create(&admin, "/api/v1/genres/", json!({"name": "Comedy", "slug": genre})).await;
    let title = h
        .create(
            &admin,
            "/api/v1/titles/",
            json!({"name": "Office", "year": 2005, "category": category, "genre": [genre]}),
        )
        .await;
    let review = h
        .create(
            &erin_token,
            &format!("/api/v1/titles/{}/reviews/", title["id"]),
            json!({"text": "Funny", "score": 7}),
        )
        .await;
    let review_url = format!("/api/v1/titles/{}/reviews/{}/", title["id"], review["id"]);

    let (status, _) = send(&h.app, Method::PATCH, &review_url, Some(&frank_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&h.app, Method::PATCH, &review_url, Some(&erin_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
