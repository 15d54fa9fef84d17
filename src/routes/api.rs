//! Resource routes mounted under `/api/v1`. Paths keep their trailing slash.

use crate::handlers::{auth, catalog, comments, reviews, titles, users};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/signup/", post(auth::signup))
        .route("/auth/token/", post(auth::token))
        .route("/users/", get(users::list).post(users::create))
        .route("/users/me/", get(users::me).patch(users::update_me))
        .route(
            "/users/:username/",
            get(users::retrieve).patch(users::update).delete(users::delete),
        )
        .route(
            "/categories/",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route("/categories/:slug/", delete(catalog::delete_category))
        .route("/genres/", get(catalog::list_genres).post(catalog::create_genre))
        .route("/genres/:slug/", delete(catalog::delete_genre))
        .route("/titles/", get(titles::list).post(titles::create))
        .route(
            "/titles/:title_id/",
            get(titles::retrieve)
                .put(titles::update)
                .patch(titles::update)
                .delete(titles::delete),
        )
        .route(
            "/titles/:title_id/reviews/",
            get(reviews::list).post(reviews::create),
        )
        .route(
            "/titles/:title_id/reviews/:review_id/",
            get(reviews::retrieve)
                .put(reviews::update)
                .patch(reviews::update)
                .delete(reviews::delete),
        )
        .route(
            "/titles/:title_id/reviews/:review_id/comments/",
            get(comments::list).post(comments::create),
        )
        .route(
            "/titles/:title_id/reviews/:review_id/comments/:comment_id/",
            get(comments::retrieve)
                .put(comments::update)
                .patch(comments::update)
                .delete(comments::delete),
        )
        .with_state(state)
}
