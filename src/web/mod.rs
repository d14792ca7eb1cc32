//! Web layer - HTML routes
//!
//! Every page is server rendered. Handlers receive a [`RequestContext`] (or
//! one of its gated variants) that owns the request's transaction.

pub mod context;
pub mod error;
pub mod handlers;
pub mod render;
pub mod session;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use context::{AdminContext, RequestContext, UserContext};
pub use error::{AppError, AppResult};
pub use state::AppState;

use handlers::{auth, comments, home, posts, tags, users};

/// Room for the text fields sent alongside an image
const FORM_OVERHEAD: usize = 1024 * 1024;

/// Build the complete router
pub fn build_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.upload.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD);
    let uploads = ServeDir::new(&state.config.upload.path);

    Router::new()
        .route("/", get(home::index))
        // Session
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/auth/github", get(auth::github_start))
        .route("/auth/github/callback", get(auth::github_callback))
        // Users
        .route("/users", get(users::index).post(users::create))
        .route("/users/new", get(users::new_form))
        .route(
            "/users/{user_id}",
            get(users::show)
                .put(users::update)
                .post(users::update)
                .delete(users::destroy),
        )
        .route("/users/{user_id}/edit", get(users::edit))
        .route("/users/{user_id}/delete", post(users::destroy))
        // Posts
        .route("/posts", get(posts::index))
        .route("/posts/create", get(posts::new_form).post(posts::create))
        .route("/posts/edit/{pid}", get(posts::edit).post(posts::update))
        .route("/posts/delete/{pid}", get(posts::destroy))
        .route("/posts/detail/{pid}", get(posts::detail))
        // Tags
        .route("/tags/list", get(tags::index))
        .route("/tags/create", get(tags::new_form).post(tags::create))
        .route("/tags/show/{tag}", get(tags::show))
        .route("/tags/delete/{tag}", get(tags::destroy))
        // Comments
        .route("/comments/create/{pid}", post(comments::create))
        .route("/comments/edit", get(comments::edit).post(comments::update))
        .route("/comments/delete", get(comments::destroy))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
