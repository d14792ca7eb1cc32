//! Sign in, sign out and GitHub login

use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use tera::Context;

use crate::models::LoginInput;
use crate::services::user::{self as user_service, UserServiceError};
use crate::services::FieldErrors;
use crate::web::context::RequestContext;
use crate::web::error::{AppError, AppResult};
use crate::web::session::Flash;
use crate::web::state::AppState;

#[derive(Debug, Default, Serialize)]
struct LoginForm {
    email: String,
}

fn login_view(email: &str, errors: &FieldErrors) -> Context {
    let mut view = Context::new();
    view.insert(
        "form",
        &LoginForm {
            email: email.to_string(),
        },
    );
    view.insert("errors", errors);
    view
}

fn welcome(name: &str) -> Flash {
    Flash::success(format!("Hello {}, Welcome back!", name))
}

pub async fn login_form(ctx: RequestContext) -> AppResult<Response> {
    ctx.render(StatusCode::OK, "users/login.html", login_view("", &FieldErrors::new()))
        .await
}

pub async fn login(mut ctx: RequestContext, Form(input): Form<LoginInput>) -> AppResult<Response> {
    match user_service::authenticate(ctx.conn().await?, &input).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, "User signed in");
            ctx.log_in(&user);
            ctx.flash(welcome(&user.name));
            ctx.redirect("/").await
        }
        Err(UserServiceError::ValidationError(errors)) => {
            ctx.render(
                StatusCode::UNPROCESSABLE_ENTITY,
                "users/login.html",
                login_view(&input.email, &errors),
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn logout(mut ctx: RequestContext) -> AppResult<Response> {
    ctx.log_out();
    ctx.flash(Flash::success("Goodbye!"));
    ctx.redirect("/").await
}

/// Send the browser to GitHub's consent page
pub async fn github_start(
    State(state): State<AppState>,
    mut ctx: RequestContext,
) -> AppResult<Response> {
    let oauth = state.oauth.as_ref().ok_or(AppError::NotFound)?;
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let url = oauth.authorize_url(&nonce);
    ctx.session.oauth_state = Some(nonce);
    ctx.redirect(&url).await
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

pub async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    mut ctx: RequestContext,
) -> AppResult<Response> {
    let oauth = state.oauth.as_ref().ok_or(AppError::NotFound)?;

    let expected = ctx.session.oauth_state.take();
    if expected.is_none() || expected != query.state {
        tracing::warn!("GitHub callback with missing or mismatched state");
        return Err(AppError::Unauthorized);
    }
    let code = query.code.ok_or(AppError::Unauthorized)?;
    let profile = oauth.complete(&code).await?;

    match user_service::provider_login(ctx.write().await?, &profile).await {
        Ok((user, created)) => {
            if created {
                ctx.flash(Flash::success("User was created successfully"));
            }
            ctx.log_in(&user);
            ctx.flash(welcome(&user.name));
            ctx.redirect("/").await
        }
        Err(UserServiceError::EmailTaken(email)) => {
            ctx.flash(Flash::danger(format!(
                "The email {} is already registered. Sign in with your password.",
                email
            )));
            ctx.redirect("/login").await
        }
        Err(e) => Err(e.into()),
    }
}
