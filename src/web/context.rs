//! Per-request context
//!
//! [`RequestContext`] decodes the session cookie and resolves the signed-in
//! user. The request's transaction is opened on first use, after any form
//! body has been read: [`RequestContext::conn`] for pages that only read,
//! [`RequestContext::write`] for handlers that change rows. Handlers finish
//! the request through [`RequestContext::render`] or
//! [`RequestContext::redirect`], which commit the transaction and write the
//! session cookie back. Returning an error instead drops the transaction,
//! rolling it back.
//!
//! Images released by a write are removed only after the commit succeeded.
//!
//! [`UserContext`] and [`AdminContext`] add the login and admin gates: a
//! visitor who fails them is sent to `/` with a danger flash.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use sqlx::{Sqlite, SqliteConnection, Transaction};

use super::error::{AppError, AppResult};
use super::session::{Flash, Session};
use super::state::AppState;
use crate::db::begin_write;
use crate::db::repositories::user as user_repo;
use crate::models::User;

pub const NOT_AUTHORIZED: &str = "You are not authorized to view that page.";

pub struct RequestContext {
    state: AppState,
    tx: Option<Transaction<'static, Sqlite>>,
    /// The open transaction holds the write lock
    writing: bool,
    /// Stored images to remove once the transaction has committed
    released: Vec<String>,
    pub current_user: Option<User>,
    pub session: Session,
    original_session: Session,
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = state.sessions.from_headers(&parts.headers);
        let original_session = session.clone();

        let mut ctx_session = session;
        let current_user = match ctx_session.user_id {
            Some(id) => {
                let mut conn = state.pool.acquire().await?;
                let user = user_repo::get_by_id(&mut conn, id).await?;
                if user.is_none() {
                    tracing::debug!(user_id = id, "Session refers to a deleted user");
                    ctx_session.user_id = None;
                }
                user
            }
            None => None,
        };

        Ok(Self {
            state: state.clone(),
            tx: None,
            writing: false,
            released: Vec::new(),
            current_user,
            session: ctx_session,
            original_session,
        })
    }
}

impl RequestContext {
    /// The request's transaction, begun on first use
    pub async fn conn(&mut self) -> AppResult<&mut SqliteConnection> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => self.state.pool.begin().await?,
        };
        Ok(&mut **self.tx.insert(tx))
    }

    /// The request's transaction holding the database write lock.
    ///
    /// A read transaction opened earlier in the request is ended first; the
    /// write transaction starts from the latest committed rows.
    pub async fn write(&mut self) -> AppResult<&mut SqliteConnection> {
        let tx = match self.tx.take() {
            Some(tx) if self.writing => tx,
            Some(read) => {
                read.rollback().await?;
                begin_write(&self.state.pool).await?
            }
            None => begin_write(&self.state.pool).await?,
        };
        self.writing = true;
        Ok(&mut **self.tx.insert(tx))
    }

    /// Remove `name` from the upload store after the commit, unless a post
    /// still refers to it by then
    pub fn release_after_commit(&mut self, name: Option<String>) {
        self.released.extend(name);
    }

    pub fn flash(&mut self, flash: Flash) {
        self.session.flash.push(flash);
    }

    pub fn log_in(&mut self, user: &User) {
        self.session.user_id = Some(user.id);
        self.current_user = Some(user.clone());
    }

    pub fn log_out(&mut self) {
        self.session.clear();
        self.current_user = None;
    }

    /// Render `template` with `view` plus the layout values: the signed-in
    /// user, pending flash messages and whether GitHub login is offered.
    ///
    /// Client and server error statuses roll the transaction back.
    pub async fn render(
        mut self,
        status: StatusCode,
        template: &str,
        mut view: tera::Context,
    ) -> AppResult<Response> {
        let flashes = std::mem::take(&mut self.session.flash);
        view.insert("flashes", &flashes);
        view.insert("current_user", &self.current_user);
        view.insert("github_login", &self.state.oauth.is_some());

        let html = self.state.renderer.render(template, &view)?;
        let response = (status, Html(html)).into_response();

        if status.is_client_error() || status.is_server_error() {
            if let Some(tx) = self.tx.take() {
                tx.rollback().await?;
            }
        } else {
            self.commit().await?;
        }
        Self::attach_cookie(&self.state, &self.session, &self.original_session, response)
    }

    /// Commit and send the browser to `location` with a 302
    pub async fn redirect(mut self, location: &str) -> AppResult<Response> {
        self.commit().await?;
        let location = HeaderValue::from_str(location)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid redirect target: {}", e)))?;
        let response = (StatusCode::FOUND, [(header::LOCATION, location)]).into_response();
        Self::attach_cookie(&self.state, &self.session, &self.original_session, response)
    }

    async fn commit(&mut self) -> AppResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        let released = std::mem::take(&mut self.released);
        if released.is_empty() {
            return Ok(());
        }
        // already committed; a file that could not be removed is only logged
        if let Err(e) = self.release_files(&released).await {
            tracing::warn!(error = %e, files = ?released, "Failed to remove released uploads");
        }
        Ok(())
    }

    async fn release_files(&mut self, names: &[String]) -> AppResult<()> {
        let mut tx = begin_write(&self.state.pool).await?;
        self.state.posts.release_files(&mut tx, names).await?;
        tx.commit().await?;
        Ok(())
    }

    fn attach_cookie(
        state: &AppState,
        session: &Session,
        original: &Session,
        mut response: Response,
    ) -> AppResult<Response> {
        if session == original {
            return Ok(response);
        }
        let cookie = state
            .sessions
            .set_cookie(session)
            .map_err(|e| AppError::Internal(e.into()))?;
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid session cookie: {}", e)))?;
        response.headers_mut().append(header::SET_COOKIE, value);
        Ok(response)
    }

    async fn deny(mut self) -> Response {
        self.flash(Flash::danger(NOT_AUTHORIZED));
        self.redirect("/").await.into_response()
    }
}

/// A request from a signed-in user
pub struct UserContext {
    pub ctx: RequestContext,
    pub user: User,
}

impl FromRequestParts<AppState> for UserContext {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ctx = RequestContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        match ctx.current_user.clone() {
            Some(user) => Ok(Self { ctx, user }),
            None => Err(ctx.deny().await),
        }
    }
}

/// A request from a signed-in administrator
pub struct AdminContext {
    pub ctx: RequestContext,
    pub user: User,
}

impl FromRequestParts<AppState> for AdminContext {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ctx = RequestContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        match ctx.current_user.clone() {
            Some(user) if user.admin => Ok(Self { ctx, user }),
            Some(user) => {
                tracing::warn!(user_id = user.id, path = %parts.uri.path(), "Rejected non-admin request");
                Err(ctx.deny().await)
            }
            None => Err(ctx.deny().await),
        }
    }
}
