//! Route handlers, one module per resource

pub mod auth;
pub mod comments;
pub mod home;
pub mod posts;
pub mod tags;
pub mod users;

use serde::Serialize;

use crate::models::PagedResult;

/// Page bookkeeping handed to the `pager` macro
#[derive(Debug, Serialize)]
pub(crate) struct Pager {
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

impl<T> From<&PagedResult<T>> for Pager {
    fn from(result: &PagedResult<T>) -> Self {
        Self {
            page: result.page,
            per_page: result.per_page,
            total_pages: result.total_pages,
            has_prev: result.has_prev(),
            has_next: result.has_next(),
        }
    }
}
