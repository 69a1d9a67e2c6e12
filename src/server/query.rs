use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

use crate::music_store::{ListParams, Ordering, Page};

use super::error::ApiError;

/// Query string of the list endpoints. Parse failures (e.g. a non-numeric
/// `artist_id`) reject with a 400 instead of being silently dropped.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub artist_id: Option<i64>,
    pub album_id: Option<i64>,
    pub genre_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub country: Option<String>,
}

impl ListQuery {
    pub fn params(&self) -> ListParams {
        ListParams {
            page: self.page.unwrap_or(1).max(1),
            page_size: self
                .page_size
                .unwrap_or(ListParams::DEFAULT_PAGE_SIZE)
                .clamp(1, ListParams::MAX_PAGE_SIZE),
            search: self.search.clone().filter(|s| !s.is_empty()),
            ordering: self.ordering.as_deref().map(Ordering::parse),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ListQuery {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<ListQuery>::from_request_parts(parts, state)
            .await
            .map(|Query(query)| query)
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
    }
}

/// The `{count, page, page_size, results}` list envelope.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: usize,
    pub page: usize,
    pub page_size: usize,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(params: &ListParams, page: Page<T>) -> Self {
        Paginated {
            count: page.total,
            page: params.page,
            page_size: params.page_size,
            results: page.items,
        }
    }
}
