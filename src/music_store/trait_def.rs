use super::models::{
    Album, Artist, Customer, Genre, Invoice, InvoiceDetail, Track,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown ordering field '{0}'")]
    UnknownOrderingField(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingDirection {
    Ascending,
    Descending,
}

/// An `ordering=field` / `ordering=-field` query value, not yet checked
/// against the entity's allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub field: String,
    pub direction: OrderingDirection,
}

impl Ordering {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(field) => Ordering {
                field: field.to_string(),
                direction: OrderingDirection::Descending,
            },
            None => Ordering {
                field: raw.to_string(),
                direction: OrderingDirection::Ascending,
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// 1-based page index.
    pub page: usize,
    pub page_size: usize,
    pub search: Option<String>,
    pub ordering: Option<Ordering>,
}

impl ListParams {
    pub const DEFAULT_PAGE_SIZE: usize = 50;
    pub const MAX_PAGE_SIZE: usize = 200;

    pub fn page_of_everything() -> Self {
        ListParams {
            page: 1,
            page_size: Self::MAX_PAGE_SIZE,
            search: None,
            ordering: None,
        }
    }

    pub(super) fn offset(&self) -> usize {
        self.page.saturating_sub(1) * self.page_size
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub total: usize,
    pub items: Vec<T>,
}

pub trait MusicStore: Send + Sync {
    fn list_artists(&self, params: &ListParams) -> Result<Page<Artist>, StoreError>;
    fn get_artist(&self, id: i64) -> Result<Option<Artist>, StoreError>;

    fn list_genres(&self, params: &ListParams) -> Result<Page<Genre>, StoreError>;
    fn get_genre(&self, id: i64) -> Result<Option<Genre>, StoreError>;

    fn list_albums(
        &self,
        params: &ListParams,
        artist_id: Option<i64>,
    ) -> Result<Page<Album>, StoreError>;
    fn get_album(&self, id: i64) -> Result<Option<Album>, StoreError>;

    fn list_tracks(
        &self,
        params: &ListParams,
        album_id: Option<i64>,
        genre_id: Option<i64>,
    ) -> Result<Page<Track>, StoreError>;
    fn get_track(&self, id: i64) -> Result<Option<Track>, StoreError>;

    fn list_customers(
        &self,
        params: &ListParams,
        country: Option<&str>,
    ) -> Result<Page<Customer>, StoreError>;
    fn get_customer(&self, id: i64) -> Result<Option<Customer>, StoreError>;

    fn list_invoices(
        &self,
        params: &ListParams,
        customer_id: Option<i64>,
    ) -> Result<Page<Invoice>, StoreError>;
    fn get_invoice(&self, id: i64) -> Result<Option<InvoiceDetail>, StoreError>;
}
