use crate::music_store::StoreError;

use super::models::{
    CountryBreakdown, DashboardSummary, DateRange, GenreBreakdown, RecentOrder, SalesBucket,
    SearchAnalyticsResults, TimeBucket, TopAlbum, TopArtist, TopCustomer, TopTrack,
};

/// Read-only aggregations over the music store. All results reflect the
/// current store state, nothing is cached.
pub trait AnalyticsStore: Send + Sync {
    /// Sales grouped by calendar bucket of the invoice date (UTC). Buckets
    /// with no invoices are omitted; results are ascending by period.
    fn sales_over_time(
        &self,
        bucket: TimeBucket,
        range: &DateRange,
    ) -> Result<Vec<SalesBucket>, StoreError>;

    /// Per-genre sales, descending by total sales. Genres with no sales are
    /// excluded.
    fn genre_analysis(&self) -> Result<Vec<GenreBreakdown>, StoreError>;

    /// Per-country sales over customers with a known country, descending by
    /// total sales.
    fn country_analysis(&self) -> Result<Vec<CountryBreakdown>, StoreError>;

    fn top_tracks(&self) -> Result<Vec<TopTrack>, StoreError>;
    fn top_artists(&self) -> Result<Vec<TopArtist>, StoreError>;
    fn top_albums(&self) -> Result<Vec<TopAlbum>, StoreError>;
    fn top_customers(&self) -> Result<Vec<TopCustomer>, StoreError>;

    fn dashboard_summary(&self) -> Result<DashboardSummary, StoreError>;

    fn recent_orders(&self, limit: usize) -> Result<Vec<RecentOrder>, StoreError>;

    fn search_analytics(&self, query: &str) -> Result<SearchAnalyticsResults, StoreError>;
}

/// Rows returned by each top-N ranking.
pub const TOP_N_LIMIT: usize = 10;

pub const RECENT_ORDERS_DEFAULT_LIMIT: usize = 5;
pub const RECENT_ORDERS_MAX_LIMIT: usize = 50;

/// Matches returned per entity type by `search_analytics`.
pub const SEARCH_RESULTS_PER_TYPE: usize = 5;
