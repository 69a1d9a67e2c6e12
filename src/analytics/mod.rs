mod models;
mod trait_def;

pub use models::{
    percentage_of, round_money, safe_average, CountryBreakdown, DashboardSummary, DateRange,
    GenreBreakdown, RecentOrder, SalesBucket, SearchAnalyticsResults, TimeBucket, TopAlbum,
    TopArtist, TopCustomer, TopTrack,
};
pub use trait_def::{
    AnalyticsStore, RECENT_ORDERS_DEFAULT_LIMIT, RECENT_ORDERS_MAX_LIMIT,
    SEARCH_RESULTS_PER_TYPE, TOP_N_LIMIT,
};
