use chrono::{NaiveDate, NaiveTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::music_store::{Album, Artist, Customer, Track};

/// Bucket granularity for sales-over-time aggregations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Month,
    Year,
}

impl TimeBucket {
    /// The strftime pattern producing the bucket's `period` label.
    pub fn strftime_pattern(&self) -> &'static str {
        match self {
            TimeBucket::Month => "%Y-%m",
            TimeBucket::Year => "%Y",
        }
    }
}

/// An optional inclusive `[start, end]` day range, applied before bucketing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Inclusive lower bound in unix seconds (midnight UTC of the start day).
    pub fn start_unix(&self) -> Option<i64> {
        self.start
            .map(|day| day.and_time(NaiveTime::MIN).and_utc().timestamp())
    }

    /// Exclusive upper bound in unix seconds (midnight UTC of the day after
    /// the end day), so the end day itself is fully included.
    pub fn end_unix_exclusive(&self) -> Option<i64> {
        self.end
            .and_then(|day| day.succ_opt())
            .map(|day| day.and_time(NaiveTime::MIN).and_utc().timestamp())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesBucket {
    pub period: String,
    pub total_sales: Decimal,
    pub total_orders: i64,
    pub average_order_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreBreakdown {
    pub genre_name: String,
    pub total_sales: Decimal,
    pub track_count: i64,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryBreakdown {
    pub country: String,
    pub total_sales: Decimal,
    pub customer_count: i64,
    pub average_customer_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopTrack {
    pub id: i64,
    pub name: String,
    pub album_title: Option<String>,
    pub artist_name: Option<String>,
    pub units_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopArtist {
    pub id: i64,
    pub name: String,
    pub units_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopAlbum {
    pub id: i64,
    pub title: String,
    pub artist_name: String,
    pub units_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCustomer {
    pub id: i64,
    pub name: String,
    pub country: Option<String>,
    pub order_count: i64,
    pub total_spent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentOrder {
    pub id: i64,
    pub customer_name: String,
    pub total: Decimal,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_customers: i64,
    pub total_tracks: i64,
    pub total_artists: i64,
    pub total_albums: i64,
    pub total_revenue: Decimal,
    pub total_orders: i64,
    pub average_order_value: Decimal,
    pub recent_orders: Vec<RecentOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchAnalyticsResults {
    pub query: String,
    pub total_results: usize,
    pub artists: Vec<Artist>,
    pub albums: Vec<Album>,
    pub tracks: Vec<Track>,
    pub customers: Vec<Customer>,
}

pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // Pad the scale so integral amounts still render as "x.00".
    rounded.rescale(2);
    rounded
}

/// The mean of `total` over `count` items, defined as 0 for an empty set.
pub fn safe_average(total: Decimal, count: i64) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        round_money(total / Decimal::from(count))
    }
}

/// `part` as a percentage of `whole`, defined as 0 when `whole` is 0.
pub fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        round_money(part / whole * Decimal::ONE_HUNDRED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn safe_average_is_zero_for_empty_sets() {
        assert_eq!(safe_average(Decimal::ZERO, 0), Decimal::ZERO);
        assert_eq!(safe_average(Decimal::new(198, 2), 0), Decimal::ZERO);
    }

    #[test]
    fn safe_average_rounds_half_away_from_zero() {
        // 1.00 / 3 = 0.333... -> 0.33
        assert_eq!(
            safe_average(Decimal::new(100, 2), 3).to_string(),
            "0.33"
        );
        // 0.05 / 2 = 0.025 -> 0.03
        assert_eq!(safe_average(Decimal::new(5, 2), 2).to_string(), "0.03");
    }

    #[test]
    fn round_money_pads_scale_to_two_decimals() {
        assert_eq!(round_money(Decimal::from(5)).to_string(), "5.00");
        assert_eq!(round_money(Decimal::new(15, 1)).to_string(), "1.50");
        assert_eq!(round_money(Decimal::new(12345, 4)).to_string(), "1.23");
    }

    #[test]
    fn percentage_of_zero_whole_is_zero() {
        assert_eq!(
            percentage_of(Decimal::new(100, 2), Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn percentage_of_rounds_to_two_decimals() {
        // 1 / 3 * 100 = 33.333... -> 33.33
        assert_eq!(
            percentage_of(Decimal::ONE, Decimal::from(3)).to_string(),
            "33.33"
        );
        assert_eq!(
            percentage_of(Decimal::from(2), Decimal::from(2)).to_string(),
            "100.00"
        );
    }

    #[test]
    fn date_range_bounds_are_inclusive_of_the_end_day() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 3, 1),
            end: NaiveDate::from_ymd_opt(2024, 3, 31),
        };
        // 2024-03-01T00:00:00Z
        assert_eq!(range.start_unix(), Some(1709251200));
        // 2024-04-01T00:00:00Z
        assert_eq!(range.end_unix_exclusive(), Some(1711929600));
    }

    #[test]
    fn empty_date_range_has_no_bounds() {
        let range = DateRange::default();
        assert_eq!(range.start_unix(), None);
        assert_eq!(range.end_unix_exclusive(), None);
    }

    #[test]
    fn time_bucket_patterns() {
        assert_eq!(TimeBucket::Month.strftime_pattern(), "%Y-%m");
        assert_eq!(TimeBucket::Year.strftime_pattern(), "%Y");
    }
}
