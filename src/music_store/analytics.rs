//! Aggregation queries over the music store.
//!
//! Sums run over integer cents in SQL so they stay exact; divisions and
//! rounding happen on `Decimal` values in Rust, only at the result boundary.

use super::models::{cents_to_decimal, format_date};
use super::store::{
    escape_like, SqliteMusicStore, ALBUM_FROM, ALBUM_SELECT, CUSTOMER_FROM, CUSTOMER_SELECT,
    TRACK_FROM, TRACK_SELECT,
};
use super::trait_def::StoreError;
use crate::analytics::{
    percentage_of, safe_average, AnalyticsStore, CountryBreakdown, DashboardSummary, DateRange,
    GenreBreakdown, RecentOrder, SalesBucket, SearchAnalyticsResults, TimeBucket, TopAlbum,
    TopArtist, TopCustomer, TopTrack, RECENT_ORDERS_DEFAULT_LIMIT, SEARCH_RESULTS_PER_TYPE,
    TOP_N_LIMIT,
};
use rusqlite::{params, params_from_iter, Connection, ToSql};
use rust_decimal::Decimal;

fn scalar_count(conn: &Connection, sql: &str) -> Result<i64, StoreError> {
    Ok(conn.query_row(sql, [], |r| r.get(0))?)
}

fn recent_orders_inner(conn: &Connection, limit: usize) -> Result<Vec<RecentOrder>, StoreError> {
    let mut stmt = conn.prepare_cached(
        "SELECT i.id, c.first_name || ' ' || c.last_name, i.total_cents, i.invoice_date \
         FROM invoices i JOIN customers c ON c.id = i.customer_id \
         ORDER BY i.invoice_date DESC, i.id DESC LIMIT ?1",
    )?;
    let orders = stmt
        .query_map(params![limit as i64], |row| {
            Ok(RecentOrder {
                id: row.get(0)?,
                customer_name: row.get(1)?,
                total: cents_to_decimal(row.get(2)?),
                date: format_date(row.get(3)?),
            })
        })?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;
    Ok(orders)
}

impl AnalyticsStore for SqliteMusicStore {
    fn sales_over_time(
        &self,
        bucket: TimeBucket,
        range: &DateRange,
    ) -> Result<Vec<SalesBucket>, StoreError> {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(bucket.strftime_pattern())];
        if let Some(start) = range.start_unix() {
            values.push(Box::new(start));
            conditions.push(format!("invoice_date >= ?{}", values.len()));
        }
        if let Some(end) = range.end_unix_exclusive() {
            values.push(Box::new(end));
            conditions.push(format!("invoice_date < ?{}", values.len()));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT strftime(?1, invoice_date, 'unixepoch') AS period, \
                    SUM(total_cents), COUNT(*) \
             FROM invoices{} GROUP BY period ORDER BY period ASC",
            where_clause
        );

        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&sql)?;
        let buckets = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?
            .into_iter()
            .map(|(period, total_cents, total_orders)| {
                let total_sales = cents_to_decimal(total_cents);
                SalesBucket {
                    period,
                    total_sales,
                    total_orders,
                    average_order_value: safe_average(total_sales, total_orders),
                }
            })
            .collect();
        Ok(buckets)
    }

    fn genre_analysis(&self) -> Result<Vec<GenreBreakdown>, StoreError> {
        // The genre total intentionally sums the invoice's *full* total once
        // per matching invoice line, and the track count covers every track
        // in the genre whether or not it ever sold.
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT g.name, SUM(i.total_cents) AS sales_cents, COUNT(DISTINCT t.id) \
             FROM genres g \
             LEFT JOIN tracks t ON t.genre_id = g.id \
             LEFT JOIN invoice_lines il ON il.track_id = t.id \
             LEFT JOIN invoices i ON i.id = il.invoice_id \
             GROUP BY g.id, g.name \
             HAVING SUM(i.total_cents) IS NOT NULL \
             ORDER BY sales_cents DESC, g.id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;

        let grand_total: Decimal = rows
            .iter()
            .map(|(_, cents, _)| cents_to_decimal(*cents))
            .sum();
        let breakdown = rows
            .into_iter()
            .map(|(genre_name, cents, track_count)| {
                let total_sales = cents_to_decimal(cents);
                GenreBreakdown {
                    genre_name,
                    total_sales,
                    track_count,
                    percentage: percentage_of(total_sales, grand_total),
                }
            })
            .collect();
        Ok(breakdown)
    }

    fn country_analysis(&self) -> Result<Vec<CountryBreakdown>, StoreError> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT c.country, COALESCE(SUM(i.total_cents), 0) AS sales_cents, \
                    COUNT(DISTINCT c.id), COUNT(i.id) \
             FROM customers c \
             LEFT JOIN invoices i ON i.customer_id = c.id \
             WHERE c.country IS NOT NULL \
             GROUP BY c.country \
             HAVING SUM(i.total_cents) IS NOT NULL \
             ORDER BY sales_cents DESC, c.country ASC",
        )?;
        let breakdown = stmt
            .query_map([], |row| {
                let total_sales = cents_to_decimal(row.get(1)?);
                let invoice_count: i64 = row.get(3)?;
                Ok(CountryBreakdown {
                    country: row.get(0)?,
                    total_sales,
                    customer_count: row.get(2)?,
                    average_customer_value: safe_average(total_sales, invoice_count),
                })
            })?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;
        Ok(breakdown)
    }

    fn top_tracks(&self) -> Result<Vec<TopTrack>, StoreError> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT t.id, t.name, al.title, ar.name, \
                    SUM(il.quantity) AS units, \
                    SUM(il.unit_price_cents * il.quantity) \
             FROM tracks t \
             JOIN invoice_lines il ON il.track_id = t.id \
             LEFT JOIN albums al ON al.id = t.album_id \
             LEFT JOIN artists ar ON ar.id = al.artist_id \
             GROUP BY t.id, t.name, al.title, ar.name \
             ORDER BY units DESC, t.id ASC LIMIT ?1",
        )?;
        let tracks = stmt
            .query_map(params![TOP_N_LIMIT as i64], |row| {
                Ok(TopTrack {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    album_title: row.get(2)?,
                    artist_name: row.get(3)?,
                    units_sold: row.get(4)?,
                    revenue: cents_to_decimal(row.get(5)?),
                })
            })?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;
        Ok(tracks)
    }

    fn top_artists(&self) -> Result<Vec<TopArtist>, StoreError> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT ar.id, ar.name, SUM(il.quantity), \
                    SUM(il.unit_price_cents * il.quantity) AS revenue_cents \
             FROM artists ar \
             JOIN albums al ON al.artist_id = ar.id \
             JOIN tracks t ON t.album_id = al.id \
             JOIN invoice_lines il ON il.track_id = t.id \
             GROUP BY ar.id, ar.name \
             ORDER BY revenue_cents DESC, ar.id ASC LIMIT ?1",
        )?;
        let artists = stmt
            .query_map(params![TOP_N_LIMIT as i64], |row| {
                Ok(TopArtist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    units_sold: row.get(2)?,
                    revenue: cents_to_decimal(row.get(3)?),
                })
            })?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;
        Ok(artists)
    }

    fn top_albums(&self) -> Result<Vec<TopAlbum>, StoreError> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT al.id, al.title, ar.name, SUM(il.quantity), \
                    SUM(il.unit_price_cents * il.quantity) AS revenue_cents \
             FROM albums al \
             JOIN artists ar ON ar.id = al.artist_id \
             JOIN tracks t ON t.album_id = al.id \
             JOIN invoice_lines il ON il.track_id = t.id \
             GROUP BY al.id, al.title, ar.name \
             ORDER BY revenue_cents DESC, al.id ASC LIMIT ?1",
        )?;
        let albums = stmt
            .query_map(params![TOP_N_LIMIT as i64], |row| {
                Ok(TopAlbum {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    artist_name: row.get(2)?,
                    units_sold: row.get(3)?,
                    revenue: cents_to_decimal(row.get(4)?),
                })
            })?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;
        Ok(albums)
    }

    fn top_customers(&self) -> Result<Vec<TopCustomer>, StoreError> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT c.id, c.first_name || ' ' || c.last_name, c.country, \
                    COUNT(i.id), SUM(i.total_cents) AS spent_cents \
             FROM customers c \
             JOIN invoices i ON i.customer_id = c.id \
             GROUP BY c.id \
             ORDER BY spent_cents DESC, c.id ASC LIMIT ?1",
        )?;
        let customers = stmt
            .query_map(params![TOP_N_LIMIT as i64], |row| {
                Ok(TopCustomer {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    country: row.get(2)?,
                    order_count: row.get(3)?,
                    total_spent: cents_to_decimal(row.get(4)?),
                })
            })?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;
        Ok(customers)
    }

    fn dashboard_summary(&self) -> Result<DashboardSummary, StoreError> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let total_customers = scalar_count(&conn, "SELECT COUNT(*) FROM customers")?;
        let total_tracks = scalar_count(&conn, "SELECT COUNT(*) FROM tracks")?;
        let total_artists = scalar_count(&conn, "SELECT COUNT(*) FROM artists")?;
        let total_albums = scalar_count(&conn, "SELECT COUNT(*) FROM albums")?;
        let (revenue_cents, total_orders): (i64, i64) = conn.query_row(
            "SELECT COALESCE(SUM(total_cents), 0), COUNT(*) FROM invoices",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        let total_revenue = cents_to_decimal(revenue_cents);
        let recent_orders = recent_orders_inner(&conn, RECENT_ORDERS_DEFAULT_LIMIT)?;

        Ok(DashboardSummary {
            total_customers,
            total_tracks,
            total_artists,
            total_albums,
            total_revenue,
            total_orders,
            average_order_value: safe_average(total_revenue, total_orders),
            recent_orders,
        })
    }

    fn recent_orders(&self, limit: usize) -> Result<Vec<RecentOrder>, StoreError> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        recent_orders_inner(&conn, limit)
    }

    fn search_analytics(&self, query: &str) -> Result<SearchAnalyticsResults, StoreError> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let limit = SEARCH_RESULTS_PER_TYPE as i64;
        let term = escape_like(query);

        let mut stmt = conn.prepare_cached(
            "SELECT a.id, a.name FROM artists a \
             WHERE a.name LIKE '%' || ?1 || '%' ESCAPE '\\' \
             ORDER BY a.name ASC LIMIT ?2",
        )?;
        let artists = stmt
            .query_map(params![term, limit], SqliteMusicStore::parse_artist_row)?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;

        let sql = format!(
            "{} {} WHERE al.title LIKE '%' || ?1 || '%' ESCAPE '\\' \
             ORDER BY al.title ASC LIMIT ?2",
            ALBUM_SELECT, ALBUM_FROM
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let albums = stmt
            .query_map(params![term, limit], SqliteMusicStore::parse_album_row)?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;

        let sql = format!(
            "{} {} WHERE t.name LIKE '%' || ?1 || '%' ESCAPE '\\' \
             ORDER BY t.name ASC LIMIT ?2",
            TRACK_SELECT, TRACK_FROM
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let tracks = stmt
            .query_map(params![term, limit], SqliteMusicStore::parse_track_row)?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;

        let sql = format!(
            "{} {} WHERE c.first_name LIKE '%' || ?1 || '%' ESCAPE '\\' \
                OR c.last_name LIKE '%' || ?1 || '%' ESCAPE '\\' \
                OR c.email LIKE '%' || ?1 || '%' ESCAPE '\\' \
             ORDER BY c.last_name ASC, c.first_name ASC LIMIT ?2",
            CUSTOMER_SELECT, CUSTOMER_FROM
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let customers = stmt
            .query_map(params![term, limit], |row| {
                SqliteMusicStore::parse_customer_columns(row, 0)
            })?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;

        let total_results = artists.len() + albums.len() + tracks.len() + customers.len();
        Ok(SearchAnalyticsResults {
            query: query.to_string(),
            total_results,
            artists,
            albums,
            tracks,
            customers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::store::test_support::{open_test_store, seed_single_sale};
    use super::*;
    use chrono::NaiveDate;

    /// Two genres, two customers in different countries, three invoices.
    fn seed_rich_dataset(store: &SqliteMusicStore) {
        store.insert_artist(1, "AC/DC").unwrap();
        store.insert_artist(2, "Miles Davis").unwrap();
        store.insert_genre(1, "Rock").unwrap();
        store.insert_genre(2, "Jazz").unwrap();
        store.insert_genre(3, "Classical").unwrap();
        store.insert_album(1, "High Voltage", 1).unwrap();
        store.insert_album(2, "Kind of Blue", 2).unwrap();
        store
            .insert_track(1, "T.N.T.", Some(1), Some(1), None, 215000, 99)
            .unwrap();
        store
            .insert_track(2, "Live Wire", Some(1), Some(1), None, 230000, 99)
            .unwrap();
        store
            .insert_track(3, "So What", Some(2), Some(2), None, 540000, 129)
            .unwrap();
        store
            .insert_customer(1, "Jane", "Doe", "jane@example.com", Some("Australia"))
            .unwrap();
        store
            .insert_customer(2, "John", "Roe", "john@example.com", Some("Brazil"))
            .unwrap();
        store
            .insert_customer(3, "Nomad", "Null", "nomad@example.com", None)
            .unwrap();

        // 2024-03-15: Jane buys 2x T.N.T. (1.98)
        store.insert_invoice(1, 1, 1710460800, Some("Australia"), 198).unwrap();
        store.insert_invoice_line(1, 1, 1, 99, 2).unwrap();
        // 2024-03-20: John buys 1x So What (1.29)
        store.insert_invoice(2, 2, 1710892800, Some("Brazil"), 129).unwrap();
        store.insert_invoice_line(2, 2, 3, 129, 1).unwrap();
        // 2024-04-01: Jane buys 1x Live Wire (0.99)
        store.insert_invoice(3, 1, 1711929600, Some("Australia"), 99).unwrap();
        store.insert_invoice_line(3, 3, 2, 99, 1).unwrap();
    }

    #[test]
    fn sales_overview_worked_example() {
        let (_dir, store) = open_test_store();
        seed_single_sale(&store);

        let buckets = store
            .sales_over_time(TimeBucket::Month, &DateRange::default())
            .unwrap();
        assert_eq!(buckets.len(), 1);
        let bucket = &buckets[0];
        assert_eq!(bucket.period, "2024-03");
        assert_eq!(bucket.total_sales.to_string(), "1.98");
        assert_eq!(bucket.total_orders, 1);
        assert_eq!(bucket.average_order_value.to_string(), "1.98");
    }

    #[test]
    fn sales_overview_buckets_by_month_ascending() {
        let (_dir, store) = open_test_store();
        seed_rich_dataset(&store);

        let buckets = store
            .sales_over_time(TimeBucket::Month, &DateRange::default())
            .unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].period, "2024-03");
        assert_eq!(buckets[0].total_orders, 2);
        assert_eq!(buckets[0].total_sales.to_string(), "3.27");
        assert_eq!(buckets[1].period, "2024-04");
        assert_eq!(buckets[1].total_sales.to_string(), "0.99");
    }

    #[test]
    fn sales_overview_date_range_is_inclusive() {
        let (_dir, store) = open_test_store();
        seed_rich_dataset(&store);

        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 3, 15),
            end: NaiveDate::from_ymd_opt(2024, 3, 20),
        };
        let buckets = store.sales_over_time(TimeBucket::Month, &range).unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].total_orders, 2);

        // Excluding the 20th drops John's invoice
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 3, 15),
            end: NaiveDate::from_ymd_opt(2024, 3, 19),
        };
        let buckets = store.sales_over_time(TimeBucket::Month, &range).unwrap();
        assert_eq!(buckets[0].total_orders, 1);
    }

    #[test]
    fn yearly_comparison_buckets_by_year() {
        let (_dir, store) = open_test_store();
        seed_rich_dataset(&store);
        // 2023-06-01: an older invoice
        store.insert_invoice(4, 2, 1685577600, Some("Brazil"), 99).unwrap();
        store.insert_invoice_line(4, 4, 1, 99, 1).unwrap();

        let buckets = store
            .sales_over_time(TimeBucket::Year, &DateRange::default())
            .unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].period, "2023");
        assert_eq!(buckets[1].period, "2024");
        assert_eq!(buckets[1].total_orders, 3);
    }

    #[test]
    fn sales_over_empty_store_is_empty_not_an_error() {
        let (_dir, store) = open_test_store();
        let buckets = store
            .sales_over_time(TimeBucket::Month, &DateRange::default())
            .unwrap();
        assert!(buckets.is_empty());
    }

    #[test]
    fn genre_analysis_worked_example() {
        let (_dir, store) = open_test_store();
        seed_single_sale(&store);

        let breakdown = store.genre_analysis().unwrap();
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].genre_name, "Rock");
        assert_eq!(breakdown[0].track_count, 1);
        assert_eq!(breakdown[0].percentage.to_string(), "100.00");
    }

    #[test]
    fn genre_analysis_counts_unsold_tracks_and_excludes_unsold_genres() {
        let (_dir, store) = open_test_store();
        seed_rich_dataset(&store);
        // A Rock track that never sold still counts toward track_count
        store
            .insert_track(4, "Rocker", Some(1), Some(1), None, 175000, 99)
            .unwrap();

        let breakdown = store.genre_analysis().unwrap();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].genre_name, "Rock");
        assert_eq!(breakdown[0].track_count, 3);
        assert_eq!(breakdown[1].genre_name, "Jazz");
        assert_eq!(breakdown[1].track_count, 1);
        // Classical never sold anything and is absent
        assert!(breakdown.iter().all(|b| b.genre_name != "Classical"));
    }

    #[test]
    fn genre_sales_sum_full_invoice_total_per_line() {
        let (_dir, store) = open_test_store();
        store.insert_genre(1, "Rock").unwrap();
        store.insert_genre(2, "Jazz").unwrap();
        store
            .insert_track(1, "A", None, Some(1), None, 1000, 100)
            .unwrap();
        store
            .insert_track(2, "B", None, Some(2), None, 1000, 100)
            .unwrap();
        store
            .insert_customer(1, "Jane", "Doe", "jane@example.com", None)
            .unwrap();
        // One mixed invoice: each genre is attributed the FULL 2.00 total
        store.insert_invoice(1, 1, 1710460800, None, 200).unwrap();
        store.insert_invoice_line(1, 1, 1, 100, 1).unwrap();
        store.insert_invoice_line(2, 1, 2, 100, 1).unwrap();

        let breakdown = store.genre_analysis().unwrap();
        assert_eq!(breakdown.len(), 2);
        for row in &breakdown {
            assert_eq!(row.total_sales.to_string(), "2.00");
            assert_eq!(row.percentage.to_string(), "50.00");
        }
    }

    #[test]
    fn genre_percentages_sum_to_one_hundred() {
        let (_dir, store) = open_test_store();
        seed_rich_dataset(&store);

        let breakdown = store.genre_analysis().unwrap();
        let sum: Decimal = breakdown.iter().map(|b| b.percentage).sum();
        let delta = (sum - Decimal::ONE_HUNDRED).abs();
        assert!(delta <= Decimal::new(2, 2), "percentages sum to {}", sum);
    }

    #[test]
    fn country_analysis_excludes_null_countries() {
        let (_dir, store) = open_test_store();
        seed_rich_dataset(&store);

        let breakdown = store.country_analysis().unwrap();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].country, "Australia");
        assert_eq!(breakdown[0].total_sales.to_string(), "2.97");
        assert_eq!(breakdown[0].customer_count, 1);
        // Jane's two invoices: (1.98 + 0.99) / 2
        assert_eq!(breakdown[0].average_customer_value.to_string(), "1.49");
        assert_eq!(breakdown[1].country, "Brazil");
    }

    #[test]
    fn country_analysis_excludes_countries_without_invoices() {
        let (_dir, store) = open_test_store();
        seed_rich_dataset(&store);
        store
            .insert_customer(10, "Freyja", "Jons", "freyja@example.com", Some("Iceland"))
            .unwrap();

        let breakdown = store.country_analysis().unwrap();
        assert!(breakdown.iter().all(|b| b.country != "Iceland"));
    }

    #[test]
    fn top_tracks_rank_by_units_sold() {
        let (_dir, store) = open_test_store();
        seed_rich_dataset(&store);

        let tracks = store.top_tracks().unwrap();
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].name, "T.N.T.");
        assert_eq!(tracks[0].units_sold, 2);
        assert_eq!(tracks[0].revenue.to_string(), "1.98");
        assert_eq!(tracks[0].artist_name.as_deref(), Some("AC/DC"));
        // Remaining single-unit tracks tie-break by id ascending
        assert_eq!(tracks[1].id, 2);
        assert_eq!(tracks[2].id, 3);
    }

    #[test]
    fn top_rankings_are_capped_at_ten() {
        let (_dir, store) = open_test_store();
        store
            .insert_customer(1, "Jane", "Doe", "jane@example.com", None)
            .unwrap();
        for i in 1..=12 {
            store.insert_track(i, &format!("Track {}", i), None, None, None, 1000, 99).unwrap();
            store.insert_invoice(i, 1, 1710460800 + i, None, 99).unwrap();
            store.insert_invoice_line(i, i, i, 99, 1).unwrap();
        }

        let tracks = store.top_tracks().unwrap();
        assert_eq!(tracks.len(), 10);
    }

    #[test]
    fn top_artists_and_albums_rank_by_revenue() {
        let (_dir, store) = open_test_store();
        seed_rich_dataset(&store);

        let artists = store.top_artists().unwrap();
        assert_eq!(artists.len(), 2);
        assert_eq!(artists[0].name, "AC/DC");
        assert_eq!(artists[0].revenue.to_string(), "2.97");
        assert_eq!(artists[0].units_sold, 3);

        let albums = store.top_albums().unwrap();
        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].title, "High Voltage");
        assert_eq!(albums[0].artist_name, "AC/DC");
    }

    #[test]
    fn top_customers_rank_by_total_spent() {
        let (_dir, store) = open_test_store();
        seed_rich_dataset(&store);

        let customers = store.top_customers().unwrap();
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].name, "Jane Doe");
        assert_eq!(customers[0].order_count, 2);
        assert_eq!(customers[0].total_spent.to_string(), "2.97");
        // Nomad never bought anything and is excluded
        assert!(customers.iter().all(|c| c.id != 3));
    }

    #[test]
    fn dashboard_summary_over_empty_store_is_all_zeros() {
        let (_dir, store) = open_test_store();
        let summary = store.dashboard_summary().unwrap();
        assert_eq!(summary.total_customers, 0);
        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.total_revenue.to_string(), "0.00");
        assert_eq!(summary.average_order_value, Decimal::ZERO);
        assert!(summary.recent_orders.is_empty());
    }

    #[test]
    fn dashboard_summary_counts_and_revenue() {
        let (_dir, store) = open_test_store();
        seed_rich_dataset(&store);

        let summary = store.dashboard_summary().unwrap();
        assert_eq!(summary.total_customers, 3);
        assert_eq!(summary.total_tracks, 3);
        assert_eq!(summary.total_artists, 2);
        assert_eq!(summary.total_albums, 2);
        assert_eq!(summary.total_orders, 3);
        assert_eq!(summary.total_revenue.to_string(), "4.26");
        assert_eq!(summary.average_order_value.to_string(), "1.42");
        assert_eq!(summary.recent_orders.len(), 3);
        assert_eq!(summary.recent_orders[0].id, 3);
    }

    #[test]
    fn recent_orders_honor_the_limit() {
        let (_dir, store) = open_test_store();
        seed_rich_dataset(&store);

        let orders = store.recent_orders(2).unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, 3);
        assert_eq!(orders[0].customer_name, "Jane Doe");
        assert_eq!(orders[0].date, "2024-04-01");
        assert_eq!(orders[1].id, 2);
    }

    #[test]
    fn search_analytics_matches_across_entity_types() {
        let (_dir, store) = open_test_store();
        seed_rich_dataset(&store);

        let results = store.search_analytics("blue").unwrap();
        assert_eq!(results.albums.len(), 1);
        assert_eq!(results.albums[0].title, "Kind of Blue");
        assert_eq!(results.total_results, 1);

        let results = store.search_analytics("jane").unwrap();
        assert_eq!(results.customers.len(), 1);
        assert_eq!(results.total_results, 1);
    }

    #[test]
    fn search_analytics_with_no_matches_is_empty() {
        let (_dir, store) = open_test_store();
        seed_rich_dataset(&store);

        let results = store.search_analytics("xyzzy").unwrap();
        assert_eq!(results.total_results, 0);
        assert!(results.artists.is_empty());
        assert!(results.albums.is_empty());
        assert!(results.tracks.is_empty());
        assert!(results.customers.is_empty());
    }

    #[test]
    fn search_analytics_treats_metacharacters_literally() {
        let (_dir, store) = open_test_store();
        store.insert_artist(1, "100% Pure").unwrap();
        store.insert_artist(2, "Plain Name").unwrap();

        let results = store.search_analytics("%").unwrap();
        assert_eq!(results.artists.len(), 1);
        assert_eq!(results.artists[0].id, 1);
        assert_eq!(results.total_results, 1);
    }

    #[test]
    fn search_analytics_caps_each_type_at_five() {
        let (_dir, store) = open_test_store();
        for i in 1..=8 {
            store.insert_artist(i, &format!("Common Name {}", i)).unwrap();
        }

        let results = store.search_analytics("common").unwrap();
        assert_eq!(results.artists.len(), 5);
        assert_eq!(results.total_results, 5);
    }
}
