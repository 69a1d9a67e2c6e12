//! SQLite-backed music store over the Chinook-style sales schema.
//!
//! Reads go through a small round-robin pool of read-only connections;
//! writes (external seeding, test fixtures) go through a single write
//! connection. The database runs in WAL mode so readers never block.

use super::models::*;
use super::schema::VERSIONED_SCHEMAS;
use super::trait_def::{
    ListParams, MusicStore, Ordering, OrderingDirection, Page, StoreError,
};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection, ToSql};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use tracing::info;

pub(super) const TRACK_SELECT: &str = "SELECT t.id, t.name, t.composer, t.milliseconds, \
     t.bytes, t.unit_price_cents, al.id, al.title, ar.id, ar.name, g.id, g.name";
pub(super) const TRACK_FROM: &str = "FROM tracks t \
     LEFT JOIN albums al ON al.id = t.album_id \
     LEFT JOIN artists ar ON ar.id = al.artist_id \
     LEFT JOIN genres g ON g.id = t.genre_id";

pub(super) const ALBUM_SELECT: &str = "SELECT al.id, al.title, ar.id, ar.name";
pub(super) const ALBUM_FROM: &str =
    "FROM albums al JOIN artists ar ON ar.id = al.artist_id";

pub(super) const CUSTOMER_SELECT: &str = "SELECT c.id, c.first_name, c.last_name, c.email, \
     c.company, c.address, c.city, c.state, c.country, c.postal_code, c.phone";
pub(super) const CUSTOMER_FROM: &str = "FROM customers c";

const INVOICE_SELECT: &str = "SELECT i.id, i.invoice_date, i.billing_address, \
     i.billing_city, i.billing_country, i.total_cents, \
     c.id, c.first_name, c.last_name, c.email, c.company, c.address, c.city, c.state, \
     c.country, c.postal_code, c.phone";
const INVOICE_FROM: &str = "FROM invoices i JOIN customers c ON c.id = i.customer_id";

const ARTIST_ORDERINGS: &[(&str, &str)] = &[("id", "a.id"), ("name", "a.name")];
const GENRE_ORDERINGS: &[(&str, &str)] = &[("id", "g.id"), ("name", "g.name")];
const ALBUM_ORDERINGS: &[(&str, &str)] = &[
    ("id", "al.id"),
    ("title", "al.title"),
    ("artist", "ar.name"),
];
const TRACK_ORDERINGS: &[(&str, &str)] = &[
    ("id", "t.id"),
    ("name", "t.name"),
    ("album", "al.title"),
    ("genre", "g.name"),
    ("milliseconds", "t.milliseconds"),
    ("unit_price", "t.unit_price_cents"),
];
const CUSTOMER_ORDERINGS: &[(&str, &str)] = &[
    ("id", "c.id"),
    ("first_name", "c.first_name"),
    ("last_name", "c.last_name"),
    ("email", "c.email"),
    ("country", "c.country"),
];
const INVOICE_ORDERINGS: &[(&str, &str)] = &[
    ("id", "i.id"),
    ("invoice_date", "i.invoice_date"),
    ("total", "i.total_cents"),
];

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let latest_version = VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating music store schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    if db_version < BASE_DB_VERSION as i64 {
        anyhow::bail!(
            "Music store database has unrecognized user_version {}",
            db_version
        );
    }

    let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;
    if current_version < latest_version {
        let tx = conn.transaction()?;
        for schema in VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating music store from version {} to {}",
                    current_version, schema.version
                );
                migration_fn(&tx)?;
                current_version = schema.version;
            }
        }
        tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
        tx.commit()?;
    }

    latest_schema
        .validate(conn)
        .context("Music store schema validation failed")?;
    Ok(())
}

fn order_clause(
    ordering: Option<&Ordering>,
    allowed: &[(&str, &str)],
    tie_break: &str,
) -> Result<String, StoreError> {
    match ordering {
        None => Ok(format!(" ORDER BY {} ASC", tie_break)),
        Some(ordering) => {
            let sql_expr = allowed
                .iter()
                .find(|(field, _)| *field == ordering.field)
                .map(|(_, expr)| *expr)
                .ok_or_else(|| StoreError::UnknownOrderingField(ordering.field.clone()))?;
            let direction = match ordering.direction {
                OrderingDirection::Ascending => "ASC",
                OrderingDirection::Descending => "DESC",
            };
            Ok(format!(
                " ORDER BY {} {}, {} ASC",
                sql_expr, direction, tie_break
            ))
        }
    }
}

fn fetch_page<T, F>(
    conn: &Connection,
    select: &str,
    from_where: &str,
    order: &str,
    values: &[Box<dyn ToSql>],
    params: &ListParams,
    parse: F,
) -> Result<Page<T>, StoreError>
where
    F: Fn(&rusqlite::Row) -> rusqlite::Result<T>,
{
    let count_sql = format!("SELECT COUNT(*) {}", from_where);
    let total: i64 = conn.query_row(
        &count_sql,
        params_from_iter(values.iter()),
        |r| r.get(0),
    )?;

    let rows_sql = format!("{} {}{} LIMIT ? OFFSET ?", select, from_where, order);
    let mut stmt = conn.prepare_cached(&rows_sql)?;
    let limit = params.page_size as i64;
    let offset = params.offset() as i64;
    let mut all_values: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
    all_values.push(&limit);
    all_values.push(&offset);
    let items = stmt
        .query_map(&all_values[..], parse)?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;

    Ok(Page {
        total: total as usize,
        items,
    })
}

#[derive(Clone)]
pub struct SqliteMusicStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

impl SqliteMusicStore {
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open music store database")?;

        migrate_if_needed(&mut write_conn)?;

        write_conn.pragma_update(None, "journal_mode", "WAL")?;
        write_conn.pragma_update(None, "foreign_keys", "ON")?;

        let track_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM tracks", [], |r| r.get(0))
            .unwrap_or(0);
        let invoice_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM invoices", [], |r| r.get(0))
            .unwrap_or(0);
        info!(
            "Opened music store: {} tracks, {} invoices",
            track_count, invoice_count
        );

        let mut read_pool = Vec::with_capacity(read_pool_size);
        for _ in 0..read_pool_size {
            let read_conn = Connection::open_with_flags(
                db_path_ref,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_conn.pragma_update(None, "journal_mode", "WAL")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteMusicStore {
            read_pool,
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub(super) fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, AtomicOrdering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    // =========================================================================
    // Row parsers
    // =========================================================================

    pub(super) fn parse_artist_row(row: &rusqlite::Row) -> rusqlite::Result<Artist> {
        Ok(Artist {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    pub(super) fn parse_genre_row(row: &rusqlite::Row) -> rusqlite::Result<Genre> {
        Ok(Genre {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    /// Parse an Album from (al.id, al.title, ar.id, ar.name).
    pub(super) fn parse_album_row(row: &rusqlite::Row) -> rusqlite::Result<Album> {
        Ok(Album {
            id: row.get(0)?,
            title: row.get(1)?,
            artist: Artist {
                id: row.get(2)?,
                name: row.get(3)?,
            },
        })
    }

    /// Parse a Track from the `TRACK_SELECT` column order.
    pub(super) fn parse_track_row(row: &rusqlite::Row) -> rusqlite::Result<Track> {
        let album = match row.get::<_, Option<i64>>(6)? {
            Some(album_id) => Some(Album {
                id: album_id,
                title: row.get(7)?,
                artist: Artist {
                    id: row.get(8)?,
                    name: row.get(9)?,
                },
            }),
            None => None,
        };
        let genre = match row.get::<_, Option<i64>>(10)? {
            Some(genre_id) => Some(Genre {
                id: genre_id,
                name: row.get(11)?,
            }),
            None => None,
        };
        Ok(Track {
            id: row.get(0)?,
            name: row.get(1)?,
            album,
            genre,
            composer: row.get(2)?,
            milliseconds: row.get(3)?,
            bytes: row.get(4)?,
            unit_price: cents_to_decimal(row.get(5)?),
        })
    }

    /// Parse a Customer from 11 consecutive columns starting at `base`.
    pub(super) fn parse_customer_columns(
        row: &rusqlite::Row,
        base: usize,
    ) -> rusqlite::Result<Customer> {
        Ok(Customer {
            id: row.get(base)?,
            first_name: row.get(base + 1)?,
            last_name: row.get(base + 2)?,
            email: row.get(base + 3)?,
            company: row.get(base + 4)?,
            address: row.get(base + 5)?,
            city: row.get(base + 6)?,
            state: row.get(base + 7)?,
            country: row.get(base + 8)?,
            postal_code: row.get(base + 9)?,
            phone: row.get(base + 10)?,
        })
    }

    /// Parse an Invoice from the `INVOICE_SELECT` column order.
    fn parse_invoice_row(row: &rusqlite::Row) -> rusqlite::Result<Invoice> {
        Ok(Invoice {
            id: row.get(0)?,
            customer: Self::parse_customer_columns(row, 6)?,
            invoice_date: format_date(row.get(1)?),
            billing_address: row.get(2)?,
            billing_city: row.get(3)?,
            billing_country: row.get(4)?,
            total: cents_to_decimal(row.get(5)?),
        })
    }

    fn get_invoice_lines(conn: &Connection, invoice_id: i64) -> Result<Vec<InvoiceLine>, StoreError> {
        let sql = format!(
            "SELECT il.id, il.unit_price_cents, il.quantity, {} {} \
             JOIN invoice_lines il ON il.track_id = t.id \
             WHERE il.invoice_id = ?1 ORDER BY il.id ASC",
            // re-select track columns after the line's own
            TRACK_SELECT.trim_start_matches("SELECT "),
            TRACK_FROM,
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let lines = stmt
            .query_map(params![invoice_id], |row| {
                // track columns start at index 3
                let track = Track {
                    id: row.get(3)?,
                    name: row.get(4)?,
                    composer: row.get(5)?,
                    milliseconds: row.get(6)?,
                    bytes: row.get(7)?,
                    unit_price: cents_to_decimal(row.get(8)?),
                    album: match row.get::<_, Option<i64>>(9)? {
                        Some(album_id) => Some(Album {
                            id: album_id,
                            title: row.get(10)?,
                            artist: Artist {
                                id: row.get(11)?,
                                name: row.get(12)?,
                            },
                        }),
                        None => None,
                    },
                    genre: match row.get::<_, Option<i64>>(13)? {
                        Some(genre_id) => Some(Genre {
                            id: genre_id,
                            name: row.get(14)?,
                        }),
                        None => None,
                    },
                };
                Ok(InvoiceLine {
                    id: row.get(0)?,
                    track,
                    unit_price: cents_to_decimal(row.get(1)?),
                    quantity: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;
        Ok(lines)
    }

    fn get_one<T, F>(&self, sql: &str, id: i64, parse: F) -> Result<Option<T>, StoreError>
    where
        F: Fn(&rusqlite::Row) -> rusqlite::Result<T>,
    {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(sql)?;
        match stmt.query_row(params![id], parse) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Write operations (external seeding and test fixtures)
    // =========================================================================

    pub fn insert_artist(&self, id: i64, name: &str) -> Result<(), StoreError> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO artists (id, name) VALUES (?1, ?2)",
            params![id, name],
        )?;
        Ok(())
    }

    pub fn insert_genre(&self, id: i64, name: &str) -> Result<(), StoreError> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO genres (id, name) VALUES (?1, ?2)",
            params![id, name],
        )?;
        Ok(())
    }

    pub fn insert_album(&self, id: i64, title: &str, artist_id: i64) -> Result<(), StoreError> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO albums (id, title, artist_id) VALUES (?1, ?2, ?3)",
            params![id, title, artist_id],
        )?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert_track(
        &self,
        id: i64,
        name: &str,
        album_id: Option<i64>,
        genre_id: Option<i64>,
        composer: Option<&str>,
        milliseconds: i64,
        unit_price_cents: i64,
    ) -> Result<(), StoreError> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO tracks (id, name, album_id, genre_id, composer, milliseconds, unit_price_cents) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![id, name, album_id, genre_id, composer, milliseconds, unit_price_cents],
        )?;
        Ok(())
    }

    pub fn insert_customer(
        &self,
        id: i64,
        first_name: &str,
        last_name: &str,
        email: &str,
        country: Option<&str>,
    ) -> Result<(), StoreError> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO customers (id, first_name, last_name, email, country) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, first_name, last_name, email, country],
        )?;
        Ok(())
    }

    pub fn insert_invoice(
        &self,
        id: i64,
        customer_id: i64,
        invoice_date: i64,
        billing_country: Option<&str>,
        total_cents: i64,
    ) -> Result<(), StoreError> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO invoices (id, customer_id, invoice_date, billing_country, total_cents) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, customer_id, invoice_date, billing_country, total_cents],
        )?;
        Ok(())
    }

    pub fn insert_invoice_line(
        &self,
        id: i64,
        invoice_id: i64,
        track_id: i64,
        unit_price_cents: i64,
        quantity: i64,
    ) -> Result<(), StoreError> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO invoice_lines (id, invoice_id, track_id, unit_price_cents, quantity) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, invoice_id, track_id, unit_price_cents, quantity],
        )?;
        Ok(())
    }
}

impl MusicStore for SqliteMusicStore {
    fn list_artists(&self, params: &ListParams) -> Result<Page<Artist>, StoreError> {
        let order = order_clause(params.ordering.as_ref(), ARTIST_ORDERINGS, "a.id")?;
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(search) = &params.search {
            conditions.push("a.name LIKE '%' || ? || '%' ESCAPE '\\'");
            values.push(Box::new(escape_like(search)));
        }
        let from_where = build_from_where("FROM artists a", &conditions);

        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        fetch_page(
            &conn,
            "SELECT a.id, a.name",
            &from_where,
            &order,
            &values,
            params,
            Self::parse_artist_row,
        )
    }

    fn get_artist(&self, id: i64) -> Result<Option<Artist>, StoreError> {
        self.get_one(
            "SELECT id, name FROM artists WHERE id = ?1",
            id,
            Self::parse_artist_row,
        )
    }

    fn list_genres(&self, params: &ListParams) -> Result<Page<Genre>, StoreError> {
        let order = order_clause(params.ordering.as_ref(), GENRE_ORDERINGS, "g.id")?;
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(search) = &params.search {
            conditions.push("g.name LIKE '%' || ? || '%' ESCAPE '\\'");
            values.push(Box::new(escape_like(search)));
        }
        let from_where = build_from_where("FROM genres g", &conditions);

        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        fetch_page(
            &conn,
            "SELECT g.id, g.name",
            &from_where,
            &order,
            &values,
            params,
            Self::parse_genre_row,
        )
    }

    fn get_genre(&self, id: i64) -> Result<Option<Genre>, StoreError> {
        self.get_one(
            "SELECT id, name FROM genres WHERE id = ?1",
            id,
            Self::parse_genre_row,
        )
    }

    fn list_albums(
        &self,
        params: &ListParams,
        artist_id: Option<i64>,
    ) -> Result<Page<Album>, StoreError> {
        let order = order_clause(params.ordering.as_ref(), ALBUM_ORDERINGS, "al.id")?;
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(search) = &params.search {
            conditions.push(
                "(al.title LIKE '%' || ?1 || '%' ESCAPE '\\' \
                 OR ar.name LIKE '%' || ?1 || '%' ESCAPE '\\')",
            );
            values.push(Box::new(escape_like(search)));
        }
        if let Some(artist_id) = artist_id {
            conditions.push(if values.is_empty() {
                "al.artist_id = ?1"
            } else {
                "al.artist_id = ?2"
            });
            values.push(Box::new(artist_id));
        }
        let from_where = build_from_where(ALBUM_FROM, &conditions);

        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        fetch_page(
            &conn,
            ALBUM_SELECT,
            &from_where,
            &order,
            &values,
            params,
            Self::parse_album_row,
        )
    }

    fn get_album(&self, id: i64) -> Result<Option<Album>, StoreError> {
        let sql = format!("{} {} WHERE al.id = ?1", ALBUM_SELECT, ALBUM_FROM);
        self.get_one(&sql, id, Self::parse_album_row)
    }

    fn list_tracks(
        &self,
        params: &ListParams,
        album_id: Option<i64>,
        genre_id: Option<i64>,
    ) -> Result<Page<Track>, StoreError> {
        let order = order_clause(params.ordering.as_ref(), TRACK_ORDERINGS, "t.id")?;
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(search) = &params.search {
            values.push(Box::new(escape_like(search)));
            conditions.push(format!(
                "t.name LIKE '%' || ?{} || '%' ESCAPE '\\'",
                values.len()
            ));
        }
        if let Some(album_id) = album_id {
            values.push(Box::new(album_id));
            conditions.push(format!("t.album_id = ?{}", values.len()));
        }
        if let Some(genre_id) = genre_id {
            values.push(Box::new(genre_id));
            conditions.push(format!("t.genre_id = ?{}", values.len()));
        }
        let condition_refs: Vec<&str> = conditions.iter().map(String::as_str).collect();
        let from_where = build_from_where(TRACK_FROM, &condition_refs);

        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        fetch_page(
            &conn,
            TRACK_SELECT,
            &from_where,
            &order,
            &values,
            params,
            Self::parse_track_row,
        )
    }

    fn get_track(&self, id: i64) -> Result<Option<Track>, StoreError> {
        let sql = format!("{} {} WHERE t.id = ?1", TRACK_SELECT, TRACK_FROM);
        self.get_one(&sql, id, Self::parse_track_row)
    }

    fn list_customers(
        &self,
        params: &ListParams,
        country: Option<&str>,
    ) -> Result<Page<Customer>, StoreError> {
        let order = order_clause(params.ordering.as_ref(), CUSTOMER_ORDERINGS, "c.id")?;
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(search) = &params.search {
            values.push(Box::new(escape_like(search)));
            let n = values.len();
            conditions.push(format!(
                "(c.first_name LIKE '%' || ?{n} || '%' ESCAPE '\\' \
                 OR c.last_name LIKE '%' || ?{n} || '%' ESCAPE '\\' \
                 OR c.email LIKE '%' || ?{n} || '%' ESCAPE '\\')"
            ));
        }
        if let Some(country) = country {
            values.push(Box::new(country.to_string()));
            conditions.push(format!("c.country = ?{}", values.len()));
        }
        let condition_refs: Vec<&str> = conditions.iter().map(String::as_str).collect();
        let from_where = build_from_where(CUSTOMER_FROM, &condition_refs);

        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        fetch_page(
            &conn,
            CUSTOMER_SELECT,
            &from_where,
            &order,
            &values,
            params,
            |row| Self::parse_customer_columns(row, 0),
        )
    }

    fn get_customer(&self, id: i64) -> Result<Option<Customer>, StoreError> {
        let sql = format!("{} {} WHERE c.id = ?1", CUSTOMER_SELECT, CUSTOMER_FROM);
        self.get_one(&sql, id, |row| Self::parse_customer_columns(row, 0))
    }

    fn list_invoices(
        &self,
        params: &ListParams,
        customer_id: Option<i64>,
    ) -> Result<Page<Invoice>, StoreError> {
        let order = order_clause(params.ordering.as_ref(), INVOICE_ORDERINGS, "i.id")?;
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(search) = &params.search {
            values.push(Box::new(escape_like(search)));
            let n = values.len();
            conditions.push(format!(
                "(c.first_name LIKE '%' || ?{n} || '%' ESCAPE '\\' \
                 OR c.last_name LIKE '%' || ?{n} || '%' ESCAPE '\\')"
            ));
        }
        if let Some(customer_id) = customer_id {
            values.push(Box::new(customer_id));
            conditions.push(format!("i.customer_id = ?{}", values.len()));
        }
        let condition_refs: Vec<&str> = conditions.iter().map(String::as_str).collect();
        let from_where = build_from_where(INVOICE_FROM, &condition_refs);

        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        fetch_page(
            &conn,
            INVOICE_SELECT,
            &from_where,
            &order,
            &values,
            params,
            Self::parse_invoice_row,
        )
    }

    fn get_invoice(&self, id: i64) -> Result<Option<InvoiceDetail>, StoreError> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let sql = format!("{} {} WHERE i.id = ?1", INVOICE_SELECT, INVOICE_FROM);
        let mut stmt = conn.prepare_cached(&sql)?;
        let invoice = match stmt.query_row(params![id], Self::parse_invoice_row) {
            Ok(invoice) => invoice,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let lines = Self::get_invoice_lines(&conn, id)?;
        Ok(Some(InvoiceDetail { invoice, lines }))
    }
}

/// Escapes LIKE metacharacters so search terms match literally. Every
/// condition binding the result must carry an `ESCAPE '\'` clause.
pub(super) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn build_from_where(from: &str, conditions: &[&str]) -> String {
    if conditions.is_empty() {
        from.to_string()
    } else {
        format!("{} WHERE {}", from, conditions.join(" AND "))
    }
}
