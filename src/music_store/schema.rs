use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const ALBUM_ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const TRACK_ALBUM_FK: ForeignKey = ForeignKey {
    foreign_table: "albums",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const TRACK_GENRE_FK: ForeignKey = ForeignKey {
    foreign_table: "genres",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const INVOICE_CUSTOMER_FK: ForeignKey = ForeignKey {
    foreign_table: "customers",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const LINE_INVOICE_FK: ForeignKey = ForeignKey {
    foreign_table: "invoices",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const LINE_TRACK_FK: ForeignKey = ForeignKey {
    foreign_table: "tracks",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const ARTISTS_TABLE_V0: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[("index_artists_name", "name")],
    unique_constraints: &[],
};

const GENRES_TABLE_V0: Table = Table {
    name: "genres",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

const ALBUMS_TABLE_V0: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ALBUM_ARTIST_FK)
        ),
    ],
    indices: &[
        ("index_albums_title", "title"),
        ("index_albums_artist_id", "artist_id"),
    ],
    unique_constraints: &[],
};

const TRACKS_TABLE_V0: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "album_id",
            &SqlType::Integer,
            foreign_key = Some(&TRACK_ALBUM_FK)
        ),
        sqlite_column!(
            "genre_id",
            &SqlType::Integer,
            foreign_key = Some(&TRACK_GENRE_FK)
        ),
        sqlite_column!("composer", &SqlType::Text),
        sqlite_column!("milliseconds", &SqlType::Integer, non_null = true),
        sqlite_column!("bytes", &SqlType::Integer),
        sqlite_column!("unit_price_cents", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("index_tracks_name", "name"),
        ("index_tracks_album_id", "album_id"),
        ("index_tracks_genre_id", "genre_id"),
    ],
    unique_constraints: &[],
};

const CUSTOMERS_TABLE_V0: Table = Table {
    name: "customers",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("first_name", &SqlType::Text, non_null = true),
        sqlite_column!("last_name", &SqlType::Text, non_null = true),
        sqlite_column!("email", &SqlType::Text, non_null = true),
        sqlite_column!("company", &SqlType::Text),
        sqlite_column!("address", &SqlType::Text),
        sqlite_column!("city", &SqlType::Text),
        sqlite_column!("state", &SqlType::Text),
        sqlite_column!("country", &SqlType::Text),
        sqlite_column!("postal_code", &SqlType::Text),
        sqlite_column!("phone", &SqlType::Text),
    ],
    indices: &[
        ("index_customers_last_name", "last_name"),
        ("index_customers_country", "country"),
    ],
    unique_constraints: &[],
};

const INVOICES_TABLE_V0: Table = Table {
    name: "invoices",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "customer_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&INVOICE_CUSTOMER_FK)
        ),
        sqlite_column!("invoice_date", &SqlType::Integer, non_null = true),
        sqlite_column!("billing_address", &SqlType::Text),
        sqlite_column!("billing_city", &SqlType::Text),
        sqlite_column!("billing_country", &SqlType::Text),
        sqlite_column!("total_cents", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("index_invoices_customer_id", "customer_id"),
        ("index_invoices_invoice_date", "invoice_date"),
    ],
    unique_constraints: &[],
};

const INVOICE_LINES_TABLE_V0: Table = Table {
    name: "invoice_lines",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "invoice_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&LINE_INVOICE_FK)
        ),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&LINE_TRACK_FK)
        ),
        sqlite_column!("unit_price_cents", &SqlType::Integer, non_null = true),
        sqlite_column!("quantity", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("index_invoice_lines_invoice_id", "invoice_id"),
        ("index_invoice_lines_track_id", "track_id"),
    ],
    unique_constraints: &[],
};

pub(super) const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE_V0,
        GENRES_TABLE_V0,
        ALBUMS_TABLE_V0,
        TRACKS_TABLE_V0,
        CUSTOMERS_TABLE_V0,
        INVOICES_TABLE_V0,
        INVOICE_LINES_TABLE_V0,
    ],
    migration: None,
}];
