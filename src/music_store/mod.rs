mod analytics;
mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{
    cents_to_decimal, format_date, Album, Artist, Customer, Genre, Invoice, InvoiceDetail,
    InvoiceLine, Track,
};
pub use store::SqliteMusicStore;
pub use trait_def::{
    ListParams, MusicStore, Ordering, OrderingDirection, Page, StoreError,
};
