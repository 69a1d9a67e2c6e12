//! Test data creation
//!
//! Builds the temporary music store and user database every test server
//! runs against. The amounts below are asserted all over the analytics
//! tests, so change them with care.

use super::constants::*;
use anyhow::Result;
use tempfile::TempDir;
use trackpulse_server::music_store::SqliteMusicStore;
use trackpulse_server::user::{
    seed_initial_data, NewUserAccount, PasswordCredentials, RegisterRequest, SqliteUserStore,
    TrackpulseHasher, UserManager, UserRole, UserStore,
};

/// 2024-03-15T00:00:00Z
pub const INVOICE_1_DATE: i64 = 1_710_460_800;
/// 2024-03-20T00:00:00Z
pub const INVOICE_2_DATE: i64 = 1_710_892_800;
/// 2024-04-01T00:00:00Z
pub const INVOICE_3_DATE: i64 = 1_711_929_600;

/// Creates a temporary music store populated with two artists, three
/// genres (one unsold), three tracks and three invoices totalling 4.26
/// across March and April 2024.
pub fn create_test_store() -> Result<(TempDir, SqliteMusicStore)> {
    let temp_dir = TempDir::new()?;
    let store = SqliteMusicStore::new(temp_dir.path().join("store.db"), 2)?;

    store.insert_artist(ARTIST_1_ID, "The Velvet Waves")?;
    store.insert_artist(ARTIST_2_ID, "Night Circuit")?;

    store.insert_genre(GENRE_ROCK_ID, "Rock")?;
    store.insert_genre(GENRE_JAZZ_ID, "Jazz")?;
    store.insert_genre(GENRE_CLASSICAL_ID, "Classical")?;

    store.insert_album(ALBUM_1_ID, "Tidal Lines", ARTIST_1_ID)?;
    store.insert_album(ALBUM_2_ID, "Neon Maps", ARTIST_2_ID)?;

    store.insert_track(
        TRACK_1_ID,
        "Undertow",
        Some(ALBUM_1_ID),
        Some(GENRE_ROCK_ID),
        Some("M. Calloway"),
        214_000,
        99,
    )?;
    store.insert_track(
        TRACK_2_ID,
        "Glass Harbor",
        Some(ALBUM_1_ID),
        Some(GENRE_ROCK_ID),
        None,
        187_000,
        99,
    )?;
    store.insert_track(
        TRACK_3_ID,
        "Midnight Transit",
        Some(ALBUM_2_ID),
        Some(GENRE_JAZZ_ID),
        Some("R. Okafor"),
        305_000,
        129,
    )?;

    store.insert_customer(CUSTOMER_1_ID, "Jane", "Doe", "jane@example.com", Some("Australia"))?;
    store.insert_customer(CUSTOMER_2_ID, "Ken", "Larsen", "ken@example.com", Some("Norway"))?;
    store.insert_customer(CUSTOMER_3_ID, "Ana", "Ruiz", "ana@example.com", None)?;

    store.insert_invoice(INVOICE_1_ID, CUSTOMER_1_ID, INVOICE_1_DATE, Some("Australia"), 198)?;
    store.insert_invoice_line(1, INVOICE_1_ID, TRACK_1_ID, 99, 2)?;

    store.insert_invoice(INVOICE_2_ID, CUSTOMER_2_ID, INVOICE_2_DATE, Some("Norway"), 129)?;
    store.insert_invoice_line(2, INVOICE_2_ID, TRACK_3_ID, 129, 1)?;

    store.insert_invoice(INVOICE_3_ID, CUSTOMER_1_ID, INVOICE_3_DATE, Some("Australia"), 99)?;
    store.insert_invoice_line(3, INVOICE_3_ID, TRACK_2_ID, 99, 1)?;

    Ok((temp_dir, store))
}

fn create_admin_account(store: &SqliteUserStore) -> Result<()> {
    let user_id = store.create_user(&NewUserAccount {
        username: ADMIN_USER.to_string(),
        email: ADMIN_EMAIL.to_string(),
        first_name: "Test".to_string(),
        last_name: "Admin".to_string(),
        role: UserRole::Admin,
        is_staff: true,
    })?;

    let hasher = TrackpulseHasher::Argon2;
    let salt = hasher.generate_b64_salt();
    let hash = hasher.hash(ADMIN_PASS.as_bytes(), &salt)?;
    store.set_password_credentials(&PasswordCredentials {
        user_id,
        salt,
        hash,
        hasher,
        created: chrono::Utc::now().timestamp(),
        last_tried: None,
        last_used: None,
    })?;
    Ok(())
}

/// Creates a temporary user database seeded with role permissions, the
/// regular test user and the admin test user.
pub fn create_test_user_manager() -> Result<(TempDir, UserManager)> {
    let temp_dir = TempDir::new()?;
    let user_store = SqliteUserStore::new(temp_dir.path().join("users.db"))?;
    create_admin_account(&user_store)?;

    let user_manager = UserManager::new(Box::new(user_store));
    seed_initial_data(&user_manager)?;
    user_manager
        .register(RegisterRequest {
            username: TEST_USER.to_string(),
            email: TEST_EMAIL.to_string(),
            password: TEST_PASS.to_string(),
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
        })
        .map_err(|err| anyhow::anyhow!("failed to register test user: {}", err))?;

    Ok((temp_dir, user_manager))
}
