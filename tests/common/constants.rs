//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes (user credentials, store contents, etc.),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// Regular test user name
pub const TEST_USER: &str = "testuser";

/// Regular test user email
pub const TEST_EMAIL: &str = "testuser@example.com";

/// Regular test user password
pub const TEST_PASS: &str = "testpass123";

/// Admin test user name
pub const ADMIN_USER: &str = "testadmin";

/// Admin test user email
pub const ADMIN_EMAIL: &str = "testadmin@example.com";

/// Admin test user password
pub const ADMIN_PASS: &str = "adminpass123";

// ============================================================================
// Test Store IDs
// ============================================================================

/// Artist id for "The Velvet Waves"
pub const ARTIST_1_ID: i64 = 1;

/// Artist id for "Night Circuit"
pub const ARTIST_2_ID: i64 = 2;

/// Genre id for "Rock"
pub const GENRE_ROCK_ID: i64 = 1;

/// Genre id for "Jazz"
pub const GENRE_JAZZ_ID: i64 = 2;

/// Genre id for "Classical" (no sales)
pub const GENRE_CLASSICAL_ID: i64 = 3;

/// Album id for "Tidal Lines" by The Velvet Waves
pub const ALBUM_1_ID: i64 = 1;

/// Album id for "Neon Maps" by Night Circuit
pub const ALBUM_2_ID: i64 = 2;

/// Track id for "Undertow" on Tidal Lines (Rock, sold twice)
pub const TRACK_1_ID: i64 = 1;

/// Track id for "Glass Harbor" on Tidal Lines (Rock)
pub const TRACK_2_ID: i64 = 2;

/// Track id for "Midnight Transit" on Neon Maps (Jazz)
pub const TRACK_3_ID: i64 = 3;

/// Customer id for Jane Doe (Australia)
pub const CUSTOMER_1_ID: i64 = 1;

/// Customer id for Ken Larsen (Norway)
pub const CUSTOMER_2_ID: i64 = 2;

/// Customer id for Ana Ruiz (no country)
pub const CUSTOMER_3_ID: i64 = 3;

/// Invoice id for Jane's March order (2 x Undertow, 1.98)
pub const INVOICE_1_ID: i64 = 1;

/// Invoice id for Ken's March order (Midnight Transit, 1.29)
pub const INVOICE_2_ID: i64 = 2;

/// Invoice id for Jane's April order (Glass Harbor, 0.99)
pub const INVOICE_3_ID: i64 = 3;

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the test server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5_000;

/// Interval between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 25;

/// Per-request timeout for the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
