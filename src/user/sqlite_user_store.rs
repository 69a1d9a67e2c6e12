use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
    DEFAULT_TIMESTAMP,
};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use std::{
    path::Path,
    str::FromStr,
    sync::{Arc, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::info;

use super::auth::{AuthToken, AuthTokenValue, PasswordCredentials, TrackpulseHasher};
use super::permissions::{Permission, UserRole};
use super::user_models::{AccountUpdate, NewUserAccount, ProfileUpdate, UserAccount, UserProfile};
use super::user_store::UserStore;

const USER_FK: ForeignKey = ForeignKey {
    foreign_table: "user_account",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

/// V 0
const USER_ACCOUNT_TABLE_V_0: Table = Table {
    name: "user_account",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("username", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("first_name", &SqlType::Text, non_null = true),
        sqlite_column!("last_name", &SqlType::Text, non_null = true),
        sqlite_column!("role", &SqlType::Text, non_null = true),
        sqlite_column!(
            "is_active",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "is_staff",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_login", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_account_email", "email")],
};

const USER_PASSWORD_CREDENTIALS_TABLE_V_0: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_tried", &SqlType::Integer),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[],
};

const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[("idx_auth_token_value", "value")],
};

const PERMISSION_TABLE_V_0: Table = Table {
    name: "permission",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!("resource_type", &SqlType::Text),
    ],
    unique_constraints: &[],
    indices: &[],
};

const ROLE_PERMISSION_TABLE_V_0: Table = Table {
    name: "role_permission",
    columns: &[
        sqlite_column!("role", &SqlType::Text, non_null = true),
        sqlite_column!(
            "permission_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "permission",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["role", "permission_id"]],
    indices: &[("idx_role_permission_role", "role")],
};

const USER_PROFILE_TABLE_V_0: Table = Table {
    name: "user_profile",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("bio", &SqlType::Text),
        sqlite_column!("location", &SqlType::Text),
        sqlite_column!("birth_date", &SqlType::Text),
        sqlite_column!("phone_number", &SqlType::Text),
        sqlite_column!(
            "timezone",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'UTC'")
        ),
        sqlite_column!(
            "theme_preference",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'light'")
        ),
        sqlite_column!(
            "default_date_range",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("30")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("updated", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[],
};

const USER_SETTING_TABLE_V_0: Table = Table {
    name: "user_setting",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("setting_key", &SqlType::Text, non_null = true),
        sqlite_column!("setting_value", &SqlType::Text, non_null = true),
    ],
    unique_constraints: &[&["user_id", "setting_key"]],
    indices: &[],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_ACCOUNT_TABLE_V_0,
        USER_PASSWORD_CREDENTIALS_TABLE_V_0,
        AUTH_TOKEN_TABLE_V_0,
        PERMISSION_TABLE_V_0,
        ROLE_PERMISSION_TABLE_V_0,
        USER_PROFILE_TABLE_V_0,
        USER_SETTING_TABLE_V_0,
    ],
    migration: None,
}];

pub(super) fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            let conn = Connection::open(db_path)?;
            VERSIONED_SCHEMAS
                .last()
                .context("No user schema defined")?
                .create(&conn)?;
            conn
        };

        let db_version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
            .context("Failed to read user database version")?
            - BASE_DB_VERSION as i64;

        if db_version < 0 {
            bail!(
                "User database version is too old, does not contain base db version {}",
                BASE_DB_VERSION
            );
        }
        let version = db_version as usize;

        if version >= VERSIONED_SCHEMAS.len() {
            bail!("User database version {} is too new", version);
        }
        VERSIONED_SCHEMAS
            .get(version)
            .context("Failed to get user schema")?
            .validate(&conn)?;

        Self::migrate_if_needed(&conn, version)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate_if_needed(conn: &Connection, version: usize) -> Result<()> {
        let mut latest_from = version;
        for schema in VERSIONED_SCHEMAS.iter().skip(version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating user db from version {} to {}",
                    latest_from, schema.version
                );
                migration_fn(conn)?;
                latest_from = schema.version;
            }
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest_from),
            [],
        )?;
        Ok(())
    }

    fn parse_account_row(row: &rusqlite::Row) -> rusqlite::Result<UserAccount> {
        let role_str: String = row.get(5)?;
        let role = UserRole::from_str(&role_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                format!("unknown role '{}'", role_str).into(),
            )
        })?;
        Ok(UserAccount {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            role,
            is_active: row.get::<_, i64>(6)? != 0,
            is_staff: row.get::<_, i64>(7)? != 0,
            created: row.get(8)?,
            last_login: row.get(9)?,
        })
    }

    fn get_account_where(&self, condition: &str, value: &dyn rusqlite::ToSql) -> Result<Option<UserAccount>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT id, username, email, first_name, last_name, role, is_active, is_staff, \
             created, last_login FROM user_account WHERE {}",
            condition
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        match stmt.query_row([value], Self::parse_account_row) {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn parse_profile_row(row: &rusqlite::Row) -> rusqlite::Result<UserProfile> {
        Ok(UserProfile {
            user_id: row.get(0)?,
            bio: row.get(1)?,
            location: row.get(2)?,
            birth_date: row.get(3)?,
            phone_number: row.get(4)?,
            timezone: row.get(5)?,
            theme_preference: row.get(6)?,
            default_date_range: row.get(7)?,
        })
    }

    fn get_profile(conn: &Connection, user_id: i64) -> Result<Option<UserProfile>> {
        let mut stmt = conn.prepare_cached(
            "SELECT user_id, bio, location, birth_date, phone_number, timezone, \
             theme_preference, default_date_range FROM user_profile WHERE user_id = ?1",
        )?;
        match stmt.query_row(params![user_id], Self::parse_profile_row) {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, new_account: &NewUserAccount) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_account (username, email, first_name, last_name, role, is_staff) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new_account.username,
                new_account.email,
                new_account.first_name,
                new_account.last_name,
                new_account.role.as_str(),
                new_account.is_staff as i64,
            ],
        )
        .with_context(|| format!("Failed to create user {}", new_account.username))?;
        Ok(conn.last_insert_rowid())
    }

    fn get_user_by_id(&self, user_id: i64) -> Result<Option<UserAccount>> {
        self.get_account_where("id = ?1", &user_id)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        self.get_account_where("email = ?1", &email)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<UserAccount>> {
        self.get_account_where("username = ?1", &username)
    }

    fn update_user_account(&self, user_id: i64, update: &AccountUpdate) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE user_account SET \
             first_name = COALESCE(?2, first_name), \
             last_name = COALESCE(?3, last_name), \
             email = COALESCE(?4, email) \
             WHERE id = ?1",
            params![user_id, update.first_name, update.last_name, update.email],
        )
        .context("Failed to update user account")?;
        Ok(())
    }

    fn set_last_login(&self, user_id: i64, timestamp: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE user_account SET last_login = ?2 WHERE id = ?1",
            params![user_id, timestamp],
        )?;
        Ok(())
    }

    fn set_password_credentials(&self, credentials: &PasswordCredentials) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_password_credentials (user_id, salt, hash, hasher, created) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(user_id) DO UPDATE SET salt = ?2, hash = ?3, hasher = ?4",
            params![
                credentials.user_id,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string(),
                credentials.created,
            ],
        )?;
        Ok(())
    }

    fn get_password_credentials(&self, user_id: i64) -> Result<Option<PasswordCredentials>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT user_id, salt, hash, hasher, created, last_tried, last_used \
             FROM user_password_credentials WHERE user_id = ?1",
        )?;
        let result = stmt.query_row(params![user_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Option<i64>>(5)?,
                row.get::<_, Option<i64>>(6)?,
            ))
        });
        match result {
            Ok((user_id, salt, hash, hasher, created, last_tried, last_used)) => {
                Ok(Some(PasswordCredentials {
                    user_id,
                    salt,
                    hash,
                    hasher: TrackpulseHasher::from_str(&hasher)?,
                    created,
                    last_tried,
                    last_used,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn record_password_attempt(&self, user_id: i64, timestamp: i64, success: bool) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE user_password_credentials SET last_tried = ?2, \
             last_used = CASE WHEN ?3 THEN ?2 ELSE last_used END \
             WHERE user_id = ?1",
            params![user_id, timestamp, success],
        )?;
        Ok(())
    }

    fn add_auth_token(&self, token: &AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO auth_token (user_id, value, created) VALUES (?1, ?2, ?3)",
            params![token.user_id, token.value.0, token.created],
        )
        .context("Failed to add auth token")?;
        Ok(())
    }

    fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT user_id, value, created, last_used FROM auth_token WHERE value = ?1",
        )?;
        let result = stmt.query_row(params![value.0], |row| {
            Ok(AuthToken {
                user_id: row.get(0)?,
                value: AuthTokenValue(row.get(1)?),
                created: row.get(2)?,
                last_used: row.get(3)?,
            })
        });
        match result {
            Ok(token) => Ok(Some(token)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let existing = self.get_auth_token(value)?;
        if existing.is_some() {
            let conn = self.conn.lock().unwrap();
            conn.execute("DELETE FROM auth_token WHERE value = ?1", params![value.0])?;
        }
        Ok(existing)
    }

    fn touch_auth_token(&self, value: &AuthTokenValue, timestamp: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE auth_token SET last_used = ?2 WHERE value = ?1",
            params![value.0, timestamp],
        )?;
        Ok(())
    }

    fn ensure_permission(&self, permission: Permission) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO permission (id, name, description, resource_type) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                permission.as_int(),
                permission.name(),
                permission.description(),
                permission.resource_type(),
            ],
        )?;
        Ok(())
    }

    fn grant_role_permission(&self, role: UserRole, permission: Permission) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO role_permission (role, permission_id) VALUES (?1, ?2)",
            params![role.as_str(), permission.as_int()],
        )?;
        Ok(())
    }

    fn resolve_role_permissions(&self, role: UserRole) -> Result<Vec<Permission>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT permission_id FROM role_permission WHERE role = ?1 ORDER BY permission_id",
        )?;
        let ids = stmt
            .query_map(params![role.as_str()], |row| row.get::<_, i32>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids.into_iter().filter_map(Permission::from_int).collect())
    }

    fn get_or_create_profile(&self, user_id: i64) -> Result<UserProfile> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO user_profile (user_id) VALUES (?1)",
            params![user_id],
        )?;
        Self::get_profile(&conn, user_id)?
            .with_context(|| format!("Profile for user {} missing after upsert", user_id))
    }

    fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<UserProfile> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO user_profile (user_id) VALUES (?1)",
            params![user_id],
        )?;
        conn.execute(
            "UPDATE user_profile SET \
             bio = COALESCE(?2, bio), \
             location = COALESCE(?3, location), \
             birth_date = COALESCE(?4, birth_date), \
             phone_number = COALESCE(?5, phone_number), \
             timezone = COALESCE(?6, timezone), \
             theme_preference = COALESCE(?7, theme_preference), \
             default_date_range = COALESCE(?8, default_date_range), \
             updated = ?9 \
             WHERE user_id = ?1",
            params![
                user_id,
                update.bio,
                update.location,
                update.birth_date,
                update.phone_number,
                update.timezone,
                update.theme_preference,
                update.default_date_range,
                now_unix(),
            ],
        )?;
        Self::get_profile(&conn, user_id)?
            .with_context(|| format!("Profile for user {} missing after update", user_id))
    }

    fn get_user_setting(&self, user_id: i64, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT setting_value FROM user_setting WHERE user_id = ?1 AND setting_key = ?2",
        )?;
        match stmt.query_row(params![user_id, key], |row| row.get(0)) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_user_setting(&self, user_id: i64, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_setting (user_id, setting_key, setting_value) VALUES (?1, ?2, ?3) \
             ON CONFLICT(user_id, setting_key) DO UPDATE SET setting_value = ?3",
            params![user_id, key, value],
        )?;
        Ok(())
    }
}
