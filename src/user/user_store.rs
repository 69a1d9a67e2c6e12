use super::auth::{AuthToken, AuthTokenValue, PasswordCredentials};
use super::permissions::{Permission, UserRole};
use super::user_models::{AccountUpdate, NewUserAccount, ProfileUpdate, UserAccount, UserProfile};
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Creates a new account row and returns its id.
    /// Fails if the username or email is already taken.
    fn create_user(&self, new_account: &NewUserAccount) -> Result<i64>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user_by_id(&self, user_id: i64) -> Result<Option<UserAccount>>;

    /// Lookup by exact (already lowercased) email.
    fn get_user_by_email(&self, email: &str) -> Result<Option<UserAccount>>;

    fn get_user_by_username(&self, username: &str) -> Result<Option<UserAccount>>;

    /// Applies the non-None fields of the update to the account row.
    fn update_user_account(&self, user_id: i64, update: &AccountUpdate) -> Result<()>;

    fn set_last_login(&self, user_id: i64, timestamp: i64) -> Result<()>;

    /// Replaces the user's password credentials.
    fn set_password_credentials(&self, credentials: &PasswordCredentials) -> Result<()>;

    /// Returns Ok(None) if the user has no password credentials.
    fn get_password_credentials(&self, user_id: i64) -> Result<Option<PasswordCredentials>>;

    fn record_password_attempt(&self, user_id: i64, timestamp: i64, success: bool) -> Result<()>;

    fn add_auth_token(&self, token: &AuthToken) -> Result<()>;

    /// Returns Ok(None) if the token does not exist.
    fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes a token, returning it if it existed.
    fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>>;

    fn touch_auth_token(&self, value: &AuthTokenValue, timestamp: i64) -> Result<()>;

    /// Inserts the permission row if it is not present yet.
    fn ensure_permission(&self, permission: Permission) -> Result<()>;

    /// Grants a permission to a role, a no-op if already granted.
    fn grant_role_permission(&self, role: UserRole, permission: Permission) -> Result<()>;

    /// The permission set granted to a role through the role_permission table.
    fn resolve_role_permissions(&self, role: UserRole) -> Result<Vec<Permission>>;

    /// Returns the user's profile, creating the default one on first access.
    fn get_or_create_profile(&self, user_id: i64) -> Result<UserProfile>;

    /// Applies the non-None fields of the update and returns the new profile.
    /// Creates the profile first if it does not exist yet.
    fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<UserProfile>;

    fn get_user_setting(&self, user_id: i64, key: &str) -> Result<Option<String>>;

    /// Upserts a per-user key/value setting.
    fn set_user_setting(&self, user_id: i64, key: &str, value: &str) -> Result<()>;
}
