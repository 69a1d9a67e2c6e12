use super::auth::{AuthToken, AuthTokenValue, PasswordCredentials, TrackpulseHasher};
use super::permissions::{Permission, UserRole};
use super::sqlite_user_store::now_unix;
use super::user_models::{AccountUpdate, NewUserAccount, ProfileUpdate, UserAccount, UserProfile};
use super::user_store::UserStore;
use anyhow::Result;
use std::sync::{Arc, Mutex};

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Deliberately vague so login responses don't leak which part failed.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub struct UserManager {
    user_store: Arc<Mutex<Box<dyn UserStore>>>,
}

impl UserManager {
    pub fn new(user_store: Box<dyn UserStore>) -> Self {
        Self {
            user_store: Arc::new(Mutex::new(user_store)),
        }
    }

    pub fn register(&self, request: RegisterRequest) -> Result<(UserAccount, AuthToken), AuthError> {
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_lowercase();
        if username.is_empty() {
            return Err(AuthError::InvalidInput("Username cannot be empty".into()));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidInput("A valid email is required".into()));
        }
        if request.password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        {
            let store = self.user_store.lock().unwrap();
            if store.get_user_by_email(&email)?.is_some() {
                return Err(AuthError::InvalidInput("Email is already registered".into()));
            }
            if store.get_user_by_username(&username)?.is_some() {
                return Err(AuthError::InvalidInput("Username is already taken".into()));
            }
        }

        let account = self.create_user_with_password(
            &username,
            &email,
            request.first_name.as_deref().unwrap_or(""),
            request.last_name.as_deref().unwrap_or(""),
            UserRole::User,
            false,
            &request.password,
        )?;
        let token = self.issue_token(account.id)?;
        Ok((account, token))
    }

    pub fn login(&self, email: &str, password: &str) -> Result<(UserAccount, AuthToken), AuthError> {
        let email = email.trim().to_lowercase();
        let store = self.user_store.lock().unwrap();

        let mut account = store
            .get_user_by_email(&email)?
            .ok_or(AuthError::InvalidCredentials)?;
        if !account.is_active {
            return Err(AuthError::InvalidCredentials);
        }
        let credentials = store
            .get_password_credentials(account.id)?
            .ok_or(AuthError::InvalidCredentials)?;

        let valid = credentials
            .hasher
            .verify(password, credentials.hash.as_str())
            .map_err(AuthError::Internal)?;
        store.record_password_attempt(account.id, now_unix(), valid)?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }
        let now = now_unix();
        store.set_last_login(account.id, now)?;
        account.last_login = Some(now);

        let token = AuthToken {
            user_id: account.id,
            value: AuthTokenValue::generate(),
            created: now,
            last_used: None,
        };
        store.add_auth_token(&token)?;
        Ok((account, token))
    }

    /// Deletes the token; returns whether it existed.
    pub fn logout(&self, value: &AuthTokenValue) -> Result<bool> {
        Ok(self
            .user_store
            .lock()
            .unwrap()
            .delete_auth_token(value)?
            .is_some())
    }

    /// Resolves a presented token into the account and its permission set,
    /// refreshing the token's last_used timestamp.
    pub fn session_user(
        &self,
        value: &AuthTokenValue,
    ) -> Result<Option<(UserAccount, Vec<Permission>)>> {
        let store = self.user_store.lock().unwrap();
        let token = match store.get_auth_token(value)? {
            Some(token) => token,
            None => return Ok(None),
        };
        let account = match store.get_user_by_id(token.user_id)? {
            Some(account) if account.is_active => account,
            _ => return Ok(None),
        };
        store.touch_auth_token(value, now_unix())?;
        let permissions = store.resolve_role_permissions(account.role)?;
        Ok(Some((account, permissions)))
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<UserAccount>> {
        self.user_store.lock().unwrap().get_user_by_id(user_id)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        self.user_store
            .lock()
            .unwrap()
            .get_user_by_email(&email.to_lowercase())
    }

    pub fn update_account(
        &self,
        user_id: i64,
        mut update: AccountUpdate,
    ) -> Result<UserAccount, AuthError> {
        let store = self.user_store.lock().unwrap();
        if let Some(email) = update.email.take() {
            let email = email.trim().to_lowercase();
            if !email.contains('@') {
                return Err(AuthError::InvalidInput("A valid email is required".into()));
            }
            if let Some(existing) = store.get_user_by_email(&email)? {
                if existing.id != user_id {
                    return Err(AuthError::InvalidInput("Email is already registered".into()));
                }
            }
            update.email = Some(email);
        }
        store.update_user_account(user_id, &update)?;
        store
            .get_user_by_id(user_id)?
            .ok_or_else(|| AuthError::InvalidInput("User not found".into()))
    }

    pub fn get_or_create_profile(&self, user_id: i64) -> Result<UserProfile> {
        self.user_store.lock().unwrap().get_or_create_profile(user_id)
    }

    pub fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<UserProfile> {
        self.user_store.lock().unwrap().update_profile(user_id, update)
    }

    pub fn get_user_setting(&self, user_id: i64, key: &str) -> Result<Option<String>> {
        self.user_store.lock().unwrap().get_user_setting(user_id, key)
    }

    pub fn set_user_setting(&self, user_id: i64, key: &str, value: &str) -> Result<()> {
        self.user_store
            .lock()
            .unwrap()
            .set_user_setting(user_id, key, value)
    }

    pub(super) fn ensure_permission(&self, permission: Permission) -> Result<()> {
        self.user_store.lock().unwrap().ensure_permission(permission)
    }

    pub(super) fn grant_role_permission(
        &self,
        role: UserRole,
        permission: Permission,
    ) -> Result<()> {
        self.user_store
            .lock()
            .unwrap()
            .grant_role_permission(role, permission)
    }

    fn issue_token(&self, user_id: i64) -> Result<AuthToken> {
        let token = AuthToken {
            user_id,
            value: AuthTokenValue::generate(),
            created: now_unix(),
            last_used: None,
        };
        self.user_store.lock().unwrap().add_auth_token(&token)?;
        Ok(token)
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn create_user_with_password(
        &self,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        role: UserRole,
        is_staff: bool,
        password: &str,
    ) -> Result<UserAccount> {
        let store = self.user_store.lock().unwrap();
        let user_id = store.create_user(&NewUserAccount {
            username: username.to_string(),
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role,
            is_staff,
        })?;

        let hasher = TrackpulseHasher::Argon2;
        let salt = hasher.generate_b64_salt();
        let hash = hasher.hash(password.as_bytes(), &salt)?;
        store.set_password_credentials(&PasswordCredentials {
            user_id,
            salt,
            hash,
            hasher,
            created: now_unix(),
            last_tried: None,
            last_used: None,
        })?;

        store
            .get_user_by_id(user_id)?
            .ok_or_else(|| anyhow::anyhow!("User {} missing right after creation", user_id))
    }
}
