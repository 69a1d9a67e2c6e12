mod auth;
mod permissions;
mod seed;
mod sqlite_user_store;
mod user_manager;
mod user_models;
mod user_store;

pub use auth::{AuthToken, AuthTokenValue, PasswordCredentials, TrackpulseHasher};
pub use permissions::{role_has_permission, Permission, UserRole};
pub use seed::{seed_initial_data, BOOTSTRAP_ADMIN_EMAIL, BOOTSTRAP_ADMIN_USERNAME};
pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::{AuthError, RegisterRequest, UserManager};
pub use user_models::{
    AccountUpdate, NewUserAccount, ProfileUpdate, UserAccount, UserProfile, UserSetting,
};
pub use user_store::UserStore;
