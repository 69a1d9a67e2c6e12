use super::permissions::UserRole;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub is_staff: bool,
    pub created: i64,
    pub last_login: Option<i64>,
}

/// Fields needed to create an account row. Passwords are handled separately
/// through `PasswordCredentials`.
#[derive(Debug, Clone)]
pub struct NewUserAccount {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_staff: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub birth_date: Option<String>,
    pub phone_number: Option<String>,
    pub timezone: String,
    pub theme_preference: String,
    pub default_date_range: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub location: Option<String>,
    pub birth_date: Option<String>,
    pub phone_number: Option<String>,
    pub timezone: Option<String>,
    pub theme_preference: Option<String>,
    pub default_date_range: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSetting {
    pub key: String,
    pub value: String,
}
