//! Idempotent bootstrap of permissions, role grants and the initial admin.

use super::permissions::{Permission, UserRole};
use super::user_manager::UserManager;
use anyhow::Result;
use tracing::info;

pub const BOOTSTRAP_ADMIN_EMAIL: &str = "admin@trackpulse.com";
pub const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";
const BOOTSTRAP_ADMIN_PASSWORD: &str = "admin1234";

/// Creates the fixed permission rows, the per-role grants and (iff no
/// account with the well-known email exists) the bootstrap admin. Safe to
/// run any number of times.
pub fn seed_initial_data(manager: &UserManager) -> Result<()> {
    for permission in Permission::ALL {
        manager.ensure_permission(*permission)?;
    }
    for role in UserRole::ALL {
        for permission in role.default_permissions() {
            manager.grant_role_permission(*role, *permission)?;
        }
    }

    if manager.get_user_by_email(BOOTSTRAP_ADMIN_EMAIL)?.is_none() {
        info!("Creating bootstrap admin account {}", BOOTSTRAP_ADMIN_EMAIL);
        manager.create_user_with_password(
            BOOTSTRAP_ADMIN_USERNAME,
            BOOTSTRAP_ADMIN_EMAIL,
            "Admin",
            "User",
            UserRole::Admin,
            true,
            BOOTSTRAP_ADMIN_PASSWORD,
        )?;
    }

    Ok(())
}
