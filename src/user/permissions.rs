use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    ViewSalesData,
    EditTrackMetadata,
    ManageUsers,
    ViewCustomerDetails,
    RunReports,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Permission::ViewSalesData,
        Permission::EditTrackMetadata,
        Permission::ManageUsers,
        Permission::ViewCustomerDetails,
        Permission::RunReports,
    ];

    pub fn as_int(self) -> i32 {
        match self {
            Permission::ViewSalesData => 1,
            Permission::EditTrackMetadata => 2,
            Permission::ManageUsers => 3,
            Permission::ViewCustomerDetails => 4,
            Permission::RunReports => 5,
        }
    }

    pub fn from_int(value: i32) -> Option<Self> {
        match value {
            1 => Some(Permission::ViewSalesData),
            2 => Some(Permission::EditTrackMetadata),
            3 => Some(Permission::ManageUsers),
            4 => Some(Permission::ViewCustomerDetails),
            5 => Some(Permission::RunReports),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Permission::ViewSalesData => "view_sales_data",
            Permission::EditTrackMetadata => "edit_track_metadata",
            Permission::ManageUsers => "manage_users",
            Permission::ViewCustomerDetails => "view_customer_details",
            Permission::RunReports => "run_reports",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Permission::ALL.iter().copied().find(|p| p.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Permission::ViewSalesData => "Can view sales analytics and reports",
            Permission::EditTrackMetadata => "Can edit track and album metadata",
            Permission::ManageUsers => "Can manage user accounts and roles",
            Permission::ViewCustomerDetails => "Can view customer personal details",
            Permission::RunReports => "Can run and export custom reports",
        }
    }

    pub fn resource_type(self) -> &'static str {
        match self {
            Permission::ViewSalesData => "analytics",
            Permission::EditTrackMetadata => "catalog",
            Permission::ManageUsers => "users",
            Permission::ViewCustomerDetails => "customers",
            Permission::RunReports => "reports",
        }
    }
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ViewSalesData,
    Permission::EditTrackMetadata,
    Permission::ManageUsers,
    Permission::ViewCustomerDetails,
    Permission::RunReports,
];
const USER_PERMISSIONS: &[Permission] = &[
    Permission::ViewSalesData,
    Permission::EditTrackMetadata,
    Permission::ViewCustomerDetails,
];
const GUEST_PERMISSIONS: &[Permission] = &[Permission::ViewSalesData];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    User,
    Guest,
}

impl UserRole {
    pub const ALL: &'static [UserRole] = &[UserRole::Admin, UserRole::User, UserRole::Guest];

    /// The default permission set seeded for the role.
    pub fn default_permissions(&self) -> &'static [Permission] {
        match self {
            UserRole::Admin => ADMIN_PERMISSIONS,
            UserRole::User => USER_PERMISSIONS,
            UserRole::Guest => GUEST_PERMISSIONS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
            UserRole::Guest => "guest",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "user" => Some(UserRole::User),
            "guest" => Some(UserRole::Guest),
            _ => None,
        }
    }
}

/// Coarse permission check against the default role sets. Admin always
/// passes.
pub fn role_has_permission(role: UserRole, permission: Permission) -> bool {
    role == UserRole::Admin || role.default_permissions().contains(&permission)
}
