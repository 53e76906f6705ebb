//! User entity model and DTOs.

use intervue_core::types::{DbId, Timestamp};
use intervue_core::usage_quota::UserPlan;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    /// Plan name; `None` means the default free tier.
    pub subscription_plan: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<User> for UserPlan {
    fn from(user: User) -> Self {
        UserPlan {
            user_id: user.id,
            subscription_plan: user.subscription_plan,
        }
    }
}

/// DTO for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub subscription_plan: Option<String>,
}

/// DTO for assigning a subscription plan to a user.
#[derive(Debug, Deserialize)]
pub struct AssignPlan {
    pub plan: String,
}
