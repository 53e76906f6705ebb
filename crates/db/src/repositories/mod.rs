//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod subscription_plan_repo;
pub mod usage_repo;
pub mod user_repo;

pub use subscription_plan_repo::SubscriptionPlanRepo;
pub use usage_repo::UsageRepo;
pub use user_repo::UserRepo;
