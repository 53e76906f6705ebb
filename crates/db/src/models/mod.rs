//! Row models and DTOs, one module per table.

pub mod subscription_plan;
pub mod usage;
pub mod user;
