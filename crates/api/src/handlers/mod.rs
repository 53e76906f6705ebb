pub mod plans;
pub mod usage;
