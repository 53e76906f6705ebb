//! Domain logic for the Intervue quota service.
//!
//! Holds everything that does not touch SQL: subscription plan limits, the
//! daily usage quota gate, and the retry strategies used around remote calls.

pub mod error;
pub mod plan;
pub mod retry;
pub mod types;
pub mod usage_quota;
