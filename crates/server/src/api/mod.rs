// Public API routes
// Decision: Profile reads go through the session reader; no local identity cache

pub mod common;
pub mod users;

pub use common::ErrorResponse;
