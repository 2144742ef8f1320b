//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod dashboard;
pub mod health;
pub mod rewards;
pub mod transactions;
pub mod users;

// Re-export all handlers for use in router
pub use dashboard::*;
pub use health::*;
pub use rewards::*;
pub use transactions::*;
pub use users::*;
