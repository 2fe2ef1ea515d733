//! Data models module
//!
//! Contains the records the engine consumes and the snapshot it produces:
//! - Captured network transactions
//! - Preference entries
//! - The assembled dashboard snapshot

pub mod dashboard;
pub mod preference;
pub mod transaction;
