//! Handler modules for quill-api.
//!
//! One module per route group: accounts, notes, profile, organization
//! features, and the assist proxy.

pub mod assist;
pub mod auth;
pub mod features;
pub mod notes;
pub mod user;
