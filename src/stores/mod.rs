//! UI-facing state stores.
//!
//! Each store is a cheap `Clone` handle over shared state. Locks are never
//! held across an `.await`.

pub mod filter;
pub mod friends;
pub mod search;
pub mod theme;
