//! Domain services used by the stores and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own session, caching and provider-delegation logic so
//! route handlers and UI stores stay focused on translation and state.

pub mod auth_store;
pub mod profile_cache;
pub mod query_cache;
pub mod session;
