//! Gamerfie client state and session layer.
//!
//! The stores in [`stores`] and [`services`] hold UI-facing state and talk to
//! the backend provider and game catalog through the traits in [`backend`]
//! and [`catalog`]. [`routes`] exposes the thin HTTP endpoints served by the
//! `gamerfie` binary.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
pub mod stores;
pub mod telemetry;
