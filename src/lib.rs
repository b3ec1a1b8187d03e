//! Firestore maintenance toolkit: duplicate-user scan, test-user seeding,
//! allow-list loading, role updates and allow-list checks.
//!
//! Each task ships as its own binary under `src/bin/`; this crate holds the
//! shared database client, credential bootstrap and the operations themselves.

pub mod config;
pub mod database;
pub mod models;
pub mod seeds;
pub mod services;
pub mod utils;
