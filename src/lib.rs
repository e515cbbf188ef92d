//! University records server: course catalog, accounts, and a transactional
//! enrollment engine over SQLite, exposed through an HTTP API.

pub mod api;
pub mod auth;
pub mod db;
pub mod grading;
pub mod models;
