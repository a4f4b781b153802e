//! Database models for the BlogHub backend.
//!
//! All record identifiers are SQLite rowids; the `*Ref` aliases exist so
//! service signatures name the table they point at.

pub mod comment;
pub mod db;
pub mod post;
pub mod user;
