//! Travel lottery registration intake service.
//!
//! Accepts multipart registration submissions with up to two identity
//! documents, persists the uploads to a pluggable storage backend, renders
//! a PDF receipt linking to the stored files, and appends each accepted
//! submission to an append-only CSV ledger.

pub mod api;
pub mod config;
pub mod error;
pub mod receipt;
pub mod validate;

pub use config::Config;
pub use error::IntakeError;
