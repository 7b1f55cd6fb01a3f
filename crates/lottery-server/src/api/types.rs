//! API response types.

use serde::Serialize;

/// Response after an accepted submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: String,
    /// Retrievable path of the generated receipt.
    pub pdf: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub ledger_rows: usize,
}
