//! HTTP request handlers.

use super::types::{HealthResponse, SubmitResponse};
use super::AppState;
use crate::error::IntakeError;
use crate::receipt::{self, ReceiptLink};
use crate::validate::{self, SubmissionForm};
use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use std::path::Path;
use submission_store::{DocumentKind, LedgerRow, StoreError, StoredFile, Upload};
use tracing::{info, warn};

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, IntakeError> {
    let ledger_rows = state.ledger.count().await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        ledger_rows,
    }))
}

/// Accept one registration submission.
///
/// Pipeline: parse multipart → validate → persist uploads → write receipt
/// PDF → append ledger row → acknowledge. Nothing is recorded for requests
/// that fail validation; the ledger row is appended only after the receipt
/// write has completed.
pub async fn submit(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SubmitResponse>, IntakeError> {
    let mut form = SubmissionForm::default();
    let mut uploads: Vec<Upload> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| IntakeError::InvalidSubmission(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        let kind = match name.as_str() {
            "passport" => Some(DocumentKind::Passport),
            "driverLicense" => Some(DocumentKind::DriverLicense),
            _ => None,
        };

        match kind {
            Some(kind) => {
                // Each file part is capped at one file.
                if uploads.iter().any(|u| u.kind == kind) {
                    return Err(IntakeError::InvalidSubmission(format!(
                        "Duplicate file part: {}",
                        name
                    )));
                }
                let original_name = field.file_name().unwrap_or("document").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    IntakeError::InvalidSubmission(format!("Failed to read file part: {}", e))
                })?;
                uploads.push(Upload {
                    kind,
                    original_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            None => {
                let value = field.text().await.map_err(|e| {
                    IntakeError::InvalidSubmission(format!("Failed to read form field: {}", e))
                })?;
                form.set(&name, value);
            }
        }
    }

    if uploads.is_empty() {
        warn!("Submission rejected: no files uploaded");
        return Err(IntakeError::NoFilesUploaded);
    }

    let today = Utc::now().date_naive();
    let submission = validate::validate_submission(&form, today)?;
    for upload in &uploads {
        validate::validate_upload(upload, state.max_upload_bytes)?;
    }

    // Persist uploads; each yields a durable reference.
    let mut passport: Option<StoredFile> = None;
    let mut driver_license: Option<StoredFile> = None;
    for upload in &uploads {
        let stored = state.storage.put(upload).await?;
        match stored.kind {
            DocumentKind::Passport => passport = Some(stored),
            DocumentKind::DriverLicense => driver_license = Some(stored),
        }
    }

    let links: Vec<ReceiptLink> = [passport.as_ref(), driver_license.as_ref()]
        .into_iter()
        .flatten()
        .map(|file| ReceiptLink {
            label: file.kind.label(),
            text: file.original_name.clone(),
            url: resolve_location(&state.public_base_url, &file.location),
        })
        .collect();

    let pdf_bytes = receipt::render(&submission, &links);
    let filename = receipt::receipt_filename(&submission.full_name, Utc::now().timestamp_millis());
    write_receipt(&state.submissions_dir, &filename, &pdf_bytes).await?;

    // Ledger row only after the receipt write has completed.
    let row = LedgerRow::new(&submission, passport.as_ref(), driver_license.as_ref());
    state.ledger.append(&row).await?;

    info!(full_name = %submission.full_name, receipt = %filename, "Submission accepted");

    Ok(Json(SubmitResponse {
        message: "Submission received and PDF saved.".to_string(),
        pdf: format!("/submissions/{}", filename),
    }))
}

/// List generated receipt filenames.
pub async fn list_submissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, IntakeError> {
    let mut entries = tokio::fs::read_dir(&state.submissions_dir)
        .await
        .map_err(StoreError::from)?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(StoreError::from)? {
        if let Some(name) = entry.file_name().to_str() {
            // Only finished receipts; a crash mid-write can leave a temp
            // file behind.
            if name.ends_with(".pdf") {
                names.push(name.to_string());
            }
        }
    }
    names.sort();

    Ok(Json(names))
}

/// Absolutize a stored-file location against the configured public base URL.
fn resolve_location(public_base_url: &str, location: &str) -> String {
    if location.starts_with("http://") || location.starts_with("https://") {
        location.to_string()
    } else {
        format!("{}{}", public_base_url.trim_end_matches('/'), location)
    }
}

/// Write the receipt durably: temp file then rename.
async fn write_receipt(dir: &Path, filename: &str, bytes: &[u8]) -> Result<(), IntakeError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| IntakeError::Receipt(e.to_string()))?;

    let final_path = dir.join(filename);
    let temp_path = final_path.with_extension("pdf.tmp");
    tokio::fs::write(&temp_path, bytes)
        .await
        .map_err(|e| IntakeError::Receipt(e.to_string()))?;
    tokio::fs::rename(&temp_path, &final_path)
        .await
        .map_err(|e| IntakeError::Receipt(e.to_string()))?;

    Ok(())
}
