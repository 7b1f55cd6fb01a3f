//! Append-only CSV ledger of accepted submissions.
//!
//! One row per accepted submission. The file is created with its header on
//! first write and never truncated or rewritten. Appends are serialized
//! behind an async mutex so concurrent submissions cannot interleave
//! partial rows; cross-process writers are not guarded.

use crate::error::StoreError;
use crate::types::{StoredFile, Submission};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Fixed ledger column set.
pub const LEDGER_HEADER: [&str; 7] = [
    "Full Name",
    "Email",
    "Phone",
    "Country",
    "Date of Birth",
    "Passport File",
    "Driver License File",
];

/// One ledger row. Field order matches [`LEDGER_HEADER`].
#[derive(Debug, Clone, Serialize)]
pub struct LedgerRow {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub date_of_birth: String,
    /// Stored location of the passport upload, empty if absent.
    pub passport_file: String,
    /// Stored location of the driver's license upload, empty if absent.
    pub driver_license_file: String,
}

impl LedgerRow {
    pub fn new(
        submission: &Submission,
        passport: Option<&StoredFile>,
        driver_license: Option<&StoredFile>,
    ) -> Self {
        Self {
            full_name: submission.full_name.clone(),
            email: submission.email.clone(),
            phone: submission.phone.clone(),
            country: submission.country.as_str().to_string(),
            date_of_birth: submission.date_of_birth_str(),
            passport_file: passport.map(|f| f.location.clone()).unwrap_or_default(),
            driver_license_file: driver_license
                .map(|f| f.location.clone())
                .unwrap_or_default(),
        }
    }
}

/// The submissions ledger file.
pub struct Ledger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Ledger {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header first if the file is new or empty.
    pub async fn append(&self, row: &LedgerRow) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let needs_header = match fs::metadata(&self.path).await {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let mut buf = Vec::new();
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut buf);
            if needs_header {
                writer.write_record(LEDGER_HEADER)?;
            }
            writer.serialize(row)?;
            writer.flush()?;
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;

        debug!("Appended ledger row for {}", row.full_name);
        Ok(())
    }

    /// Number of data rows (header excluded). Zero if the file doesn't exist.
    pub async fn count(&self) -> Result<usize, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes.as_slice());
        let mut count = 0;
        for record in reader.records() {
            record?;
            count += 1;
        }
        Ok(count)
    }
}
