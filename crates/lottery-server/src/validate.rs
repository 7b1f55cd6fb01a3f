//! Authoritative server-side validation of submissions.
//!
//! The original front end validated these rules in the browser only; here
//! every rule is re-enforced before any side effect happens.

use crate::error::IntakeError;
use chrono::{Datelike, NaiveDate};
use email_address::EmailAddress;
use std::str::FromStr;
use submission_store::{Country, Submission, Upload};

/// Minimum applicant age.
pub const ADULT_AGE: i32 = 18;

/// MIME types accepted for identity documents.
pub const ALLOWED_FILE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

/// Raw text fields collected from the multipart form.
#[derive(Debug, Default)]
pub struct SubmissionForm {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub date_of_birth: Option<String>,
}

impl SubmissionForm {
    /// Record a text field by its form name. Unknown fields are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        match name {
            "fullName" => self.full_name = Some(value),
            "email" => self.email = Some(value),
            "phone" => self.phone = Some(value),
            "country" => self.country = Some(value),
            "dateOfBirth" => self.date_of_birth = Some(value),
            _ => {}
        }
    }
}

fn required(value: &Option<String>, label: &str) -> Result<String, IntakeError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(IntakeError::InvalidSubmission(format!(
            "{} is required",
            label
        ))),
    }
}

/// Calendar-based age: a birthday "today" counts as already turned.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// Validate the form fields against today's date, producing a [`Submission`].
pub fn validate_submission(
    form: &SubmissionForm,
    today: NaiveDate,
) -> Result<Submission, IntakeError> {
    let full_name = required(&form.full_name, "Full name")?;
    let email = required(&form.email, "Email")?;
    let phone = required(&form.phone, "Phone number")?;
    let country_code = required(&form.country, "Country")?;
    let date_of_birth_raw = required(&form.date_of_birth, "Date of birth")?;

    if EmailAddress::from_str(&email).is_err() {
        return Err(IntakeError::InvalidSubmission(
            "Please enter a valid email address".into(),
        ));
    }

    let country = Country::parse(&country_code).ok_or_else(|| {
        IntakeError::InvalidSubmission(format!("Unknown country code: {}", country_code))
    })?;

    let date_of_birth = NaiveDate::parse_from_str(&date_of_birth_raw, "%Y-%m-%d")
        .map_err(|_| {
            IntakeError::InvalidSubmission(
                "Date of birth must be in YYYY-MM-DD format".into(),
            )
        })?;

    if age_on(date_of_birth, today) < ADULT_AGE {
        return Err(IntakeError::InvalidSubmission(
            "You must be 18 or older to participate".into(),
        ));
    }

    Ok(Submission {
        full_name,
        email,
        phone,
        country,
        date_of_birth,
    })
}

/// Detect the file type from leading magic bytes.
fn sniff_file_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if bytes.starts_with(b"%PDF-") {
        Some("application/pdf")
    } else {
        None
    }
}

/// Validate an uploaded file's type and size.
pub fn validate_upload(upload: &Upload, max_bytes: usize) -> Result<(), IntakeError> {
    if upload.bytes.len() > max_bytes {
        return Err(IntakeError::InvalidSubmission(format!(
            "{}: file size must be less than {} MB",
            upload.kind.label(),
            max_bytes / (1024 * 1024)
        )));
    }

    // Trust the content over the declared type; fall back to the declared
    // type for files whose leading bytes are inconclusive.
    let detected = sniff_file_type(&upload.bytes).unwrap_or(upload.content_type.as_str());
    if !ALLOWED_FILE_TYPES.contains(&detected) {
        return Err(IntakeError::InvalidSubmission(format!(
            "{}: please upload JPG, PNG, or PDF files only",
            upload.kind.label()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use submission_store::DocumentKind;

    fn valid_form() -> SubmissionForm {
        SubmissionForm {
            full_name: Some("Ada Lovelace".into()),
            email: Some("ada@example.com".into()),
            phone: Some("+1-555-0100".into()),
            country: Some("UK".into()),
            date_of_birth: Some("1990-01-01".into()),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 25).unwrap()
    }

    #[test]
    fn test_valid_submission() {
        let submission = validate_submission(&valid_form(), today()).unwrap();
        assert_eq!(submission.full_name, "Ada Lovelace");
        assert_eq!(submission.country, Country::UnitedKingdom);
        assert_eq!(submission.date_of_birth_str(), "1990-01-01");
    }

    #[test]
    fn test_missing_fields_rejected() {
        for clear in [
            |f: &mut SubmissionForm| f.full_name = None,
            |f: &mut SubmissionForm| f.email = None,
            |f: &mut SubmissionForm| f.phone = None,
            |f: &mut SubmissionForm| f.country = None,
            |f: &mut SubmissionForm| f.date_of_birth = None,
        ] {
            let mut form = valid_form();
            clear(&mut form);
            assert!(validate_submission(&form, today()).is_err());
        }
    }

    #[test]
    fn test_whitespace_only_field_rejected() {
        let mut form = valid_form();
        form.full_name = Some("   ".into());
        assert!(validate_submission(&form, today()).is_err());
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut form = valid_form();
        form.email = Some("not-an-email".into());
        let err = validate_submission(&form, today()).unwrap_err();
        assert!(err.to_string().contains("valid email"));
    }

    #[test]
    fn test_unknown_country_rejected() {
        let mut form = valid_form();
        form.country = Some("ZZ".into());
        assert!(validate_submission(&form, today()).is_err());
    }

    #[test]
    fn test_malformed_date_rejected() {
        let mut form = valid_form();
        form.date_of_birth = Some("01/01/1990".into());
        assert!(validate_submission(&form, today()).is_err());
    }

    #[test]
    fn test_age_exactly_18_today_accepted() {
        let mut form = valid_form();
        // Birthday is today: counts as already turned 18.
        form.date_of_birth = Some("2008-08-25".into());
        assert!(validate_submission(&form, today()).is_ok());
    }

    #[test]
    fn test_age_one_day_short_rejected() {
        let mut form = valid_form();
        form.date_of_birth = Some("2008-08-26".into());
        let err = validate_submission(&form, today()).unwrap_err();
        assert!(err.to_string().contains("18 or older"));
    }

    #[test]
    fn test_age_on_handles_month_boundaries() {
        let dob = NaiveDate::from_ymd_opt(2000, 6, 15).unwrap();
        assert_eq!(age_on(dob, NaiveDate::from_ymd_opt(2018, 6, 14).unwrap()), 17);
        assert_eq!(age_on(dob, NaiveDate::from_ymd_opt(2018, 6, 15).unwrap()), 18);
        assert_eq!(age_on(dob, NaiveDate::from_ymd_opt(2018, 7, 1).unwrap()), 18);
        assert_eq!(age_on(dob, NaiveDate::from_ymd_opt(2018, 5, 31).unwrap()), 17);
    }

    fn upload(kind: DocumentKind, content_type: &str, bytes: Vec<u8>) -> Upload {
        Upload {
            kind,
            original_name: "scan".into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    #[test]
    fn test_upload_sniffing_accepts_known_types() {
        let max = 5 * 1024 * 1024;
        let jpeg = upload(
            DocumentKind::Passport,
            "application/octet-stream",
            vec![0xFF, 0xD8, 0xFF, 0xE0],
        );
        assert!(validate_upload(&jpeg, max).is_ok());

        let png = upload(
            DocumentKind::Passport,
            "application/octet-stream",
            vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
        );
        assert!(validate_upload(&png, max).is_ok());

        let pdf = upload(
            DocumentKind::DriverLicense,
            "application/octet-stream",
            b"%PDF-1.7 rest".to_vec(),
        );
        assert!(validate_upload(&pdf, max).is_ok());
    }

    #[test]
    fn test_upload_unknown_type_rejected() {
        let max = 5 * 1024 * 1024;
        let exe = upload(
            DocumentKind::Passport,
            "application/x-msdownload",
            vec![b'M', b'Z', 0x90, 0x00],
        );
        let err = validate_upload(&exe, max).unwrap_err();
        assert!(err.to_string().contains("JPG, PNG, or PDF"));
    }

    #[test]
    fn test_upload_declared_type_fallback() {
        // Inconclusive leading bytes but an allowed declared type.
        let tiny = upload(DocumentKind::Passport, "image/jpeg", vec![0x00, 0x01]);
        assert!(validate_upload(&tiny, 5 * 1024 * 1024).is_ok());
    }

    #[test]
    fn test_upload_over_size_limit_rejected() {
        let max = 5 * 1024 * 1024;
        let mut bytes = vec![0xFF, 0xD8, 0xFF];
        bytes.resize(max + 1, 0);
        let big = upload(DocumentKind::Passport, "image/jpeg", bytes);
        let err = validate_upload(&big, max).unwrap_err();
        assert!(err.to_string().contains("5 MB"));
    }

    #[test]
    fn test_upload_exactly_at_limit_accepted() {
        let max = 5 * 1024 * 1024;
        let mut bytes = vec![0xFF, 0xD8, 0xFF];
        bytes.resize(max, 0);
        let at_limit = upload(DocumentKind::Passport, "image/jpeg", bytes);
        assert!(validate_upload(&at_limit, max).is_ok());
    }
}
