//! Shared submission types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Country codes offered on the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "US")]
    UnitedStates,
    #[serde(rename = "CA")]
    Canada,
    #[serde(rename = "UK")]
    UnitedKingdom,
    #[serde(rename = "FR")]
    France,
    #[serde(rename = "DE")]
    Germany,
    #[serde(rename = "JP")]
    Japan,
    #[serde(rename = "AU")]
    Australia,
    #[serde(rename = "BR")]
    Brazil,
    #[serde(rename = "other")]
    Other,
}

impl Country {
    /// Parse a form-submitted country code.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "US" => Some(Country::UnitedStates),
            "CA" => Some(Country::Canada),
            "UK" => Some(Country::UnitedKingdom),
            "FR" => Some(Country::France),
            "DE" => Some(Country::Germany),
            "JP" => Some(Country::Japan),
            "AU" => Some(Country::Australia),
            "BR" => Some(Country::Brazil),
            "other" => Some(Country::Other),
            _ => None,
        }
    }

    /// The code as it appears on the form and in the ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::UnitedStates => "US",
            Country::Canada => "CA",
            Country::UnitedKingdom => "UK",
            Country::France => "FR",
            Country::Germany => "DE",
            Country::Japan => "JP",
            Country::Australia => "AU",
            Country::Brazil => "BR",
            Country::Other => "other",
        }
    }
}

/// Which identity document a file part carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Passport,
    DriverLicense,
}

impl DocumentKind {
    /// The multipart field name for this document.
    pub fn field_name(&self) -> &'static str {
        match self {
            DocumentKind::Passport => "passport",
            DocumentKind::DriverLicense => "driverLicense",
        }
    }

    /// Human-readable label used on the receipt.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Passport => "Passport/ID",
            DocumentKind::DriverLicense => "Driver's License",
        }
    }
}

/// An uploaded file that has passed validation but is not yet persisted.
#[derive(Debug, Clone)]
pub struct Upload {
    pub kind: DocumentKind,
    /// Filename as sent by the client.
    pub original_name: String,
    /// Declared MIME type.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A persisted upload, referenced by its durable location.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    #[serde(skip)]
    pub kind: DocumentKind,
    /// Filename as sent by the client (link text on the receipt).
    pub original_name: String,
    /// URL path (local backend) or absolute URL (remote backend).
    pub location: String,
}

/// A validated registration. Immutable once persisted.
#[derive(Debug, Clone)]
pub struct Submission {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub country: Country,
    pub date_of_birth: NaiveDate,
}

impl Submission {
    /// Date of birth as it appears on the form and in the ledger.
    pub fn date_of_birth_str(&self) -> String {
        self.date_of_birth.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_parse_round_trip() {
        for code in ["US", "CA", "UK", "FR", "DE", "JP", "AU", "BR", "other"] {
            let country = Country::parse(code).unwrap();
            assert_eq!(country.as_str(), code);
        }
    }

    #[test]
    fn test_country_parse_rejects_unknown() {
        assert!(Country::parse("XX").is_none());
        assert!(Country::parse("").is_none());
        assert!(Country::parse("us").is_none());
    }

    #[test]
    fn test_document_kind_labels() {
        assert_eq!(DocumentKind::Passport.label(), "Passport/ID");
        assert_eq!(DocumentKind::DriverLicense.label(), "Driver's License");
        assert_eq!(DocumentKind::Passport.field_name(), "passport");
        assert_eq!(DocumentKind::DriverLicense.field_name(), "driverLicense");
    }

    #[test]
    fn test_date_of_birth_formatting() {
        let submission = Submission {
            full_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "+1-555-0100".into(),
            country: Country::UnitedKingdom,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        };
        assert_eq!(submission.date_of_birth_str(), "1990-01-01");
    }
}
