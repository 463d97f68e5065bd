//! Candidate records parsed from an uploaded lead file

use serde::Serialize;

use crate::services::row_validator;

/// Lead fields recognized in an uploaded file
///
/// Values are trimmed with one wrapping pair of double quotes removed;
/// no other normalization is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeadFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub notes: Option<String>,
}

/// One parsed row awaiting import
///
/// Validated once at construction and immutable afterwards; a re-upload
/// produces new records instead of re-validating these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRecord {
    row_number: usize,
    #[serde(flatten)]
    fields: LeadFields,
    is_valid: bool,
    validation_errors: Vec<String>,
}

impl CandidateRecord {
    /// Build a record and attach its validation result
    pub fn new(row_number: usize, fields: LeadFields) -> Self {
        let validation_errors = row_validator::validate(&fields);
        Self {
            row_number,
            is_valid: validation_errors.is_empty(),
            fields,
            validation_errors,
        }
    }

    /// 1-based line position, counting the header as line 1
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn fields(&self) -> &LeadFields {
        &self.fields
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn validation_errors(&self) -> &[String] {
        &self.validation_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_follows_errors() {
        let valid = CandidateRecord::new(
            2,
            LeadFields {
                first_name: "John".into(),
                last_name: "Doe".into(),
                email: "john@example.com".into(),
                ..Default::default()
            },
        );
        assert!(valid.is_valid());
        assert!(valid.validation_errors().is_empty());
        assert_eq!(valid.row_number(), 2);

        let invalid = CandidateRecord::new(3, LeadFields::default());
        assert!(!invalid.is_valid());
        assert_eq!(invalid.validation_errors().len(), 3);
    }

    #[test]
    fn test_serializes_flat() {
        let record = CandidateRecord::new(
            2,
            LeadFields {
                first_name: "Jane".into(),
                last_name: "Smith".into(),
                email: "bad".into(),
                company: Some("Tech Inc".into()),
                ..Default::default()
            },
        );
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["row_number"], 2);
        assert_eq!(json["first_name"], "Jane");
        assert_eq!(json["company"], "Tech Inc");
        assert_eq!(json["is_valid"], false);
        assert_eq!(json["validation_errors"][0], "Invalid email format");
    }
}
