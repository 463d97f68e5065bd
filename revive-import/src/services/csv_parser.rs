//! Lead file parser
//!
//! Turns uploaded CSV text into validated [`CandidateRecord`]s.
//!
//! Fields are split on every comma, so a quoted field containing a comma is
//! not supported. Data lines whose value count differs from the header are
//! skipped without a per-row error; the number of such lines is reported in
//! [`ParsedFile::skipped_rows`].

use crate::error::FormatError;
use crate::models::{CandidateRecord, LeadFields};

/// Columns every lead file must declare
pub const REQUIRED_COLUMNS: [&str; 3] = ["first_name", "last_name", "email"];

/// Columns mapped when present; anything else is ignored
pub const OPTIONAL_COLUMNS: [&str; 4] = ["phone", "company", "job_title", "notes"];

/// Download name of the template file
pub const TEMPLATE_FILE_NAME: &str = "leads_template.csv";

/// Template offered for download; re-uploading it yields two valid records
pub const LEADS_TEMPLATE: &str = "first_name,last_name,email,phone,company,job_title,notes\n\
John,Doe,john@example.com,555-0100,Acme Corp,CEO,Important lead\n\
Jane,Smith,jane@example.com,555-0101,Tech Inc,CTO,Met at conference";

/// Parser output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    /// Records in file order, valid and invalid together
    pub records: Vec<CandidateRecord>,
    /// Non-empty data lines after the header
    pub lines_seen: usize,
    /// Lines dropped for a column-count mismatch (`lines_seen - records`)
    pub skipped_rows: usize,
}

/// Parse a whole uploaded file
///
/// Blank lines are ignored and do not advance row numbers. The header is
/// row 1, so the first data row is row 2.
pub fn parse_csv(text: &str) -> Result<ParsedFile, FormatError> {
    let mut lines = text.split(['\r', '\n']).filter(|line| !line.trim().is_empty());

    let header_line = lines.next().ok_or(FormatError::Empty)?;
    let headers: Vec<String> = header_line
        .split(',')
        .map(|h| h.trim().to_lowercase())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .map(|required| required.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(FormatError::MissingColumns(missing));
    }

    let mut records = Vec::new();
    let mut lines_seen = 0;

    for (offset, line) in lines.enumerate() {
        lines_seen += 1;
        let row_number = offset + 2;

        let values: Vec<&str> = line.split(',').map(clean_value).collect();
        if values.len() != headers.len() {
            tracing::debug!(
                row_number,
                expected = headers.len(),
                found = values.len(),
                "Skipping row with mismatched column count"
            );
            continue;
        }

        records.push(CandidateRecord::new(row_number, map_fields(&headers, &values)));
    }

    let skipped_rows = lines_seen - records.len();
    tracing::debug!(
        records = records.len(),
        lines_seen,
        skipped_rows,
        "Parsed lead file"
    );

    Ok(ParsedFile {
        records,
        lines_seen,
        skipped_rows,
    })
}

/// Trim, then drop one leading and one trailing double quote
fn clean_value(raw: &str) -> &str {
    let value = raw.trim();
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

/// Map values onto lead fields by header name; a repeated column keeps its
/// last value
fn map_fields(headers: &[String], values: &[&str]) -> LeadFields {
    let mut fields = LeadFields::default();
    for (header, value) in headers.iter().zip(values) {
        let optional = || (!value.is_empty()).then(|| value.to_string());
        match header.as_str() {
            "first_name" => fields.first_name = value.to_string(),
            "last_name" => fields.last_name = value.to_string(),
            "email" => fields.email = value.to_string(),
            "phone" => fields.phone = optional(),
            "company" => fields.company = optional(),
            "job_title" => fields.job_title = optional(),
            "notes" => fields.notes = optional(),
            _ => {}
        }
    }
    fields
}
