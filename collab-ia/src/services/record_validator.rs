//! Record validation
//!
//! Turns one raw delimited row into an `AssignmentRecord` or a rejection.
//! Pure: no I/O, no clock reads. The "today" used for open-ended rows is fixed
//! when the validator is built, so every open-ended row in one ingestion run
//! resolves to the same end date.

use chrono::NaiveDate;
use collab_common::dates::{is_open_end, parse_calendar_date};
use collab_common::AssignmentRecord;
use thiserror::Error;

pub const EMPLOYEE_ID: &str = "EmpID";
pub const PROJECT_ID: &str = "ProjectID";
pub const DATE_FROM: &str = "DateFrom";
pub const DATE_TO: &str = "DateTo";

/// One data row as read from the file, header already skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub employee_id: String,
    pub project_id: String,
    pub date_from: String,
    pub date_to: String,
    /// 1-based line in the source, for logging
    pub line: u64,
}

impl RawRow {
    /// Build from positional fields; missing trailing columns read as blank
    pub fn from_fields<'a, I>(fields: I, line: u64) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default().to_string();
        Self {
            employee_id: next(),
            project_id: next(),
            date_from: next(),
            date_to: next(),
            line,
        }
    }
}

/// Why a row was not accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("invalid id in {field}: {value:?}")]
    InvalidId { field: &'static str, value: String },

    #[error("invalid date in {field}: {value:?}")]
    InvalidDate { field: &'static str, value: String },

    /// The reader could not split the line into fields (e.g. bad encoding)
    #[error("malformed row: {0}")]
    Malformed(String),
}

impl RejectReason {
    /// Stable snake_case name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            RejectReason::MissingField(_) => "missing_field",
            RejectReason::InvalidId { .. } => "invalid_id",
            RejectReason::InvalidDate { .. } => "invalid_date",
            RejectReason::Malformed(_) => "malformed",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecordValidator {
    today: NaiveDate,
}

impl RecordValidator {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn validate(&self, row: &RawRow) -> Result<AssignmentRecord, RejectReason> {
        let employee_id = row.employee_id.trim();
        let project_id = row.project_id.trim();
        let date_from = row.date_from.trim();
        let date_to = row.date_to.trim();

        if employee_id.is_empty() {
            return Err(RejectReason::MissingField(EMPLOYEE_ID));
        }
        if project_id.is_empty() {
            return Err(RejectReason::MissingField(PROJECT_ID));
        }
        if date_from.is_empty() {
            return Err(RejectReason::MissingField(DATE_FROM));
        }

        let employee_id = parse_id(EMPLOYEE_ID, employee_id)?;
        let project_id = parse_id(PROJECT_ID, project_id)?;

        let date_from = parse_calendar_date(date_from).ok_or_else(|| RejectReason::InvalidDate {
            field: DATE_FROM,
            value: date_from.to_string(),
        })?;

        let date_to = if is_open_end(date_to) {
            self.today
        } else {
            parse_calendar_date(date_to).ok_or_else(|| RejectReason::InvalidDate {
                field: DATE_TO,
                value: date_to.to_string(),
            })?
        };

        Ok(AssignmentRecord::new(employee_id, project_id, date_from, date_to))
    }
}

/// Ids are positive; 0 is reserved for the "no collaboration" sentinel
fn parse_id(field: &'static str, value: &str) -> Result<i64, RejectReason> {
    match value.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(RejectReason::InvalidId {
            field,
            value: value.to_string(),
        }),
    }
}
