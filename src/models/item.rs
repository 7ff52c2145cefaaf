//! # Item Model
//!
//! The record processed by the bulk status-transition job. Items are created
//! and persisted through the storage layer; the batch engine only ever reads
//! them back, moves their status to [`ItemStatus::Processed`] and writes them
//! again.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

const TEXT_FIELD_PATTERN: &str = r"^[a-zA-Z0-9_ ]{3,50}$";
const EMAIL_PATTERN: &str = r"^[A-Za-z0-9_.%+-]+@[A-Za-z0-9_.-]+\.[A-Za-z]{2,6}$";

const TEXT_FIELD_RULE: &str =
    "must be 3-50 characters long and can only contain letters, numbers, spaces, and underscores";

/// Processing state of an item.
///
/// Transitions are monotonic within a batch: the processor only ever moves an
/// item to `Processed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    #[default]
    Unprocessed,
    Processed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Unprocessed => "UNPROCESSED",
            ItemStatus::Processed => "PROCESSED",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = ItemValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNPROCESSED" => Ok(ItemStatus::Unprocessed),
            "PROCESSED" => Ok(ItemStatus::Processed),
            other => Err(ItemValidationError::single(
                "status",
                format!("must be either 'UNPROCESSED' or 'PROCESSED', got '{other}'"),
            )),
        }
    }
}

/// A managed record.
///
/// `id` is `None` until the storage layer assigns one on first save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub status: ItemStatus,
    pub email: String,
}

impl Item {
    /// Build an unsaved, unprocessed item
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            status: ItemStatus::Unprocessed,
            email: email.into(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_processed(&self) -> bool {
        self.status == ItemStatus::Processed
    }

    /// Move the item to `Processed`. Already-processed items are left as is.
    pub fn mark_processed(&mut self) {
        self.status = ItemStatus::Processed;
    }

    /// Check field-level rules, collecting every violation
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        let mut violations = Vec::new();

        if !text_field_regex().is_match(&self.name) {
            violations.push(FieldViolation::new("name", TEXT_FIELD_RULE));
        }
        if !text_field_regex().is_match(&self.description) {
            violations.push(FieldViolation::new("description", TEXT_FIELD_RULE));
        }
        if !email_regex().is_match(&self.email) {
            violations.push(FieldViolation::new("email", "Invalid email format"));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ItemValidationError { violations })
        }
    }
}

fn text_field_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TEXT_FIELD_PATTERN).expect("static pattern compiles"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("static pattern compiles"))
}

/// A single failed field rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.messages().join("; "))]
pub struct ItemValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ItemValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation::new(field, message)],
        }
    }

    /// `"<field> <message>"` strings, one per violation
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}
