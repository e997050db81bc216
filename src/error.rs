//! Error types shared across gridcast modules.
//!
//! Every error here is scoped to the operation that raised it and leaves
//! prior state intact. The binary converts them into `anyhow` errors at the
//! CLI/web boundary.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::prediction::Field;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Failure of the persistent key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read stored record '{key}' at {path}: {source}")]
    Read {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write stored record '{key}' at {path}: {source}")]
    Write {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize record '{key}': {details}")]
    Serialize { key: String, details: String },
}

// ---------------------------------------------------------------------------
// Prediction request
// ---------------------------------------------------------------------------

/// Classified failure of a single prediction submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("prediction service returned HTTP {code}")]
    ServerStatus { code: u16 },

    #[error("prediction service is unreachable: {details}")]
    Unreachable { details: String },

    #[error("no prediction data received from the prediction service")]
    EmptyResult,
}

/// Field-scoped form validation failures.
///
/// Keys are the offending form fields, values are human-readable messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("invalid prediction parameters: {}", self.summary())]
pub struct ValidationErrors {
    pub fields: BTreeMap<Field, String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    fn summary(&self) -> String {
        self.fields
            .iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Everything that can stop [`crate::app::App::predict`].
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("not logged in")]
    NotLoggedIn,

    #[error("a prediction request is already in progress")]
    Busy,

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Failed to get prediction: {0}")]
    Request(#[from] RequestError),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid credentials. Try admin/admin123 or user/user123")]
    InvalidCredentials,

    #[error("a login attempt is already in progress")]
    AttemptPending,
}

// ---------------------------------------------------------------------------
// Application context
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not logged in")]
    NotLoggedIn,

    #[error("clearing history requires confirmation")]
    NotConfirmed,

    #[error("no prediction to export")]
    NothingToExport,

    #[error("no history entry with id {0}")]
    UnknownEntry(i64),

    #[error("failed to write report to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
