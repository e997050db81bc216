//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns a [`Reply`] that
//! the server turns into an HTTP response. Handlers never panic on bad input;
//! client errors come back as a JSON `{"error": ...}` with a 4xx status.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::App;
use crate::error::{AppError, AuthError, PredictError};
use crate::prediction::validation::{MAX_BUDGET, MIN_BUDGET};
use crate::prediction::{Location, PredictionForm, SubstationType, TowerType};

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// A handler result, independent of the HTTP library.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Html(&'static str),
    Json { status: u16, body: Value },
    Download { file_name: String, contents: String },
}

impl Reply {
    /// `200` with `data` as the JSON body.
    pub fn json<T: Serialize>(data: &T) -> Result<Self> {
        let body = serde_json::to_value(data).context("failed to serialize JSON response")?;
        Ok(Self::Json { status: 200, body })
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::Json {
            status,
            body: serde_json::json!({ "error": message.into() }),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Json { status, .. } => *status,
            Self::Html(_) | Self::Download { .. } => 200,
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct OptionsResponse {
    locations: Vec<&'static str>,
    tower_types: Vec<&'static str>,
    substation_types: Vec<&'static str>,
    min_budget: f64,
    max_budget: f64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract a query parameter from a URL.
fn query_param<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    url.split('?').nth(1)?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == key { Some(v) } else { None }
    })
}

/// Map an application error to a client-facing status.
fn app_error_reply(e: AppError) -> Reply {
    let status = match &e {
        AppError::NotLoggedIn | AppError::Auth(AuthError::InvalidCredentials) => 401,
        AppError::Auth(AuthError::AttemptPending) => 409,
        AppError::NotConfirmed => 400,
        AppError::NothingToExport | AppError::UnknownEntry(_) => 404,
        AppError::Export { .. } | AppError::Storage(_) => 500,
    };
    Reply::error(status, e.to_string())
}

fn not_logged_in() -> Reply {
    app_error_reply(AppError::NotLoggedIn)
}

// ---------------------------------------------------------------------------
// Session handlers
// ---------------------------------------------------------------------------

/// `GET /api/session` — the current identity, or `null`.
pub fn get_session(app: &App) -> Reply {
    Reply::Json {
        status: 200,
        body: serde_json::json!({ "user": app.current_user() }),
    }
}

/// `POST /api/login` — body `{"username": ..., "password": ...}`.
pub fn post_login(app: &mut App, body: &str) -> Result<Reply> {
    let Ok(req) = serde_json::from_str::<LoginRequest>(body) else {
        return Ok(Reply::error(400, "invalid JSON in login request"));
    };

    match app.login(&req.username, &req.password) {
        Ok(outcome) => Reply::json(&serde_json::json!({
            "user": outcome.user,
            "warning": outcome.storage_warning.map(|e| e.to_string()),
        })),
        Err(e) => Ok(app_error_reply(e)),
    }
}

/// `POST /api/logout`
pub fn post_logout(app: &mut App) -> Reply {
    let warning = app.logout().map(|e| e.to_string());
    Reply::Json {
        status: 200,
        body: serde_json::json!({ "success": true, "warning": warning }),
    }
}

// ---------------------------------------------------------------------------
// Prediction handlers
// ---------------------------------------------------------------------------

/// `GET /api/options` — choices and limits for the prediction form.
pub fn get_options() -> Reply {
    let resp = OptionsResponse {
        locations: Location::ALL.iter().map(|l| l.as_str()).collect(),
        tower_types: TowerType::ALL.iter().map(|t| t.as_str()).collect(),
        substation_types: SubstationType::ALL.iter().map(|s| s.as_str()).collect(),
        min_budget: MIN_BUDGET,
        max_budget: MAX_BUDGET,
    };
    Reply::json(&resp).unwrap_or_else(|e| Reply::error(500, e.to_string()))
}

/// `POST /api/predict` — body is the raw form; every field is a string.
pub fn post_predict(app: &mut App, body: &str) -> Result<Reply> {
    let Ok(form) = serde_json::from_str::<PredictionForm>(body) else {
        return Ok(Reply::error(400, "invalid JSON in prediction request"));
    };

    match app.predict(&form) {
        Ok(outcome) => Reply::json(&serde_json::json!({
            "entry": outcome.entry,
            "stats": outcome.stats,
            "warning": outcome.storage_warning.map(|e| e.to_string()),
        })),
        Err(PredictError::NotLoggedIn) => Ok(not_logged_in()),
        Err(e @ PredictError::Busy) => Ok(Reply::error(409, e.to_string())),
        Err(PredictError::Validation(errors)) => Ok(Reply::Json {
            status: 422,
            body: serde_json::json!({
                "error": errors.to_string(),
                "fields": errors.fields,
            }),
        }),
        Err(e @ PredictError::Request(_)) => Ok(Reply::error(502, e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// History handlers
// ---------------------------------------------------------------------------

/// `GET /api/history` — newest-first entries.
pub fn get_history(app: &App) -> Reply {
    if app.current_user().is_none() {
        return not_logged_in();
    }
    Reply::Json {
        status: 200,
        body: serde_json::json!({ "entries": app.history().entries() }),
    }
}

/// `GET /api/stats`
pub fn get_stats(app: &App) -> Reply {
    if app.current_user().is_none() {
        return not_logged_in();
    }
    Reply::json(app.stats()).unwrap_or_else(|e| Reply::error(500, e.to_string()))
}

/// `DELETE /api/history?confirm=true`
pub fn delete_history(app: &mut App, url: &str) -> Reply {
    let confirmed = query_param(url, "confirm") == Some("true");
    match app.clear_history(confirmed) {
        Ok(change) => Reply::Json {
            status: 200,
            body: serde_json::json!({
                "stats": change.stats,
                "warning": change.persist_error.map(|e| e.to_string()),
            }),
        },
        Err(e) => app_error_reply(e),
    }
}

/// `GET /api/export?id=N` — the report as a text download (default: newest).
pub fn get_export(app: &App, url: &str) -> Reply {
    let id = match query_param(url, "id") {
        Some(raw) => match raw.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => return Reply::error(400, format!("invalid entry id '{raw}'")),
        },
        None => None,
    };

    match app.report(id) {
        Ok(report) => {
            app.events().info("report.downloaded", report.file_name.clone());
            Reply::Download {
                file_name: report.file_name,
                contents: report.contents,
            }
        }
        Err(e) => app_error_reply(e),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
