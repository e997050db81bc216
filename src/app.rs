//! Application context shared by the CLI and the web dashboard.
//!
//! [`App`] owns the store, the session, the history engine and the predictor
//! client. Every mutating operation returns the new derived state so the
//! presentation layer can render it without re-querying.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;

use crate::config::expand_home;
use crate::config::schema::GridcastConfig;
use crate::error::{AppError, PredictError, StorageError};
use crate::events::EventLog;
use crate::history::{Change, DerivedStats, HistoryEngine, HistoryEntry, LoadIssue};
use crate::prediction::{PredictionForm, PredictionInputs, PredictionResult, Predictor, SingleFlight};
use crate::report::{self, Report};
use crate::session::{SessionFlow, UserIdentity};
use crate::storage::{FileStore, KeyValueStore};

/// Result of a successful prediction.
#[derive(Debug)]
pub struct PredictionOutcome {
    /// The entry now at the head of the history log.
    pub entry: HistoryEntry,
    pub stats: DerivedStats,
    /// Set when the updated log could not be persisted.
    pub storage_warning: Option<StorageError>,
}

/// Result of a successful login.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: UserIdentity,
    /// Set when the session could not be persisted.
    pub storage_warning: Option<StorageError>,
}

pub struct App {
    config: GridcastConfig,
    store: Box<dyn KeyValueStore>,
    session: SessionFlow,
    history: HistoryEngine,
    predictor: Predictor,
    flight: SingleFlight,
    events: EventLog,
}

impl App {
    /// Open the file-backed store from `config`, restore the session and
    /// load the history log.
    pub fn open(config: GridcastConfig) -> Self {
        let store = FileStore::new(expand_home(&config.storage.dir));
        Self::with_store(config, Box::new(store))
    }

    /// Build around an explicit store.
    pub fn with_store(config: GridcastConfig, store: Box<dyn KeyValueStore>) -> Self {
        let events = EventLog::from_config(&config.logging);
        let delay = Duration::from_millis(config.session.login_delay_ms);

        let session = SessionFlow::restore(&*store, delay);
        let (history, issue) = HistoryEngine::load_with_issues(&*store);
        match issue {
            Some(LoadIssue::Unreadable(e)) => events.warn("history.unreadable", e),
            Some(LoadIssue::Unparsable(e)) => events.warn("history.unparsable", e),
            Some(LoadIssue::SkippedEntries(n)) => {
                events.warn("history.skipped_entries", format!("{n} malformed entries"));
            }
            None => {}
        }
        events.debug(
            "app.opened",
            format!("{} history entries, logged in: {}", history.len(), session.is_logged_in()),
        );

        Self {
            predictor: Predictor::from_config(&config.predictor),
            config,
            store,
            session,
            history,
            flight: SingleFlight::new(),
            events,
        }
    }

    pub fn config(&self) -> &GridcastConfig {
        &self.config
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    pub fn current_user(&self) -> Option<&UserIdentity> {
        self.session.current()
    }

    /// The logged-in user, or [`AppError::NotLoggedIn`].
    pub fn require_user(&self) -> Result<&UserIdentity, AppError> {
        self.session.current().ok_or(AppError::NotLoggedIn)
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<LoginOutcome, AppError> {
        match self.session.login(&mut *self.store, username, password) {
            Ok((user, storage_warning)) => {
                self.events.info("session.login", format!("{} ({})", user.username, user.role));
                if let Some(e) = &storage_warning {
                    self.events.warn("storage.write_failed", e.to_string());
                }
                Ok(LoginOutcome {
                    user,
                    storage_warning,
                })
            }
            Err(e) => {
                self.events.warn("session.login_failed", format!("{username}: {e}"));
                Err(e.into())
            }
        }
    }

    /// Log out. The in-memory session always ends; a storage failure is
    /// returned as a warning.
    pub fn logout(&mut self) -> Option<StorageError> {
        let username = self.session.current().map(|u| u.username.clone());
        let warning = self.session.logout(&mut *self.store).err();

        if let Some(name) = username {
            self.events.info("session.logout", name);
        }
        if let Some(e) = &warning {
            self.events.warn("storage.write_failed", e.to_string());
        }
        warning
    }

    // -----------------------------------------------------------------------
    // Predictions
    // -----------------------------------------------------------------------

    pub fn is_prediction_in_flight(&self) -> bool {
        self.flight.is_in_flight()
    }

    /// Validate the form, submit it, and record the result at the head of
    /// the history log.
    ///
    /// Any failure leaves the log and stats exactly as they were.
    pub fn predict(&mut self, form: &PredictionForm) -> Result<PredictionOutcome, PredictError> {
        if !self.session.is_logged_in() {
            return Err(PredictError::NotLoggedIn);
        }

        let inputs = form.parse().inspect_err(|e| {
            self.events.debug("prediction.invalid", e.to_string());
        })?;

        let results = self.submit(&inputs)?;

        let entry = self.history.new_entry(inputs, results);
        let Change {
            stats,
            persist_error,
        } = self.history.append(&mut *self.store, entry.clone());

        self.events.info(
            "prediction.succeeded",
            format!("entry {} with {} materials", entry.id, entry.results.len()),
        );
        if let Some(e) = &persist_error {
            self.events.warn("storage.write_failed", e.to_string());
        }

        Ok(PredictionOutcome {
            entry,
            stats,
            storage_warning: persist_error,
        })
    }

    /// Send one request to the predictor under the single-flight slot.
    ///
    /// Only borrows `self`, so the slot is what keeps a second caller out
    /// while a request is outstanding.
    pub fn submit(&self, inputs: &PredictionInputs) -> Result<PredictionResult, PredictError> {
        let Some(_guard) = self.flight.try_begin() else {
            self.events.debug("prediction.busy", "request already in flight");
            return Err(PredictError::Busy);
        };

        self.events.debug(
            "prediction.submitted",
            format!("{} @ {}", serde_json::to_string(inputs).unwrap_or_default(), self.predictor.url()),
        );
        self.predictor.submit(inputs).map_err(|e| {
            self.events.error("prediction.failed", e.to_string());
            e.into()
        })
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    pub fn history(&self) -> &HistoryEngine {
        &self.history
    }

    pub fn stats(&self) -> &DerivedStats {
        self.history.stats()
    }

    /// Empty the history log. Refuses unless the user confirmed.
    pub fn clear_history(&mut self, confirmed: bool) -> Result<Change, AppError> {
        self.require_user()?;
        if !confirmed {
            return Err(AppError::NotConfirmed);
        }

        let removed = self.history.len();
        let change = self.history.clear(&mut *self.store);
        self.events.info("history.cleared", format!("{removed} entries removed"));
        if let Some(e) = &change.persist_error {
            self.events.warn("storage.write_failed", e.to_string());
        }
        Ok(change)
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Render the report for entry `id`, or the newest entry when `None`.
    pub fn report(&self, id: Option<i64>) -> Result<Report, AppError> {
        let user = self.require_user()?;
        let entry = match id {
            Some(id) => self.history.get(id).ok_or(AppError::UnknownEntry(id))?,
            None => self.history.latest().ok_or(AppError::NothingToExport)?,
        };

        let now = Local::now();
        Ok(Report {
            file_name: report::report_file_name(now.timestamp_millis()),
            contents: report::render_report(&user.username, &entry.inputs, &entry.results, &now),
        })
    }

    /// Write the report for entry `id` (default: newest) into the export
    /// directory.
    pub fn export(&self, id: Option<i64>) -> Result<PathBuf, AppError> {
        let report = self.report(id)?;
        let dir = expand_home(&self.config.export.dir);

        match report::write_report(&dir, &report) {
            Ok(path) => {
                self.events.info("report.exported", path.display().to_string());
                Ok(path)
            }
            Err(e) => {
                self.events.error("report.export_failed", e.to_string());
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
