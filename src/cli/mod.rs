//! CLI command implementations for gridcast.
//!
//! Provides subcommand handlers for:
//! - `gridcast login | logout | whoami` — session management
//! - `gridcast predict` — request a forecast and record it
//! - `gridcast history` / `gridcast stats` — the log and its derived stats
//! - `gridcast clear` — wipe the log after confirmation
//! - `gridcast export` — write a plain-text report
//! - `gridcast config show|init|set|reset` — configuration management

use std::io::{self, BufRead, Write};

use anyhow::{Result, anyhow, bail};
use colored::Colorize;

use crate::app::App;
use crate::config;
use crate::error::PredictError;
use crate::history::{DerivedStats, HistoryEntry};
use crate::prediction::{PredictionForm, PredictionResult, split_material_unit};

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

fn open_app() -> App {
    App::open(config::load())
}

fn require_login(app: &App) -> Result<()> {
    if app.current_user().is_none() {
        bail!("not logged in. Run `gridcast login <username> <password>` first");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// gridcast login | logout | whoami
// ---------------------------------------------------------------------------

pub fn run_login(username: &str, password: &str) -> Result<()> {
    let mut app = open_app();
    if let Some(user) = app.current_user() {
        println!(
            "{} Already logged in as {} ({})",
            "·".dimmed(),
            user.username.bold(),
            user.role
        );
        return Ok(());
    }

    let outcome = app.login(username, password)?;
    println!(
        "{} Logged in as {} ({})",
        "✓".green().bold(),
        outcome.user.username.bold(),
        outcome.user.role
    );
    if let Some(e) = outcome.storage_warning {
        print_storage_warning(&e.to_string());
    }
    Ok(())
}

pub fn run_logout() -> Result<()> {
    let mut app = open_app();
    let was = app.current_user().map(|u| u.username.clone());
    if let Some(e) = app.logout() {
        print_storage_warning(&e.to_string());
    }

    match was {
        Some(name) => println!("{} Logged out {}", "✓".green().bold(), name.bold()),
        None => println!("{}", "Not logged in.".yellow()),
    }
    Ok(())
}

pub fn run_whoami() -> Result<()> {
    let app = open_app();
    match app.current_user() {
        Some(user) => println!("{} ({})", user.username.bold(), user.role),
        None => println!("{}", "Not logged in.".yellow()),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// gridcast predict
// ---------------------------------------------------------------------------

/// Raw `gridcast predict` arguments.
#[derive(Debug, Clone)]
pub struct PredictArgs {
    pub budget: String,
    pub location: String,
    pub tower_type: String,
    pub substation_type: String,
    pub export: bool,
}

impl PredictArgs {
    fn form(&self) -> PredictionForm {
        PredictionForm {
            budget: self.budget.clone(),
            location: self.location.clone(),
            tower_type: self.tower_type.clone(),
            substation_type: self.substation_type.clone(),
        }
    }
}

pub fn run_predict(args: PredictArgs, format: OutputFormat) -> Result<()> {
    let mut app = open_app();
    require_login(&app)?;

    let outcome = match app.predict(&args.form()) {
        Ok(outcome) => outcome,
        Err(PredictError::Validation(errors)) => {
            for (field, message) in &errors.fields {
                eprintln!("  {} {:<16} {}", "✗".red().bold(), field, message);
            }
            bail!("prediction parameters are invalid");
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "entry": outcome.entry,
                "stats": outcome.stats,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => print_materials_csv(&outcome.entry.results),
        OutputFormat::Table => {
            println!("{}", "Material Forecast".bold().cyan());
            println!("{}", "=".repeat(60));
            print_entry_summary(&outcome.entry);
            println!();
            print_materials_table(&outcome.entry.results);
        }
    }

    if let Some(e) = outcome.storage_warning {
        print_storage_warning(&e.to_string());
    }

    if args.export {
        let path = app.export(Some(outcome.entry.id))?;
        println!("{} Report written to {}", "✓".green().bold(), path.display());
    }

    Ok(())
}

fn print_entry_summary(entry: &HistoryEntry) {
    let inputs = &entry.inputs;
    println!("  {} {}", "Generated:      ".bold(), entry.timestamp);
    println!("  {} {}", "Budget:         ".bold(), format_budget(inputs.budget));
    println!("  {} {}", "Location:       ".bold(), inputs.location);
    println!("  {} {}", "Tower type:     ".bold(), inputs.tower_type);
    println!("  {} {}", "Substation type:".bold(), inputs.substation_type);
}

fn print_materials_table(results: &PredictionResult) {
    println!("  {:<28} {:>14} Unit", "Material", "Quantity");
    println!("  {}", "-".repeat(50));
    for (i, (material, quantity)) in results.iter().enumerate() {
        let (name, unit) = split_material_unit(material);
        let line = format!("  {:<28} {:>14} {}", name, quantity.to_string(), unit.unwrap_or(""));
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_materials_csv(results: &PredictionResult) {
    println!("material,quantity");
    for (material, quantity) in results.iter() {
        println!("{},{}", csv_field(material), csv_field(&quantity.to_string()));
    }
}

// ---------------------------------------------------------------------------
// gridcast history
// ---------------------------------------------------------------------------

pub fn run_history(format: OutputFormat) -> Result<()> {
    let app = open_app();
    require_login(&app)?;
    let entries = app.history().entries();

    if entries.is_empty() && format == OutputFormat::Table {
        println!(
            "{}",
            "No predictions yet. Run `gridcast predict` to create one.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Csv => print_history_csv(entries),
        OutputFormat::Table => print_history_table(entries),
    }
    Ok(())
}

fn print_history_table(entries: &[HistoryEntry]) {
    println!("{}", "Prediction History".bold().cyan());
    println!("{}", "=".repeat(60));
    println!(
        "  {:<24} {:>9} {:<15} {:<6} {:<4}",
        "Time", "Budget", "Location", "Tower", "Sub"
    );
    println!("  {}", "-".repeat(58));

    for (i, entry) in entries.iter().enumerate() {
        let line = format!(
            "  {:<24} {:>9} {:<15} {:<6} {:<4}",
            entry.timestamp,
            format_budget(entry.inputs.budget),
            entry.inputs.location.as_str(),
            entry.inputs.tower_type.as_str(),
            entry.inputs.substation_type.as_str(),
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
    println!();
    println!("  {} {}", "Entry ids:".dimmed(), id_list(entries).dimmed());
}

fn print_history_csv(entries: &[HistoryEntry]) {
    println!("id,timestamp,budget,location,tower_type,substation_type,materials");
    for entry in entries {
        let materials = entry
            .results
            .iter()
            .map(|(m, q)| format!("{m}={q}"))
            .collect::<Vec<_>>()
            .join("; ");
        println!(
            "{},{},{},{},{},{},{}",
            entry.id,
            csv_field(&entry.timestamp),
            entry.inputs.budget,
            csv_field(entry.inputs.location.as_str()),
            entry.inputs.tower_type,
            entry.inputs.substation_type,
            csv_field(&materials),
        );
    }
}

fn id_list(entries: &[HistoryEntry]) -> String {
    entries
        .iter()
        .map(|e| e.id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// gridcast stats
// ---------------------------------------------------------------------------

pub fn run_stats(format: OutputFormat) -> Result<()> {
    let app = open_app();
    require_login(&app)?;
    let stats = app.stats();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(stats)?),
        OutputFormat::Csv => {
            println!("total_predictions,avg_budget,last_prediction");
            println!(
                "{},{:.2},{}",
                stats.total_predictions,
                stats.avg_budget,
                csv_field(last_prediction_label(stats).as_str()),
            );
        }
        OutputFormat::Table => print_stats_table(stats),
    }
    Ok(())
}

fn print_stats_table(stats: &DerivedStats) {
    println!("{}", "POWERGRID Forecast Stats".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();
    println!("  {} {}", "Total predictions:".bold(), stats.total_predictions);
    println!(
        "  {} {}",
        "Avg budget:       ".bold(),
        format_budget(stats.avg_budget)
    );
    println!(
        "  {} {}",
        "Last prediction:  ".bold(),
        last_prediction_label(stats)
    );
}

fn last_prediction_label(stats: &DerivedStats) -> String {
    stats
        .last_prediction
        .as_ref()
        .map(|e| e.timestamp.clone())
        .unwrap_or_else(|| "None".to_string())
}

// ---------------------------------------------------------------------------
// gridcast clear
// ---------------------------------------------------------------------------

pub fn run_clear(yes: bool) -> Result<()> {
    let mut app = open_app();
    require_login(&app)?;

    if app.history().is_empty() {
        println!("{}", "History is already empty.".yellow());
        return Ok(());
    }

    let confirmed = yes
        || confirm(&format!(
            "Are you sure you want to clear all prediction history ({} entries)?",
            app.history().len()
        ))?;
    if !confirmed {
        println!("{}", "Aborted.".dimmed());
        return Ok(());
    }

    let change = app.clear_history(true)?;
    println!("{} Prediction history cleared", "✓".green().bold());
    if let Some(e) = change.persist_error {
        print_storage_warning(&e.to_string());
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

// ---------------------------------------------------------------------------
// gridcast export
// ---------------------------------------------------------------------------

pub fn run_export(id: Option<i64>) -> Result<()> {
    let app = open_app();
    require_login(&app)?;
    let path = app
        .export(id)
        .map_err(|e| anyhow!(e).context("export failed"))?;
    println!("{} Report written to {}", "✓".green().bold(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// gridcast config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective gridcast Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.gridcast/config.toml", global_exists);
    print_source(".gridcast.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "GRIDCAST_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.gridcast/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Set predictor.url to your prediction service.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// `₹12.50 Cr`
fn format_budget(budget: f64) -> String {
    format!("₹{budget:.2} Cr")
}

/// Quote a CSV field when it contains a separator, quote or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn print_storage_warning(message: &str) {
    eprintln!(
        "  {} {}",
        "Warning:".yellow().bold(),
        format!("changes were not saved ({message})").yellow()
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
