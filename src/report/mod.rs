//! Plain-text forecast report export.
//!
//! Renders one prediction (inputs + materials) as a human-readable report and
//! writes it to `powergrid-forecast-<unix millis>.txt` in the export
//! directory. Export is one-way; reports are never read back.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::error::AppError;
use crate::history::entry::display_timestamp;
use crate::prediction::{PredictionInputs, PredictionResult};

/// A rendered report, ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub file_name: String,
    pub contents: String,
}

/// Build the report file name for a generation instant.
pub fn report_file_name(unix_millis: i64) -> String {
    format!("powergrid-forecast-{unix_millis}.txt")
}

/// Render the report body.
pub fn render_report<Tz: TimeZone>(
    username: &str,
    inputs: &PredictionInputs,
    results: &PredictionResult,
    generated_at: &DateTime<Tz>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    let _ = writeln!(out, "POWERGRID Material Forecast Report");
    let _ = writeln!(out, "Generated: {}", display_timestamp(generated_at));
    let _ = writeln!(out, "User: {username}");
    let _ = writeln!(out);

    let _ = writeln!(out, "Project Parameters:");
    let _ = writeln!(out, "- Budget: {} Cr", inputs.budget);
    let _ = writeln!(out, "- Location: {}", inputs.location);
    let _ = writeln!(out, "- Tower Type: {}", inputs.tower_type);
    let _ = writeln!(out, "- Substation Type: {}", inputs.substation_type);
    let _ = writeln!(out);

    let _ = writeln!(out, "Predicted Materials:");
    for (material, quantity) in results.iter() {
        let _ = writeln!(out, "- {material}: {quantity}");
    }

    out
}

/// Write `report` into `dir`, creating it if needed.
///
/// Returns the full path of the written file.
pub fn write_report(dir: &Path, report: &Report) -> Result<PathBuf, AppError> {
    let path = dir.join(&report.file_name);
    let export_err = |source| AppError::Export {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(export_err)?;
    fs::write(&path, &report.contents).map_err(export_err)?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::prediction::{Location, SubstationType, TowerType};

    fn sample() -> (PredictionInputs, PredictionResult) {
        let inputs = PredictionInputs {
            budget: 25.0,
            location: Location::TamilNadu,
            tower_type: TowerType::Kv220,
            substation_type: SubstationType::Gis,
        };
        let mut results = PredictionResult::new();
        results.insert("Steel (MT)", 120_i64);
        results.insert("Conductor (km)", "45.5");
        (inputs, results)
    }

    #[test]
    fn report_lists_parameters_and_materials_in_order() {
        let (inputs, results) = sample();
        let at = Utc.with_ymd_and_hms(2025, 3, 7, 14, 5, 9).unwrap();
        let report = render_report("admin", &inputs, &results, &at);

        let expected = "\
POWERGRID Material Forecast Report
Generated: 3/7/2025, 2:05:09 PM
User: admin

Project Parameters:
- Budget: 25 Cr
- Location: Tamil Nadu
- Tower Type: 220kV
- Substation Type: GIS

Predicted Materials:
- Steel (MT): 120
- Conductor (km): 45.5
";
        assert_eq!(report, expected);
    }

    #[test]
    fn file_name_uses_millis() {
        assert_eq!(
            report_file_name(1_741_356_309_000),
            "powergrid-forecast-1741356309000.txt"
        );
    }

    #[test]
    fn write_report_creates_directory() {
        let dir = std::env::temp_dir()
            .join(format!("gridcast-report-{}", std::process::id()))
            .join("nested");
        let _ = fs::remove_dir_all(&dir);

        let report = Report {
            file_name: report_file_name(42),
            contents: "body".to_string(),
        };
        let path = write_report(&dir, &report).unwrap();
        assert_eq!(path, dir.join("powergrid-forecast-42.txt"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "body");

        let _ = fs::remove_dir_all(dir.parent().unwrap());
    }
}
