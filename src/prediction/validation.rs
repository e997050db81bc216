//! Prediction form validation.
//!
//! The form is range-validated: budget must be a number between
//! [`MIN_BUDGET`] and [`MAX_BUDGET`] crore (inclusive). Location, tower type
//! and substation type are fixed-choice fields with defaults, so they only
//! fail when a caller supplies an unknown choice or clears the field.

use serde::{Deserialize, Serialize};

use super::{Field, Location, PredictionInputs, SubstationType, TowerType};
use crate::error::ValidationErrors;

/// Smallest accepted budget (crore).
pub const MIN_BUDGET: f64 = 1.0;

/// Largest accepted budget (crore).
pub const MAX_BUDGET: f64 = 100.0;

/// Check typed inputs. Does not modify them.
pub fn validate(inputs: &PredictionInputs) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if let Some(msg) = budget_error(inputs.budget) {
        errors.insert(Field::Budget, msg);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn budget_error(budget: f64) -> Option<String> {
    if !budget.is_finite() {
        return Some("Budget must be a number".to_string());
    }
    if !(MIN_BUDGET..=MAX_BUDGET).contains(&budget) {
        return Some(format!(
            "Budget must be between {MIN_BUDGET} and {MAX_BUDGET} crore"
        ));
    }
    None
}

// ---------------------------------------------------------------------------
// Raw form state
// ---------------------------------------------------------------------------

/// Untyped form state as entered by the user.
///
/// Exists only until submission. [`PredictionForm::parse`] turns it into
/// [`PredictionInputs`] or a field-keyed error map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionForm {
    pub budget: String,
    pub location: String,
    pub tower_type: String,
    pub substation_type: String,
}

impl Default for PredictionForm {
    fn default() -> Self {
        Self {
            budget: String::new(),
            location: Location::default().to_string(),
            tower_type: TowerType::default().to_string(),
            substation_type: SubstationType::default().to_string(),
        }
    }
}

impl PredictionForm {
    /// Check presence of every field, parse the choices and the budget, then
    /// apply [`validate`]. All problems are reported at once.
    pub fn parse(&self) -> Result<PredictionInputs, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let budget = match self.budget.trim() {
            "" => {
                errors.insert(Field::Budget, "Budget is required");
                None
            }
            raw => match raw.parse::<f64>() {
                Ok(b) => match budget_error(b) {
                    Some(msg) => {
                        errors.insert(Field::Budget, msg);
                        None
                    }
                    None => Some(b),
                },
                Err(_) => {
                    errors.insert(Field::Budget, "Budget must be a number");
                    None
                }
            },
        };

        let location = parse_choice::<Location>(&self.location, Field::Location, &mut errors);
        let tower_type = parse_choice::<TowerType>(&self.tower_type, Field::TowerType, &mut errors);
        let substation_type =
            parse_choice::<SubstationType>(&self.substation_type, Field::SubstationType, &mut errors);

        match (budget, location, tower_type, substation_type) {
            (Some(budget), Some(location), Some(tower_type), Some(substation_type))
                if errors.is_empty() =>
            {
                let inputs = PredictionInputs {
                    budget,
                    location,
                    tower_type,
                    substation_type,
                };
                validate(&inputs)?;
                Ok(inputs)
            }
            _ => Err(errors),
        }
    }
}

fn parse_choice<T: std::str::FromStr>(
    raw: &str,
    field: Field,
    errors: &mut ValidationErrors,
) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.insert(field, format!("{} is required", field_label(field)));
        return None;
    }
    match raw.parse::<T>() {
        Ok(choice) => Some(choice),
        Err(_) => {
            errors.insert(
                field,
                format!("Unknown {} '{raw}'", field_label(field).to_lowercase()),
            );
            None
        }
    }
}

fn field_label(field: Field) -> &'static str {
    match field {
        Field::Budget => "Budget",
        Field::Location => "Location",
        Field::TowerType => "Tower type",
        Field::SubstationType => "Substation type",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(budget: f64) -> PredictionInputs {
        PredictionInputs {
            budget,
            location: Location::Delhi,
            tower_type: TowerType::Kv132,
            substation_type: SubstationType::Ais,
        }
    }

    fn form(budget: &str) -> PredictionForm {
        PredictionForm {
            budget: budget.to_string(),
            ..PredictionForm::default()
        }
    }

    #[test]
    fn budget_bounds_are_inclusive() {
        assert!(validate(&inputs(1.0)).is_ok());
        assert!(validate(&inputs(100.0)).is_ok());
        assert!(validate(&inputs(55.25)).is_ok());
    }

    #[test]
    fn budget_outside_range_is_rejected() {
        for bad in [0.0, 0.99, 100.01, 101.0, -5.0] {
            let errors = validate(&inputs(bad)).unwrap_err();
            assert!(errors.get(Field::Budget).is_some(), "budget {bad} accepted");
            assert_eq!(errors.fields.len(), 1);
        }
    }

    #[test]
    fn non_finite_budget_is_rejected() {
        assert!(validate(&inputs(f64::NAN)).is_err());
        assert!(validate(&inputs(f64::INFINITY)).is_err());
    }

    #[test]
    fn validate_leaves_inputs_untouched() {
        let original = inputs(250.0);
        let copy = original.clone();
        let _ = validate(&original);
        assert_eq!(original, copy);
    }

    #[test]
    fn default_form_only_lacks_budget() {
        let errors = PredictionForm::default().parse().unwrap_err();
        assert_eq!(errors.fields.len(), 1);
        assert_eq!(errors.get(Field::Budget), Some("Budget is required"));
    }

    #[test]
    fn form_parses_valid_values() {
        let parsed = PredictionForm {
            budget: " 12.5 ".to_string(),
            location: "Tamil Nadu".to_string(),
            tower_type: "400kV".to_string(),
            substation_type: "GIS".to_string(),
        }
        .parse()
        .unwrap();

        assert_eq!(parsed.budget, 12.5);
        assert_eq!(parsed.location, Location::TamilNadu);
        assert_eq!(parsed.tower_type, TowerType::Kv400);
        assert_eq!(parsed.substation_type, SubstationType::Gis);
    }

    #[test]
    fn form_reports_every_bad_field() {
        let errors = PredictionForm {
            budget: "abc".to_string(),
            location: String::new(),
            tower_type: "765kV".to_string(),
            substation_type: "  ".to_string(),
        }
        .parse()
        .unwrap_err();

        assert_eq!(errors.get(Field::Budget), Some("Budget must be a number"));
        assert_eq!(errors.get(Field::Location), Some("Location is required"));
        assert_eq!(errors.get(Field::TowerType), Some("Unknown tower type '765kV'"));
        assert_eq!(
            errors.get(Field::SubstationType),
            Some("Substation type is required")
        );
    }

    #[test]
    fn form_range_checks_budget() {
        assert!(form("0").parse().is_err());
        assert!(form("101").parse().is_err());
        assert!(form("1").parse().is_ok());
        assert!(form("100").parse().is_ok());
    }
}
