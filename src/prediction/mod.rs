//! Prediction request flow — form types, validation, and the predictor client.
//!
//! The prediction itself is computed by an external HTTP service. This module
//! owns everything on our side of that boundary:
//!
//! - **Inputs**: [`PredictionInputs`] (typed) and [`PredictionForm`] (raw form state)
//! - **Validation**: [`validate`] — budget range check, field-keyed errors
//! - **Client**: [`client::Predictor`] — one `POST` per submission, classified errors
//! - **Single-flight**: [`flight::SingleFlight`] — at most one request outstanding
//!
//! Submitting never touches the history log. The caller pairs the returned
//! [`PredictionResult`] with its inputs and hands it to the history engine.

pub mod client;
pub mod flight;
pub mod validation;

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::de;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use client::Predictor;
pub use flight::SingleFlight;
pub use validation::{PredictionForm, validate};

/// Envelope key emitted by the reference backend: `{"predictions": {...}}`.
const ENVELOPE_KEY: &str = "predictions";

// ---------------------------------------------------------------------------
// Form fields
// ---------------------------------------------------------------------------

/// A field of the prediction form, used to key validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Budget,
    Location,
    TowerType,
    SubstationType,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Budget => write!(f, "budget"),
            Self::Location => write!(f, "location"),
            Self::TowerType => write!(f, "tower_type"),
            Self::SubstationType => write!(f, "substation_type"),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixed-choice parameters
// ---------------------------------------------------------------------------

/// Project region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    #[default]
    Delhi,
    Gujarat,
    Karnataka,
    Kerala,
    #[serde(rename = "Madhya Pradesh")]
    MadhyaPradesh,
    Maharashtra,
    Odisha,
    Rajasthan,
    #[serde(rename = "Tamil Nadu")]
    TamilNadu,
    Telangana,
}

impl Location {
    pub const ALL: [Location; 10] = [
        Self::Delhi,
        Self::Gujarat,
        Self::Karnataka,
        Self::Kerala,
        Self::MadhyaPradesh,
        Self::Maharashtra,
        Self::Odisha,
        Self::Rajasthan,
        Self::TamilNadu,
        Self::Telangana,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delhi => "Delhi",
            Self::Gujarat => "Gujarat",
            Self::Karnataka => "Karnataka",
            Self::Kerala => "Kerala",
            Self::MadhyaPradesh => "Madhya Pradesh",
            Self::Maharashtra => "Maharashtra",
            Self::Odisha => "Odisha",
            Self::Rajasthan => "Rajasthan",
            Self::TamilNadu => "Tamil Nadu",
            Self::Telangana => "Telangana",
        }
    }
}

/// Transmission tower voltage class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerType {
    #[default]
    #[serde(rename = "132kV")]
    Kv132,
    #[serde(rename = "220kV")]
    Kv220,
    #[serde(rename = "400kV")]
    Kv400,
}

impl TowerType {
    pub const ALL: [TowerType; 3] = [Self::Kv132, Self::Kv220, Self::Kv400];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kv132 => "132kV",
            Self::Kv220 => "220kV",
            Self::Kv400 => "400kV",
        }
    }
}

/// Substation switchgear insulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubstationType {
    /// Air Insulated Switchgear.
    #[default]
    #[serde(rename = "AIS")]
    Ais,
    /// Gas Insulated Switchgear.
    #[serde(rename = "GIS")]
    Gis,
}

impl SubstationType {
    pub const ALL: [SubstationType; 2] = [Self::Ais, Self::Gis];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ais => "AIS",
            Self::Gis => "GIS",
        }
    }
}

/// Implements `Display` and a case-insensitive `FromStr` over `ALL`.
macro_rules! choice_str {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                <$ty>::ALL
                    .into_iter()
                    .find(|choice| choice.as_str().eq_ignore_ascii_case(s))
                    .ok_or(())
            }
        }
    };
}

choice_str!(Location);
choice_str!(TowerType);
choice_str!(SubstationType);

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Validated project parameters, serialized as the flat request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInputs {
    /// Budget in crore. Older stored records carry this as a string.
    #[serde(deserialize_with = "deserialize_budget")]
    pub budget: f64,
    pub location: Location,
    pub tower_type: TowerType,
    pub substation_type: SubstationType,
}

/// Accept a budget stored either as a JSON number or as a numeric string.
fn deserialize_budget<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawBudget {
        Number(f64),
        Text(String),
    }

    let budget = match RawBudget::deserialize(deserializer)? {
        RawBudget::Number(n) => Some(n),
        RawBudget::Text(s) => s.trim().parse::<f64>().ok(),
    };
    budget
        .filter(|b| b.is_finite())
        .ok_or_else(|| de::Error::custom("budget is not a finite number"))
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A predicted quantity as returned by the service — a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Number(serde_json::Number),
    Text(String),
}

impl Quantity {
    /// Numeric value, parsing string quantities.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => Some(Self::Number(n)),
            serde_json::Value::String(s) => Some(Self::Text(s)),
            _ => None,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Quantity {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for Quantity {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Material name → predicted quantity, in the order the service sent them.
///
/// Serialized as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionResult {
    materials: Vec<(String, Quantity)>,
}

impl PredictionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material, replacing the quantity if the name already exists.
    pub fn insert(&mut self, material: impl Into<String>, quantity: impl Into<Quantity>) {
        let material = material.into();
        let quantity = quantity.into();
        match self.materials.iter_mut().find(|(name, _)| *name == material) {
            Some(slot) => slot.1 = quantity,
            None => self.materials.push((material, quantity)),
        }
    }

    pub fn get(&self, material: &str) -> Option<&Quantity> {
        self.materials
            .iter()
            .find(|(name, _)| name == material)
            .map(|(_, q)| q)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Quantity)> {
        self.materials.iter().map(|(name, q)| (name.as_str(), q))
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Strip a `{"predictions": {...}}` envelope if it is the only key.
    pub fn unwrap_envelope(
        mut object: serde_json::Map<String, serde_json::Value>,
    ) -> serde_json::Map<String, serde_json::Value> {
        if object.len() == 1
            && let Some(serde_json::Value::Object(_)) = object.get(ENVELOPE_KEY)
            && let Some(serde_json::Value::Object(inner)) = object.remove(ENVELOPE_KEY)
        {
            return inner;
        }
        object
    }

    /// Build from a decoded JSON object.
    ///
    /// Returns `None` if any value is neither a number nor a string.
    pub fn from_json_object(object: serde_json::Map<String, serde_json::Value>) -> Option<Self> {
        let mut result = Self::new();
        for (name, value) in object {
            result.insert(name, Quantity::from_json(value)?);
        }
        Some(result)
    }
}

impl From<Vec<(String, Quantity)>> for PredictionResult {
    fn from(materials: Vec<(String, Quantity)>) -> Self {
        let mut result = Self::new();
        for (name, quantity) in materials {
            result.insert(name, quantity);
        }
        result
    }
}

impl Serialize for PredictionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.materials.len()))?;
        for (name, quantity) in &self.materials {
            map.serialize_entry(name, quantity)?;
        }
        map.end()
    }
}

/// Stored records from older dashboards kept the raw service response,
/// envelope included, so it is unwrapped here as well.
impl<'de> Deserialize<'de> for PredictionResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        PredictionResult::from_json_object(PredictionResult::unwrap_envelope(object))
            .ok_or_else(|| de::Error::custom("material quantities must be numbers or strings"))
    }
}

// ---------------------------------------------------------------------------
// Material names
// ---------------------------------------------------------------------------

/// Matches a trailing parenthesized unit: `Steel (tons)`.
static UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(.*?)\s*\(([^()]+)\)\s*$").expect("unit regex must compile")
});

/// Split `"Steel (tons)"` into `("Steel", Some("tons"))`.
///
/// Names without a trailing parenthesized unit come back unchanged.
pub fn split_material_unit(material: &str) -> (&str, Option<&str>) {
    match UNIT_RE.captures(material) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(name), Some(unit)) if !name.as_str().is_empty() => {
                (name.as_str(), Some(unit.as_str().trim()))
            }
            _ => (material.trim(), None),
        },
        None => (material.trim(), None),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
