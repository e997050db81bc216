/// HTTP client for the external material-prediction service.
///
/// Sends one `POST` per submission with the inputs as a flat JSON object,
/// using the synchronous `ureq` client. There is no retry and no timeout
/// override; the transport defaults apply.
///
/// Failures are classified into [`RequestError`]:
///
/// | Condition                                  | Error                     |
/// |--------------------------------------------|---------------------------|
/// | Non-2xx HTTP status                        | `ServerStatus { code }`   |
/// | DNS / connect / TLS / socket failure       | `Unreachable`             |
/// | Empty, non-JSON or non-object body         | `EmptyResult`             |
/// | Object with no materials                   | `EmptyResult`             |
/// | Quantity that is neither number nor string | `EmptyResult`             |
use serde_json::Value;

use super::{PredictionInputs, PredictionResult};
use crate::config::schema::PredictorConfig;
use crate::error::RequestError;

/// Blocking predictor client. Cheap to construct; holds only the endpoint.
#[derive(Debug, Clone)]
pub struct Predictor {
    url: String,
}

impl Predictor {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn from_config(config: &PredictorConfig) -> Self {
        Self::new(config.url.trim())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Submit inputs and return the predicted materials.
    ///
    /// Does not record anything. The caller appends to history on success.
    pub fn submit(&self, inputs: &PredictionInputs) -> Result<PredictionResult, RequestError> {
        let response = ureq::post(&self.url)
            .set("Content-Type", "application/json")
            .send_json(inputs)
            .map_err(classify_error)?;

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(RequestError::ServerStatus { code: status });
        }

        let body = response
            .into_string()
            .map_err(|e| RequestError::Unreachable {
                details: format!("failed reading response body: {e}"),
            })?;

        parse_prediction_body(&body)
    }
}

fn classify_error(error: ureq::Error) -> RequestError {
    match error {
        ureq::Error::Status(code, _) => RequestError::ServerStatus { code },
        ureq::Error::Transport(transport) => RequestError::Unreachable {
            details: transport.to_string(),
        },
    }
}

/// Decode a predictor response body into a [`PredictionResult`].
pub fn parse_prediction_body(body: &str) -> Result<PredictionResult, RequestError> {
    if body.trim().is_empty() {
        return Err(RequestError::EmptyResult);
    }

    let value: Value = serde_json::from_str(body).map_err(|_| RequestError::EmptyResult)?;
    let Value::Object(object) = value else {
        return Err(RequestError::EmptyResult);
    };

    let result = PredictionResult::from_json_object(PredictionResult::unwrap_envelope(object))
        .ok_or(RequestError::EmptyResult)?;
    if result.is_empty() {
        return Err(RequestError::EmptyResult);
    }
    Ok(result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_object() {
        let result = parse_prediction_body(r#"{"Steel (MT)": 120, "Cement (MT)": "84.5"}"#).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.get("Steel (MT)").unwrap().to_string(), "120");
        assert_eq!(result.get("Cement (MT)").unwrap().as_f64(), Some(84.5));
    }

    #[test]
    fn unwraps_predictions_envelope() {
        let body = r#"{"predictions": {"Steel (tons)": 125.3, "Insulators (units)": 247.1}}"#;
        let result = parse_prediction_body(body).unwrap();
        let names: Vec<&str> = result.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["Steel (tons)", "Insulators (units)"]);
    }

    #[test]
    fn empty_and_malformed_bodies_are_empty_result() {
        for body in ["", "   ", "null", "[]", "42", "not json", "{}", r#"{"predictions": {}}"#] {
            assert_eq!(
                parse_prediction_body(body),
                Err(RequestError::EmptyResult),
                "body {body:?}"
            );
        }
    }

    #[test]
    fn nested_quantity_is_empty_result() {
        let body = r#"{"Steel": [1, 2]}"#;
        assert_eq!(parse_prediction_body(body), Err(RequestError::EmptyResult));
    }

    #[test]
    fn from_config_trims_url() {
        let config = PredictorConfig {
            url: " http://localhost:8000/predict ".to_string(),
        };
        assert_eq!(
            Predictor::from_config(&config).url(),
            "http://localhost:8000/predict"
        );
    }

    #[test]
    fn unreachable_host_is_classified() {
        // Grab a free port, then release it so the connect is refused.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let predictor = Predictor::new(format!("http://127.0.0.1:{port}/predict"));
        let inputs = PredictionInputs {
            budget: 10.0,
            location: Default::default(),
            tower_type: Default::default(),
            substation_type: Default::default(),
        };
        assert!(matches!(
            predictor.submit(&inputs),
            Err(RequestError::Unreachable { .. })
        ));
    }
}
