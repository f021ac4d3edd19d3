//! Response shape validation.
//!
//! Every backend speaks the `{success, data}` envelope except the liveness
//! endpoint. A 2xx response that fails validation is treated exactly like a
//! rejected attempt.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Result of checking a 2xx response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// The payload to hand back to the caller.
    Valid(Value),
    /// Why the body was not acceptable.
    Invalid(String),
}

/// Checks a decoded response body.
///
/// Bodies that are not JSON arrive as `Value::String` holding the raw text.
pub trait EnvelopeValidator: fmt::Debug + Send + Sync {
    fn validate(&self, body: Value) -> Validation;
}

type ShapeCheck = fn(&Value) -> Result<(), String>;

/// Validator for the `{success: true, data: {...}}` convention.
///
/// Yields the `data` member on success.
#[derive(Clone, Default)]
pub struct Envelope {
    required: &'static [&'static str],
    shape: Option<(&'static str, ShapeCheck)>,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields that must be present, non-null and, for strings, non-empty
    /// inside `data`.
    pub fn require(mut self, fields: &'static [&'static str]) -> Self {
        self.required = fields;
        self
    }

    /// Additionally require that `data` deserializes as `T`.
    pub fn decodes_as<T: DeserializeOwned>(mut self) -> Self {
        self.shape = Some((std::any::type_name::<T>(), check_shape::<T>));
        self
    }
}

fn check_shape<T: DeserializeOwned>(data: &Value) -> Result<(), String> {
    serde_json::from_value::<T>(data.clone())
        .map(|_| ())
        .map_err(|e| e.to_string())
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("required", &self.required)
            .field("shape", &self.shape.map(|(name, _)| name))
            .finish()
    }
}

impl EnvelopeValidator for Envelope {
    fn validate(&self, body: Value) -> Validation {
        let Value::Object(mut object) = body else {
            return Validation::Invalid("body is not a JSON object".to_string());
        };

        if object.get("success").and_then(Value::as_bool) != Some(true) {
            let message = object
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("success flag missing or false");
            return Validation::Invalid(message.to_string());
        }

        let data = match object.remove("data") {
            Some(Value::Null) | None => {
                return Validation::Invalid("data field missing".to_string())
            }
            Some(data) => data,
        };

        for field in self.required {
            match data.get(field) {
                None | Some(Value::Null) => {
                    return Validation::Invalid(format!("data.{} missing", field))
                }
                Some(Value::String(s)) if s.is_empty() => {
                    return Validation::Invalid(format!("data.{} is empty", field))
                }
                Some(_) => {}
            }
        }

        if let Some((name, check)) = self.shape {
            if let Err(reason) = check(&data) {
                return Validation::Invalid(format!("data is not a {}: {}", short_name(name), reason));
            }
        }

        Validation::Valid(data)
    }
}

fn short_name(type_name: &str) -> &str {
    type_name.rsplit("::").next().unwrap_or(type_name)
}

/// Accepts any 2xx body. Used for `/health`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Liveness;

impl EnvelopeValidator for Liveness {
    fn validate(&self, body: Value) -> Validation {
        Validation::Valid(body)
    }
}
