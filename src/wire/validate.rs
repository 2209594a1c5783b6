use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone)]
pub(crate) struct WireError {
    pub(crate) field: &'static str,
    pub(crate) message: String,
}

impl WireError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': {}", self.field, self.message)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct WireErrors {
    pub(crate) errors: Vec<WireError>,
}

impl fmt::Display for WireErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for WireErrors {}

/// Structurally validate a render request payload.
///
/// Field presence and primitive JSON type only: both peers may live in
/// contexts with no shared object identity, so this is the entire contract.
/// A missing or wrong-typed numeric field is rejected, never defaulted.
pub(crate) fn validate_request(v: &Value) -> Result<(), WireErrors> {
    let obj = require_object(v)?;
    let mut errors = Vec::new();
    require_string(obj, "id", &mut errors);
    require_string(obj, "css", &mut errors);
    require_string(obj, "html", &mut errors);
    require_dimension(obj, "width", &mut errors);
    require_dimension(obj, "height", &mut errors);
    finish(errors)
}

/// Structurally validate a render response payload.
pub(crate) fn validate_response(v: &Value) -> Result<(), WireErrors> {
    let obj = require_object(v)?;
    let mut errors = Vec::new();
    require_string(obj, "id", &mut errors);
    require_string(obj, "uri", &mut errors);
    finish(errors)
}

fn require_object(v: &Value) -> Result<&Map<String, Value>, WireErrors> {
    v.as_object().ok_or_else(|| WireErrors {
        errors: vec![WireError::new("$", "payload must be a JSON object")],
    })
}

fn require_string(obj: &Map<String, Value>, field: &'static str, errors: &mut Vec<WireError>) {
    match obj.get(field) {
        None => errors.push(WireError::new(field, "missing required field")),
        Some(Value::String(_)) => {}
        Some(_) => errors.push(WireError::new(field, "must be a string")),
    }
}

fn require_dimension(obj: &Map<String, Value>, field: &'static str, errors: &mut Vec<WireError>) {
    match obj.get(field) {
        None => errors.push(WireError::new(field, "missing required field")),
        Some(v) => match v.as_u64() {
            Some(n) if n > 0 => {}
            _ => errors.push(WireError::new(field, "must be a positive integer")),
        },
    }
}

fn finish(errors: Vec<WireError>) -> Result<(), WireErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(WireErrors { errors })
    }
}
