use std::fmt;

use serde_json::Value;

/// One positional value of an invocation payload, as sent by the scripted app layer.
#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum ArgumentValue {
    /// JSON `null` or an explicitly absent value
    Null,
    /// A boolean
    Boolean {
        /// The value
        value: bool,
    },
    /// A whole number
    Integer {
        /// The value
        value: i64,
    },
    /// A number with a fractional part, or one that does not fit in an `i64`
    Float {
        /// The value
        value: f64,
    },
    /// A string
    Text {
        /// The value
        value: String,
    },
    /// An array or object, kept as its JSON text
    Structured {
        /// The JSON encoding of the value
        json: String,
    },
}

impl ArgumentValue {
    /// Short type label used in validation messages
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean { .. } => "boolean",
            Self::Integer { .. } => "integer",
            Self::Float { .. } => "float",
            Self::Text { .. } => "string",
            Self::Structured { .. } => "structured value",
        }
    }
}

impl From<Value> for ArgumentValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Boolean { value },
            Value::Number(number) => number.as_i64().map_or_else(
                || Self::Float {
                    value: number.as_f64().unwrap_or(f64::NAN),
                },
                |value| Self::Integer { value },
            ),
            Value::String(value) => Self::Text { value },
            structured @ (Value::Array(_) | Value::Object(_)) => Self::Structured {
                json: structured.to_string(),
            },
        }
    }
}

/// Why an invocation payload was rejected. Every variant is delivered as `INVALID_ARGUMENTS`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// The raw payload is not a JSON array
    #[error("invocation payload is not a JSON array: {reason}")]
    MalformedPayload {
        /// Parser or type mismatch details
        reason: String,
    },
    /// Fewer positional values than required
    #[error("missing argument `{name}` at position {position}")]
    Missing {
        /// Zero-based position
        position: usize,
        /// Argument name
        name: &'static str,
    },
    /// A value of the wrong type
    #[error("argument `{name}` at position {position} must be a {expected}, got {found}")]
    WrongType {
        /// Zero-based position
        position: usize,
        /// Argument name
        name: &'static str,
        /// Required type
        expected: &'static str,
        /// Type that was sent
        found: &'static str,
    },
    /// A negative timeout
    #[error("argument `{name}` at position {position} must not be negative, got {value}")]
    Negative {
        /// Zero-based position
        position: usize,
        /// Argument name
        name: &'static str,
        /// The rejected value
        value: i64,
    },
}

struct Position {
    index: usize,
    name: &'static str,
}

const API_KEY: Position = Position {
    index: 0,
    name: "apiKey",
};
const DEVELOPER_PLAN_ID: Position = Position {
    index: 1,
    name: "developerPlanId",
};
const TIMEOUT_MS: Position = Position {
    index: 2,
    name: "timeoutMs",
};
const USE_CACHED_PLAN_ID: Position = Position {
    index: 3,
    name: "useCachedPlanId",
};

/// A validated `invokeBlinkUp` request. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    api_key: String,
    developer_plan_id: String,
    timeout_ms: u64,
    use_cached_plan_id: bool,
}

impl InvocationRequest {
    /// Builds a request from the positional payload
    /// `[apiKey: string, developerPlanId: string, timeoutMs: integer, useCachedPlanId: boolean]`.
    ///
    /// Values are never coerced: a number where a string is expected is rejected, as is a
    /// float or negative timeout. Values past the fourth position are ignored.
    ///
    /// # Errors
    /// Returns the first [`ArgumentError`] found, checking positions in order.
    pub fn from_arguments(arguments: &[ArgumentValue]) -> Result<Self, ArgumentError> {
        Ok(Self {
            api_key: text_at(arguments, &API_KEY)?,
            developer_plan_id: text_at(arguments, &DEVELOPER_PLAN_ID)?,
            timeout_ms: timeout_at(arguments, &TIMEOUT_MS)?,
            use_cached_plan_id: boolean_at(arguments, &USE_CACHED_PLAN_ID)?,
        })
    }

    /// Builds a request from a raw JSON array payload.
    ///
    /// # Errors
    /// Returns [`ArgumentError::MalformedPayload`] when `payload` is not a JSON array, otherwise
    /// the same errors as [`InvocationRequest::from_arguments`].
    pub fn from_json(payload: &str) -> Result<Self, ArgumentError> {
        Self::from_arguments(&parse_arguments(payload)?)
    }

    /// API key used for token acquisition and device setup
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Developer plan id; empty means not set
    #[must_use]
    pub fn developer_plan_id(&self) -> &str {
        &self.developer_plan_id
    }

    /// Timeout forwarded to the SDK controller
    #[must_use]
    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Whether the cached plan id should be looked up
    #[must_use]
    pub const fn use_cached_plan_id(&self) -> bool {
        self.use_cached_plan_id
    }
}

impl fmt::Debug for InvocationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationRequest")
            .field("api_key", &"<redacted>")
            .field("developer_plan_id", &self.developer_plan_id)
            .field("timeout_ms", &self.timeout_ms)
            .field("use_cached_plan_id", &self.use_cached_plan_id)
            .finish()
    }
}

/// Splits a raw JSON payload into positional values.
///
/// # Errors
/// Returns [`ArgumentError::MalformedPayload`] if `payload` is not valid JSON or not an array.
pub fn parse_arguments(payload: &str) -> Result<Vec<ArgumentValue>, ArgumentError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| ArgumentError::MalformedPayload {
            reason: e.to_string(),
        })?;

    match value {
        Value::Array(items) => Ok(items.into_iter().map(ArgumentValue::from).collect()),
        other => Err(ArgumentError::MalformedPayload {
            reason: format!("expected an array, got {}", ArgumentValue::from(other).type_name()),
        }),
    }
}

fn argument_at<'a>(
    arguments: &'a [ArgumentValue],
    position: &Position,
) -> Result<&'a ArgumentValue, ArgumentError> {
    arguments
        .get(position.index)
        .ok_or(ArgumentError::Missing {
            position: position.index,
            name: position.name,
        })
}

const fn wrong_type(
    position: &Position,
    expected: &'static str,
    found: &ArgumentValue,
) -> ArgumentError {
    ArgumentError::WrongType {
        position: position.index,
        name: position.name,
        expected,
        found: found.type_name(),
    }
}

fn text_at(arguments: &[ArgumentValue], position: &Position) -> Result<String, ArgumentError> {
    match argument_at(arguments, position)? {
        ArgumentValue::Text { value } => Ok(value.clone()),
        other => Err(wrong_type(position, "string", other)),
    }
}

fn timeout_at(arguments: &[ArgumentValue], position: &Position) -> Result<u64, ArgumentError> {
    match argument_at(arguments, position)? {
        ArgumentValue::Integer { value } => {
            u64::try_from(*value).map_err(|_| ArgumentError::Negative {
                position: position.index,
                name: position.name,
                value: *value,
            })
        }
        other => Err(wrong_type(position, "integer", other)),
    }
}

fn boolean_at(arguments: &[ArgumentValue], position: &Position) -> Result<bool, ArgumentError> {
    match argument_at(arguments, position)? {
        ArgumentValue::Boolean { value } => Ok(*value),
        other => Err(wrong_type(position, "boolean", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> ArgumentValue {
        ArgumentValue::Text {
            value: value.to_string(),
        }
    }

    fn valid_arguments() -> Vec<ArgumentValue> {
        vec![
            text("sk_live_abc"),
            text(""),
            ArgumentValue::Integer { value: 30_000 },
            ArgumentValue::Boolean { value: false },
        ]
    }

    #[test]
    fn test_valid_arguments() {
        let request = InvocationRequest::from_arguments(&valid_arguments()).unwrap();

        assert_eq!(request.api_key(), "sk_live_abc");
        assert_eq!(request.developer_plan_id(), "");
        assert_eq!(request.timeout_ms(), 30_000);
        assert!(!request.use_cached_plan_id());
    }

    #[test]
    fn test_api_key_must_be_a_string() {
        let mut arguments = valid_arguments();
        arguments[0] = ArgumentValue::Integer { value: 123 };

        let err = InvocationRequest::from_arguments(&arguments).unwrap_err();
        assert_eq!(
            err,
            ArgumentError::WrongType {
                position: 0,
                name: "apiKey",
                expected: "string",
                found: "integer",
            }
        );
    }

    #[test]
    fn test_missing_trailing_argument() {
        let arguments = &valid_arguments()[..3];

        let err = InvocationRequest::from_arguments(arguments).unwrap_err();
        assert_eq!(
            err,
            ArgumentError::Missing {
                position: 3,
                name: "useCachedPlanId",
            }
        );
    }

    #[test]
    fn test_null_is_not_a_default() {
        let mut arguments = valid_arguments();
        arguments[1] = ArgumentValue::Null;

        let err = InvocationRequest::from_arguments(&arguments).unwrap_err();
        assert!(matches!(
            err,
            ArgumentError::WrongType {
                name: "developerPlanId",
                found: "null",
                ..
            }
        ));
    }

    #[test]
    fn test_timeout_rejects_floats_and_negatives() {
        let mut arguments = valid_arguments();
        arguments[2] = ArgumentValue::Float { value: 1.5 };
        assert!(matches!(
            InvocationRequest::from_arguments(&arguments),
            Err(ArgumentError::WrongType { expected: "integer", .. })
        ));

        arguments[2] = ArgumentValue::Integer { value: -1 };
        assert_eq!(
            InvocationRequest::from_arguments(&arguments).unwrap_err().to_string(),
            "argument `timeoutMs` at position 2 must not be negative, got -1"
        );
    }

    #[test]
    fn test_flag_does_not_accept_strings() {
        let mut arguments = valid_arguments();
        arguments[3] = text("true");

        assert!(matches!(
            InvocationRequest::from_arguments(&arguments),
            Err(ArgumentError::WrongType {
                position: 3,
                expected: "boolean",
                found: "string",
                ..
            })
        ));
    }

    #[test]
    fn test_extra_arguments_are_ignored() {
        let mut arguments = valid_arguments();
        arguments.push(text("unused"));

        assert!(InvocationRequest::from_arguments(&arguments).is_ok());
    }

    #[test]
    fn test_from_json_payload() {
        let request =
            InvocationRequest::from_json(r#"["sk_live_abc", "plan-1", 5000, true]"#).unwrap();
        assert_eq!(request.developer_plan_id(), "plan-1");
        assert_eq!(request.timeout_ms(), 5000);
        assert!(request.use_cached_plan_id());

        let err = InvocationRequest::from_json(r#"[123, "", 5000, false]"#).unwrap_err();
        assert!(matches!(err, ArgumentError::WrongType { position: 0, .. }));
    }

    #[test]
    fn test_payload_must_be_an_array() {
        assert!(matches!(
            parse_arguments(r#"{"apiKey": "sk_live_abc"}"#),
            Err(ArgumentError::MalformedPayload { reason }) if reason.contains("structured value")
        ));
        assert!(matches!(
            parse_arguments("not json"),
            Err(ArgumentError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_json_values_map_to_argument_values() {
        let values = parse_arguments(r#"[null, 1.25, 18446744073709551615, [1, 2]]"#).unwrap();

        assert_eq!(values[0], ArgumentValue::Null);
        assert_eq!(values[1], ArgumentValue::Float { value: 1.25 });
        assert_eq!(values[2].type_name(), "float");
        assert_eq!(
            values[3],
            ArgumentValue::Structured {
                json: "[1,2]".to_string()
            }
        );
    }

    #[test]
    fn test_debug_output_redacts_api_key() {
        let request = InvocationRequest::from_arguments(&valid_arguments()).unwrap();
        let rendered = format!("{request:?}");

        assert!(!rendered.contains("sk_live_abc"));
        assert!(rendered.contains("<redacted>"));
    }
}
