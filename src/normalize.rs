//! Unwraps the backend's response envelope.
//!
//! The backend answers with either `{ "data": T }` or `{ "data": { "data": T } }`
//! depending on the endpoint and deployment. Every response goes through
//! [`normalize`] exactly once, in the API client's response interceptor.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

const ENVELOPE: &str = "data";

/// Extract the payload from a raw response body.
///
/// Returns `body.data.data` when `body.data` is an object that itself carries a
/// `data` field, otherwise `body.data` (including `null`).
pub fn normalize(body: Value) -> ClientResult<Value> {
    let mut outer = match body {
        Value::Object(map) => map,
        other => {
            tracing::warn!("Response body is not an object: {}", kind(&other));
            return Err(ClientError::UnexpectedShape(format!(
                "expected an object envelope, got {}",
                kind(&other)
            )));
        }
    };

    let Some(data) = outer.remove(ENVELOPE) else {
        tracing::warn!("Response body has no `data` envelope");
        return Err(ClientError::UnexpectedShape(
            "missing `data` envelope".to_string(),
        ));
    };

    match data {
        Value::Object(mut inner) if inner.contains_key(ENVELOPE) => {
            Ok(inner.remove(ENVELOPE).unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

/// [`normalize`] and narrow the payload to the endpoint's result type.
pub fn normalize_into<T: DeserializeOwned>(body: Value) -> ClientResult<T> {
    let payload = normalize(body)?;
    serde_json::from_value(payload).map_err(|e| {
        tracing::warn!("Response payload did not match expected type: {}", e);
        ClientError::UnexpectedShape(e.to_string())
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_single_envelope() {
        let body = json!({ "data": [{ "id": 1 }, { "id": 2 }] });
        assert_eq!(normalize(body).unwrap(), json!([{ "id": 1 }, { "id": 2 }]));
    }

    #[test]
    fn unwraps_double_envelope() {
        let body = json!({ "data": { "data": { "id": 7, "nome": "Sala A" } } });
        assert_eq!(normalize(body).unwrap(), json!({ "id": 7, "nome": "Sala A" }));
    }

    #[test]
    fn double_envelope_around_array() {
        let body = json!({ "data": { "data": [1, 2, 3] }, "message": "ok" });
        assert_eq!(normalize(body).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn object_without_nested_data_is_returned_whole() {
        let body = json!({ "data": { "id": 3, "token": "abc" } });
        assert_eq!(normalize(body).unwrap(), json!({ "id": 3, "token": "abc" }));
    }

    #[test]
    fn null_payload_is_passed_through() {
        assert_eq!(normalize(json!({ "data": null })).unwrap(), Value::Null);
        assert_eq!(
            normalize(json!({ "data": { "data": null } })).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn missing_envelope_is_rejected() {
        let err = normalize(json!({ "id": 1 })).unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedShape(_)));

        let err = normalize(json!([1, 2])).unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedShape(_)));
    }

    #[test]
    fn normalize_into_narrows_to_type() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Room {
            id: i64,
            name: String,
        }

        let room: Room =
            normalize_into(json!({ "data": { "data": { "id": 1, "name": "1A" } } })).unwrap();
        assert_eq!(
            room,
            Room {
                id: 1,
                name: "1A".into()
            }
        );

        let err = normalize_into::<Room>(json!({ "data": { "id": "one" } })).unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedShape(_)));
    }
}
