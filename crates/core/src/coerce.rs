//! Type coercion of request input shared by the record models

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::ModelError;

/// Deserialize a request body, which must be a JSON object, into a draft
/// or patch type. Type mismatches surface as `TypeCoercion`.
pub(crate) fn from_object<T: DeserializeOwned>(
    resource: &str,
    body: JsonValue,
) -> Result<T, ModelError> {
    if !body.is_object() {
        return Err(ModelError::TypeCoercion(format!(
            "{} validation failed: request body must be a JSON object",
            resource
        )));
    }
    serde_json::from_value(body)
        .map_err(|e| ModelError::TypeCoercion(format!("{} validation failed: {}", resource, e)))
}

/// Coerce a calendar date. Accepts `YYYY-MM-DD` or an RFC 3339 timestamp,
/// which is truncated to its date.
pub(crate) fn parse_date(resource: &str, field: &str, raw: &str) -> Result<NaiveDate, ModelError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| cast_error(resource, field, raw, "date"))
}

/// Coerce a timestamp. Accepts RFC 3339, or a bare date taken as midnight UTC.
pub(crate) fn parse_timestamp(
    resource: &str,
    field: &str,
    raw: &str,
) -> Result<DateTime<Utc>, ModelError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| cast_error(resource, field, raw, "timestamp"))
}

fn cast_error(resource: &str, field: &str, raw: &str, kind: &str) -> ModelError {
    ModelError::TypeCoercion(format!(
        "{} validation failed: {}: cannot cast `{}` to a {}",
        resource, field, raw, kind
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn date_accepts_plain_and_timestamp_forms() {
        let d = parse_date("Patient", "birthDate", "1990-05-15").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (1990, 5, 15));

        let d = parse_date("Patient", "birthDate", "1990-05-15T10:30:00Z").unwrap();
        assert_eq!(d.day(), 15);
    }

    #[test]
    fn date_rejects_nonsense() {
        let err = parse_date("Patient", "birthDate", "1990-13-45").unwrap_err();
        assert!(matches!(err, ModelError::TypeCoercion(ref m) if m.contains("birthDate")));
    }

    #[test]
    fn timestamp_normalizes_to_utc() {
        let ts = parse_timestamp("Observation", "issued", "2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn bare_date_is_midnight() {
        let ts = parse_timestamp("Observation", "effectiveDateTime", "2024-03-01").unwrap();
        assert_eq!((ts.hour(), ts.minute()), (0, 0));
    }
}
