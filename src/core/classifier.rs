use crate::core::error::{NormalizeError, NormalizeResult};
use crate::domain::model::{GroupKey, RawRecord, ResponseType};
use crate::utils::error::{EtlError, Result};
use serde_json::Value;

/// Activity name used when a record carries no activity metadata.
pub const DEFAULT_ACTIVITY: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub response_type: ResponseType,
    /// Activity short name from metadata, if the record has one.
    pub activity: Option<String>,
}

impl Classification {
    pub fn activity_name(&self) -> &str {
        self.activity.as_deref().unwrap_or(DEFAULT_ACTIVITY)
    }

    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(self.response_type, self.activity_name())
    }
}

/// Map the numeric `response_type` code. An unknown code aborts the run.
pub fn resolve_response_type(raw: &RawRecord) -> Result<ResponseType> {
    let code = match &raw.response_type {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    code.and_then(ResponseType::from_code)
        .ok_or_else(|| EtlError::UnknownResponseType {
            record_id: raw.display_id(),
            code: raw.response_type.to_string(),
        })
}

/// Decode a JSON-encoded sub-field. Already-decoded objects pass through.
pub fn decode_embedded(field: &'static str, value: Option<&Value>) -> NormalizeResult<Option<Value>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(encoded)) => serde_json::from_str(encoded)
            .map(Some)
            .map_err(|source| NormalizeError::InvalidEmbeddedJson { field, source }),
        Some(other) => Ok(Some(other.clone())),
    }
}

/// `metadata.activity.short_name`, or `None` when there is no activity block.
pub fn resolve_activity(metadata: Option<&Value>) -> NormalizeResult<Option<String>> {
    let activity = match metadata.and_then(|m| m.get("activity")) {
        None | Some(Value::Null) => return Ok(None),
        Some(activity) => activity,
    };

    activity
        .get("short_name")
        .and_then(Value::as_str)
        .map(|name| Some(name.to_string()))
        .ok_or_else(|| NormalizeError::MissingField("metadata.activity.short_name".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(response_type: Value) -> RawRecord {
        serde_json::from_value(json!({
            "id": 1,
            "participant_id": "p1",
            "response_type": response_type,
            "created_at": "2021-03-17T14:30:00"
        }))
        .unwrap()
    }

    #[test]
    fn test_resolve_response_type() {
        assert_eq!(resolve_response_type(&raw(json!(1))).unwrap(), ResponseType::Questionnaire);
        assert_eq!(resolve_response_type(&raw(json!("2"))).unwrap(), ResponseType::Task);
        assert_eq!(resolve_response_type(&raw(json!(3.0))).unwrap(), ResponseType::HealthData);
    }

    #[test]
    fn test_unknown_response_type_is_fatal() {
        let err = resolve_response_type(&raw(json!(7))).unwrap_err();
        assert!(matches!(err, EtlError::UnknownResponseType { .. }));
        assert!(resolve_response_type(&raw(json!(null))).is_err());
    }

    #[test]
    fn test_decode_embedded() {
        let encoded = json!("{\"short_name\": \"1nP\", \"version\": 2}");
        let decoded = decode_embedded("study", Some(&encoded)).unwrap().unwrap();
        assert_eq!(decoded["short_name"], "1nP");

        let object = json!({"short_name": "1nP"});
        assert_eq!(decode_embedded("study", Some(&object)).unwrap(), Some(object));

        assert_eq!(decode_embedded("study", None).unwrap(), None);
        assert!(decode_embedded("study", Some(&json!("{broken"))).is_err());
    }

    #[test]
    fn test_activity_defaults_to_all() {
        let metadata = json!({"activity": null, "app": {}});
        let activity = resolve_activity(Some(&metadata)).unwrap();
        assert_eq!(activity, None);

        let classification = Classification {
            response_type: ResponseType::HealthData,
            activity,
        };
        assert_eq!(classification.group_key().to_string(), "healthdata-all");
        assert_eq!(resolve_activity(None).unwrap(), None);
    }

    #[test]
    fn test_activity_short_name() {
        let metadata = json!({"activity": {"short_name": "at_tapping"}});
        assert_eq!(
            resolve_activity(Some(&metadata)).unwrap().as_deref(),
            Some("at_tapping")
        );

        let broken = json!({"activity": {"name": "Tapping"}});
        assert!(resolve_activity(Some(&broken)).is_err());
    }
}
