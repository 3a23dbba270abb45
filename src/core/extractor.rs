use crate::core::classifier::Classification;
use crate::core::error::{NormalizeError, NormalizeResult};
use crate::core::normalizers::lookup;
use crate::domain::model::{ParsedRecord, RawRecord};
use serde_json::Value;

/// Decoded `study` and `metadata` sub-fields of a record.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    pub study: Option<Value>,
    pub metadata: Option<Value>,
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Write the identity and metadata columns shared by every activity.
///
/// Order: id, participant, response_type, study, study_version, activity,
/// app_version, timezone, received_at.
pub fn extract_common(
    raw: &RawRecord,
    classification: &Classification,
    envelope: &Envelope,
    record: &mut ParsedRecord,
) -> NormalizeResult<()> {
    record.set("id", raw.id.clone());
    record.set("participant", raw.participant_id.clone());
    record.set("response_type", classification.response_type.as_str());

    if let Some(study) = &envelope.study {
        record.set("study", lookup(study, &["short_name"])?.clone());
        record.set("study_version", lookup(study, &["version"])?.clone());
    }

    record.set("activity", classification.activity_name());

    if let Some(app) = envelope.metadata.as_ref().and_then(|m| m.get("app")) {
        if !app.is_object() {
            return Err(NormalizeError::UnexpectedShape {
                path: "metadata.app".to_string(),
                expected: "object",
            });
        }
        let version = lookup(app, &["version"])?;
        let build = lookup(app, &["build"])?;
        record.set("app_version", format!("{} - {}", text(version), text(build)));
        record.set("timezone", lookup(app, &["device", "tz"])?.clone());
    }

    record.set("received_at", raw.created_at.clone());
    Ok(())
}
