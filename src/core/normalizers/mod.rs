//! Activity normalizers.
//!
//! Each normalizer flattens the decoded `data` payload of one activity kind
//! into columns appended to a [`ParsedRecord`]. All of them start with the
//! shared timestamp columns.

pub mod healthdata;
pub mod intake;
pub mod mood;
pub mod stroop;
pub mod tapping;
pub mod timestamps;

use crate::core::error::{NormalizeError, NormalizeResult};
use crate::domain::model::{ParsedRecord, ResponseType};
use serde_json::Value;

pub use healthdata::HealthDataNormalizer;
pub use intake::IntakeNormalizer;
pub use mood::MoodNormalizer;
pub use stroop::StroopNormalizer;
pub use tapping::TappingNormalizer;

pub const INTAKE_ACTIVITY: &str = "qes_intake";
pub const FINAL_ACTIVITY: &str = "qes_final";
pub const STROOP_ACTIVITY: &str = "at_stroopeffect";
pub const TAPPING_ACTIVITY: &str = "at_tapping";

pub trait Normalizer: Send + Sync {
    fn name(&self) -> &'static str;
    fn normalize(&self, data: &Value, record: &mut ParsedRecord) -> NormalizeResult<()>;
}

/// Which normalizer a record is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Intake,
    Mood,
    Stroop,
    Tapping,
    HealthData,
    /// Known activity without a flattening scheme; only common columns.
    Unsupported,
}

impl ActivityKind {
    pub fn resolve(
        response_type: ResponseType,
        activity: Option<&str>,
    ) -> NormalizeResult<Self> {
        match (response_type, activity) {
            (ResponseType::HealthData, _) => Ok(Self::HealthData),
            (ResponseType::Questionnaire, Some(INTAKE_ACTIVITY)) => Ok(Self::Intake),
            (ResponseType::Questionnaire, Some(FINAL_ACTIVITY)) => Ok(Self::Unsupported),
            (ResponseType::Questionnaire, Some(_)) => Ok(Self::Mood),
            (ResponseType::Task, Some(STROOP_ACTIVITY)) => Ok(Self::Stroop),
            (ResponseType::Task, Some(TAPPING_ACTIVITY)) => Ok(Self::Tapping),
            (ResponseType::Task, Some(_)) => Ok(Self::Unsupported),
            (rtype, None) => Err(NormalizeError::MissingActivity {
                response_type: rtype.to_string(),
            }),
        }
    }
}

/// Walk `path` through nested objects, failing on the first missing key.
pub(crate) fn lookup<'a>(value: &'a Value, path: &[&str]) -> NormalizeResult<&'a Value> {
    let mut current = value;
    for (depth, key) in path.iter().enumerate() {
        current = current
            .get(*key)
            .ok_or_else(|| NormalizeError::MissingField(path[..=depth].join(".")))?;
    }
    Ok(current)
}

pub(crate) fn lookup_array<'a>(value: &'a Value, path: &[&str]) -> NormalizeResult<&'a Vec<Value>> {
    lookup(value, path)?
        .as_array()
        .ok_or_else(|| NormalizeError::UnexpectedShape {
            path: path.join("."),
            expected: "array",
        })
}

pub(crate) fn lookup_object<'a>(
    value: &'a Value,
    path: &[&str],
) -> NormalizeResult<&'a serde_json::Map<String, Value>> {
    lookup(value, path)?
        .as_object()
        .ok_or_else(|| NormalizeError::UnexpectedShape {
            path: path.join("."),
            expected: "object",
        })
}

/// `results.answer[0].text` of a questionnaire question entry.
pub(crate) fn answer_text(question_key: &str, question: &Value) -> NormalizeResult<Value> {
    let answers = lookup_array(question, &["results", "answer"])
        .map_err(|_| NormalizeError::MissingField(format!("{question_key}.results.answer")))?;
    let first = answers
        .first()
        .ok_or_else(|| NormalizeError::MissingField(format!("{question_key}.results.answer[0]")))?;
    first
        .get("text")
        .cloned()
        .ok_or_else(|| NormalizeError::MissingField(format!("{question_key}.results.answer[0].text")))
}
