use super::{answer_text, lookup_object, timestamps::extract_timestamps, Normalizer};
use crate::core::error::NormalizeResult;
use crate::domain::model::ParsedRecord;
use serde_json::Value;

/// Question groups of the baseline intake questionnaire, in column order.
pub const INTAKE_QUESTION_GROUPS: [&str; 11] = [
    "Basic Demographic Information",
    "Basic Medical Information",
    "blood_circulation_problems",
    "blood_circulation_type",
    "heart_vascular_disorders",
    "heart_vascular_type",
    "musculoskeletal_concerns",
    "musculoskeletal_type",
    "respiratory_concerns",
    "respiratory_type",
    "symptoms_list",
];

/// Flattens the intake questionnaire: one column per answered question.
///
/// A group that is missing, or that holds a question without an answer,
/// collapses to a single null column named after the group.
#[derive(Debug, Default)]
pub struct IntakeNormalizer;

impl IntakeNormalizer {
    fn extract_group(
        data: &Value,
        group_key: &str,
        record: &mut ParsedRecord,
    ) -> NormalizeResult<()> {
        let questions = lookup_object(data, &["results", group_key, "results"])?;
        for (question_key, question) in questions {
            record.set(question_key.as_str(), answer_text(question_key, question)?);
        }
        Ok(())
    }
}

impl Normalizer for IntakeNormalizer {
    fn name(&self) -> &'static str {
        "intake"
    }

    fn normalize(&self, data: &Value, record: &mut ParsedRecord) -> NormalizeResult<()> {
        extract_timestamps(data, record)?;

        for group_key in INTAKE_QUESTION_GROUPS {
            if let Err(e) = Self::extract_group(data, group_key, record) {
                tracing::debug!("Intake group '{}' unavailable: {}", group_key, e);
                record.set_null(group_key);
            }
        }
        Ok(())
    }
}
