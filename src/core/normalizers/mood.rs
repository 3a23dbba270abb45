use super::{answer_text, lookup, lookup_object, timestamps::extract_timestamps, Normalizer};
use crate::core::error::NormalizeResult;
use crate::domain::model::ParsedRecord;
use serde_json::{Map, Value};

const QUESTIONS_BLOCK: &str = "Questions";
const SECOND_QUESTIONS_BLOCK: &str = "Questions 2";
const CARRIED_QUESTION: &str = "question10";

/// Flattens mood-style questionnaires answered in a `Questions` block.
///
/// `question10` lives in a second block on some instruments and is folded in.
#[derive(Debug, Default)]
pub struct MoodNormalizer;

impl Normalizer for MoodNormalizer {
    fn name(&self) -> &'static str {
        "mood"
    }

    fn normalize(&self, data: &Value, record: &mut ParsedRecord) -> NormalizeResult<()> {
        extract_timestamps(data, record)?;

        let mut questions: Map<String, Value> =
            match lookup_object(data, &["results", QUESTIONS_BLOCK, "results"]) {
                Ok(block) => block.clone(),
                Err(e) => {
                    tracing::warn!("Questionnaire has no '{}' block: {}", QUESTIONS_BLOCK, e);
                    Map::new()
                }
            };

        if let Ok(extra) = lookup(
            data,
            &["results", SECOND_QUESTIONS_BLOCK, "results", CARRIED_QUESTION],
        ) {
            questions.insert(CARRIED_QUESTION.to_string(), extra.clone());
        }

        for (question_key, question) in &questions {
            record.set(question_key.as_str(), answer_text(question_key, question)?);
        }
        Ok(())
    }
}
