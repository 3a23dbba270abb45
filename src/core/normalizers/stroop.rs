use super::{lookup_array, timestamps::extract_timestamps, Normalizer, STROOP_ACTIVITY};
use crate::core::error::{NormalizeError, NormalizeResult};
use crate::domain::model::ParsedRecord;
use regex::Regex;
use serde_json::Value;

/// Number of trial slots written per Stroop session.
pub const STROOP_SLOTS: usize = 30;

const DESCRIPTION_PATTERN: &str =
    r"(?i)^.+(Green|Red|Yellow|Blue).+(Green|Red|Yellow|Blue).+\s(\d+)\s*$";

/// Ink color and spelled word parsed from a trial description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StroopWords {
    pub color: String,
    pub spelling: String,
}

/// Flattens a Stroop session into a fixed grid of trial columns.
#[derive(Debug)]
pub struct StroopNormalizer {
    pattern: Regex,
}

impl StroopNormalizer {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(DESCRIPTION_PATTERN).expect("Stroop description pattern compiles"),
        }
    }

    /// The captured words as written, case preserved.
    pub fn match_description(&self, description: &str) -> Option<StroopWords> {
        let captures = self.pattern.captures(description)?;
        Some(StroopWords {
            color: captures.get(1)?.as_str().to_string(),
            spelling: captures.get(2)?.as_str().to_string(),
        })
    }

    fn write_slot(
        &self,
        slot: usize,
        interaction: Option<&Value>,
        record: &mut ParsedRecord,
    ) -> NormalizeResult<()> {
        let time = interaction
            .and_then(|i| i.get("time"))
            .filter(|t| is_truthy(t))
            .cloned()
            .unwrap_or(Value::Null);
        record.set(format!("Inter{slot}_Date_Time"), time);

        let correct = match interaction {
            Some(i) => i.get("correctness").cloned().ok_or_else(|| {
                NormalizeError::MissingField(format!(
                    "results.{STROOP_ACTIVITY}.interactions[{}].correctness",
                    slot - 1
                ))
            })?,
            None => Value::Null,
        };
        record.set(format!("Inter{slot}_Correct"), correct);

        let words = interaction
            .and_then(|i| i.get("description"))
            .and_then(Value::as_str)
            .and_then(|d| self.match_description(d));
        match words {
            Some(words) => {
                record.set(format!("Inter{slot}_Color"), words.color);
                record.set(format!("Inter{slot}_Spelling"), words.spelling);
            }
            None => {
                record.set_null(format!("Inter{slot}_Color"));
                record.set_null(format!("Inter{slot}_Spelling"));
            }
        }
        Ok(())
    }
}

impl Default for StroopNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

impl Normalizer for StroopNormalizer {
    fn name(&self) -> &'static str {
        "stroop"
    }

    fn normalize(&self, data: &Value, record: &mut ParsedRecord) -> NormalizeResult<()> {
        extract_timestamps(data, record)?;
        let interactions = lookup_array(data, &["results", STROOP_ACTIVITY, "interactions"])?;

        if interactions.len() > STROOP_SLOTS {
            tracing::debug!(
                "Stroop session has {} interactions, keeping the first {}",
                interactions.len(),
                STROOP_SLOTS
            );
        }

        for slot in 1..=STROOP_SLOTS {
            self.write_slot(slot, interactions.get(slot - 1), record)?;
        }
        Ok(())
    }
}
