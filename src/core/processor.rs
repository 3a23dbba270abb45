use crate::core::classifier::{decode_embedded, resolve_activity, resolve_response_type, Classification};
use crate::core::error::NormalizeResult;
use crate::core::extractor::{extract_common, Envelope};
use crate::core::normalizers::{
    ActivityKind, HealthDataNormalizer, IntakeNormalizer, MoodNormalizer, Normalizer,
    StroopNormalizer, TappingNormalizer,
};
use crate::domain::model::{GroupKey, ParsedRecord, RawRecord, ResponseType, SkippedRecord};
use crate::utils::error::Result;

/// Result of flattening one input record.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    Parsed { group: GroupKey, record: ParsedRecord },
    Skipped(SkippedRecord),
}

/// Turns raw records into flat rows: classify, common columns, payload.
#[derive(Debug, Default)]
pub struct ResponseProcessor {
    intake: IntakeNormalizer,
    mood: MoodNormalizer,
    stroop: StroopNormalizer,
    tapping: TappingNormalizer,
    health: HealthDataNormalizer,
}

impl ResponseProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalizer_for(&self, kind: ActivityKind) -> Option<&dyn Normalizer> {
        match kind {
            ActivityKind::Intake => Some(&self.intake),
            ActivityKind::Mood => Some(&self.mood),
            ActivityKind::Stroop => Some(&self.stroop),
            ActivityKind::Tapping => Some(&self.tapping),
            ActivityKind::HealthData => Some(&self.health),
            ActivityKind::Unsupported => None,
        }
    }

    /// Flatten one record.
    ///
    /// Only an unknown response type is returned as an error; every other
    /// problem skips the record and nothing of it is kept.
    pub fn process(&self, raw: &RawRecord) -> Result<RecordOutcome> {
        let response_type = resolve_response_type(raw)?;

        match self.flatten(raw, response_type) {
            Ok((group, record)) => Ok(RecordOutcome::Parsed { group, record }),
            Err(e) => Ok(RecordOutcome::Skipped(SkippedRecord {
                id: raw.display_id(),
                reason: e.to_string(),
            })),
        }
    }

    fn flatten(
        &self,
        raw: &RawRecord,
        response_type: ResponseType,
    ) -> NormalizeResult<(GroupKey, ParsedRecord)> {
        let envelope = Envelope {
            study: decode_embedded("study", raw.study.as_ref())?,
            metadata: decode_embedded("metadata", raw.metadata.as_ref())?,
        };
        let classification = Classification {
            response_type,
            activity: resolve_activity(envelope.metadata.as_ref())?,
        };

        let mut record = ParsedRecord::new();
        extract_common(raw, &classification, &envelope, &mut record)?;

        if let Some(data) = decode_embedded("data", raw.data.as_ref())? {
            let kind = ActivityKind::resolve(response_type, classification.activity.as_deref())?;
            match self.normalizer_for(kind) {
                Some(normalizer) => {
                    tracing::trace!("Record {} -> {} normalizer", raw.display_id(), normalizer.name());
                    normalizer.normalize(&data, &mut record)?;
                }
                None => tracing::warn!(
                    "No flattening for {} activity '{}' (record {}), keeping common columns only",
                    response_type,
                    classification.activity_name(),
                    raw.display_id()
                ),
            }
        }

        Ok((classification.group_key(), record))
    }
}
