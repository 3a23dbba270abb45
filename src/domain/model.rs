use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One response as exported by the study backend.
///
/// `study`, `metadata` and `data` normally arrive as JSON-encoded strings;
/// they are decoded per record so a broken payload only costs that record.
/// Serialising a record gives back `source`, the object exactly as read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct RawRecord {
    pub id: Value,
    pub participant_id: Value,
    pub response_type: Value,
    pub created_at: Value,
    pub study: Option<Value>,
    pub metadata: Option<Value>,
    pub data: Option<Value>,
    pub source: Value,
}

#[derive(Deserialize)]
struct RecordFields {
    id: Value,
    participant_id: Value,
    response_type: Value,
    created_at: Value,
    #[serde(default)]
    study: Option<Value>,
    #[serde(default)]
    metadata: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
}

impl TryFrom<Value> for RawRecord {
    type Error = serde_json::Error;

    fn try_from(source: Value) -> Result<Self, Self::Error> {
        let fields = RecordFields::deserialize(&source)?;
        Ok(Self {
            id: fields.id,
            participant_id: fields.participant_id,
            response_type: fields.response_type,
            created_at: fields.created_at,
            study: fields.study,
            metadata: fields.metadata,
            data: fields.data,
            source,
        })
    }
}

impl From<RawRecord> for Value {
    fn from(record: RawRecord) -> Self {
        record.source
    }
}

impl RawRecord {
    /// Record id rendered for log lines.
    pub fn display_id(&self) -> String {
        scalar_text(&self.id)
    }

    pub fn participant(&self) -> String {
        scalar_text(&self.participant_id)
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Questionnaire,
    Task,
    HealthData,
}

impl ResponseType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Questionnaire),
            2 => Some(Self::Task),
            3 => Some(Self::HealthData),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Questionnaire => "questionnaire",
            Self::Task => "task",
            Self::HealthData => "healthdata",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output grouping key: response type plus activity short name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub response_type: ResponseType,
    pub activity: String,
}

impl GroupKey {
    pub fn new(response_type: ResponseType, activity: impl Into<String>) -> Self {
        Self {
            response_type,
            activity: activity.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.response_type, self.activity)
    }
}

/// Flat row built up column by column.
///
/// Column order is insertion order; setting an existing column replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedRecord {
    columns: Map<String, Value>,
}

impl ParsedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.insert(column.into(), value.into());
    }

    pub fn set_null(&mut self, column: impl Into<String>) {
        self.columns.insert(column.into(), Value::Null);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct OutputGroup {
    pub key: GroupKey,
    pub records: Vec<ParsedRecord>,
}

impl OutputGroup {
    pub fn new(key: GroupKey) -> Self {
        Self {
            key,
            records: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedRecord {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    /// Groups in order of first appearance in the input.
    pub groups: Vec<OutputGroup>,
    pub total_records: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl TransformResult {
    pub fn written_records(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }
}
