use super::lookup_object;
use crate::core::error::{NormalizeError, NormalizeResult};
use crate::domain::model::ParsedRecord;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde_json::Value;

const SECONDS_PER_DAY: i64 = 86_400;

const TIMESTAMP_COLUMNS: [(&str, &str); 5] = [
    ("start", "time_start"),
    ("end", "time_end"),
    ("scheduled_start", "time_scheduled_start"),
    ("scheduled_end", "time_scheduled_end"),
    ("submitted", "submitted_at"),
];

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO 8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(field: &str, raw: &str) -> NormalizeResult<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed);
    }
    if let Ok(parsed) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(parsed);
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| NormalizeError::InvalidTimestamp {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

pub fn parse_timestamp_value(field: &str, value: &Value) -> NormalizeResult<DateTime<FixedOffset>> {
    match value.as_str() {
        Some(raw) => parse_timestamp(field, raw),
        None => Err(NormalizeError::InvalidTimestamp {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

/// `YYYYMMDD` of the UTC day containing `timestamp`.
pub fn date_as_number(timestamp: &DateTime<FixedOffset>) -> String {
    let epoch = timestamp.timestamp();
    let midnight = epoch - epoch.rem_euclid(SECONDS_PER_DAY);
    DateTime::<Utc>::from_timestamp(midnight, 0)
        .unwrap_or_default()
        .format("%Y%m%d")
        .to_string()
}

/// Copy `data.timestamps.*` into the record and derive `Date_as_Number`.
///
/// Only `start` is mandatory since the derived date depends on it.
pub fn extract_timestamps(data: &Value, record: &mut ParsedRecord) -> NormalizeResult<()> {
    let timestamps = lookup_object(data, &["timestamps"])?;

    for (source, column) in TIMESTAMP_COLUMNS {
        record.set(column, timestamps.get(source).cloned().unwrap_or(Value::Null));
    }

    let start = timestamps
        .get("start")
        .ok_or_else(|| NormalizeError::MissingField("timestamps.start".to_string()))?;
    let start = parse_timestamp_value("timestamps.start", start)?;
    record.set("Date_as_Number", date_as_number(&start));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date_for(raw: &str) -> String {
        date_as_number(&parse_timestamp("start", raw).unwrap())
    }

    #[test]
    fn test_date_as_number_truncates_to_midnight() {
        assert_eq!(date_for("2021-03-17T14:30:00"), "20210317");
        assert_eq!(date_for("2021-03-17T23:59:59"), "20210317");
        assert_eq!(date_for("2021-03-18T00:00:01"), "20210318");
    }

    #[test]
    fn test_date_as_number_uses_utc_day_for_offsets() {
        assert_eq!(date_for("2021-03-17T00:30:00+02:00"), "20210316");
        assert_eq!(date_for("2021-03-17T10:00:00.123Z"), "20210317");
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("start", "2021-03-17 14:30:00").is_ok());
        assert!(parse_timestamp("start", "2021-03-17T14:30:00.250").is_ok());
        assert!(parse_timestamp("start", "2021-03-17T14:30:00+0100").is_ok());
        assert!(parse_timestamp("start", "yesterday").is_err());
    }

    #[test]
    fn test_extract_timestamps_columns_in_order() {
        let data = json!({
            "timestamps": {
                "start": "2021-03-17T14:30:00",
                "end": "2021-03-17T14:35:00",
                "scheduled_start": null,
                "submitted": "2021-03-17T14:35:02"
            }
        });
        let mut record = ParsedRecord::new();
        extract_timestamps(&data, &mut record).unwrap();

        let names: Vec<&str> = record.column_names().collect();
        assert_eq!(
            names,
            vec![
                "time_start",
                "time_end",
                "time_scheduled_start",
                "time_scheduled_end",
                "submitted_at",
                "Date_as_Number"
            ]
        );
        assert_eq!(record.get("time_scheduled_end"), Some(&Value::Null));
        assert_eq!(record.get("Date_as_Number"), Some(&json!("20210317")));
    }

    #[test]
    fn test_extract_timestamps_requires_start() {
        let data = json!({"timestamps": {"end": "2021-03-17T14:35:00"}});
        let mut record = ParsedRecord::new();
        assert!(matches!(
            extract_timestamps(&data, &mut record),
            Err(NormalizeError::MissingField(_))
        ));

        let no_block = json!({"results": {}});
        assert!(extract_timestamps(&no_block, &mut ParsedRecord::new()).is_err());
    }
}
