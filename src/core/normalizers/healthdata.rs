//! Passive health-sensor data.
//!
//! Samples arrive as typed blocks covering a time span. Blocks are grouped by
//! type; for each tracked type the record gets the per-day totals, the first
//! and last instants covered and the covered range in hours.

use super::timestamps::{extract_timestamps, parse_timestamp_value};
use super::{lookup_array, Normalizer};
use crate::core::error::{NormalizeError, NormalizeResult};
use crate::domain::model::ParsedRecord;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

pub const STEPS_TYPE: &str = "HealthDataType.STEPS";
pub const ACTIVE_ENERGY_TYPE: &str = "HealthDataType.ACTIVE_ENERGY_BURNED";

/// Block types that produce columns, in column order.
pub const TRACKED_TYPES: [&str; 2] = [STEPS_TYPE, ACTIVE_ENERGY_TYPE];

/// One sample block after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthBlock {
    pub block_type: String,
    pub date_from: DateTime<FixedOffset>,
    pub date_to: DateTime<FixedOffset>,
    pub value: f64,
}

impl HealthBlock {
    pub fn from_json(index: usize, block: &Value) -> NormalizeResult<Self> {
        let block_type = required(block, index, "type")?
            .as_str()
            .ok_or_else(|| NormalizeError::UnexpectedShape {
                path: format!("results[{index}].type"),
                expected: "string",
            })?
            .to_string();
        let date_from = parse_timestamp_value(
            &format!("results[{index}].dateFrom"),
            required(block, index, "dateFrom")?,
        )?;
        let date_to = parse_timestamp_value(
            &format!("results[{index}].dateTo"),
            required(block, index, "dateTo")?,
        )?;
        let value = parse_number(
            &format!("results[{index}].value"),
            required(block, index, "value")?,
        )?;

        Ok(Self {
            block_type,
            date_from,
            date_to,
            value,
        })
    }
}

fn required<'a>(block: &'a Value, index: usize, name: &str) -> NormalizeResult<&'a Value> {
    block
        .get(name)
        .ok_or_else(|| NormalizeError::MissingField(format!("results[{index}].{name}")))
}

fn parse_number(field: &str, value: &Value) -> NormalizeResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| NormalizeError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Aggregate of every block of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthTypeSummary {
    /// Sum of block values keyed by the calendar date of `dateFrom`.
    pub daily_totals: BTreeMap<NaiveDate, f64>,
    pub first_start: DateTime<FixedOffset>,
    pub last_end: DateTime<FixedOffset>,
}

impl HealthTypeSummary {
    fn from_block(block: &HealthBlock) -> Self {
        let mut daily_totals = BTreeMap::new();
        daily_totals.insert(block.date_from.date_naive(), block.value);
        Self {
            daily_totals,
            first_start: block.date_from,
            last_end: block.date_to,
        }
    }

    fn absorb(&mut self, block: &HealthBlock) {
        *self
            .daily_totals
            .entry(block.date_from.date_naive())
            .or_insert(0.0) += block.value;
        // Blocks are not guaranteed to be chronological.
        if block.date_from < self.first_start {
            self.first_start = block.date_from;
        }
        if block.date_to > self.last_end {
            self.last_end = block.date_to;
        }
    }

    /// Hours between the first start and the last end, two decimals,
    /// exact halves rounded to even.
    pub fn hours_range(&self) -> f64 {
        let seconds = (self.last_end - self.first_start).num_milliseconds() as f64 / 1000.0;
        (seconds / 3600.0 * 100.0).round_ties_even() / 100.0
    }
}

pub fn summarize_blocks(blocks: &[HealthBlock]) -> HashMap<String, HealthTypeSummary> {
    let mut summaries: HashMap<String, HealthTypeSummary> = HashMap::new();
    for block in blocks {
        match summaries.get_mut(&block.block_type) {
            Some(summary) => summary.absorb(block),
            None => {
                summaries.insert(block.block_type.clone(), HealthTypeSummary::from_block(block));
            }
        }
    }
    summaries
}

/// Packed `YYYYMMDD-<sum>_` text used by the analysis notebooks.
///
/// Days are written in calendar order, not in the order the blocks arrived,
/// so exports with out-of-order blocks differ from older files byte for byte.
pub fn encode_daily_totals(daily_totals: &BTreeMap<NaiveDate, f64>) -> String {
    daily_totals
        .iter()
        .map(|(date, sum)| format!("{}-{}_", date.format("%Y%m%d"), float_text(*sum)))
        .collect()
}

/// Shortest round-trip float text, always with a fraction or exponent.
/// Exponents carry a sign and at least two digits (`1e+16`, `1.5e-05`).
fn float_text(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let text = format!("{value:?}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

fn iso_utc(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp
        .with_timezone(&Utc)
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.f")
        .to_string()
}

/// Column stem for a block type: the part after the enum prefix.
pub fn column_stem(block_type: &str) -> &str {
    block_type
        .split_once('.')
        .map(|(_, stem)| stem)
        .unwrap_or(block_type)
}

#[derive(Debug, Default)]
pub struct HealthDataNormalizer;

impl Normalizer for HealthDataNormalizer {
    fn name(&self) -> &'static str {
        "healthdata"
    }

    fn normalize(&self, data: &Value, record: &mut ParsedRecord) -> NormalizeResult<()> {
        extract_timestamps(data, record)?;

        let blocks = lookup_array(data, &["results"])?
            .iter()
            .enumerate()
            .map(|(index, block)| HealthBlock::from_json(index, block))
            .collect::<NormalizeResult<Vec<_>>>()?;
        let summaries = summarize_blocks(&blocks);

        for block_type in TRACKED_TYPES {
            let stem = column_stem(block_type);
            let total_column = format!("Total_Dates_{stem}");
            let start_column = format!("{stem}_Session_Start_Time");
            let end_column = format!("{stem}_Session_End_Time");
            let range_column = format!("{stem}_Hours_Range");

            match summaries.get(block_type) {
                Some(summary) => {
                    record.set(total_column, encode_daily_totals(&summary.daily_totals));
                    record.set(start_column, iso_utc(&summary.first_start));
                    record.set(end_column, iso_utc(&summary.last_end));
                    record.set(range_column, summary.hours_range());
                }
                None => {
                    record.set_null(total_column);
                    record.set_null(start_column);
                    record.set_null(end_column);
                    record.set_null(range_column);
                }
            }
        }
        Ok(())
    }
}
