use super::{lookup_array, timestamps::extract_timestamps, Normalizer, TAPPING_ACTIVITY};
use crate::core::error::NormalizeResult;
use crate::domain::model::ParsedRecord;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Right,
    Left,
}

/// Classification of one tap relative to the tap before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapClass {
    /// First tap of the session; counted nowhere.
    Baseline,
    /// Description differs from the previous tap: the participant alternated.
    SideChanged(Option<Hand>),
    /// Same description as the previous tap.
    SideRepeated(Option<Hand>),
    /// No usable description on this tap or the previous one.
    Unclassifiable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TapCounts {
    pub correct_right: u32,
    pub correct_left: u32,
    pub incorrect_right: u32,
    pub incorrect_left: u32,
    pub missing_data: u32,
}

impl TapCounts {
    fn add(&mut self, class: TapClass) {
        match class {
            TapClass::Baseline => {}
            TapClass::SideChanged(Some(Hand::Right)) => self.correct_right += 1,
            TapClass::SideChanged(Some(Hand::Left)) => self.correct_left += 1,
            TapClass::SideRepeated(Some(Hand::Right)) => self.incorrect_right += 1,
            TapClass::SideRepeated(Some(Hand::Left)) => self.incorrect_left += 1,
            TapClass::SideChanged(None) | TapClass::SideRepeated(None) => {}
            TapClass::Unclassifiable => self.missing_data += 1,
        }
    }
}

fn hand_of(description: &str) -> Option<Hand> {
    let lowered = description.to_lowercase();
    if lowered.contains(" right ") {
        Some(Hand::Right)
    } else if lowered.contains(" left ") {
        Some(Hand::Left)
    } else {
        None
    }
}

fn description(interaction: &Value) -> Option<&str> {
    interaction.get("description").and_then(Value::as_str)
}

pub fn classify_taps(interactions: &[Value]) -> Vec<TapClass> {
    interactions
        .iter()
        .enumerate()
        .map(|(i, interaction)| {
            if i == 0 {
                return TapClass::Baseline;
            }
            match (description(&interactions[i - 1]), description(interaction)) {
                (Some(previous), Some(current)) if previous != current => {
                    TapClass::SideChanged(hand_of(current))
                }
                (Some(_), Some(current)) => TapClass::SideRepeated(hand_of(current)),
                _ => TapClass::Unclassifiable,
            }
        })
        .collect()
}

pub fn count_taps(interactions: &[Value]) -> TapCounts {
    classify_taps(interactions)
        .into_iter()
        .fold(TapCounts::default(), |mut counts, class| {
            counts.add(class);
            counts
        })
}

/// Summarises a finger tapping session into per-hand hit/miss counters.
#[derive(Debug, Default)]
pub struct TappingNormalizer;

impl Normalizer for TappingNormalizer {
    fn name(&self) -> &'static str {
        "tapping"
    }

    fn normalize(&self, data: &Value, record: &mut ParsedRecord) -> NormalizeResult<()> {
        extract_timestamps(data, record)?;
        let interactions = lookup_array(data, &["results", TAPPING_ACTIVITY, "interactions"])?;
        let counts = count_taps(interactions);

        if counts.missing_data > 0 {
            tracing::warn!(
                "{} tap(s) without a usable description",
                counts.missing_data
            );
        }

        record.set("Correct_Right_Hand", counts.correct_right);
        record.set("Correct_Left_Hand", counts.correct_left);
        record.set("Incorrect_Right_Hand", counts.incorrect_right);
        record.set("Incorrect_Left_Hand", counts.incorrect_left);
        record.set("Missing_data", counts.missing_data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn taps(descriptions: &[&str]) -> Vec<Value> {
        descriptions
            .iter()
            .map(|d| json!({"time": "2021-03-17T11:00:00", "description": d}))
            .collect()
    }

    #[test]
    fn test_alternating_taps_count_as_correct() {
        let interactions = taps(&[
            "Tapped the right button",
            "Tapped the left button",
            "Tapped the right button",
            "Tapped the left button",
        ]);
        let counts = count_taps(&interactions);
        assert_eq!(counts.correct_left, 2);
        assert_eq!(counts.correct_right, 1);
        assert_eq!(counts.incorrect_left + counts.incorrect_right, 0);
    }

    #[test]
    fn test_repeated_taps_count_as_incorrect() {
        let interactions = taps(&[
            "Tapped the RIGHT button",
            "Tapped the RIGHT button",
            "Tapped the left button",
            "Tapped the left button",
            "Tapped the left button",
        ]);
        let counts = count_taps(&interactions);
        assert_eq!(counts.incorrect_right, 1);
        assert_eq!(counts.incorrect_left, 2);
        assert_eq!(counts.correct_left, 1);
        assert_eq!(counts.correct_right, 0);
    }

    #[test]
    fn test_first_tap_is_baseline() {
        let interactions = taps(&["Tapped the right button"]);
        assert_eq!(classify_taps(&interactions), vec![TapClass::Baseline]);
        assert_eq!(count_taps(&interactions), TapCounts::default());
    }

    #[test]
    fn test_taps_without_side_word_are_not_counted() {
        let interactions = taps(&["start", "rightward", "rightward"]);
        let counts = count_taps(&interactions);
        assert_eq!(counts, TapCounts::default());
    }

    // Missing descriptions are the only way to reach `Missing_data`; the
    // three-way classification above never produces it on its own.
    #[test]
    fn test_missing_description_is_unclassifiable() {
        let interactions = vec![
            json!({"description": "Tapped the right button"}),
            json!({"time": "2021-03-17T11:00:01"}),
            json!({"description": "Tapped the left button"}),
        ];
        let classes = classify_taps(&interactions);
        assert_eq!(
            classes,
            vec![
                TapClass::Baseline,
                TapClass::Unclassifiable,
                TapClass::Unclassifiable
            ]
        );
        assert_eq!(count_taps(&interactions).missing_data, 2);
    }

    #[test]
    fn test_tapping_columns() {
        let data = json!({
            "timestamps": {"start": "2021-03-17T11:00:00"},
            "results": {"at_tapping": {"interactions": taps(&[
                "Tapped the right button",
                "Tapped the left button"
            ])}}
        });
        let mut record = ParsedRecord::new();
        TappingNormalizer.normalize(&data, &mut record).unwrap();

        let names: Vec<&str> = record.column_names().skip(6).collect();
        assert_eq!(
            names,
            vec![
                "Correct_Right_Hand",
                "Correct_Left_Hand",
                "Incorrect_Right_Hand",
                "Incorrect_Left_Hand",
                "Missing_data"
            ]
        );
        assert_eq!(record.get("Correct_Left_Hand"), Some(&json!(1)));
        assert_eq!(record.get("Missing_data"), Some(&json!(0)));
    }
}
