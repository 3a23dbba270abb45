use crate::domain::model::GroupKey;
use std::collections::HashMap;

/// Per-run tally of how often each participant submitted each activity.
///
/// Lives for one transform; a fresh run starts every count at 1 again.
#[derive(Debug, Default)]
pub struct SubmissionCounter {
    counts: HashMap<String, u32>,
}

impl SubmissionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(participant: &str, group: &GroupKey) -> String {
        format!("{participant}:{group}")
    }

    /// Count one more submission and return its 1-based index.
    pub fn next_index(&mut self, participant: &str, group: &GroupKey) -> u32 {
        let count = self.counts.entry(Self::key(participant, group)).or_insert(0);
        *count += 1;
        *count
    }
}
