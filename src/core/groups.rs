use crate::domain::model::{GroupKey, OutputGroup, ParsedRecord};
use std::collections::HashMap;

/// Output groups in order of first appearance.
#[derive(Debug, Default)]
pub struct GroupBuffers {
    groups: Vec<OutputGroup>,
    index: HashMap<GroupKey, usize>,
}

impl GroupBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: GroupKey, record: ParsedRecord) {
        let slot = match self.index.get(&key) {
            Some(slot) => *slot,
            None => {
                tracing::debug!("New output group {}", key);
                self.groups.push(OutputGroup::new(key.clone()));
                self.index.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[slot].records.push(record);
    }

    pub fn into_groups(self) -> Vec<OutputGroup> {
        self.groups
    }
}
