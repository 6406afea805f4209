use std::collections::{BTreeMap, BTreeSet};

/// Which keywords and district query labels surfaced one contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationEntry {
    pub id: String,
    pub keywords: BTreeSet<String>,
    pub district_labels: BTreeSet<String>,
}

/// Identifier-keyed accumulator filled during discovery.
///
/// Entries only grow: recording the same (id, keyword, district) twice is a
/// no-op, and the final content does not depend on recording order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationIndex {
    entries: BTreeMap<String, AggregationEntry>,
}

impl AggregationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: &str, keyword: &str, district_label: &str) {
        let entry = self
            .entries
            .entry(id.to_string())
            .or_insert_with(|| AggregationEntry {
                id: id.to_string(),
                ..AggregationEntry::default()
            });
        entry.keywords.insert(keyword.to_string());
        entry.district_labels.insert(district_label.to_string());
    }

    pub fn record_all<'a, I>(&mut self, ids: I, keyword: &str, district_label: &str)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for id in ids {
            self.record(id, keyword, district_label);
        }
    }

    pub fn get(&self, id: &str) -> Option<&AggregationEntry> {
        self.entries.get(id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &AggregationEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
