use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Occurrence counter that remembers the order keys were first seen.
/// Serializes as a JSON object; consumers must not assume sorted keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedCounts {
    entries: Vec<(String, u64)>,
}

impl GroupedCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 += 1;
        } else {
            self.entries.push((key.to_string(), 1));
        }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for GroupedCounts {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// Grouped counts over one project's persisted records.
///
/// `sheet_row_counts` duplicates `wells_by_sheet` by construction; it
/// is kept as a separate field for API stability.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectStats {
    pub wells_by_company: GroupedCounts,
    pub wells_by_field: GroupedCounts,
    pub wells_by_formation: GroupedCounts,
    pub wells_by_sheet: GroupedCounts,
    pub wells_per_row_bucket: GroupedCounts,
    pub sheet_row_counts: GroupedCounts,
}
