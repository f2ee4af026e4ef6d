use std::collections::HashMap;

use shared::{domain::TierField, protocol::ObjectInfo};

/// Column header text, one entry per tier field. Starts with built-in
/// labels and takes whatever the schema describes for the known fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLabels {
    labels: HashMap<TierField, String>,
}

impl Default for HeaderLabels {
    fn default() -> Self {
        Self {
            labels: TierField::ALL
                .into_iter()
                .map(|field| (field, field.default_label().to_string()))
                .collect(),
        }
    }
}

impl HeaderLabels {
    pub fn label(&self, field: TierField) -> &str {
        self.labels
            .get(&field)
            .map(String::as_str)
            .unwrap_or_else(|| field.default_label())
    }

    /// Returns how many labels were taken from `info`; unknown fields and
    /// blank labels are skipped.
    pub fn apply(&mut self, info: &ObjectInfo) -> usize {
        let mut applied = 0;
        for described in &info.fields {
            let Some(field) = TierField::from_api_name(&described.api_name) else {
                continue;
            };
            if described.label.trim().is_empty() {
                continue;
            }
            self.labels.insert(field, described.label.clone());
            applied += 1;
        }
        applied
    }
}
