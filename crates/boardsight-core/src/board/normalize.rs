//! Record normalization
//!
//! Raw board items carry opaque column ids and display text straight
//! from the source. Normalization resolves ids to human-readable
//! column titles, maps placeholder strings to an explicit absent
//! value, and drops items that are really the board's own header row
//! leaking through as data.

use std::collections::HashMap;

use super::RawItem;

/// Placeholder strings treated as an absent value, compared
/// case-insensitively after trimming.
const ABSENT_SENTINELS: &[&str] = &["", "null", "none", "-", "n/a"];

/// Item names that mark a leaked header row on the deals board.
pub const DEAL_HEADER_SENTINELS: &[&str] = &["Deal Name", "name"];

/// Item names that mark a leaked header row on the work orders board.
pub const WORK_ORDER_HEADER_SENTINELS: &[&str] = &["Deal name masked", "name"];

/// A normalized board record: item name plus a title-keyed field map
#[derive(Debug, Clone, PartialEq)]
pub struct BoardRecord {
    /// Item display name
    pub name: String,
    fields: HashMap<String, Option<String>>,
}

impl BoardRecord {
    /// Look up a field by column title. Absent values and unknown
    /// titles both come back as `None`.
    pub fn get(&self, title: &str) -> Option<&str> {
        self.fields.get(title).and_then(|v| v.as_deref())
    }

    /// Field value for distribution bucketing, with absent values
    /// landing in the reserved `"Unknown"` bucket.
    pub fn category(&self, title: &str) -> &str {
        self.get(title).unwrap_or("Unknown")
    }

    /// Monetary field coerced to a number; absent or malformed cells
    /// count as zero.
    pub fn money(&self, title: &str) -> f64 {
        coerce_money(self.get(title))
    }

    /// Render the record as a JSON object for tool payloads.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        object.insert("name".to_string(), self.name.clone().into());
        for (title, value) in &self.fields {
            object.insert(title.clone(), value.clone().into());
        }
        serde_json::Value::Object(object)
    }
}

/// Trim a raw cell value and collapse placeholder text to `None`.
pub fn clean_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if ABSENT_SENTINELS
        .iter()
        .any(|s| trimmed.eq_ignore_ascii_case(s))
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Coerce currency-like text into a number.
///
/// Thousands separators, currency symbols, and whitespace are
/// stripped before parsing. Absent or unparsable input yields `0.0`;
/// this is deliberate, one malformed cell must never fail a whole
/// aggregate.
pub fn coerce_money(value: Option<&str>) -> f64 {
    let Some(raw) = value else {
        return 0.0;
    };
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '₹' | '$') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse().unwrap_or(0.0)
}

/// Resolve column ids to display titles and clean every cell.
///
/// Ids with no entry in the lookup keep the raw id as the field key.
pub fn normalize_record(item: &RawItem, titles: &HashMap<String, String>) -> BoardRecord {
    let mut fields = HashMap::new();
    for column in &item.column_values {
        let title = titles
            .get(&column.id)
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|| column.id.clone());
        let value = column.text.as_deref().and_then(clean_value);
        fields.insert(title, value);
    }
    BoardRecord {
        name: item.name.clone(),
        fields,
    }
}

/// Whether an item name is a known header/placeholder leak. Each
/// board has its own sentinel list; nameless items leak on both.
pub fn is_header_leak(name: &str, sentinels: &[&str]) -> bool {
    name.trim().is_empty() || sentinels.contains(&name)
}
