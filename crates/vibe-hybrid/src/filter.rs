use vibe_core::types::{Conditions, FieldCondition, Filter};

/// Translate hard constraints into the index's conjunctive filter.
///
/// No constraints means no filter at all, not an always-false one.
pub fn build_filter(hard_filters: &Conditions) -> Option<Filter> {
    if hard_filters.is_empty() {
        return None;
    }
    let must = hard_filters
        .iter()
        .map(|(key, value)| FieldCondition { key: key.clone(), value: value.clone() })
        .collect();
    Some(Filter { must })
}
