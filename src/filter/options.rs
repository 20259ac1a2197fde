use crate::filter::distinct::DistinctValues;
use crate::filter::selection::FilterSelection;
use serde::Serialize;

/// One entry of a column's filter dropdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
    pub selected: bool,
}

impl FilterOption {
    pub fn is_blank(&self) -> bool {
        self.value.is_empty()
    }
}

/// Build the dropdown for a column from its distinct values and current filter.
///
/// The first option is always the blank one (value `""`, clears the filter).
/// Empty display values fold into it. A selection that is not among the
/// distinct values is still offered, appended and selected, so an active
/// filter is never hidden.
pub fn build_options(
    distinct: &DistinctValues,
    selection: &FilterSelection,
    blank_label: &str,
) -> Vec<FilterOption> {
    let mut options = Vec::with_capacity(distinct.len() + 1);
    options.push(FilterOption {
        label: blank_label.to_string(),
        value: String::new(),
        selected: !selection.is_active(),
    });

    let active = selection.value();
    for value in distinct.iter().filter(|v| !v.is_empty()) {
        options.push(FilterOption {
            label: value.to_string(),
            value: value.to_string(),
            selected: active == Some(value),
        });
    }

    if let Some(value) = active {
        if !distinct.contains(value) {
            options.push(FilterOption {
                label: value.to_string(),
                value: value.to_string(),
                selected: true,
            });
        }
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distinct(values: &[&str]) -> DistinctValues {
        DistinctValues::from_display_values(values.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_blank_first_then_sorted_values() {
        let options = build_options(&distinct(&["b", "a", "b"]), &FilterSelection::None, "");
        let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["", "a", "b"]);
        assert!(options[0].selected);
        assert!(options[0].is_blank());
        assert!(options.iter().skip(1).all(|o| !o.selected));
        assert!(options.iter().all(|o| o.label == o.value));
    }

    #[test]
    fn test_active_value_is_selected() {
        let options = build_options(
            &distinct(&["a", "b", "c"]),
            &FilterSelection::from_raw("b"),
            "(all)",
        );
        assert_eq!(options[0].label, "(all)");
        assert!(!options[0].selected);
        let selected: Vec<&str> = options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(selected, vec!["b"]);
    }

    #[test]
    fn test_empty_values_fold_into_blank() {
        let options = build_options(&distinct(&["", "x"]), &FilterSelection::None, "");
        assert_eq!(options.len(), 2);
        assert_eq!(options[1].value, "x");
    }

    #[test]
    fn test_unknown_selection_still_offered() {
        let options = build_options(&distinct(&["a"]), &FilterSelection::from_raw("gone"), "");
        let last = options.last().unwrap();
        assert_eq!(last.value, "gone");
        assert!(last.selected);
        assert_eq!(options.iter().filter(|o| o.selected).count(), 1);
    }

    #[test]
    fn test_empty_column_has_only_blank() {
        let options = build_options(&distinct(&[]), &FilterSelection::None, "");
        assert_eq!(options.len(), 1);
        assert!(options[0].selected);
    }
}
