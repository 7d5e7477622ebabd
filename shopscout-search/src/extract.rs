//! Ordered field-extraction rules for provider records.
//!
//! Provider payloads vary in shape, so each output field is described by a
//! list of [`FieldRule`]s tried in order; the first one yielding a present
//! value wins.

use serde_json::Value;

use crate::types::Price;

/// Locates one candidate value inside a raw record by JSON pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule(pub &'static str);

impl FieldRule {
    /// Value at this rule's pointer, if it is present.
    pub fn apply<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        record.pointer(self.0).filter(|value| is_present(value))
    }
}

/// Whether a value counts as supplied.
///
/// `null`, `false`, `0` and the empty string are treated as missing, which is
/// how the upstream payloads signal an absent field.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First present value across `rules`.
pub fn first_match<'a>(record: &'a Value, rules: &[FieldRule]) -> Option<&'a Value> {
    rules.iter().find_map(|rule| rule.apply(record))
}

/// First present value rendered as text. Numbers are formatted, other
/// non-string values are skipped.
pub fn text_field(record: &Value, rules: &[FieldRule]) -> Option<String> {
    rules.iter().find_map(|rule| match rule.apply(record)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

/// First present value that can be read as a price.
pub fn price_field(record: &Value, rules: &[FieldRule]) -> Option<Price> {
    rules
        .iter()
        .find_map(|rule| rule.apply(record).and_then(Price::from_json))
}

/// First present array among the top-level `keys` of a response body.
///
/// A present but non-array container yields no records.
pub fn record_list<'a>(body: &'a Value, keys: &[&str]) -> &'a [Value] {
    keys.iter()
        .find_map(|key| body.get(*key).filter(|value| is_present(value)))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const TITLE: &[FieldRule] = &[FieldRule("/info/title"), FieldRule("/title")];

    #[test]
    fn test_first_rule_wins() {
        let record = json!({"info": {"title": "Nested"}, "title": "Flat"});
        assert_eq!(text_field(&record, TITLE).as_deref(), Some("Nested"));
    }

    #[test]
    fn test_empty_values_fall_through() {
        let record = json!({"info": {"title": ""}, "title": "Flat"});
        assert_eq!(text_field(&record, TITLE).as_deref(), Some("Flat"));

        let record = json!({"info": null});
        assert_eq!(text_field(&record, TITLE), None);
    }

    #[test]
    fn test_zero_price_is_treated_as_missing() {
        let rules = &[FieldRule("/sale"), FieldRule("/mrp")];
        let record = json!({"sale": 0, "mrp": 1999});
        assert_eq!(price_field(&record, rules), Some(Price::Amount(1999.0)));
    }

    #[test]
    fn test_array_index_pointer() {
        let rules = &[FieldRule("/images/0")];
        assert_eq!(
            text_field(&json!({"images": ["a.jpg", "b.jpg"]}), rules).as_deref(),
            Some("a.jpg")
        );
        assert_eq!(text_field(&json!({"images": []}), rules), None);
        assert_eq!(text_field(&json!({"images": {"200x200": "c.jpg"}}), rules), None);
    }

    #[test]
    fn test_record_list_picks_first_present_container() {
        let body = json!({"products": [], "productInfoList": [{"id": 1}]});
        // An empty array is still present.
        assert!(record_list(&body, &["products", "productInfoList"]).is_empty());

        let body = json!({"productInfoList": [{"id": 1}, {"id": 2}]});
        assert_eq!(record_list(&body, &["products", "productInfoList"]).len(), 2);
    }

    #[test]
    fn test_record_list_ignores_non_array_container() {
        let body = json!({"product": {"id": 1}});
        assert!(record_list(&body, &["products", "product"]).is_empty());
    }
}
