use models::Operator;
use serde_json::Value;

/// Test the `actual` value of a field with `operator` and its operator-supplied
/// `value`. An absent field is null. Comparisons are of stringified values,
/// and null has no string form.
pub fn test(operator: Operator, actual: Option<&Value>, value: Option<&str>) -> bool {
    let text = actual.and_then(models::stringify);
    let value = value.unwrap_or_default();

    match operator {
        Operator::Equals => text.as_deref() == Some(value),
        Operator::NotEquals => text.as_deref() != Some(value),
        Operator::Contains => text.map(|text| text.contains(value)).unwrap_or(false),
        Operator::NotContains => !test(Operator::Contains, actual, Some(value)),
        Operator::StartsWith => text.map(|text| text.starts_with(value)).unwrap_or(false),
        Operator::EqualsIgnoreCase => text
            .map(|text| text.to_lowercase() == value.to_lowercase())
            .unwrap_or(false),
        Operator::Blank => text.map(|text| text.trim().is_empty()).unwrap_or(true),
        Operator::NotBlank => !test(Operator::Blank, actual, None),
        Operator::Null => matches!(actual, None | Some(Value::Null)),
        Operator::NotNull => !test(Operator::Null, actual, None),
    }
}

#[cfg(test)]
mod test {
    use super::test as check;
    use models::Operator::*;
    use serde_json::{json, Value};

    #[test]
    fn test_operators() {
        let cases: Vec<(models::Operator, Value, Option<&str>, bool)> = vec![
            (Equals, json!("Closed"), Some("Closed"), true),
            (Equals, json!("closed"), Some("Closed"), false),
            (Equals, json!(null), Some(""), false),
            (Equals, json!(""), Some(""), true),
            (Equals, json!(42), Some("42"), true),
            (Equals, json!(true), Some("true"), true),
            (NotEquals, json!(null), Some(""), true),
            (NotEquals, json!("Closed"), Some("Closed"), false),
            (Contains, json!("broken pipe"), Some("pipe"), true),
            (Contains, json!(null), Some("pipe"), false),
            (NotContains, json!("broken pipe"), Some("pipe"), false),
            (NotContains, json!(null), Some("pipe"), true),
            (StartsWith, json!("+39 055"), Some("+39"), true),
            (StartsWith, json!(null), Some("+39"), false),
            (EqualsIgnoreCase, json!("ACME Ltd"), Some("acme ltd"), true),
            (EqualsIgnoreCase, json!(null), Some("acme"), false),
            (EqualsIgnoreCase, json!("MÜLLER GmbH"), Some("müller gmbh"), true),
            // Both sides are only lower-cased: no folding or normalization.
            (EqualsIgnoreCase, json!("ＡＣＭＥ"), Some("acme"), false),
            (EqualsIgnoreCase, json!("ﬁle"), Some("file"), false),
            (EqualsIgnoreCase, json!("STRASSE"), Some("straße"), false),
            (Blank, json!(null), None, true),
            (Blank, json!("  "), None, true),
            (Blank, json!("x"), None, false),
            (Blank, json!(0), None, false),
            (NotBlank, json!(" x "), None, true),
            (Null, json!(null), None, true),
            (Null, json!(""), None, false),
            (NotNull, json!(""), None, true),
        ];

        for (op, actual, value, expect) in cases {
            assert_eq!(
                check(op, Some(&actual), value),
                expect,
                "{op} {actual} {value:?}"
            );
        }

        // Absent fields are null.
        assert!(check(Null, None, None));
        assert!(check(Blank, None, None));
        assert!(!check(Equals, None, Some("")));
    }
}
