//! Recursive removal of empty values from JSON output.

use serde_json::Value;

/// `null`, `""`, `[]` and `{}` count as empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Strip empty values bottom-up, so a container emptied by pruning is itself
/// removed from its parent. Scalars pass through unchanged.
pub fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, prune(v)))
                .filter(|(_, v)| !is_empty_value(v))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(prune)
                .filter(|v| !is_empty_value(v))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn removes_nested_empties() {
        let input = json!({
            "회차": "제1회",
            "차수": null,
            "images": [],
            "ext": { "note": "", "inner": { "x": [] } },
            "rows": [null, "", {}, [[]], "keep"],
            "count": 0,
            "flag": false
        });
        let expected = json!({
            "회차": "제1회",
            "rows": ["keep"],
            "count": 0,
            "flag": false
        });
        assert_eq!(prune(input), expected);
    }

    #[test]
    fn prune_is_idempotent() {
        let input = json!({"a": {"b": [null, {"c": ""}]}, "d": 1});
        let once = prune(input);
        assert_eq!(prune(once.clone()), once);
        assert_eq!(once, json!({"d": 1}));
    }

    #[test]
    fn top_level_empty_object_stays_an_object() {
        assert_eq!(prune(json!({"a": null})), json!({}));
    }
}
