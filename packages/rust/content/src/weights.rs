//! `name (NN%)` pairs in coverage descriptions.

use std::sync::LazyLock;

use certnorm_shared::Weight;
use regex::Regex;
use serde_json::{Map, Number, Value};

static PERCENT_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*([^(),%]+?)\s*\(\s*(\d+(?:\.\d+)?)\s*%\s*\)").expect("valid regex")
});

const NAME_TRIM: &[char] = &[' ', ',', ';', '/', '·', 'ㆍ', '-', '–', '—'];

fn ratio(text: &str) -> Option<Number> {
    let value: f64 = text.parse().ok()?;
    if value.fract() == 0.0 {
        Some(Number::from(value as u64))
    } else {
        Number::from_f64(value)
    }
}

/// Every `name (NN%)` pair in `text`, in order. Whole percentages become
/// integers.
pub fn parse_weights(text: &str) -> Vec<Weight> {
    PERCENT_PAIR
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().trim_matches(NAME_TRIM);
            if name.is_empty() {
                return None;
            }
            Some(Weight {
                name: name.to_string(),
                ratio: ratio(caps.get(2)?.as_str())?,
            })
        })
        .collect()
}

fn pair_count(text: &str) -> usize {
    PERCENT_PAIR.find_iter(text).count()
}

/// Whether a map without explicit keys reads like a coverage row: its
/// `평가범위` holds a weight pair, or its string values hold two or more.
pub fn looks_like_coverage(map: &Map<String, Value>) -> bool {
    if let Some(Value::String(scope)) = map.get("평가범위") {
        return pair_count(scope) >= 1;
    }
    let joined = map
        .values()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    pair_count(&joined) >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_pairs() {
        let weights = parse_weights("이론(40%), 실기 작업 (60 %)");
        assert_eq!(weights.len(), 2);
        assert_eq!(weights[0].name, "이론");
        assert_eq!(weights[0].ratio, Number::from(40u64));
        assert_eq!(weights[1].name, "실기 작업");
        assert_eq!(weights[1].ratio, Number::from(60u64));
    }

    #[test]
    fn keeps_fractional_ratio() {
        let weights = parse_weights("· 데이터베이스 (12.5%)");
        assert_eq!(weights[0].name, "데이터베이스");
        assert_eq!(weights[0].ratio.as_f64(), Some(12.5));
        assert!(weights[0].ratio.as_u64().is_none());
    }

    #[test]
    fn no_pairs() {
        assert!(parse_weights("필기 100문항").is_empty());
        assert!(parse_weights("(30%)").is_empty());
    }

    #[test]
    fn coverage_heuristic() {
        let scoped = json!({"평가범위": "회계(50%)"});
        assert!(looks_like_coverage(scoped.as_object().expect("object")));

        let scoped_plain = json!({"평가범위": "회계 전반", "비고": "a(1%) b(2%)"});
        assert!(!looks_like_coverage(scoped_plain.as_object().expect("object")));

        let loose = json!({"내용": "재무회계(60%)", "기타": "원가회계(40%)"});
        assert!(looks_like_coverage(loose.as_object().expect("object")));

        let single = json!({"내용": "재무회계(60%)"});
        assert!(!looks_like_coverage(single.as_object().expect("object")));
    }
}
