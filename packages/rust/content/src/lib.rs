//! Syllabus and coverage extraction from arbitrary content trees.
//!
//! Crawlers hand over whatever nesting the source page had. The walker visits
//! every map and list once, collecting items under `syllabus`, `coverage`, and
//! `시험종목 및 평가범위`, plus maps that carry `name (NN%)` weight pairs
//! without any of those keys. Items are then standardized and deduplicated.

pub mod weights;

pub use weights::{looks_like_coverage, parse_weights};

use std::collections::HashSet;

use certnorm_dedupe::{dedup_by_signature, is_empty_value};
use certnorm_shared::{ContentOutput, CoverageItem, SyllabusItem, Weight};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

const SYLLABUS_KEY: &str = "syllabus";
const COVERAGE_KEYS: &[&str] = &["coverage", "시험종목 및 평가범위"];
const NESTED_KEY: &str = "시험내용";

const IMAGE_NAMES: &[&str] = &[
    "images", "image", "img", "imgs", "picture", "pictures", "pics", "photos",
];

const SYLLABUS_KEYS: &[&str] = &["등급", "과목", "검정항목", "검정내용", "상세검정내용"];
const SYLLABUS_ALIASES: &[&str] = &["차수", "항목", "검정내용목록"];
const COVERAGE_STD_KEYS: &[&str] = &["종목", "등급", "구분", "평가범위"];
const ALWAYS_EXCLUDED: &[&str] = &["parsedWeights", "section", "ext"];

// ---------------------------------------------------------------------------
// Tree walk
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Collector<'a> {
    visited: HashSet<usize>,
    syllabus: Vec<&'a Map<String, Value>>,
    coverage: Vec<&'a Map<String, Value>>,
}

fn node_id(node: &Value) -> usize {
    node as *const Value as usize
}

/// A list, or a single map treated as a one-item list.
fn as_items(value: &Value) -> Vec<&Map<String, Value>> {
    match value {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(map) => vec![map],
        _ => Vec::new(),
    }
}

impl<'a> Collector<'a> {
    fn walk(&mut self, node: &'a Value) {
        if !self.visited.insert(node_id(node)) {
            return;
        }
        match node {
            Value::Object(map) => self.walk_map(map),
            Value::Array(items) => items.iter().for_each(|v| self.walk(v)),
            _ => {}
        }
    }

    fn walk_map(&mut self, map: &'a Map<String, Value>) {
        let mut explicit = false;
        if let Some(value) = map.get(SYLLABUS_KEY) {
            explicit = true;
            self.syllabus.extend(as_items(value));
        }
        for key in COVERAGE_KEYS {
            if let Some(value) = map.get(*key) {
                explicit = true;
                self.coverage.extend(as_items(value));
            }
        }
        if let Some(nested) = map.get(NESTED_KEY) {
            self.walk(nested);
        }
        if !explicit && looks_like_coverage(map) {
            self.coverage.push(map);
        }
        for value in map.values() {
            self.walk(value);
        }
    }
}

// ---------------------------------------------------------------------------
// Item standardization
// ---------------------------------------------------------------------------

fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn is_image_key(key: &str) -> bool {
    key.contains("이미지") || IMAGE_NAMES.contains(&key.to_lowercase().as_str())
}

fn collect_images(map: &Map<String, Value>) -> Vec<String> {
    let mut out = Vec::new();
    for (key, value) in map {
        if !is_image_key(key) {
            continue;
        }
        match value {
            Value::String(s) if !s.trim().is_empty() => out.push(s.trim().to_string()),
            Value::Array(items) => out.extend(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned),
            ),
            _ => {}
        }
    }
    out
}

/// Leftover non-empty keys. An `ext` map already on the item is folded in,
/// so normalized output normalizes to itself.
fn collect_ext(map: &Map<String, Value>, standard: &[&[&str]]) -> Map<String, Value> {
    let carried = map.get("ext").and_then(Value::as_object).into_iter().flatten();
    map.iter()
        .filter(|(key, value)| {
            !standard.iter().any(|keys| keys.contains(&key.as_str()))
                && !ALWAYS_EXCLUDED.contains(&key.as_str())
                && !is_image_key(key)
                && !is_empty_value(value)
        })
        .chain(carried.filter(|(_, value)| !is_empty_value(value)))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Build a syllabus item, filling `과목`, `검정항목`, and `검정내용` from their
/// aliases when missing.
pub fn syllabus_item(map: &Map<String, Value>) -> SyllabusItem {
    let pick = |key: &str, alias: &str| {
        let primary = text_of(map.get(key));
        if primary.is_empty() {
            text_of(map.get(alias))
        } else {
            primary
        }
    };

    let mut content = text_of(map.get("검정내용"));
    if content.is_empty() {
        if let Some(Value::Array(lines)) = map.get("검정내용목록") {
            content = lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n");
        }
    }

    SyllabusItem {
        grade: text_of(map.get("등급")),
        subject: pick("과목", "차수"),
        topic: pick("검정항목", "항목"),
        content,
        detail: text_of(map.get("상세검정내용")),
        images: collect_images(map),
        ext: collect_ext(map, &[SYLLABUS_KEYS, SYLLABUS_ALIASES]),
    }
}

fn existing_weights(map: &Map<String, Value>) -> Option<Vec<Weight>> {
    let value = map.get("parsedWeights")?;
    let weights: Vec<Weight> = serde_json::from_value(value.clone()).ok()?;
    (!weights.is_empty()).then_some(weights)
}

/// Build a coverage item. Weights already present are reused; otherwise they
/// are parsed from `평가범위` or the first string value holding a `%`.
pub fn coverage_item(map: &Map<String, Value>) -> CoverageItem {
    let scope = text_of(map.get("평가범위"));
    let parsed_weights = existing_weights(map).unwrap_or_else(|| {
        let source = if scope.is_empty() {
            map.values()
                .filter_map(Value::as_str)
                .find(|s| s.contains('%'))
                .unwrap_or_default()
        } else {
            scope.as_str()
        };
        parse_weights(source)
    });

    CoverageItem {
        subject: text_of(map.get("종목")),
        grade: text_of(map.get("등급")),
        category: text_of(map.get("구분")),
        scope: scope.clone(),
        parsed_weights,
        images: collect_images(map),
        ext: collect_ext(map, &[COVERAGE_STD_KEYS]),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Extract and deduplicate syllabus and coverage items from `raw`.
#[instrument(skip_all)]
pub fn normalize_content(raw: &Value) -> ContentOutput {
    let mut collector = Collector::default();
    collector.walk(raw);
    debug!(
        syllabus = collector.syllabus.len(),
        coverage = collector.coverage.len(),
        "content nodes collected"
    );

    let syllabus = dedup_by_signature(
        collector
            .syllabus
            .into_iter()
            .map(syllabus_item)
            .collect(),
    );
    let coverage = dedup_by_signature(
        collector
            .coverage
            .into_iter()
            .map(coverage_item)
            .collect(),
    );
    info!(
        syllabus = syllabus.len(),
        coverage = coverage.len(),
        "content normalized"
    );
    ContentOutput { syllabus, coverage }
}
