//! Signature-based deduplication and empty-value pruning.
//!
//! Repeated extraction passes produce the same item more than once, often
//! with cosmetic differences (image order, weight order). Each output type
//! implements [`Signature`] to reduce itself to a canonical key; the first
//! item with a given key wins and output order is preserved.

pub mod prune;

pub use prune::{is_empty_value, prune};

use std::collections::HashSet;
use std::hash::Hash;

use certnorm_shared::{CoverageItem, ScheduleEntry, SyllabusItem, TimeSlotRecord};
use tracing::debug;

/// Canonical identity of an output item.
pub trait Signature {
    type Key: Eq + Hash;

    fn signature(&self) -> Self::Key;
}

/// Drop every item whose signature was already seen. First occurrence wins.
pub fn dedup_by_signature<T: Signature>(items: Vec<T>) -> Vec<T> {
    let before = items.len();
    let mut seen = HashSet::with_capacity(before);
    let out: Vec<T> = items
        .into_iter()
        .filter(|item| seen.insert(item.signature()))
        .collect();
    if out.len() < before {
        debug!(before, after = out.len(), "dropped duplicate items");
    }
    out
}

fn sorted_images(images: &[String]) -> Vec<String> {
    let mut out: Vec<String> = images
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    out.sort();
    out
}

fn text<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

impl Signature for SyllabusItem {
    type Key = (String, String, String, String, String, Vec<String>);

    fn signature(&self) -> Self::Key {
        (
            self.grade.clone(),
            self.subject.clone(),
            self.topic.clone(),
            self.content.clone(),
            self.detail.clone(),
            sorted_images(&self.images),
        )
    }
}

impl Signature for CoverageItem {
    type Key = (String, String, String, String, Vec<(String, String)>, Vec<String>);

    fn signature(&self) -> Self::Key {
        let mut weights: Vec<(String, String)> = self
            .parsed_weights
            .iter()
            .map(|w| (w.name.clone(), w.ratio.to_string()))
            .collect();
        weights.sort();
        (
            self.subject.clone(),
            self.grade.clone(),
            self.category.clone(),
            self.scope.clone(),
            weights,
            sorted_images(&self.images),
        )
    }
}

impl Signature for ScheduleEntry {
    type Key = Vec<String>;

    fn signature(&self) -> Self::Key {
        vec![
            text(&self.round),
            text(&self.grade),
            text(&self.session),
            text(&self.phase),
            text(&self.title),
            text(&self.category),
            text(&self.register_start),
            text(&self.register_end),
            text(&self.exam_date),
            text(&self.result_date),
            text(&self.extra_registration),
            text(&self.document_submission),
            text(&self.opinion_period),
            text(&self.answer_announcement),
            text(&self.register_display),
            text(&self.exam_display),
            text(&self.result_display),
        ]
    }
}

impl Signature for TimeSlotRecord {
    type Key = Vec<String>;

    fn signature(&self) -> Self::Key {
        vec![
            text(&self.period),
            text(&self.grade),
            text(&self.session),
            text(&self.admission),
            text(&self.display),
            text(&self.start),
            text(&self.end),
            text(&self.note),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certnorm_shared::{Phase, Weight};
    use proptest::prelude::*;

    fn syllabus(subject: &str, images: &[&str]) -> SyllabusItem {
        SyllabusItem {
            grade: "1급".into(),
            subject: subject.into(),
            images: images.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn image_order_does_not_matter() {
        let items = vec![
            syllabus("필기", &["b.png", "a.png"]),
            syllabus("필기", &["a.png", " b.png "]),
            syllabus("실기", &[]),
        ];
        let out = dedup_by_signature(items);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].images, vec!["b.png", "a.png"], "first occurrence wins");
    }

    #[test]
    fn weight_order_does_not_matter() {
        let w = |name: &str, pct: u64| Weight {
            name: name.into(),
            ratio: pct.into(),
        };
        let a = CoverageItem {
            subject: "GTQ".into(),
            parsed_weights: vec![w("이론", 30), w("실습", 70)],
            ..Default::default()
        };
        let mut b = a.clone();
        b.parsed_weights.reverse();
        assert_eq!(a.signature(), b.signature());
        assert_eq!(dedup_by_signature(vec![a, b]).len(), 1);
    }

    #[test]
    fn schedule_entries_differing_in_phase_are_kept() {
        let a = ScheduleEntry {
            round: Some("제1회".into()),
            phase: Some(Phase::Written),
            ..Default::default()
        };
        let mut b = a.clone();
        b.phase = Some(Phase::Practical);
        let out = dedup_by_signature(vec![a.clone(), b, a]);
        assert_eq!(out.len(), 2);
    }

    proptest! {
        #[test]
        fn dedup_is_idempotent(names in proptest::collection::vec("[a-c]{0,2}", 0..20)) {
            let items: Vec<SyllabusItem> = names.iter().map(|n| syllabus(n, &[])).collect();
            let once = dedup_by_signature(items);
            let twice = dedup_by_signature(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn dedup_preserves_first_occurrence_order(names in proptest::collection::vec("[a-c]", 0..20)) {
            let items: Vec<SyllabusItem> = names.iter().map(|n| syllabus(n, &[])).collect();
            let out: Vec<String> = dedup_by_signature(items).into_iter().map(|i| i.subject).collect();
            let mut expected: Vec<String> = Vec::new();
            for n in &names {
                if !expected.contains(n) {
                    expected.push(n.clone());
                }
            }
            prop_assert_eq!(out, expected);
        }
    }
}
