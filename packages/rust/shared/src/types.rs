//! Core domain types for normalized certification exam data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// An exam stage. "No phase" is expressed as `Option<Phase>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "필기")]
    Written,
    #[serde(rename = "실기")]
    Practical,
    #[serde(rename = "면접")]
    Interview,
    #[serde(rename = "1차")]
    First,
    #[serde(rename = "2차")]
    Second,
}

impl Phase {
    /// All phases in priority order.
    pub const ALL: [Phase; 5] = [
        Phase::Written,
        Phase::Practical,
        Phase::Interview,
        Phase::First,
        Phase::Second,
    ];

    /// Korean label used in headers and output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Written => "필기",
            Self::Practical => "실기",
            Self::Interview => "면접",
            Self::First => "1차",
            Self::Second => "2차",
        }
    }

    /// Inverse of [`Phase::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label.trim())
    }

    /// Bucket slot for this phase. Slot 0 is reserved for "no phase".
    pub fn slot(phase: Option<Self>) -> usize {
        match phase {
            None => 0,
            Some(p) => p as usize + 1,
        }
    }

    /// Inverse of [`Phase::slot`].
    pub fn from_slot(slot: usize) -> Option<Self> {
        slot.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    /// Whether the phase itself is a session number (`1차`/`2차`).
    pub fn is_session(self) -> bool {
        matches!(self, Self::First | Self::Second)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// A semantic schedule column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "회차")]
    Round,
    #[serde(rename = "접수기간")]
    Registration,
    #[serde(rename = "추가접수기간")]
    ExtraRegistration,
    #[serde(rename = "서류제출기간")]
    DocumentSubmission,
    #[serde(rename = "의견제시기간")]
    OpinionPeriod,
    #[serde(rename = "시험일")]
    ExamDate,
    #[serde(rename = "발표")]
    Announcement,
    #[serde(rename = "정답발표")]
    AnswerAnnouncement,
}

impl Field {
    /// Every date-bearing field, in output order.
    pub const DATES: [Field; 7] = [
        Field::Registration,
        Field::ExtraRegistration,
        Field::DocumentSubmission,
        Field::OpinionPeriod,
        Field::ExamDate,
        Field::Announcement,
        Field::AnswerAnnouncement,
    ];

    /// Order in which header tokens are tried. A field whose label contains
    /// another field's label comes first.
    pub const CLASSIFY_ORDER: [Field; 7] = [
        Field::ExtraRegistration,
        Field::Registration,
        Field::DocumentSubmission,
        Field::OpinionPeriod,
        Field::AnswerAnnouncement,
        Field::Announcement,
        Field::ExamDate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Round => "회차",
            Self::Registration => "접수기간",
            Self::ExtraRegistration => "추가접수기간",
            Self::DocumentSubmission => "서류제출기간",
            Self::OpinionPeriod => "의견제시기간",
            Self::ExamDate => "시험일",
            Self::Announcement => "발표",
            Self::AnswerAnnouncement => "정답발표",
        }
    }

    pub fn is_date(self) -> bool {
        !matches!(self, Self::Round)
    }

    /// Index into [`Field::DATES`]; `None` for the round.
    pub fn date_slot(self) -> Option<usize> {
        Self::DATES.iter().position(|f| *f == self)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// DateSpan
// ---------------------------------------------------------------------------

/// A resolved date value: one day, a closed range, or a range with no end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateSpan {
    Single(NaiveDate),
    Range(NaiveDate, NaiveDate),
    OpenEnded(NaiveDate),
}

impl DateSpan {
    /// Build a span from a start/end pair as produced by the range parser.
    /// Equal endpoints collapse to [`DateSpan::Single`].
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
        match (start, end) {
            (Some(s), Some(e)) if s == e => Some(Self::Single(s)),
            (Some(s), Some(e)) => Some(Self::Range(s, e)),
            (Some(s), None) => Some(Self::OpenEnded(s)),
            (None, Some(e)) => Some(Self::Single(e)),
            (None, None) => None,
        }
    }

    pub fn start(&self) -> NaiveDate {
        match *self {
            Self::Single(d) | Self::Range(d, _) | Self::OpenEnded(d) => d,
        }
    }

    pub fn end(&self) -> Option<NaiveDate> {
        match *self {
            Self::Single(d) | Self::Range(_, d) => Some(d),
            Self::OpenEnded(_) => None,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range(..))
    }
}

impl std::fmt::Display for DateSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Range(s, e) => write!(f, "{} ~ {}", s.format("%Y-%m-%d"), e.format("%Y-%m-%d")),
            Self::OpenEnded(s) => write!(f, "{} ~", s.format("%Y-%m-%d")),
        }
    }
}

impl std::str::FromStr for DateSpan {
    type Err = chrono::ParseError;

    /// Parses the canonical forms written by `Display`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parse = |t: &str| NaiveDate::parse_from_str(t.trim(), "%Y-%m-%d");
        match s.split_once('~') {
            None => Ok(Self::Single(parse(s)?)),
            Some((a, b)) if b.trim().is_empty() => Ok(Self::OpenEnded(parse(a)?)),
            Some((a, b)) => Ok(Self::from_bounds(Some(parse(a)?), Some(parse(b)?))
                .unwrap_or(Self::Single(parse(a)?))),
        }
    }
}

impl Serialize for DateSpan {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateSpan {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// ScheduleRecord
// ---------------------------------------------------------------------------

/// One normalized schedule row as assembled from a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScheduleRecord {
    /// Canonical round (`제N회` or `상시`).
    #[serde(rename = "회차", skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    /// Session within a round (`1차`, `2차`, ...).
    #[serde(rename = "차수", skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    /// Date spans indexed by [`Field::date_slot`].
    #[serde(skip)]
    pub dates: [Option<DateSpan>; 7],
    /// Raw merged cell text indexed by [`Field::date_slot`].
    #[serde(skip)]
    pub raw: [Option<String>; 7],
}

impl ScheduleRecord {
    pub fn date(&self, field: Field) -> Option<&DateSpan> {
        field.date_slot().and_then(|i| self.dates[i].as_ref())
    }

    pub fn set_date(&mut self, field: Field, span: Option<DateSpan>) {
        if let Some(i) = field.date_slot() {
            self.dates[i] = span;
        }
    }

    pub fn raw_text(&self, field: Field) -> Option<&str> {
        field.date_slot().and_then(|i| self.raw[i].as_deref())
    }

    /// A record is worth keeping only when it carries a date.
    pub fn has_any_date(&self) -> bool {
        self.dates.iter().any(Option::is_some)
    }
}

// ---------------------------------------------------------------------------
// ScheduleEntry (output projection)
// ---------------------------------------------------------------------------

/// One `정기검정일정` output row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(rename = "회차", default, skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    #[serde(rename = "등급", default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(rename = "차수", default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(rename = "항목", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "구분", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "원서접수표시", default, skip_serializing_if = "Option::is_none")]
    pub register_display: Option<String>,
    #[serde(rename = "시험일자표시", default, skip_serializing_if = "Option::is_none")]
    pub exam_display: Option<String>,
    #[serde(rename = "발표표시", default, skip_serializing_if = "Option::is_none")]
    pub result_display: Option<String>,
    #[serde(rename = "registerStart", default, skip_serializing_if = "Option::is_none")]
    pub register_start: Option<NaiveDate>,
    #[serde(rename = "registerEnd", default, skip_serializing_if = "Option::is_none")]
    pub register_end: Option<NaiveDate>,
    #[serde(rename = "examDate", default, skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<NaiveDate>,
    #[serde(rename = "resultDate", default, skip_serializing_if = "Option::is_none")]
    pub result_date: Option<NaiveDate>,
    #[serde(rename = "추가접수기간", default, skip_serializing_if = "Option::is_none")]
    pub extra_registration: Option<DateSpan>,
    #[serde(rename = "서류제출기간", default, skip_serializing_if = "Option::is_none")]
    pub document_submission: Option<DateSpan>,
    #[serde(rename = "의견제시기간", default, skip_serializing_if = "Option::is_none")]
    pub opinion_period: Option<DateSpan>,
    #[serde(rename = "정답발표", default, skip_serializing_if = "Option::is_none")]
    pub answer_announcement: Option<DateSpan>,
}

impl From<&ScheduleRecord> for ScheduleEntry {
    fn from(rec: &ScheduleRecord) -> Self {
        let registration = rec.date(Field::Registration);
        Self {
            round: rec.round.clone(),
            session: rec.session.clone(),
            phase: rec.phase,
            register_display: rec.raw_text(Field::Registration).map(str::to_owned),
            exam_display: rec.raw_text(Field::ExamDate).map(str::to_owned),
            result_display: rec.raw_text(Field::Announcement).map(str::to_owned),
            register_start: registration.map(DateSpan::start),
            register_end: registration.and_then(DateSpan::end),
            exam_date: rec.date(Field::ExamDate).map(DateSpan::start),
            result_date: rec.date(Field::Announcement).map(DateSpan::start),
            extra_registration: rec.date(Field::ExtraRegistration).copied(),
            document_submission: rec.date(Field::DocumentSubmission).copied(),
            opinion_period: rec.date(Field::OpinionPeriod).copied(),
            answer_announcement: rec.date(Field::AnswerAnnouncement).copied(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// TimeSlotRecord
// ---------------------------------------------------------------------------

/// One `시험시간` row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotRecord {
    #[serde(rename = "교시", default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(rename = "등급", default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(rename = "차수", default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(rename = "입실완료시간", default, skip_serializing_if = "Option::is_none")]
    pub admission: Option<String>,
    #[serde(rename = "시험시간표시", default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(rename = "durationMin", default, skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<u32>,
    #[serde(rename = "비고", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Normalized schedule document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOutput {
    #[serde(rename = "정기검정일정", default)]
    pub entries: Vec<ScheduleEntry>,
    #[serde(rename = "시험시간", default)]
    pub time_slots: Vec<TimeSlotRecord>,
}

impl ScheduleOutput {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.time_slots.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// `수수료`: amounts per phase when a fee table was found, otherwise the
/// paragraph that describes the fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fees {
    ByPhase {
        #[serde(rename = "필기", default, skip_serializing_if = "Option::is_none")]
        written: Option<String>,
        #[serde(rename = "실기", default, skip_serializing_if = "Option::is_none")]
        practical: Option<String>,
    },
    Text(String),
}

// ---------------------------------------------------------------------------
// Content items
// ---------------------------------------------------------------------------

/// A `name (NN%)` pair parsed from a coverage description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    #[serde(rename = "항목")]
    pub name: String,
    /// Integer when whole, otherwise the decimal as written.
    #[serde(rename = "비율")]
    pub ratio: serde_json::Number,
}

/// One syllabus row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyllabusItem {
    #[serde(rename = "등급", default)]
    pub grade: String,
    #[serde(rename = "과목", default)]
    pub subject: String,
    #[serde(rename = "검정항목", default)]
    pub topic: String,
    #[serde(rename = "검정내용", default)]
    pub content: String,
    #[serde(rename = "상세검정내용", default)]
    pub detail: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub ext: serde_json::Map<String, serde_json::Value>,
}

/// One exam-coverage row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageItem {
    #[serde(rename = "종목", default)]
    pub subject: String,
    #[serde(rename = "등급", default)]
    pub grade: String,
    #[serde(rename = "구분", default)]
    pub category: String,
    #[serde(rename = "평가범위", default)]
    pub scope: String,
    #[serde(rename = "parsedWeights", default)]
    pub parsed_weights: Vec<Weight>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub ext: serde_json::Map<String, serde_json::Value>,
}

/// Normalized content document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentOutput {
    #[serde(default)]
    pub syllabus: Vec<SyllabusItem>,
    #[serde(default)]
    pub coverage: Vec<CoverageItem>,
}
