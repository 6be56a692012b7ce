//! Token dictionary: the externally configurable vocabulary used to classify
//! headers, detect row phases, and recognize banner rows.
//!
//! The dictionary is plain TOML ([`TokenDictionary`]). It is compiled once into
//! [`Tokens`], an immutable set of regex alternations that is passed by
//! reference to every stage that needs it.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CertnormError, Result};
use crate::types::{Field, Phase};

/// The dictionary compiled into the binary.
pub const DEFAULT_TOKENS: &str = include_str!("../tokens.default.toml");

// ---------------------------------------------------------------------------
// Dictionary (TOML schema)
// ---------------------------------------------------------------------------

/// Per-phase token lists. `neutral` is only meaningful for field entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseTokens {
    #[serde(default)]
    pub neutral: Vec<String>,
    #[serde(default, rename = "필기")]
    pub written: Vec<String>,
    #[serde(default, rename = "실기")]
    pub practical: Vec<String>,
    #[serde(default, rename = "면접")]
    pub interview: Vec<String>,
    #[serde(default, rename = "1차")]
    pub first: Vec<String>,
    #[serde(default, rename = "2차")]
    pub second: Vec<String>,
}

impl PhaseTokens {
    fn for_phase(&self, phase: Phase) -> &[String] {
        match phase {
            Phase::Written => &self.written,
            Phase::Practical => &self.practical,
            Phase::Interview => &self.interview,
            Phase::First => &self.first,
            Phase::Second => &self.second,
        }
    }

    fn is_empty(&self) -> bool {
        self.neutral.is_empty() && Phase::ALL.iter().all(|p| self.for_phase(*p).is_empty())
    }
}

/// `[fields]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldDictionary {
    #[serde(default, rename = "회차")]
    pub round: Vec<String>,
    #[serde(default, rename = "접수기간")]
    pub registration: PhaseTokens,
    #[serde(default, rename = "추가접수기간")]
    pub extra_registration: PhaseTokens,
    #[serde(default, rename = "서류제출기간")]
    pub document_submission: PhaseTokens,
    #[serde(default, rename = "의견제시기간")]
    pub opinion_period: PhaseTokens,
    #[serde(default, rename = "시험일")]
    pub exam_date: PhaseTokens,
    #[serde(default, rename = "발표")]
    pub announcement: PhaseTokens,
    #[serde(default, rename = "정답발표")]
    pub answer_announcement: PhaseTokens,
}

impl FieldDictionary {
    fn for_field(&self, field: Field) -> Option<&PhaseTokens> {
        match field {
            Field::Round => None,
            Field::Registration => Some(&self.registration),
            Field::ExtraRegistration => Some(&self.extra_registration),
            Field::DocumentSubmission => Some(&self.document_submission),
            Field::OpinionPeriod => Some(&self.opinion_period),
            Field::ExamDate => Some(&self.exam_date),
            Field::Announcement => Some(&self.announcement),
            Field::AnswerAnnouncement => Some(&self.answer_announcement),
        }
    }
}

/// `[banner_row]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BannerDictionary {
    #[serde(default)]
    pub contains_any: Vec<String>,
    #[serde(default)]
    pub first_cell_contains: Vec<String>,
    #[serde(default)]
    pub first_cell_excludes: Vec<String>,
}

/// `[time_slot_headers]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeSlotDictionary {
    #[serde(default)]
    pub period: Vec<String>,
    #[serde(default)]
    pub grade: Vec<String>,
    #[serde(default)]
    pub admission: Vec<String>,
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub note: Vec<String>,
}

/// The full token dictionary as written in TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenDictionary {
    #[serde(default)]
    pub row_phase_tokens: PhaseTokens,
    #[serde(default)]
    pub fields: FieldDictionary,
    #[serde(default)]
    pub banner_row: BannerDictionary,
    #[serde(default)]
    pub fee_tokens: Vec<String>,
    #[serde(default)]
    pub schedule_keywords: Vec<String>,
    #[serde(default)]
    pub time_slot_headers: TimeSlotDictionary,
}

impl TokenDictionary {
    /// Parse a dictionary from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CertnormError::config(format!("invalid token dictionary: {e}")))
    }

    /// Check that every list the classifier cannot work without is populated.
    pub fn validate(&self) -> Result<()> {
        if self.fields.round.is_empty() {
            return Err(CertnormError::validation("fields.회차 must list at least one token"));
        }
        if Phase::ALL
            .iter()
            .all(|p| self.row_phase_tokens.for_phase(*p).is_empty())
        {
            return Err(CertnormError::validation(
                "row_phase_tokens must list tokens for at least one phase",
            ));
        }
        for field in [Field::Registration, Field::ExamDate] {
            if self.fields.for_field(field).is_none_or(PhaseTokens::is_empty) {
                return Err(CertnormError::validation(format!(
                    "fields.{field} must list at least one token"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Compiled matchers
// ---------------------------------------------------------------------------

/// Remove all whitespace (including NBSP and zero-width spaces).
pub fn strip_ws(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{200b}' && *c != '\u{feff}')
        .collect()
}

/// A compiled alternation of literal tokens. An empty list never matches.
#[derive(Debug, Clone, Default)]
pub struct TokenMatcher {
    regex: Option<Regex>,
}

impl TokenMatcher {
    pub fn compile(tokens: &[String]) -> Result<Self> {
        let alternatives: Vec<String> = tokens
            .iter()
            .map(|t| strip_ws(t))
            .filter(|t| !t.is_empty())
            .map(|t| regex::escape(&t))
            .collect();
        if alternatives.is_empty() {
            return Ok(Self { regex: None });
        }
        let regex = Regex::new(&alternatives.join("|"))
            .map_err(|e| CertnormError::config(format!("token pattern failed to compile: {e}")))?;
        Ok(Self { regex: Some(regex) })
    }

    /// Whether any token occurs in `text` once whitespace is removed.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex
            .as_ref()
            .is_some_and(|re| re.is_match(&strip_ws(text)))
    }

    pub fn is_empty(&self) -> bool {
        self.regex.is_none()
    }
}

/// Neutral and phase-specific matchers for one date field.
#[derive(Debug, Clone)]
pub struct FieldMatchers {
    pub field: Field,
    pub neutral: TokenMatcher,
    /// Indexed by `Phase as usize`.
    pub by_phase: [TokenMatcher; 5],
}

#[derive(Debug, Clone, Default)]
pub struct BannerMatchers {
    pub contains_any: TokenMatcher,
    pub first_cell_contains: TokenMatcher,
    pub first_cell_excludes: TokenMatcher,
}

#[derive(Debug, Clone, Default)]
pub struct TimeSlotMatchers {
    pub period: TokenMatcher,
    pub grade: TokenMatcher,
    pub admission: TokenMatcher,
    pub time: TokenMatcher,
    pub note: TokenMatcher,
}

/// The compiled, immutable token configuration.
#[derive(Debug, Clone)]
pub struct Tokens {
    pub round: TokenMatcher,
    /// Indexed by `Phase as usize`.
    pub row_phase: [TokenMatcher; 5],
    /// In [`Field::CLASSIFY_ORDER`].
    pub fields: Vec<FieldMatchers>,
    pub banner: BannerMatchers,
    pub fee: TokenMatcher,
    pub schedule_keywords: TokenMatcher,
    pub time_slot: TimeSlotMatchers,
}

fn compile_phases(tokens: &PhaseTokens) -> Result<[TokenMatcher; 5]> {
    Ok([
        TokenMatcher::compile(tokens.for_phase(Phase::Written))?,
        TokenMatcher::compile(tokens.for_phase(Phase::Practical))?,
        TokenMatcher::compile(tokens.for_phase(Phase::Interview))?,
        TokenMatcher::compile(tokens.for_phase(Phase::First))?,
        TokenMatcher::compile(tokens.for_phase(Phase::Second))?,
    ])
}

impl Tokens {
    /// Validate and compile a dictionary.
    pub fn init(dict: &TokenDictionary) -> Result<Self> {
        dict.validate()?;

        let mut fields = Vec::with_capacity(Field::CLASSIFY_ORDER.len());
        for field in Field::CLASSIFY_ORDER {
            let Some(entry) = dict.fields.for_field(field) else {
                continue;
            };
            fields.push(FieldMatchers {
                field,
                neutral: TokenMatcher::compile(&entry.neutral)?,
                by_phase: compile_phases(entry)?,
            });
        }

        let tokens = Self {
            round: TokenMatcher::compile(&dict.fields.round)?,
            row_phase: compile_phases(&dict.row_phase_tokens)?,
            fields,
            banner: BannerMatchers {
                contains_any: TokenMatcher::compile(&dict.banner_row.contains_any)?,
                first_cell_contains: TokenMatcher::compile(&dict.banner_row.first_cell_contains)?,
                first_cell_excludes: TokenMatcher::compile(&dict.banner_row.first_cell_excludes)?,
            },
            fee: TokenMatcher::compile(&dict.fee_tokens)?,
            schedule_keywords: TokenMatcher::compile(&dict.schedule_keywords)?,
            time_slot: TimeSlotMatchers {
                period: TokenMatcher::compile(&dict.time_slot_headers.period)?,
                grade: TokenMatcher::compile(&dict.time_slot_headers.grade)?,
                admission: TokenMatcher::compile(&dict.time_slot_headers.admission)?,
                time: TokenMatcher::compile(&dict.time_slot_headers.time)?,
                note: TokenMatcher::compile(&dict.time_slot_headers.note)?,
            },
        };
        tracing::debug!(fields = tokens.fields.len(), "compiled token dictionary");
        Ok(tokens)
    }

    /// Compile the built-in dictionary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(DEFAULT_TOKENS)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Self::init(&TokenDictionary::from_toml(content)?)
    }

    /// Compile the dictionary at `path`, or the built-in one when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Self::builtin(),
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|e| CertnormError::io(path, e))?;
                tracing::debug!(?path, "loading token dictionary");
                Self::from_toml(&content)
            }
        }
    }

    /// Row-phase matcher for `phase`.
    pub fn row_phase_matcher(&self, phase: Phase) -> &TokenMatcher {
        &self.row_phase[phase as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_dictionary_compiles() {
        let tokens = Tokens::builtin().expect("builtin tokens");
        assert_eq!(tokens.fields.len(), Field::CLASSIFY_ORDER.len());
        assert_eq!(tokens.fields[0].field, Field::ExtraRegistration);
        assert!(tokens.round.is_match("시험 회차"));
    }

    #[test]
    fn matcher_ignores_whitespace() {
        let m = TokenMatcher::compile(&["원서접수".to_string()]).expect("compile");
        assert!(m.is_match("원서 접수\u{00a0}기간"));
        assert!(!m.is_match("시험일"));
    }

    #[test]
    fn matcher_escapes_metacharacters() {
        let m = TokenMatcher::compile(&["※".to_string(), "(주)".to_string()]).expect("compile");
        assert!(m.is_match("(주)공지"));
        assert!(!m.is_match("주"));
    }

    #[test]
    fn empty_matcher_never_matches() {
        let m = TokenMatcher::compile(&[]).expect("compile");
        assert!(m.is_empty());
        assert!(!m.is_match("anything"));
    }

    #[test]
    fn missing_round_tokens_fail_fast() {
        let toml_str = r#"
[row_phase_tokens]
"필기" = ["필기"]

[fields."접수기간"]
neutral = ["접수"]

[fields."시험일"]
neutral = ["시험일"]
"#;
        let err = Tokens::from_toml(toml_str).unwrap_err();
        assert!(err.to_string().contains("회차"));
    }

    #[test]
    fn missing_exam_tokens_fail_fast() {
        let toml_str = r#"
[row_phase_tokens]
"필기" = ["필기"]

[fields]
"회차" = ["회차"]

[fields."접수기간"]
neutral = ["접수"]
"#;
        let err = Tokens::from_toml(toml_str).unwrap_err();
        assert!(matches!(err, CertnormError::Validation { .. }), "got {err}");
        assert!(err.to_string().contains("시험일"));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = Tokens::from_toml("fields = [").unwrap_err();
        assert!(matches!(err, CertnormError::Config { .. }));
    }

    #[test]
    fn load_none_uses_builtin() {
        let tokens = Tokens::load(None).expect("builtin");
        assert!(tokens.row_phase_matcher(Phase::Practical).is_match("실기시험"));
    }
}
