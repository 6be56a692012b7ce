//! Shared types, error model, and configuration for certnorm.
//!
//! This crate is the foundation depended on by all other certnorm crates.
//! It provides:
//! - [`CertnormError`]: the unified error type
//! - Domain types ([`Phase`], [`Field`], [`DateSpan`], the record shapes)
//! - Configuration ([`AppConfig`], config loading) and the token dictionary
//!   ([`TokenDictionary`] → compiled [`Tokens`])

pub mod config;
pub mod error;
pub mod tokens;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, TokensConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{CertnormError, Result};
pub use tokens::{
    BannerMatchers, DEFAULT_TOKENS, FieldMatchers, PhaseTokens, TimeSlotMatchers,
    TokenDictionary, TokenMatcher, Tokens, strip_ws,
};
pub use types::{
    ContentOutput, CoverageItem, DateSpan, Fees, Field, Phase, ScheduleEntry, ScheduleOutput,
    ScheduleRecord, SyllabusItem, TimeSlotRecord, Weight,
};
