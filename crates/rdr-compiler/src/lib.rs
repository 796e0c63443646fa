//! Redirector Rule Compiler
//!
//! This crate turns the extension's loosely-typed rule storage format
//! into validated `rdr-core` rules (fail-soft: bad records are skipped
//! and reported, never abort the load), and compiles placeholder-free
//! rules into static descriptors for the declarative enforcement
//! collaborator.

pub mod record;
pub mod static_rules;

pub use record::{load_records, parse_rule_file, LoadReport, ParseError, RuleRecord, SkippedRule};
pub use static_rules::{compile_static, StaticRuleDescriptor};
