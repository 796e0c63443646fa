//! Rule record loading.
//!
//! Rule configuration arrives as JSON in the extension's storage format:
//! camelCase field names, `"W"`/`"R"` pattern-type codes, request kinds
//! as strings. Records are reconstructed into validated `RedirectRule`s
//! at load time; a malformed record is skipped with a diagnostic and the
//! rest of the configuration keeps loading.

use serde::Deserialize;
use thiserror::Error;

use rdr_core::pattern::PatternType;
use rdr_core::rule::{ProcessMatches, RedirectRule, RuleDef};
use rdr_core::types::RequestKind;

/// A rule as stored by the extension. Loosely typed: anything structural
/// is validated during conversion, not here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub example_url: String,
    #[serde(default)]
    pub include_pattern: String,
    #[serde(default)]
    pub exclude_pattern: String,
    #[serde(default)]
    pub pattern_type: PatternType,
    #[serde(default)]
    pub redirect_url: String,
    #[serde(default)]
    pub process_matches: ProcessMatches,
    #[serde(default)]
    pub applies_to: Vec<RequestKind>,
    #[serde(default)]
    pub disabled: bool,
}

impl RuleRecord {
    fn into_def(self) -> RuleDef {
        RuleDef {
            description: self.description,
            example_url: self.example_url,
            include_pattern: self.include_pattern,
            exclude_pattern: self.exclude_pattern,
            pattern_type: self.pattern_type,
            redirect_template: self.redirect_url,
            process_matches: self.process_matches,
            applies_to: self.applies_to,
            disabled: self.disabled,
        }
    }
}

/// Rule files are either a bare array of records (storage format) or an
/// export file wrapping the array in a `redirects` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleFile {
    Records(Vec<RuleRecord>),
    Export { redirects: Vec<RuleRecord> },
}

/// The whole file failed to parse. Per-record problems are not errors;
/// they show up as `SkippedRule`s in the load report.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("rule file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A record that did not survive validation.
#[derive(Debug)]
pub struct SkippedRule {
    /// Display text of the record, for the diagnostic.
    pub description: String,
    pub error: rdr_core::RuleError,
}

/// Outcome of a fail-soft load.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Validated rules, in authored order.
    pub rules: Vec<RedirectRule>,
    /// Records dropped during validation.
    pub skipped: Vec<SkippedRule>,
}

/// Parse a rule file (storage array or export wrapper) into records.
pub fn parse_rule_file(text: &str) -> Result<Vec<RuleRecord>, ParseError> {
    let file: RuleFile = serde_json::from_str(text)?;
    Ok(match file {
        RuleFile::Records(records) => records,
        RuleFile::Export { redirects } => redirects,
    })
}

/// Convert records into validated rules, fail-soft.
///
/// The engine degrades to "fewer active rules" rather than refusing the
/// whole configuration: each invalid record is logged, reported and
/// skipped.
pub fn load_records(records: Vec<RuleRecord>) -> LoadReport {
    let mut report = LoadReport::default();

    for record in records {
        let description = record.description.clone();
        match RedirectRule::compile(record.into_def()) {
            Ok(rule) => report.rules.push(rule),
            Err(error) => {
                log::warn!("dropping rule `{description}`: {error}");
                report.skipped.push(SkippedRule { description, error });
            }
        }
    }

    log::debug!(
        "loaded {} rules, skipped {}",
        report.rules.len(),
        report.skipped.len()
    );
    report
}
