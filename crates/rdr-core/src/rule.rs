//! Redirect rules: validation, matching and capture substitution.
//!
//! A `RedirectRule` owns its compiled include/exclude matchers. Matchers
//! are built once from the authored pattern text; a rule whose pattern
//! fails to compile is rejected here and never enters the active set.

use std::borrow::Cow;

use base64::Engine as _;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::pattern::{compile, CompiledMatcher, PatternType};
use crate::types::{MatchResult, RequestKind};

/// Percent-encoding set equivalent to JavaScript's `encodeURIComponent`.
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

// =============================================================================
// Capture Transforms
// =============================================================================

/// Per-capture text transform applied before substitution.
///
/// Serialized as the storage format's camelCase names. Decode failures
/// degrade to the raw capture text rather than erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessMatches {
    #[default]
    #[serde(rename = "noProcessing")]
    NoProcessing,
    #[serde(rename = "urlEncode")]
    UrlEncode,
    #[serde(rename = "urlDecode")]
    UrlDecode,
    #[serde(rename = "base64encode")]
    Base64Encode,
    #[serde(rename = "base64decode")]
    Base64Decode,
}

impl ProcessMatches {
    /// Apply the transform to one captured string.
    pub fn apply<'a>(self, capture: &'a str) -> Cow<'a, str> {
        match self {
            Self::NoProcessing => Cow::Borrowed(capture),
            Self::UrlEncode => Cow::Owned(utf8_percent_encode(capture, URL_COMPONENT).to_string()),
            Self::UrlDecode => match percent_decode_str(capture).decode_utf8() {
                Ok(decoded) => Cow::Owned(decoded.into_owned()),
                Err(_) => {
                    log::debug!("capture `{capture}` is not valid percent-encoded UTF-8, left as-is");
                    Cow::Borrowed(capture)
                }
            },
            Self::Base64Encode => {
                Cow::Owned(base64::engine::general_purpose::STANDARD.encode(capture))
            }
            Self::Base64Decode => {
                let decoded = base64::engine::general_purpose::STANDARD
                    .decode(capture)
                    .ok()
                    .and_then(|bytes| String::from_utf8(bytes).ok());
                match decoded {
                    Some(text) => Cow::Owned(text),
                    None => {
                        log::debug!("capture `{capture}` is not valid base64 UTF-8, left as-is");
                        Cow::Borrowed(capture)
                    }
                }
            }
        }
    }
}

// =============================================================================
// Rule Definition
// =============================================================================

/// Unvalidated rule fields, as authored.
///
/// The configuration loader reconstructs these from loosely-typed storage
/// records; `RedirectRule::compile` turns them into a validated rule.
#[derive(Debug, Clone, Default)]
pub struct RuleDef {
    /// Display text, not used in matching.
    pub description: String,
    /// Authoring aid, not used in matching.
    pub example_url: String,
    pub include_pattern: String,
    /// Empty string means no exclude pattern.
    pub exclude_pattern: String,
    pub pattern_type: PatternType,
    /// Destination template; may contain `$1`, `$2`, ... placeholders.
    pub redirect_template: String,
    pub process_matches: ProcessMatches,
    pub applies_to: Vec<RequestKind>,
    pub disabled: bool,
}

// =============================================================================
// Redirect Rule
// =============================================================================

/// A validated rule with compiled matchers.
#[derive(Debug, Clone)]
pub struct RedirectRule {
    def: RuleDef,
    include: CompiledMatcher,
    exclude: Option<CompiledMatcher>,
    has_placeholders: bool,
}

impl RedirectRule {
    /// Validate and compile a rule definition.
    ///
    /// Rejects rules with an empty include pattern, an empty redirect
    /// template, an empty `applies_to` set, or patterns that fail to
    /// compile.
    pub fn compile(def: RuleDef) -> Result<Self, RuleError> {
        if def.include_pattern.is_empty() {
            return Err(RuleError::EmptyIncludePattern(def.description.clone()));
        }
        if def.redirect_template.is_empty() {
            return Err(RuleError::EmptyTemplate(def.description.clone()));
        }
        if def.applies_to.is_empty() {
            return Err(RuleError::NoRequestKinds(def.description.clone()));
        }

        let include = compile(&def.include_pattern, def.pattern_type)?;
        let exclude = if def.exclude_pattern.is_empty() {
            None
        } else {
            Some(compile(&def.exclude_pattern, def.pattern_type)?)
        };

        let has_placeholders = template_has_placeholders(&def.redirect_template);

        Ok(Self {
            def,
            include,
            exclude,
            has_placeholders,
        })
    }

    pub fn description(&self) -> &str {
        &self.def.description
    }

    pub fn applies_to(&self) -> &[RequestKind] {
        &self.def.applies_to
    }

    pub fn disabled(&self) -> bool {
        self.def.disabled
    }

    pub fn redirect_template(&self) -> &str {
        &self.def.redirect_template
    }

    /// The authored fields this rule was compiled from.
    pub fn def(&self) -> &RuleDef {
        &self.def
    }

    /// Whether the template references captured text (`$N`). Placeholder
    /// rules must be evaluated at request time; placeholder-free rules are
    /// eligible for static compilation.
    pub fn has_placeholders(&self) -> bool {
        self.has_placeholders
    }

    /// The anchored pattern text of the include matcher, for handing to
    /// the declarative enforcement collaborator.
    pub fn anchored_include_pattern(&self) -> &str {
        self.include.as_anchored_pattern()
    }

    /// Evaluate this rule against a candidate URL.
    ///
    /// Include must match; a matching exclude pattern wins over the
    /// include match. On a match the destination is the template with
    /// every `$N` replaced by the transformed N-th capture.
    /// Deterministic: identical input always yields identical output.
    pub fn evaluate(&self, url: &str) -> MatchResult {
        let captures = match self.include.captures(url) {
            Some(captures) => captures,
            None => return MatchResult::no_match(),
        };

        if let Some(exclude) = &self.exclude {
            if exclude.is_match(url) {
                return MatchResult::no_match();
            }
        }

        let destination = substitute(
            &self.def.redirect_template,
            &captures,
            self.def.process_matches,
            &self.def.description,
        );

        MatchResult {
            is_match: true,
            redirect_to: Some(destination),
        }
    }
}

/// True if the template contains a `$N` placeholder (a `$` immediately
/// followed by an ASCII digit).
fn template_has_placeholders(template: &str) -> bool {
    let bytes = template.as_bytes();
    bytes
        .windows(2)
        .any(|pair| pair[0] == b'$' && pair[1].is_ascii_digit())
}

/// Substitute `$N` tokens left to right. Placeholders are 1-indexed and
/// may be multi-digit; a placeholder referencing a missing capture
/// substitutes the empty string (observable via a debug diagnostic).
/// A `$` not followed by a digit is literal text.
fn substitute(
    template: &str,
    captures: &[String],
    transform: ProcessMatches,
    rule_description: &str,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || !chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            out.push(ch);
            continue;
        }

        // Saturate on absurdly long digit runs; a saturated index is
        // out of range and substitutes the empty string like any other.
        let mut index: usize = 0;
        while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
            chars.next();
            index = index.saturating_mul(10).saturating_add(digit as usize);
        }

        match index.checked_sub(1).and_then(|i| captures.get(i)) {
            Some(capture) => out.push_str(&transform.apply(capture)),
            None => {
                // $0 or out-of-range: rule author referenced a capture
                // that does not exist. Substitute nothing.
                log::debug!(
                    "rule `{rule_description}` references ${index} but the match produced {} captures",
                    captures.len()
                );
            }
        }
    }

    out
}
