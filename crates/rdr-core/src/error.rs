//! Error taxonomy for rule compilation.
//!
//! No error here is fatal: invalid rules are dropped from the active set
//! and the rest of the configuration keeps loading.

use thiserror::Error;

/// Pattern compilation failure.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The pattern text is not a valid regular expression.
    #[error("invalid regular expression `{pattern}`: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
}

/// Rule validation failure. The owning rule is rejected and excluded from
/// the active set; loading continues with the remaining rules.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),

    /// The include pattern is empty.
    #[error("rule `{0}` has an empty include pattern")]
    EmptyIncludePattern(String),

    /// The redirect template is empty.
    #[error("rule `{0}` has an empty redirect template")]
    EmptyTemplate(String),

    /// `applies_to` names no request kinds.
    #[error("rule `{0}` applies to no request kinds")]
    NoRequestKinds(String),
}
