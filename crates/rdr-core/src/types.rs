//! Core type definitions for Redirector
//!
//! These types mirror the extension's storage format for rules and
//! requests and are used throughout the matching engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Request Kinds
// =============================================================================

/// The kind of request being evaluated.
///
/// Matches the browser's resource type strings, plus the pseudo-kind
/// `history` which is fired on single-page-app navigation-state events
/// rather than on network requests. `history` is never merged into the
/// network kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    MainFrame,
    SubFrame,
    Stylesheet,
    Script,
    Image,
    Object,
    Xmlhttprequest,
    Other,
    /// Navigation-state events (pushState and friends), not network requests.
    History,
}

impl RequestKind {
    /// Browser-facing string form, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MainFrame => "main_frame",
            Self::SubFrame => "sub_frame",
            Self::Stylesheet => "stylesheet",
            Self::Script => "script",
            Self::Image => "image",
            Self::Object => "object",
            Self::Xmlhttprequest => "xmlhttprequest",
            Self::Other => "other",
            Self::History => "history",
        }
    }

    /// True for kinds delivered by the network-interception collaborator.
    pub fn is_network(self) -> bool {
        !matches!(self, Self::History)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = UnknownRequestKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main_frame" => Ok(Self::MainFrame),
            "sub_frame" => Ok(Self::SubFrame),
            "stylesheet" => Ok(Self::Stylesheet),
            "script" => Ok(Self::Script),
            "image" => Ok(Self::Image),
            "object" => Ok(Self::Object),
            "xmlhttprequest" => Ok(Self::Xmlhttprequest),
            "other" => Ok(Self::Other),
            "history" => Ok(Self::History),
            _ => Err(UnknownRequestKind(s.to_string())),
        }
    }
}

/// Error for an unrecognized request-kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRequestKind(pub String);

impl fmt::Display for UnknownRequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown request kind `{}`", self.0)
    }
}

impl std::error::Error for UnknownRequestKind {}

// =============================================================================
// Evaluation Request
// =============================================================================

/// A single URL-evaluation request from the interception collaborator.
#[derive(Debug, Clone)]
pub struct EvaluationRequest<'a> {
    /// Full candidate URL.
    pub url: &'a str,
    /// Request kind this URL arrived as.
    pub kind: RequestKind,
    /// Whether the request originates from the top-level frame.
    pub is_top_frame: bool,
}

// =============================================================================
// Match Result
// =============================================================================

/// Result of evaluating one rule against one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Did the include pattern match (and the exclude pattern not match)?
    pub is_match: bool,
    /// Substituted destination URL when `is_match` is true.
    pub redirect_to: Option<String>,
}

impl MatchResult {
    /// The negative result.
    pub fn no_match() -> Self {
        Self {
            is_match: false,
            redirect_to: None,
        }
    }
}

impl Default for MatchResult {
    fn default() -> Self {
        Self::no_match()
    }
}
