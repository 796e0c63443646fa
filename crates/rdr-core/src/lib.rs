//! Redirector Core Library
//!
//! This crate provides the core matching engine for the Redirector URL
//! rewriter. Given a set of user-authored redirect rules (wildcard or
//! regular-expression patterns plus a redirect template), it decides for
//! each incoming request URL whether a rule matches and what the
//! destination URL is.
//!
//! # Architecture
//!
//! Rules are compiled once at load time into anchored regexes, partitioned
//! by request kind, and published atomically so an evaluation in flight
//! always sees a complete rule set. Evaluation itself is pure computation:
//! no I/O, no ambient listeners. The caller owns the dispatch loop and the
//! collaborators that perform the actual navigation.
//!
//! # Modules
//!
//! - `pattern`: wildcard/regex pattern compilation into anchored matchers
//! - `rule`: validated redirect rules, capture substitution and transforms
//! - `partition`: request-kind partitioning and atomic rule-set publication
//! - `suppress`: loop-suppression cache with windowed tallies
//! - `engine`: per-request evaluation over the partitioned rule set
//! - `types`: shared type definitions
//! - `error`: error taxonomy

pub mod engine;
pub mod error;
pub mod partition;
pub mod pattern;
pub mod rule;
pub mod suppress;
pub mod types;

// Re-export commonly used types
pub use engine::{Redirect, RedirectEngine};
pub use error::{PatternError, RuleError};
pub use partition::{PartitionedRuleSet, RuleSetHandle};
pub use pattern::{compile, CompiledMatcher, PatternType};
pub use rule::{ProcessMatches, RedirectRule, RuleDef};
pub use suppress::{LoopSuppressionCache, RecordOutcome, LOOP_THRESHOLD, SUPPRESSION_WINDOW};
pub use types::{EvaluationRequest, MatchResult, RequestKind};
