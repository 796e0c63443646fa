//! Per-request evaluation engine.
//!
//! This is the dynamic path: rules whose templates reference captured
//! text cannot be enforced declaratively and are evaluated here, per
//! request, against the published rule partition. Placeholder-free rules
//! on network kinds are skipped because the static descriptors already
//! cover them; on `history` events there is no declarative mechanism, so
//! every rule in the bucket is evaluated.
//!
//! The engine owns no listeners. A caller-owned dispatch loop feeds it
//! `EvaluationRequest`s one at a time and performs the actual navigation
//! for any redirect returned.

use std::sync::Arc;

use crate::partition::{PartitionedRuleSet, RuleSetHandle};
use crate::rule::RedirectRule;
use crate::suppress::{LoopSuppressionCache, RecordOutcome};
use crate::types::{EvaluationRequest, RequestKind};

/// A redirect produced by the engine, for the navigation collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Substituted destination URL.
    pub destination: String,
    /// Display text of the matching rule, for notifications and logs.
    pub rule_description: String,
}

/// Evaluates requests against the published rule set, with loop
/// suppression. Single-threaded: each request is handled to completion
/// before the next.
#[derive(Debug)]
pub struct RedirectEngine {
    rules: Arc<RuleSetHandle>,
    cache: LoopSuppressionCache,
}

impl RedirectEngine {
    pub fn new() -> Self {
        Self::with_rules(PartitionedRuleSet::default())
    }

    pub fn with_rules(set: PartitionedRuleSet) -> Self {
        Self {
            rules: Arc::new(RuleSetHandle::new(set)),
            cache: LoopSuppressionCache::new(),
        }
    }

    /// Handle to the published rule set, for configuration collaborators
    /// that rebuild and install rule sets.
    pub fn handle(&self) -> Arc<RuleSetHandle> {
        Arc::clone(&self.rules)
    }

    /// Rebuild the partition from a new authored rule list and publish it
    /// atomically. Evaluations in flight see the old complete set or the
    /// new complete one, never a mix.
    pub fn install(&self, rules: Vec<RedirectRule>) {
        self.rules.install(PartitionedRuleSet::build(rules));
    }

    /// Evaluate one request. Returns the redirect to perform, if any.
    pub fn evaluate(&mut self, request: &EvaluationRequest<'_>) -> Option<Redirect> {
        // One-shot suppression: the URL was just produced by us.
        if self.cache.should_suppress(request.url) {
            log::debug!("ignoring {}, was just redirected to", request.url);
            return None;
        }

        // Navigation-level kinds only apply to the top frame.
        if !request.is_top_frame
            && matches!(request.kind, RequestKind::MainFrame | RequestKind::History)
        {
            return None;
        }

        let set = self.rules.load();
        for rule in set.rules_for(request.kind) {
            // Static descriptors already enforce placeholder-free rules
            // on network kinds.
            if request.kind.is_network() && !rule.has_placeholders() {
                continue;
            }

            let result = rule.evaluate(request.url);
            let Some(destination) = result.redirect_to else {
                continue;
            };

            // First match wins; the only question left is loop safety.
            return match self.cache.record_redirect(&destination) {
                RecordOutcome::Recorded => {
                    log::debug!(
                        "rule `{}` matched: {} ===> {}",
                        rule.description(),
                        request.url,
                        destination
                    );
                    Some(Redirect {
                        destination,
                        rule_description: rule.description().to_string(),
                    })
                }
                RecordOutcome::ThresholdExceeded { count } => {
                    log::warn!(
                        "redirect loop detected: {destination} produced {count} times in a row, \
                         suppressing until the window lapses"
                    );
                    None
                }
            };
        }

        None
    }
}

impl Default for RedirectEngine {
    fn default() -> Self {
        Self::new()
    }
}
