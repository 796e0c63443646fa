//! Rule partitioning and atomic publication.
//!
//! Rules are grouped by request kind so a lookup only scans the rules
//! that can possibly apply. Relative order within each bucket equals the
//! rules' order in the authored list: the first matching rule wins.
//!
//! The partitioned set is rebuilt wholesale whenever the rule list
//! changes and published through `RuleSetHandle` with a single atomic
//! swap, so an evaluation in flight sees either the old complete set or
//! the new complete one, never a partially rebuilt one.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::rule::RedirectRule;
use crate::types::RequestKind;

/// Enabled rules grouped by request kind, in authored order.
#[derive(Debug, Default)]
pub struct PartitionedRuleSet {
    buckets: HashMap<RequestKind, Vec<Arc<RedirectRule>>>,
    rule_count: usize,
}

impl PartitionedRuleSet {
    /// Build partitions from an authored rule list.
    ///
    /// Disabled rules are excluded. A rule naming zero kinds is malformed
    /// configuration; it is dropped with a diagnostic (the loader already
    /// rejects these, this is a second line of defense).
    pub fn build(rules: Vec<RedirectRule>) -> Self {
        let mut buckets: HashMap<RequestKind, Vec<Arc<RedirectRule>>> = HashMap::new();
        let mut rule_count = 0;

        for rule in rules {
            if rule.disabled() {
                continue;
            }
            if rule.applies_to().is_empty() {
                log::warn!(
                    "rule `{}` names no request kinds, dropping it",
                    rule.description()
                );
                continue;
            }

            rule_count += 1;
            let rule = Arc::new(rule);
            for &kind in rule.applies_to() {
                buckets.entry(kind).or_default().push(Arc::clone(&rule));
            }
        }

        Self { buckets, rule_count }
    }

    /// Rules applicable to one request kind, in authored order.
    pub fn rules_for(&self, kind: RequestKind) -> &[Arc<RedirectRule>] {
        self.buckets.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of enabled rules across all partitions (each rule counted
    /// once, however many kinds it applies to).
    pub fn rule_count(&self) -> usize {
        self.rule_count
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count == 0
    }

    /// Request kinds that have at least one rule.
    pub fn kinds(&self) -> impl Iterator<Item = RequestKind> + '_ {
        self.buckets.keys().copied()
    }
}

/// Shared handle to the currently published rule set.
///
/// Reads are lock-free; `install` replaces the whole set atomically.
#[derive(Debug, Default)]
pub struct RuleSetHandle {
    inner: ArcSwap<PartitionedRuleSet>,
}

impl RuleSetHandle {
    pub fn new(set: PartitionedRuleSet) -> Self {
        Self {
            inner: ArcSwap::new(Arc::new(set)),
        }
    }

    /// Snapshot of the current rule set.
    pub fn load(&self) -> Arc<PartitionedRuleSet> {
        self.inner.load_full()
    }

    /// Atomically replace the published set.
    pub fn install(&self, set: PartitionedRuleSet) {
        log::debug!("installing rule set with {} rules", set.rule_count());
        self.inner.store(Arc::new(set));
    }
}
